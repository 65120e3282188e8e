//! Byte stuffing rules shared by the SLIP and SLIPMUX encoders and decoders.

use crate::{ESCAPE, ESCAPED_ESCAPE, ESCAPED_TERMINATOR, TERMINATOR, serial::ByteSink};

/// The wire form of a single payload byte: either the byte itself or a two
/// byte escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escaped {
    buf: [u8; 2],
    len: u8,
}

impl Escaped {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

/// Escape one byte for the wire.
pub const fn escape(byte: u8) -> Escaped {
    match byte {
        TERMINATOR => Escaped {
            buf: [ESCAPE, ESCAPED_TERMINATOR],
            len: 2,
        },
        ESCAPE => Escaped {
            buf: [ESCAPE, ESCAPED_ESCAPE],
            len: 2,
        },
        b => Escaped { buf: [b, 0], len: 1 },
    }
}

/// Map the byte that followed an [`ESCAPE`] back to its payload value.
///
/// Anything other than the two escape codes is a protocol violation and is
/// handed back unchanged.
pub fn unescape(follower: u8) -> u8 {
    match follower {
        ESCAPED_TERMINATOR => TERMINATOR,
        ESCAPED_ESCAPE => ESCAPE,
        other => {
            log::trace!("invalid escape sequence {:#04x}, passing through", other);
            other
        }
    }
}

/// Escape every byte of `data` into `sink`.
pub fn escape_into<K: ByteSink + ?Sized>(data: &[u8], sink: &mut K) -> Result<(), K::Error> {
    for byte in data {
        for b in escape(*byte).as_bytes() {
            sink.put(*b)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bytes_pass_through() {
        assert_eq!(escape(0x01).as_bytes(), &[0x01]);
        assert_eq!(escape(ESCAPED_TERMINATOR).as_bytes(), &[ESCAPED_TERMINATOR]);
    }

    #[test]
    fn reserved_bytes_are_escaped() {
        assert_eq!(escape(TERMINATOR).as_bytes(), &[ESCAPE, ESCAPED_TERMINATOR]);
        assert_eq!(escape(ESCAPE).as_bytes(), &[ESCAPE, ESCAPED_ESCAPE]);
    }

    #[test]
    fn every_byte_survives_escaping() {
        for b in 0..=u8::MAX {
            let e = escape(b);
            let back = match e.as_bytes() {
                [single] => *single,
                [ESCAPE, follower] => unescape(*follower),
                other => panic!("unexpected escape output {:?}", other),
            };
            assert_eq!(b, back);
        }
    }

    #[test]
    fn invalid_follower_is_left_alone() {
        assert_eq!(unescape(0x42), 0x42);
        assert_eq!(unescape(TERMINATOR), TERMINATOR);
    }

    #[test]
    fn escape_into_writes_stuffed_stream() {
        let mut out = heapless::Vec::<u8, 8>::new();
        escape_into(&[0x01, TERMINATOR, ESCAPE, 0x02], &mut out).unwrap();
        assert_eq!(
            &out,
            &[0x01, ESCAPE, ESCAPED_TERMINATOR, ESCAPE, ESCAPED_ESCAPE, 0x02]
        );
    }
}
