//! Plain SLIP (RFC 1055) framing.

use crate::{
    TERMINATOR,
    buffer::{FrameBuffer, Popped},
    serial::ByteSink,
    stuffing,
};

/// Result of one decode call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Bytes written to the start of the destination by this call
    pub len: usize,
    /// A terminator closed the packet
    pub complete: bool,
}

/// Send `payload` as one SLIP frame.
///
/// The frame starts with a terminator as well, which flushes whatever line
/// noise the receiver has collected since the last frame.
pub fn encode<K: ByteSink + ?Sized>(payload: &[u8], sink: &mut K) -> Result<(), K::Error> {
    sink.put(TERMINATOR)?;
    stuffing::escape_into(payload, sink)?;
    sink.put(TERMINATOR)
}

/// Read the next packet out of `buffer` into `dest`.
///
/// Returns straight away when no complete packet is buffered. Bytes that do
/// not fit into `dest` are consumed and dropped; the returned length does not
/// tell a truncated packet from one that fit exactly.
pub fn decode<const N: usize>(buffer: &FrameBuffer<N>, dest: &mut [u8]) -> Decoded {
    if buffer.packet_count() == 0 {
        return Decoded::default();
    }

    let mut window = Window::new(dest);
    loop {
        match read_symbol(buffer) {
            Symbol::Exhausted => return window.partial(),
            Symbol::Terminator if window.seen == 0 => {
                log::debug!("skipping empty frame");
            }
            Symbol::Terminator => {
                buffer.complete_packet();
                return window.complete();
            }
            Symbol::Data(byte) => window.store(byte),
        }
    }
}

pub(crate) enum Symbol {
    Data(u8),
    Terminator,
    Exhausted,
}

/// Pull one unescaped symbol out of the buffer. An escape at the very end
/// stays buffered until its follower arrives and reads as `Exhausted`.
pub(crate) fn read_symbol<const N: usize>(buffer: &FrameBuffer<N>) -> Symbol {
    match buffer.pop() {
        None => Symbol::Exhausted,
        Some(Popped::Plain(TERMINATOR)) => Symbol::Terminator,
        Some(Popped::Plain(byte)) => Symbol::Data(byte),
        Some(Popped::Escaped(follower)) => Symbol::Data(stuffing::unescape(follower)),
    }
}

/// Destination window of a single decode call.
pub(crate) struct Window<'a> {
    dest: &'a mut [u8],
    pub(crate) len: usize,
    /// Stored plus dropped payload bytes
    pub(crate) seen: usize,
}

impl<'a> Window<'a> {
    pub(crate) fn new(dest: &'a mut [u8]) -> Window<'a> {
        Window { dest, len: 0, seen: 0 }
    }

    pub(crate) fn store(&mut self, byte: u8) {
        if let Some(slot) = self.dest.get_mut(self.len) {
            *slot = byte;
            self.len += 1;
        }
        self.seen += 1;
    }

    fn finish(&self, complete: bool) -> Decoded {
        if self.seen > self.len {
            log::debug!(
                "destination too small, dropped {} of {} bytes",
                self.seen - self.len,
                self.seen
            );
        }
        Decoded {
            len: self.len,
            complete,
        }
    }

    pub(crate) fn complete(&self) -> Decoded {
        self.finish(true)
    }

    pub(crate) fn partial(&self) -> Decoded {
        self.finish(false)
    }
}
