//! 16 bit frame check sequence carried by checksum protected SLIPMUX frames.
//!
//! This is the PPP FCS-16 (RFC 1662). The digest reports the raw register;
//! [`Fcs16::finish`] complements it and splits it into wire order.

use crc::{Algorithm, Crc, Digest};

/// PPP FCS-16 without the final complement.
pub const FCS16_RAW: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0xffff,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0x6f91,
    residue: 0x0000,
};

static FCS16: Crc<u16> = Crc::<u16>::new(&FCS16_RAW);

pub struct Fcs16 {
    digest: Digest<'static, u16>,
}

impl Fcs16 {
    pub fn new() -> Fcs16 {
        Fcs16 {
            digest: FCS16.digest(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// Complement the running value and return it least significant byte
    /// first, as it goes on the wire.
    pub fn finish(self) -> [u8; 2] {
        (!self.digest.finalize()).to_le_bytes()
    }
}

impl Default for Fcs16 {
    fn default() -> Self {
        Self::new()
    }
}
