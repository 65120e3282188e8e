//! SLIPMUX: SLIP frames that carry a leading type byte and, for
//! configuration frames, a trailing FCS-16.
//!
//! The locked entry points live on [`Link`](crate::Link); this module holds
//! the frame layout and the unlocked encode and decode loops.

use crate::{
    TERMINATOR,
    buffer::FrameBuffer,
    fcs::Fcs16,
    link::ReadMode,
    serial::ByteSink,
    slip::{Decoded, Symbol, Window, read_symbol},
    stuffing,
};

/// The first byte of a SLIPMUX frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameType(pub u8);

impl FrameType {
    /// Human readable UTF-8 text
    pub const DIAGNOSTIC: FrameType = FrameType(0x0A);
    /// CoAP message protected by a trailing FCS-16
    pub const CONFIGURATION: FrameType = FrameType(0xA9);

    pub const IP4_FROM: u8 = 0x45;
    pub const IP4_TO: u8 = 0x4F;
    pub const IP6_FROM: u8 = 0x60;
    pub const IP6_TO: u8 = 0x6F;

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Frames of this type end with two checksum bytes.
    pub const fn is_checksummed(self) -> bool {
        self.0 == Self::CONFIGURATION.0
    }

    pub const fn is_diagnostic(self) -> bool {
        self.0 == Self::DIAGNOSTIC.0
    }

    pub const fn is_ipv4(self) -> bool {
        self.0 >= Self::IP4_FROM && self.0 <= Self::IP4_TO
    }

    pub const fn is_ipv6(self) -> bool {
        self.0 >= Self::IP6_FROM && self.0 <= Self::IP6_TO
    }
}

impl From<u8> for FrameType {
    fn from(value: u8) -> Self {
        FrameType(value)
    }
}

/// Progress of a frame across decode calls.
///
/// Start every packet with [`DecodeState::new`]. When a decode call returns
/// an incomplete result, pass the state it returned into the next call to
/// carry on with the same frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeState {
    frame_type: Option<FrameType>,
    pending: bool,
}

impl DecodeState {
    pub const fn new() -> DecodeState {
        DecodeState {
            frame_type: None,
            pending: false,
        }
    }

    /// The type byte of the last frame seen, if any.
    pub fn frame_type(&self) -> Option<FrameType> {
        self.frame_type
    }

    /// A frame has been started but its terminator has not been read yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    fn resumed_type(&self) -> Option<FrameType> {
        if self.pending { self.frame_type } else { None }
    }
}

pub(crate) fn encode<K: ByteSink + ?Sized>(
    payload: &[u8],
    frame_type: FrameType,
    sink: &mut K,
) -> Result<(), K::Error> {
    sink.put(TERMINATOR)?;
    // fixed position, never escaped
    sink.put(frame_type.value())?;
    stuffing::escape_into(payload, sink)?;
    if frame_type.is_checksummed() {
        let mut fcs = Fcs16::new();
        fcs.update(&[frame_type.value()]);
        fcs.update(payload);
        stuffing::escape_into(&fcs.finish(), sink)?;
    }
    sink.put(TERMINATOR)
}

pub(crate) fn decode<const N: usize>(
    buffer: &FrameBuffer<N>,
    dest: &mut [u8],
    state: DecodeState,
    mode: ReadMode,
) -> (Decoded, DecodeState) {
    if mode == ReadMode::WholeFrames && buffer.packet_count() == 0 {
        return (Decoded::default(), state);
    }

    let mut frame_type = state.resumed_type();
    let mut window = Window::new(dest);
    loop {
        match read_symbol(buffer) {
            Symbol::Exhausted => {
                let state = DecodeState {
                    frame_type,
                    pending: frame_type.is_some(),
                };
                return (window.partial(), state);
            }
            Symbol::Terminator if window.seen == 0 && frame_type.is_none() => {
                log::debug!("skipping empty frame");
            }
            Symbol::Terminator => {
                buffer.complete_packet();
                let mut decoded = window.complete();
                // FCS is stripped, not verified
                if frame_type.is_some_and(FrameType::is_checksummed) && decoded.len >= 2 {
                    decoded.len -= 2;
                }
                let state = DecodeState {
                    frame_type,
                    pending: false,
                };
                return (decoded, state);
            }
            Symbol::Data(byte) if frame_type.is_none() => frame_type = Some(FrameType(byte)),
            Symbol::Data(byte) => window.store(byte),
        }
    }
}
