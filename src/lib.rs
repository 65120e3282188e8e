//! SLIP and SLIPMUX framing for byte oriented serial links.
//!
//! Bytes arriving from a UART are pushed one at a time into a [`FrameBuffer`],
//! usually from an interrupt handler. Task level code pulls complete packets
//! out of the same buffer with [`slip::decode`] or, for type multiplexed
//! frames, with [`Link::recv`]. Outgoing packets are escaped and written one
//! byte at a time into a [`ByteSink`].
//!
//! ```
//! use embed_slipmux::{DecodeState, FrameBuffer, FrameType, Link, LinkConfig};
//!
//! static RX: FrameBuffer<64> = FrameBuffer::new();
//! let link = Link::new(LinkConfig::new());
//!
//! let mut wire = heapless::Vec::<u8, 64>::new();
//! link.send_configuration(&[0x01, 0x02], &mut wire).unwrap();
//! for byte in &wire {
//!     RX.ingest(*byte);
//! }
//!
//! let mut out = [0; 16];
//! let (decoded, state) = link.recv(&RX, &mut out, DecodeState::new());
//! assert!(decoded.complete);
//! assert_eq!(state.frame_type(), Some(FrameType::CONFIGURATION));
//! assert_eq!(&out[..decoded.len], &[0x01, 0x02]);
//! ```
#![cfg_attr(not(test), no_std)]

mod buffer;
pub mod fcs;
mod guard;
mod link;
mod serial;
pub mod slip;
pub mod slipmux;
pub mod stuffing;

pub use buffer::FrameBuffer;
pub use guard::{Guard, NoLock, Semaphore, SpinSemaphore};
pub use link::{Link, LinkConfig, ReadMode};
pub use serial::{BufferFull, ByteSink, FnSink, Io, Serial};
pub use slip::Decoded;
pub use slipmux::{DecodeState, FrameType};

/// Frame boundary
pub const TERMINATOR: u8 = 0xC0;

/// Escape prefix
pub const ESCAPE: u8 = 0xDB;

/// Follows [`ESCAPE`] to stand for a literal [`TERMINATOR`]
pub const ESCAPED_TERMINATOR: u8 = 0xDC;

/// Follows [`ESCAPE`] to stand for a literal [`ESCAPE`]
pub const ESCAPED_ESCAPE: u8 = 0xDD;
