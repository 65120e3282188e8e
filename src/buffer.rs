use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal_nb::serial::Read;
use heapless::Deque;

use crate::{ESCAPE, TERMINATOR};

/// One unit taken off the front of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Popped {
    Plain(u8),
    /// The raw byte that followed an escape
    Escaped(u8),
}

struct State<const N: usize> {
    queue: Deque<u8, N>,
    /// Terminators that closed a non-empty run and have not been decoded yet
    packets: usize,
    last: u8,
}

/// Receive side buffer shared between the byte producer (usually a UART
/// interrupt) and the task that decodes packets.
///
/// Every access runs inside a short `critical_section`, so a `FrameBuffer`
/// can sit in a `static` and be fed from interrupt context while a task
/// drains it.
pub struct FrameBuffer<const N: usize> {
    state: Mutex<RefCell<State<N>>>,
}

impl<const N: usize> FrameBuffer<N> {
    pub const fn new() -> FrameBuffer<N> {
        FrameBuffer {
            state: Mutex::new(RefCell::new(State {
                queue: Deque::new(),
                packets: 0,
                last: TERMINATOR,
            })),
        }
    }

    /// Push one byte as it came off the wire.
    ///
    /// # Panics
    ///
    /// If the buffer is full. A full buffer means bytes are arriving faster
    /// than packets are decoded and the link has already lost data.
    pub fn ingest(&self, byte: u8) {
        let pushed = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if let Err(rejected) = state.queue.push_back(byte) {
                return Err(rejected);
            }
            if byte == TERMINATOR && state.last != TERMINATOR {
                state.packets += 1;
            }
            state.last = byte;
            Ok(())
        });
        if let Err(byte) = pushed {
            log::error!("frame buffer overflow, dropping {:#04x}", byte);
            panic!("frame buffer full ({} bytes)", N);
        }
    }

    /// Move bytes out of a serial port until it has nothing more to give.
    ///
    /// Stops with `WouldBlock` when the port is drained or when the buffer is
    /// full. In the latter case the pending byte stays in the port.
    pub fn ingest_from<Rx: Read>(&self, rx: &mut Rx) -> nb::Result<(), Rx::Error> {
        loop {
            if self.is_full() {
                log::debug!("frame buffer full, leaving bytes in the port");
                return Err(nb::Error::WouldBlock);
            }
            let byte = rx.read()?;
            self.ingest(byte);
        }
    }

    /// Number of complete packets waiting to be decoded.
    pub fn packet_count(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).packets)
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).queue.len())
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).queue.is_empty())
    }

    pub fn is_full(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).queue.is_full())
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Take the oldest byte, or an escape together with the byte after it.
    ///
    /// An escape whose follower has not arrived yet stays queued and reads as
    /// `None`. Running dry with packets still outstanding means the counter
    /// and the queue disagree, which is fatal.
    pub(crate) fn pop(&self) -> Option<Popped> {
        let popped = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let stalled = match state.queue.front() {
                None => true,
                Some(&ESCAPE) => state.queue.len() < 2,
                Some(_) => false,
            };
            if stalled {
                return if state.packets == 0 {
                    Ok(None)
                } else {
                    Err(state.packets)
                };
            }
            let popped = match state.queue.pop_front() {
                Some(ESCAPE) => state.queue.pop_front().map(Popped::Escaped),
                byte => byte.map(Popped::Plain),
            };
            Ok(popped)
        });
        match popped {
            Ok(popped) => popped,
            Err(packets) => {
                log::error!("frame buffer ran dry but packet count = {}", packets);
                panic!("frame buffer drained with {} packets outstanding", packets);
            }
        }
    }

    /// A decoder consumed the terminator of a counted packet.
    pub(crate) fn complete_packet(&self) {
        let remaining = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.packets = state.packets.checked_sub(1)?;
            Some(state.packets)
        });
        if remaining.is_none() {
            log::error!("packet completed while packet count = 0");
            panic!("packet count underflow");
        }
    }
}

impl<const N: usize> Default for FrameBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::convert::Infallible;
    use std::collections::VecDeque;

    use embedded_hal_nb::serial::ErrorType;

    #[derive(Debug)]
    struct ReadBuffer(VecDeque<u8>);

    impl ErrorType for ReadBuffer {
        type Error = Infallible;
    }

    impl Read for ReadBuffer {
        fn read(&mut self) -> nb::Result<u8, Self::Error> {
            self.0.pop_front().ok_or(nb::Error::WouldBlock)
        }
    }

    fn feed<const N: usize>(buffer: &FrameBuffer<N>, data: &[u8]) {
        for b in data {
            buffer.ingest(*b);
        }
    }

    #[test]
    fn counts_closed_frames() {
        let buffer = FrameBuffer::<32>::new();
        feed(&buffer, &[TERMINATOR, 0x01, 0x02, TERMINATOR]);
        assert_eq!(buffer.packet_count(), 1);
        feed(&buffer, &[TERMINATOR, 0x03, TERMINATOR]);
        assert_eq!(buffer.packet_count(), 2);
        assert_eq!(buffer.len(), 7);
    }

    #[test]
    fn repeated_terminators_count_once() {
        let buffer = FrameBuffer::<32>::new();
        feed(&buffer, &[TERMINATOR, TERMINATOR, TERMINATOR]);
        assert_eq!(buffer.packet_count(), 0);
        feed(&buffer, &[0x01, TERMINATOR, TERMINATOR]);
        assert_eq!(buffer.packet_count(), 1);
    }

    #[test]
    fn escaped_bytes_are_not_terminators() {
        let buffer = FrameBuffer::<32>::new();
        feed(&buffer, &[ESCAPE, 0xDC, 0x01]);
        assert_eq!(buffer.packet_count(), 0);
    }

    #[test]
    #[should_panic(expected = "frame buffer full")]
    fn ingest_into_full_buffer_is_fatal() {
        let buffer = FrameBuffer::<2>::new();
        feed(&buffer, &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn pop_is_fifo() {
        let buffer = FrameBuffer::<4>::new();
        feed(&buffer, &[0x01, 0x02]);
        assert_eq!(buffer.pop(), Some(Popped::Plain(0x01)));
        assert_eq!(buffer.pop(), Some(Popped::Plain(0x02)));
        assert_eq!(buffer.pop(), None);
    }

    #[test]
    fn escape_waits_for_its_follower() {
        let buffer = FrameBuffer::<4>::new();
        feed(&buffer, &[0x01, ESCAPE]);
        assert_eq!(buffer.pop(), Some(Popped::Plain(0x01)));
        assert_eq!(buffer.pop(), None);
        assert_eq!(buffer.len(), 1);

        feed(&buffer, &[0xDC]);
        assert_eq!(buffer.pop(), Some(Popped::Escaped(0xDC)));
        assert!(buffer.is_empty());
    }

    #[test]
    #[should_panic(expected = "packets outstanding")]
    fn draining_past_a_counted_packet_is_fatal() {
        let buffer = FrameBuffer::<4>::new();
        feed(&buffer, &[0x01, TERMINATOR]);
        buffer.pop();
        buffer.pop();
        buffer.pop();
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn completing_without_packets_is_fatal() {
        let buffer = FrameBuffer::<4>::new();
        buffer.complete_packet();
    }

    #[test]
    fn ingest_from_drains_port() {
        let buffer = FrameBuffer::<8>::new();
        let mut rx = ReadBuffer(VecDeque::from([TERMINATOR, 0x01, TERMINATOR]));
        assert!(matches!(buffer.ingest_from(&mut rx), Err(nb::Error::WouldBlock)));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.packet_count(), 1);
    }

    #[test]
    fn ingest_from_stops_when_full() {
        let buffer = FrameBuffer::<2>::new();
        let mut rx = ReadBuffer(VecDeque::from([0x01, 0x02, 0x03]));
        assert!(matches!(buffer.ingest_from(&mut rx), Err(nb::Error::WouldBlock)));
        assert!(buffer.is_full());
        assert_eq!(rx.0, VecDeque::from([0x03]));
    }
}
