use core::convert::Infallible;

use embedded_hal_nb::serial;

/// A synchronous, one byte at a time destination for encoded frames.
pub trait ByteSink {
    type Error;

    fn put(&mut self, byte: u8) -> Result<(), Self::Error>;
}

impl<K: ByteSink + ?Sized> ByteSink for &mut K {
    type Error = K::Error;

    fn put(&mut self, byte: u8) -> Result<(), Self::Error> {
        (**self).put(byte)
    }
}

/// Writes into an `embedded-hal-nb` serial port, blocking while the port
/// reports `WouldBlock`.
#[derive(Debug)]
pub struct Serial<W>(pub W);

impl<W: serial::Write> ByteSink for Serial<W> {
    type Error = W::Error;

    fn put(&mut self, byte: u8) -> Result<(), Self::Error> {
        nb::block!(self.0.write(byte))
    }
}

/// Writes into any `embedded-io` writer.
#[derive(Debug)]
pub struct Io<W>(pub W);

impl<W: embedded_io::Write> ByteSink for Io<W> {
    type Error = W::Error;

    fn put(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.0.write_all(&[byte])
    }
}

/// Wraps a closure that takes every byte, e.g. a UART data register write.
pub struct FnSink<F>(pub F);

impl<F: FnMut(u8)> ByteSink for FnSink<F> {
    type Error = Infallible;

    fn put(&mut self, byte: u8) -> Result<(), Self::Error> {
        (self.0)(byte);
        Ok(())
    }
}

/// A fixed capacity sink ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFull {
    pub rejected: u8,
}

impl<const N: usize> ByteSink for heapless::Vec<u8, N> {
    type Error = BufferFull;

    fn put(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.push(byte).map_err(|rejected| BufferFull { rejected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    struct Uart {
        sent: Vec<u8>,
        busy: VecDeque<bool>,
    }

    impl serial::ErrorType for Uart {
        type Error = serial::ErrorKind;
    }

    impl serial::Write for Uart {
        fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
            if self.busy.pop_front().unwrap_or(false) {
                return Err(nb::Error::WouldBlock);
            }
            self.sent.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn serial_sink_waits_out_would_block() {
        let mut uart = Uart {
            busy: VecDeque::from([true, true, false, true]),
            ..Default::default()
        };
        let mut sink = Serial(&mut uart);
        sink.put(0x01).unwrap();
        sink.put(0x02).unwrap();
        assert_eq!(uart.sent, vec![0x01, 0x02]);
    }

    #[test]
    fn io_sink_writes_through() {
        let mut buf = [0u8; 4];
        {
            let mut sink = Io(&mut buf[..]);
            sink.put(0xAA).unwrap();
            sink.put(0x55).unwrap();
        }
        assert_eq!(buf, [0xAA, 0x55, 0, 0]);
    }

    #[test]
    fn heapless_sink_rejects_overflow() {
        let mut v = heapless::Vec::<u8, 1>::new();
        v.put(7).unwrap();
        assert_eq!(v.put(8), Err(BufferFull { rejected: 8 }));
    }

    #[test]
    fn closure_sink_sees_every_byte() {
        let mut seen = Vec::new();
        let mut sink = FnSink(|b: u8| seen.push(b));
        sink.put(1).unwrap();
        sink.put(2).unwrap();
        drop(sink);
        assert_eq!(seen, vec![1, 2]);
    }
}
