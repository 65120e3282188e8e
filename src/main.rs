use std::{collections::VecDeque, convert::Infallible};

use embed_slipmux::{DecodeState, FrameBuffer, FrameType, Link, LinkConfig, Serial};
use embedded_hal_nb::serial::{ErrorType, Read, Write};

static RX: FrameBuffer<512> = FrameBuffer::new();

/// Sends a few SLIPMUX frames through a fake UART and reads them back.
fn main() {
    let link = Link::new(LinkConfig::new());

    let mut tx = Serial(TxBuffer::new());
    link.send_diagnostic("boot complete", &mut tx).unwrap();
    link.send_configuration(&[0x40, 0x01, 0x00, 0x00], &mut tx).unwrap();
    link.send(&[0x00, 0x00, 0x00, 0x2c], FrameType(0x60), &mut tx).unwrap();

    let mut rx = ReadBuffer::from_iter(tx.0.0.into_iter());
    match RX.ingest_from(&mut rx) {
        Ok(()) | Err(nb::Error::WouldBlock) => {}
        Err(nb::Error::Other(e)) => match e {},
    }
    println!("{} bytes buffered, {} frames", RX.len(), RX.packet_count());

    let mut out = [0; 128];
    loop {
        let (decoded, state) = link.recv(&RX, &mut out, DecodeState::new());
        if !decoded.complete {
            break;
        }
        let payload = &out[..decoded.len];
        match state.frame_type() {
            Some(t) if t.is_diagnostic() => {
                println!("diagnostic: {}", String::from_utf8_lossy(payload))
            }
            Some(t) if t.is_checksummed() => println!("configuration: {:02x?}", payload),
            Some(t) => println!("type {:#04x}: {:02x?}", t.value(), payload),
            None => println!("untyped: {:02x?}", payload),
        }
    }
}

#[derive(Debug)]
struct TxBuffer(Vec<u8>);

impl TxBuffer {
    fn new() -> TxBuffer {
        TxBuffer(Vec::new())
    }
}

impl ErrorType for TxBuffer {
    type Error = Infallible;
}

impl Write for TxBuffer {
    fn write(&mut self, c: u8) -> nb::Result<(), Self::Error> {
        self.0.push(c);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug)]
struct ReadBuffer(pub VecDeque<u8>);

impl ReadBuffer {
    fn from_iter(data: impl Iterator<Item = u8>) -> ReadBuffer {
        let q = VecDeque::from_iter(data);
        ReadBuffer(q)
    }
}

impl ErrorType for ReadBuffer {
    type Error = Infallible;
}

impl Read for ReadBuffer {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.0.pop_front().ok_or(nb::Error::WouldBlock)
    }
}
