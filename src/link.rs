use crate::{
    buffer::FrameBuffer,
    guard::{Guard, NoLock, Semaphore, SpinSemaphore},
    serial::ByteSink,
    slip::Decoded,
    slipmux::{self, DecodeState, FrameType},
};

/// When [`Link::recv`] starts reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// Only once at least one complete frame is buffered.
    #[default]
    WholeFrames,
    /// Whenever bytes are buffered. Frames still arriving are handed out in
    /// pieces and resumed through the returned [`DecodeState`].
    ///
    /// The checksum of a configuration frame is only taken off the output of
    /// the call that reads its terminator. When a piece ends inside the two
    /// checksum bytes, the ones already handed out are left in the caller's
    /// data and the final call is too short to strip anything.
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// How long `send` and `recv` may wait for their lock before the link is
    /// considered wedged. Units are those of the link's [`Semaphore`].
    pub lock_timeout: u32,
    pub read_mode: ReadMode,
}

impl LinkConfig {
    pub const DEFAULT_LOCK_TIMEOUT: u32 = 1_000_000;

    pub const fn new() -> LinkConfig {
        LinkConfig {
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            read_mode: ReadMode::WholeFrames,
        }
    }

    pub const fn with_lock_timeout(mut self, lock_timeout: u32) -> LinkConfig {
        self.lock_timeout = lock_timeout;
        self
    }

    pub const fn with_read_mode(mut self, read_mode: ReadMode) -> LinkConfig {
        self.read_mode = read_mode;
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A SLIPMUX link.
///
/// Senders are serialised by the transmit lock and receivers by the receive
/// lock, each held for a whole call. The two directions run independently.
#[derive(Debug)]
pub struct Link<S = SpinSemaphore> {
    tx: S,
    rx: S,
    config: LinkConfig,
}

impl Link<SpinSemaphore> {
    pub const fn new(config: LinkConfig) -> Link<SpinSemaphore> {
        Link {
            tx: SpinSemaphore::new(),
            rx: SpinSemaphore::new(),
            config,
        }
    }
}

impl Link<NoLock> {
    pub const fn unguarded(config: LinkConfig) -> Link<NoLock> {
        Link {
            tx: NoLock,
            rx: NoLock,
            config,
        }
    }
}

impl<S: Semaphore> Link<S> {
    pub fn with_semaphores(tx: S, rx: S, config: LinkConfig) -> Link<S> {
        Link { tx, rx, config }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Send `payload` as a frame of type `frame_type`.
    ///
    /// # Panics
    ///
    /// If the transmit lock is not free within the configured timeout.
    pub fn send<K: ByteSink + ?Sized>(
        &self,
        payload: &[u8],
        frame_type: FrameType,
        sink: &mut K,
    ) -> Result<(), K::Error> {
        let _tx = Guard::acquire(&self.tx, self.config.lock_timeout, "transmit");
        slipmux::encode(payload, frame_type, sink)
    }

    pub fn send_diagnostic<K: ByteSink + ?Sized>(
        &self,
        text: &str,
        sink: &mut K,
    ) -> Result<(), K::Error> {
        self.send(text.as_bytes(), FrameType::DIAGNOSTIC, sink)
    }

    /// Send a configuration (CoAP) message with its FCS appended.
    pub fn send_configuration<K: ByteSink + ?Sized>(
        &self,
        message: &[u8],
        sink: &mut K,
    ) -> Result<(), K::Error> {
        self.send(message, FrameType::CONFIGURATION, sink)
    }

    /// Read the next frame, or the next piece of one, into `dest`.
    ///
    /// The type byte is reported through the returned state and never
    /// written to `dest`. For configuration frames the two checksum bytes are
    /// dropped from the reported length without being checked. In
    /// [`ReadMode::Streaming`] that only covers checksum bytes read by the
    /// call that completes the frame.
    ///
    /// # Panics
    ///
    /// If the receive lock is not free within the configured timeout, or if
    /// the buffer's packet count disagrees with its contents.
    pub fn recv<const N: usize>(
        &self,
        buffer: &FrameBuffer<N>,
        dest: &mut [u8],
        state: DecodeState,
    ) -> (Decoded, DecodeState) {
        let _rx = Guard::acquire(&self.rx, self.config.lock_timeout, "receive");
        slipmux::decode(buffer, dest, state, self.config.read_mode)
    }
}
