//! Flow-controlled in-memory pipe for PCM bytes
//!
//! One Writer appends to a shared FIFO, one Reader drains it:
//! - the Reader suspends while the FIFO is empty
//! - the Writer suspends while the FIFO holds more than `threshold` bytes
//! - each side wakes the other through a single-slot `Signal`
//!
//! # Scheduling model
//!
//! The pipe is built for cooperative scheduling: both ends share their
//! state through `Rc<RefCell<_>>` and are therefore `!Send`. Drive them from
//! one task (`tokio::join!`) or from tasks on a `tokio::task::LocalSet`.
//! No borrow of the shared state is held across an `.await`, so whichever
//! side runs has exclusive access without a lock.
//!
//! Moving the pipe to a preemptive multi-threaded setting needs real
//! synchronization (a mutex with condition variables, or a lock-free ring).
//! The compiler refuses to send either end to another thread, so this can't
//! happen by accident.
//!
//! # Threshold
//!
//! The threshold is a soft watermark. It is checked only before a write
//! starts, and a single write is never split: writing 5000 bytes into an
//! empty pipe with a 4096-byte threshold appends all 5000 at once.
//!
//! # Closing
//!
//! `close()` on either end does nothing. It neither wakes a suspended
//! counterpart nor stops further reads and writes. A read or write that
//! waits for a counterpart which never runs again waits forever.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use embedded_io_async::{ErrorType, Read, Write};

use crate::signal::Signal;

/// Default soft threshold, in bytes
pub const PIPE_BUF_SIZE: usize = 4096;

/// Pipe configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeConfig {
    /// Writes wait while more than this many bytes are buffered
    pub threshold: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            threshold: PIPE_BUF_SIZE,
        }
    }
}

/// Shared state between Writer and Reader
struct SharedBuffer {
    buf: VecDeque<u8>,
    threshold: usize,
    data_available: Signal,
    space_available: Signal,
}

impl SharedBuffer {
    fn new(config: &PipeConfig) -> Self {
        Self {
            buf: VecDeque::new(),
            threshold: config.threshold,
            data_available: Signal::new("data_available"),
            space_available: Signal::new("space_available"),
        }
    }

    fn is_above_threshold(&self) -> bool {
        self.buf.len() > self.threshold
    }

    /// Move up to `out.len()` bytes from the front of the FIFO into `out`
    fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.buf.len());
        let (front, back) = self.buf.as_slices();
        let from_front = n.min(front.len());

        // from_front <= n <= out.len() and from_front <= front.len();
        // the remaining n - from_front bytes are in `back` because
        // front.len() + back.len() == buf.len() >= n
        #[allow(clippy::indexing_slicing)]
        {
            out[..from_front].copy_from_slice(&front[..from_front]);
            out[from_front..n].copy_from_slice(&back[..n - from_front]);
        }
        self.buf.drain(..n);
        n
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buffered={}, threshold={}, reader_waiting={}, writer_waiting={}",
            self.buf.len(),
            self.threshold,
            self.data_available.is_waiting(),
            self.space_available.is_waiting()
        )
    }
}

/// Create a connected Reader/Writer pair with the default threshold
#[must_use]
pub fn pipe() -> (Reader, Writer) {
    pipe_with_config(&PipeConfig::default())
}

/// Create a connected Reader/Writer pair
#[must_use]
pub fn pipe_with_config(config: &PipeConfig) -> (Reader, Writer) {
    let shared = Rc::new(RefCell::new(SharedBuffer::new(config)));
    let reader = Reader {
        shared: Rc::clone(&shared),
    };
    let writer = Writer { shared };
    (reader, writer)
}

/// Writer side of the pipe
///
/// Appends to the shared FIFO and wakes the reader when the FIFO stops
/// being empty.
pub struct Writer {
    shared: Rc<RefCell<SharedBuffer>>,
}

impl Writer {
    /// Get the number of bytes currently buffered
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.shared.borrow().buf.len()
    }

    #[must_use]
    pub fn threshold(&self) -> usize {
        self.shared.borrow().threshold
    }

    /// Write all of `data` to the pipe
    ///
    /// Waits while the buffer is above the threshold, then appends `data`
    /// in one piece. Always returns `data.len()`.
    ///
    /// # Important behavior
    ///
    /// - Empty data returns 0 at once, without waiting and without waking
    ///   the reader, even if the buffer is above the threshold
    /// - The append may leave the buffer above the threshold
    /// - The reader is woken only if the buffer was empty before the append
    ///
    /// A write borrows the writer mutably, so a second write can't start
    /// before the first one is finished or dropped:
    ///
    /// ```compile_fail,E0499
    /// let (_reader, mut writer) = pcmpipe::pipe();
    /// let first = writer.write(b"a");
    /// let second = writer.write(b"b");
    /// drop((first, second));
    /// ```
    pub async fn write(&mut self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }

        loop {
            let wakeup = {
                let mut shared = self.shared.borrow_mut();
                if !shared.is_above_threshold() {
                    break;
                }
                log::debug!(
                    "pipe writer: {} bytes buffered, above threshold {}, waiting",
                    shared.buf.len(),
                    shared.threshold
                );
                shared.space_available.wait()
            };
            wakeup.await;
        }

        let mut shared = self.shared.borrow_mut();
        let was_empty = shared.buf.is_empty();
        shared.buf.extend(data);
        if was_empty {
            shared.data_available.fire();
        }
        data.len()
    }

    /// Close the writer
    ///
    /// Does nothing: the buffer is kept, the reader is not woken and
    /// further writes are accepted. Can be called any number of times.
    pub fn close(&self) {
        log::trace!("pipe writer: close (no-op), {:?}", self.shared.borrow());
    }
}

impl fmt::Debug for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipe.Writer({:?})", self.shared.borrow())
    }
}

impl ErrorType for Writer {
    type Error = Infallible;
}

impl Write for Writer {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(Writer::write(self, buf).await)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Reader side of the pipe
///
/// Drains the shared FIFO from the front and wakes the writer when a drain
/// starts above the threshold.
pub struct Reader {
    shared: Rc<RefCell<SharedBuffer>>,
}

impl Reader {
    /// Get the number of bytes currently buffered
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.shared.borrow().buf.len()
    }

    #[must_use]
    pub fn threshold(&self) -> usize {
        self.shared.borrow().threshold
    }

    /// Read data from the pipe
    ///
    /// Waits until at least one byte is buffered, then moves up to
    /// `buf.len()` bytes into `buf`.
    ///
    /// Returns:
    /// - the number of bytes read, `1..=buf.len()`, for a non-empty `buf`
    /// - 0 at once for an empty `buf`
    ///
    /// A non-empty `buf` never gets 0: downstream readers take 0 as end of
    /// stream, and the pipe has no end of stream.
    pub async fn read(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }

        loop {
            let wakeup = {
                let mut shared = self.shared.borrow_mut();
                if !shared.buf.is_empty() {
                    break;
                }
                log::debug!("pipe reader: buffer empty, waiting");
                shared.data_available.wait()
            };
            wakeup.await;
        }

        let mut shared = self.shared.borrow_mut();
        let was_above_threshold = shared.is_above_threshold();
        let n = shared.drain_into(buf);
        if was_above_threshold {
            shared.space_available.fire();
        }
        n
    }

    /// Close the reader
    ///
    /// Does nothing, see `Writer::close`.
    pub fn close(&self) {
        log::trace!("pipe reader: close (no-op), {:?}", self.shared.borrow());
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipe.Reader({:?})", self.shared.borrow())
    }
}

impl ErrorType for Reader {
    type Error = Infallible;
}

impl Read for Reader {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(Reader::read(self, buf).await)
    }
}
