//! Player - drains a byte stream into wave-out hardware buffers
//!
//! The player owns a fixed set of equally sized hardware buffers. Each
//! `play_chunk` call takes a buffer the device is done with, fills it
//! completely from the stream and queues it. The stream is any
//! `embedded_io_async::Read`; with a `pcmpipe::Reader` the fill suspends
//! until the producer has written enough.
//!
//! Device errors are handed back untouched, tagged with the failing call.

use std::fmt;

use embedded_io_async::{Read, ReadExactError};
use tracing::{debug, info, trace, warn};

use crate::backend::{op, WaveOut};
use crate::error::{MmResult, WaveOutError};
use crate::format::{select_device, HWaveOut, WaveFormat, WaveHeader};

/// Player configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Substring of the device name to look for; system default if `None`
    pub device_filter: Option<String>,
    pub format: WaveFormat,
    /// Size of one hardware buffer in bytes, a multiple of the frame size
    pub buffer_size: usize,
    pub buffer_count: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            device_filter: None,
            format: WaveFormat::default(),
            buffer_size: 4096,
            buffer_count: 2,
        }
    }
}

impl PlayerConfig {
    /// # Errors
    /// `BADFORMAT` for an unusable format, `PlayError::Config` for bad
    /// buffer settings.
    pub fn validate<E: fmt::Debug>(&self) -> Result<(), PlayError<E>> {
        self.format.validate(op::OPEN)?;
        if self.buffer_count == 0 {
            return Err(PlayError::Config("buffer_count must be positive"));
        }
        if self.buffer_size == 0 || self.buffer_size % self.format.block_align() != 0 {
            return Err(PlayError::Config(
                "buffer_size must be a positive multiple of the frame size",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlayError<E: fmt::Debug> {
    #[error("invalid player config: {0}")]
    Config(&'static str),

    #[error("stream error: {0:?}")]
    Stream(ReadExactError<E>),

    #[error(transparent)]
    Device(#[from] WaveOutError),
}

/// Outcome of `Player::play_chunk`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    /// A buffer of this many bytes was queued
    Queued(usize),
    /// Every buffer is still queued on the device; nothing was read
    Full,
}

pub struct Player<R, D: WaveOut> {
    stream: R,
    device: D,
    hwo: Option<HWaveOut>,
    headers: Vec<WaveHeader>,
    /// Filled buffer the device hasn't accepted yet
    pending: Option<usize>,
    queued_bytes: u64,
}

impl<R: Read, D: WaveOut> Player<R, D> {
    /// Open the output device and allocate the hardware buffers
    ///
    /// # Errors
    /// Config errors, or the device error of `waveOutOpen`.
    pub fn open(
        stream: R,
        mut device: D,
        config: &PlayerConfig,
    ) -> Result<Self, PlayError<R::Error>> {
        config.validate::<R::Error>()?;

        let device_id = select_device(&device.device_caps(), config.device_filter.as_deref());
        let hwo = device.open(device_id, &config.format)?;
        info!(?device_id, format = ?config.format, "waveout device opened");

        let headers = (0..config.buffer_count)
            .map(|id| WaveHeader::new(id, config.buffer_size))
            .collect();

        Ok(Self {
            stream,
            device,
            hwo: Some(hwo),
            headers,
            pending: None,
            queued_bytes: 0,
        })
    }

    /// Fill one free hardware buffer from the stream and queue it
    ///
    /// Suspends until the stream has delivered a whole buffer. Returns
    /// `Submit::Full` without touching the stream if the device still holds
    /// every buffer.
    ///
    /// A buffer that was filled but not queued because the device failed
    /// stays pending: the next call submits it again without reading.
    ///
    /// # Errors
    /// Stream errors, or the device error of the failing call.
    pub async fn play_chunk(&mut self) -> Result<Submit, PlayError<R::Error>> {
        let hwo = self.handle(op::WRITE)?;

        let index = match self.pending {
            Some(index) => {
                debug!(buffer = index, "resubmitting pending buffer");
                index
            }
            None => {
                for header in &mut self.headers {
                    self.device.refresh_header(hwo, header)?;
                }
                let Some(index) = self.headers.iter().position(|h| !h.in_queue()) else {
                    trace!(buffer_count = self.headers.len(), "all buffers queued");
                    return Ok(Submit::Full);
                };

                // index comes from position() over the same vector
                #[allow(clippy::indexing_slicing)]
                let header = &mut self.headers[index];
                self.stream
                    .read_exact(&mut header.data)
                    .await
                    .map_err(PlayError::Stream)?;
                self.pending = Some(index);
                index
            }
        };

        let n = self.submit(hwo, index)?;
        self.pending = None;
        self.queued_bytes += n as u64;
        Ok(Submit::Queued(n))
    }
}

impl<R, D: WaveOut> Player<R, D> {
    /// Prepare (once) and queue a filled buffer
    fn submit(&mut self, hwo: HWaveOut, index: usize) -> Result<usize, WaveOutError> {
        let Some(header) = self.headers.get_mut(index) else {
            return Err(WaveOutError::result(op::WRITE, MmResult::INVALHANDLE));
        };
        if !header.is_prepared() {
            self.device.prepare_header(hwo, header)?;
            debug!(buffer = header.id(), "buffer prepared");
        }
        self.device.write(hwo, header)?;

        let n = header.data.len();
        trace!(buffer = header.id(), bytes = n, "buffer queued");
        Ok(n)
    }

    fn handle(&self, op: &'static str) -> Result<HWaveOut, WaveOutError> {
        self.hwo.ok_or(WaveOutError::result(op, MmResult::INVALHANDLE))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.hwo.is_some()
    }

    /// Total bytes handed to the device so far
    #[must_use]
    pub fn queued_bytes(&self) -> u64 {
        self.queued_bytes
    }

    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Close the device
    ///
    /// Can be called multiple times; only the first call reaches the device.
    /// A device that is still playing closes successfully.
    ///
    /// # Errors
    /// The device error of `waveOutClose`.
    pub fn close(&mut self) -> Result<(), WaveOutError> {
        let Some(hwo) = self.hwo.take() else {
            return Ok(());
        };
        self.device.close(hwo)?;
        if let Some(index) = self.pending.take() {
            warn!(buffer = index, "pending buffer dropped on close");
        }
        info!(bytes = self.queued_bytes, "waveout device closed");
        Ok(())
    }
}

impl<R, D: WaveOut> fmt::Debug for Player<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queued = self.headers.iter().filter(|h| h.in_queue()).count();
        write!(
            f,
            "Player(hwo={:?}, buffers={}, queued={}, pending={:?}, bytes={})",
            self.hwo,
            self.headers.len(),
            queued,
            self.pending,
            self.queued_bytes
        )
    }
}

impl<R, D: WaveOut> Drop for Player<R, D> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Player::drop: {e}");
        }
    }
}
