//! Formats, devices and hardware buffers

use crate::error::{MmResult, WaveOutError};

/// PCM sample format of an output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WaveFormat {
    /// Bytes per frame (one sample for every channel)
    #[must_use]
    pub fn block_align(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bits_per_sample / 8)
    }

    #[must_use]
    pub fn avg_bytes_per_sec(&self) -> u64 {
        u64::from(self.sample_rate) * self.block_align() as u64
    }

    /// Check that the format is plain integer PCM the driver can take
    ///
    /// # Errors
    /// `BADFORMAT` tagged with `op`.
    pub fn validate(&self, op: &'static str) -> Result<(), WaveOutError> {
        let bits_ok = matches!(self.bits_per_sample, 8 | 16 | 24 | 32);
        if self.channels == 0 || self.sample_rate == 0 || !bits_ok {
            return Err(WaveOutError::result(op, MmResult::BADFORMAT));
        }
        Ok(())
    }
}

impl Default for WaveFormat {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        }
    }
}

/// Output device description, as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCaps {
    /// Human-readable name; drivers may pad it with NULs
    pub name: String,
    pub channels: u16,
}

impl DeviceCaps {
    #[must_use]
    pub fn new(name: &str, channels: u16) -> Self {
        Self {
            name: name.to_string(),
            channels,
        }
    }

    /// Name without the trailing NUL padding
    #[must_use]
    pub fn trimmed_name(&self) -> &str {
        self.name.trim_end_matches('\0')
    }
}

/// Which device to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceId {
    /// Let the driver pick the system default
    Mapper,
    Index(u32),
}

/// Pick the first device whose name contains `filter`
///
/// Falls back to `DeviceId::Mapper` without a filter or without a match.
#[must_use]
pub fn select_device(devices: &[DeviceCaps], filter: Option<&str>) -> DeviceId {
    let Some(filter) = filter else {
        return DeviceId::Mapper;
    };

    devices
        .iter()
        .position(|caps| caps.trimmed_name().contains(filter))
        .and_then(|index| u32::try_from(index).ok())
        .map_or_else(
            || {
                log::debug!("no output device matches {filter:?}, using the mapper");
                DeviceId::Mapper
            },
            DeviceId::Index,
        )
}

/// Handle of an opened output device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HWaveOut(pub u64);

/// The driver is done with the buffer
pub const WHDR_DONE: u32 = 0x01;
/// The buffer is prepared for the device
pub const WHDR_PREPARED: u32 = 0x02;
/// The buffer is queued for playback
pub const WHDR_INQUEUE: u32 = 0x10;

/// A hardware buffer submitted to the device
///
/// The data length is fixed at creation; the flags are owned by the
/// driver once the buffer is prepared.
#[derive(Debug, Clone)]
pub struct WaveHeader {
    id: usize,
    pub data: Vec<u8>,
    pub flags: u32,
}

impl WaveHeader {
    #[must_use]
    pub fn new(id: usize, size: usize) -> Self {
        Self {
            id,
            data: vec![0; size],
            flags: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.flags & WHDR_PREPARED != 0
    }

    #[must_use]
    pub fn in_queue(&self) -> bool {
        self.flags & WHDR_INQUEUE != 0
    }
}
