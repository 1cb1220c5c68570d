//! Wave-out backend interface
//!
//! `WaveOut` is the seam between the player and a concrete driver binding.
//! A native binding implements it on top of the platform calls; tests and
//! the CLI use the in-memory one from `waveout_mocked`.
//!
//! # Process-wide backend
//!
//! Driver entry points are bound once per process and never torn down.
//! `install_backend` puts a backend into that process-wide slot, and
//! `SharedBackend` forwards every call to it. Nothing is installed until the
//! first `install_backend`; calls before that fail with `NODRIVER`.

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::error::{MmResult, WaveOutError};
use crate::format::{DeviceCaps, DeviceId, HWaveOut, WaveFormat, WaveHeader};

/// Names of the native calls, used to tag errors
pub mod op {
    pub const OPEN: &str = "waveOutOpen";
    pub const CLOSE: &str = "waveOutClose";
    pub const PREPARE_HEADER: &str = "waveOutPrepareHeader";
    pub const WRITE: &str = "waveOutWrite";
    /// Reading back a header's flags; not a native call of its own
    pub const REFRESH_HEADER: &str = "refreshHeader";
}

/// Trait for wave-out driver operations.
pub trait WaveOut {
    /// List the output devices, in driver order
    fn device_caps(&self) -> Vec<DeviceCaps>;

    /// Open a device for the given format
    ///
    /// # Errors
    /// `NODRIVER`, `ALLOCATED`, `BADDEVICEID`, `BADFORMAT`, `NOMEM`, or an
    /// OS error; tagged `waveOutOpen`.
    fn open(&mut self, device: DeviceId, format: &WaveFormat) -> Result<HWaveOut, WaveOutError>;

    /// Prepare a buffer for playback (once per buffer)
    ///
    /// # Errors
    /// `INVALHANDLE`, `NOMEM`, or an OS error; tagged `waveOutPrepareHeader`.
    fn prepare_header(&mut self, hwo: HWaveOut, header: &mut WaveHeader)
        -> Result<(), WaveOutError>;

    /// Queue a prepared buffer for playback
    ///
    /// # Errors
    /// `INVALHANDLE`, `UNPREPARED`, or an OS error; tagged `waveOutWrite`.
    fn write(&mut self, hwo: HWaveOut, header: &mut WaveHeader) -> Result<(), WaveOutError>;

    /// Bring `header.flags` up to date with the device
    ///
    /// A native driver updates the flags in place, so the default does
    /// nothing.
    ///
    /// # Errors
    /// Backend specific; tagged `refreshHeader`.
    fn refresh_header(
        &mut self,
        _hwo: HWaveOut,
        _header: &mut WaveHeader,
    ) -> Result<(), WaveOutError> {
        Ok(())
    }

    /// Close the device
    ///
    /// A device that still plays queued buffers closes successfully.
    ///
    /// # Errors
    /// `INVALHANDLE` or an OS error; tagged `waveOutClose`.
    fn close(&mut self, hwo: HWaveOut) -> Result<(), WaveOutError>;
}

impl<T: WaveOut + ?Sized> WaveOut for Box<T> {
    fn device_caps(&self) -> Vec<DeviceCaps> {
        (**self).device_caps()
    }

    fn open(&mut self, device: DeviceId, format: &WaveFormat) -> Result<HWaveOut, WaveOutError> {
        (**self).open(device, format)
    }

    fn prepare_header(
        &mut self,
        hwo: HWaveOut,
        header: &mut WaveHeader,
    ) -> Result<(), WaveOutError> {
        (**self).prepare_header(hwo, header)
    }

    fn write(&mut self, hwo: HWaveOut, header: &mut WaveHeader) -> Result<(), WaveOutError> {
        (**self).write(hwo, header)
    }

    fn refresh_header(
        &mut self,
        hwo: HWaveOut,
        header: &mut WaveHeader,
    ) -> Result<(), WaveOutError> {
        (**self).refresh_header(hwo, header)
    }

    fn close(&mut self, hwo: HWaveOut) -> Result<(), WaveOutError> {
        (**self).close(hwo)
    }
}

type BoxedBackend = Box<dyn WaveOut + Send>;

lazy_static! {
    static ref BACKEND: Mutex<Option<BoxedBackend>> = Mutex::new(None);
}

/// Install the process-wide backend
///
/// Returns the previously installed one, if any.
pub fn install_backend(backend: BoxedBackend) -> Option<BoxedBackend> {
    let previous = BACKEND.lock().replace(backend);
    if previous.is_some() {
        log::warn!("waveout: replacing the installed backend");
    }
    previous
}

/// Remove the process-wide backend
pub fn uninstall_backend() -> Option<BoxedBackend> {
    BACKEND.lock().take()
}

/// Run `f` with the process-wide backend
///
/// # Errors
/// `NODRIVER` tagged with `op` if no backend is installed, otherwise
/// whatever `f` returns.
pub fn with_backend<T>(
    op: &'static str,
    f: impl FnOnce(&mut dyn WaveOut) -> Result<T, WaveOutError>,
) -> Result<T, WaveOutError> {
    let mut slot = BACKEND.lock();
    match slot.as_mut() {
        Some(backend) => f(&mut **backend),
        None => Err(WaveOutError::result(op, MmResult::NODRIVER)),
    }
}

/// `WaveOut` that forwards to the process-wide backend
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedBackend;

impl WaveOut for SharedBackend {
    fn device_caps(&self) -> Vec<DeviceCaps> {
        BACKEND
            .lock()
            .as_ref()
            .map(|backend| backend.device_caps())
            .unwrap_or_default()
    }

    fn open(&mut self, device: DeviceId, format: &WaveFormat) -> Result<HWaveOut, WaveOutError> {
        with_backend(op::OPEN, |backend| backend.open(device, format))
    }

    fn prepare_header(
        &mut self,
        hwo: HWaveOut,
        header: &mut WaveHeader,
    ) -> Result<(), WaveOutError> {
        with_backend(op::PREPARE_HEADER, |backend| {
            backend.prepare_header(hwo, header)
        })
    }

    fn write(&mut self, hwo: HWaveOut, header: &mut WaveHeader) -> Result<(), WaveOutError> {
        with_backend(op::WRITE, |backend| backend.write(hwo, header))
    }

    fn refresh_header(
        &mut self,
        hwo: HWaveOut,
        header: &mut WaveHeader,
    ) -> Result<(), WaveOutError> {
        with_backend(op::REFRESH_HEADER, |backend| {
            backend.refresh_header(hwo, header)
        })
    }

    fn close(&mut self, hwo: HWaveOut) -> Result<(), WaveOutError> {
        with_backend(op::CLOSE, |backend| backend.close(hwo))
    }
}
