//! In-memory wave-out device.
//!
//! - `with_devices` lists the device names the driver reports.
//! - `fail_next` makes the next call of one operation fail with a cause.
//! - `complete_all` finishes playback of every queued buffer.
//! - `played` returns every byte queued so far, in queue order.
//!
//! `open`:
//! - `ALLOCATED` if a device is already open.
//! - `BADDEVICEID` for an index past the device list.
//! - `NODRIVER` for the mapper when there are no devices.
//! - `BADFORMAT` for a format the driver can't take.
//!
//! `prepare_header`, `write`, `refresh_header`, `close`:
//! - `INVALHANDLE` for a handle other than the open one.
//! - `write` returns `UNPREPARED` for a buffer that wasn't prepared.
//! - `close` reports `STILLPLAYING` while buffers are queued, which counts
//!   as a successful close.
//!
//! Clones share the device, so a test can keep one clone for inspection
//! while the player owns another.
use std::sync::Arc;

use parking_lot::Mutex;
use waveout::{
    check, check_close, op, Cause, DeviceCaps, DeviceId, HWaveOut, MmResult, WaveFormat,
    WaveHeader, WaveOut, WaveOutError, WHDR_DONE, WHDR_INQUEUE, WHDR_PREPARED,
};

#[derive(Debug)]
struct Opened {
    hwo: HWaveOut,
    device: DeviceId,
    format: WaveFormat,
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<DeviceCaps>,
    next_handle: u64,
    opened: Option<Opened>,
    last_opened: Option<(DeviceId, WaveFormat)>,
    prepared: usize,
    submitted: usize,
    queued: Vec<usize>,
    played: Vec<u8>,
    faults: Vec<(&'static str, Cause)>,
}

impl MockState {
    fn take_fault(&mut self, op: &'static str) -> Option<Cause> {
        let pos = self.faults.iter().position(|(fault_op, _)| *fault_op == op)?;
        let (_, cause) = self.faults.remove(pos);
        log::debug!("mock waveout: injecting {cause} into {op}");
        Some(cause)
    }

    fn injected(&mut self, op: &'static str) -> Result<(), WaveOutError> {
        match self.take_fault(op) {
            Some(Cause::Errno(errno)) => check(op, errno, MmResult::NOERROR),
            Some(Cause::Result(result)) => check(op, 0, result),
            None => Ok(()),
        }
    }

    fn check_handle(&self, op: &'static str, hwo: HWaveOut) -> Result<(), WaveOutError> {
        match &self.opened {
            Some(opened) if opened.hwo == hwo => Ok(()),
            _ => check(op, 0, MmResult::INVALHANDLE),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockWaveOut {
    state: Arc<Mutex<MockState>>,
}

impl MockWaveOut {
    /// Device without any output devices; only the mapper fails
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_devices(names: &[&str]) -> Self {
        let mock = Self::new();
        mock.state.lock().devices = names.iter().map(|name| DeviceCaps::new(name, 2)).collect();
        mock
    }

    /// Make the next call of `op` fail with `cause`
    ///
    /// Faults for the same operation are used up in the order they were
    /// added.
    pub fn fail_next(&self, op: &'static str, cause: Cause) {
        self.state.lock().faults.push((op, cause));
    }

    /// Finish playback of every queued buffer
    ///
    /// The buffers show up as done on their next `refresh_header`.
    pub fn complete_all(&self) {
        let mut state = self.state.lock();
        log::trace!("mock waveout: completing {} buffers", state.queued.len());
        state.queued.clear();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().opened.is_some()
    }

    /// Device and format of the most recent successful `open`
    #[must_use]
    pub fn opened_with(&self) -> Option<(DeviceId, WaveFormat)> {
        self.state.lock().last_opened
    }

    #[must_use]
    pub fn played(&self) -> Vec<u8> {
        self.state.lock().played.clone()
    }

    #[must_use]
    pub fn played_len(&self) -> usize {
        self.state.lock().played.len()
    }

    /// Number of `prepare_header` calls that succeeded
    #[must_use]
    pub fn prepared_count(&self) -> usize {
        self.state.lock().prepared
    }

    /// Number of `write` calls that succeeded
    #[must_use]
    pub fn submitted_count(&self) -> usize {
        self.state.lock().submitted
    }

    /// Number of buffers the device is still playing
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.state.lock().queued.len()
    }
}

impl WaveOut for MockWaveOut {
    fn device_caps(&self) -> Vec<DeviceCaps> {
        self.state.lock().devices.clone()
    }

    fn open(&mut self, device: DeviceId, format: &WaveFormat) -> Result<HWaveOut, WaveOutError> {
        let mut state = self.state.lock();
        state.injected(op::OPEN)?;

        if state.opened.is_some() {
            return Err(WaveOutError::result(op::OPEN, MmResult::ALLOCATED));
        }
        match device {
            DeviceId::Mapper if state.devices.is_empty() => {
                return Err(WaveOutError::result(op::OPEN, MmResult::NODRIVER));
            }
            DeviceId::Index(index)
                if usize::try_from(index).map_or(true, |i| i >= state.devices.len()) =>
            {
                return Err(WaveOutError::result(op::OPEN, MmResult::BADDEVICEID));
            }
            _ => {}
        }
        format.validate(op::OPEN)?;

        state.next_handle += 1;
        let hwo = HWaveOut(state.next_handle);
        state.opened = Some(Opened {
            hwo,
            device,
            format: *format,
        });
        state.last_opened = Some((device, *format));
        Ok(hwo)
    }

    fn prepare_header(
        &mut self,
        hwo: HWaveOut,
        header: &mut WaveHeader,
    ) -> Result<(), WaveOutError> {
        let mut state = self.state.lock();
        state.injected(op::PREPARE_HEADER)?;
        state.check_handle(op::PREPARE_HEADER, hwo)?;

        header.flags = (header.flags | WHDR_PREPARED) & !WHDR_DONE;
        state.prepared += 1;
        Ok(())
    }

    fn write(&mut self, hwo: HWaveOut, header: &mut WaveHeader) -> Result<(), WaveOutError> {
        let mut state = self.state.lock();
        state.injected(op::WRITE)?;
        state.check_handle(op::WRITE, hwo)?;
        if !header.is_prepared() {
            return Err(WaveOutError::result(op::WRITE, MmResult::UNPREPARED));
        }

        header.flags = (header.flags | WHDR_INQUEUE) & !WHDR_DONE;
        state.queued.push(header.id());
        state.played.extend_from_slice(&header.data);
        state.submitted += 1;
        Ok(())
    }

    fn refresh_header(
        &mut self,
        hwo: HWaveOut,
        header: &mut WaveHeader,
    ) -> Result<(), WaveOutError> {
        let state = self.state.lock();
        state.check_handle(op::REFRESH_HEADER, hwo)?;
        if header.in_queue() && !state.queued.contains(&header.id()) {
            header.flags = (header.flags & !WHDR_INQUEUE) | WHDR_DONE;
        }
        Ok(())
    }

    fn close(&mut self, hwo: HWaveOut) -> Result<(), WaveOutError> {
        let mut state = self.state.lock();
        match state.take_fault(op::CLOSE) {
            Some(Cause::Errno(errno)) => check_close(op::CLOSE, errno, MmResult::NOERROR)?,
            Some(Cause::Result(result)) => check_close(op::CLOSE, 0, result)?,
            None => {}
        }
        state.check_handle(op::CLOSE, hwo)?;

        let result = if state.queued.is_empty() {
            MmResult::NOERROR
        } else {
            MmResult::STILLPLAYING
        };
        check_close(op::CLOSE, 0, result)?;

        if let Some(opened) = state.opened.take() {
            log::trace!(
                "mock waveout: closed {:?} on {:?} ({:?})",
                opened.hwo,
                opened.device,
                opened.format
            );
        }
        state.queued.clear();
        Ok(())
    }
}
