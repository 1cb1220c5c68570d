//! Wave-out driver errors
//!
//! Every native call reports two things: an OS error (errno) and a driver
//! result code (`MMRESULT`). `WaveOutError` keeps whichever one failed,
//! together with the name of the call, and never folds them into a
//! generic error.

use std::fmt;

/// Driver result code as returned by the wave-out calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MmResult(pub u32);

impl MmResult {
    pub const NOERROR: Self = Self(0);
    pub const ERROR: Self = Self(1);
    pub const BADDEVICEID: Self = Self(2);
    pub const ALLOCATED: Self = Self(4);
    pub const INVALHANDLE: Self = Self(5);
    pub const NODRIVER: Self = Self(6);
    pub const NOMEM: Self = Self(7);
    pub const BADFORMAT: Self = Self(32);
    pub const STILLPLAYING: Self = Self(33);
    pub const UNPREPARED: Self = Self(34);
    pub const SYNC: Self = Self(35);

    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::NOERROR
    }

    /// Classify the code
    ///
    /// Generic codes, `ERROR` among them, are `ErrorKind::Other`.
    #[must_use]
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::BADDEVICEID => ErrorKind::BadDeviceId,
            Self::ALLOCATED => ErrorKind::Allocated,
            Self::INVALHANDLE => ErrorKind::InvalidHandle,
            Self::NODRIVER => ErrorKind::NoDriver,
            Self::NOMEM => ErrorKind::OutOfMemory,
            Self::BADFORMAT => ErrorKind::BadFormat,
            Self::STILLPLAYING => ErrorKind::StillPlaying,
            Self::UNPREPARED => ErrorKind::Unprepared,
            Self::SYNC => ErrorKind::Sync,
            _ => ErrorKind::Other(self.0),
        }
    }
}

impl fmt::Display for MmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NOERROR => "MMSYSERR_NOERROR",
            Self::ERROR => "MMSYSERR_ERROR",
            Self::BADDEVICEID => "MMSYSERR_BADDEVICEID",
            Self::ALLOCATED => "MMSYSERR_ALLOCATED",
            Self::INVALHANDLE => "MMSYSERR_INVALHANDLE",
            Self::NODRIVER => "MMSYSERR_NODRIVER",
            Self::NOMEM => "MMSYSERR_NOMEM",
            Self::BADFORMAT => "WAVERR_BADFORMAT",
            Self::STILLPLAYING => "WAVERR_STILLPLAYING",
            Self::UNPREPARED => "WAVERR_UNPREPARED",
            Self::SYNC => "WAVERR_SYNC",
            Self(code) => return write!(f, "MMRESULT ({code})"),
        };
        f.write_str(name)
    }
}

/// What went wrong, independent of how the driver reported it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoDriver,
    /// The device is busy, already opened by someone
    Allocated,
    BadDeviceId,
    InvalidHandle,
    OutOfMemory,
    BadFormat,
    /// Buffers are still queued; harmless when closing
    StillPlaying,
    Unprepared,
    Sync,
    /// Generic OS failure with its errno
    Os(u32),
    /// Any other driver result code
    Other(u32),
}

/// How the failing call reported the error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cause {
    Errno(u32),
    Result(MmResult),
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Errno(errno) => write!(f, "Errno: {errno}"),
            Cause::Result(result) => write!(f, "{result}"),
        }
    }
}

/// A failed wave-out call
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("waveout error at {op}: {cause}")]
pub struct WaveOutError {
    op: &'static str,
    cause: Cause,
}

impl WaveOutError {
    #[must_use]
    pub fn errno(op: &'static str, errno: u32) -> Self {
        Self {
            op,
            cause: Cause::Errno(errno),
        }
    }

    #[must_use]
    pub fn result(op: &'static str, result: MmResult) -> Self {
        Self {
            op,
            cause: Cause::Result(result),
        }
    }

    #[must_use]
    pub fn new(op: &'static str, cause: Cause) -> Self {
        Self { op, cause }
    }

    /// Name of the call that failed
    #[must_use]
    pub fn op(&self) -> &'static str {
        self.op
    }

    #[must_use]
    pub fn cause(&self) -> Cause {
        self.cause
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.cause {
            Cause::Errno(errno) => ErrorKind::Os(errno),
            Cause::Result(result) => result.kind(),
        }
    }

    /// Transient device state: retrying or ignoring is reasonable
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::StillPlaying | ErrorKind::Sync)
    }
}

impl embedded_io::Error for WaveOutError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match WaveOutError::kind(self) {
            ErrorKind::NoDriver | ErrorKind::BadDeviceId => embedded_io::ErrorKind::NotFound,
            ErrorKind::Allocated => embedded_io::ErrorKind::AddrInUse,
            ErrorKind::InvalidHandle | ErrorKind::BadFormat | ErrorKind::Unprepared => {
                embedded_io::ErrorKind::InvalidInput
            }
            ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            ErrorKind::StillPlaying | ErrorKind::Sync | ErrorKind::Os(_) | ErrorKind::Other(_) => {
                embedded_io::ErrorKind::Other
            }
        }
    }
}

/// Convert the raw outcome of a native call
///
/// A nonzero errno wins over the driver result.
///
/// # Errors
/// Returns the error of the call, tagged with `op`.
pub fn check(op: &'static str, errno: u32, result: MmResult) -> Result<(), WaveOutError> {
    if errno != 0 {
        return Err(WaveOutError::errno(op, errno));
    }
    if !result.is_ok() {
        return Err(WaveOutError::result(op, result));
    }
    Ok(())
}

/// Like `check`, for closing a device: "still playing" counts as success
///
/// # Errors
/// Returns the error of the call, tagged with `op`.
pub fn check_close(op: &'static str, errno: u32, result: MmResult) -> Result<(), WaveOutError> {
    if errno == 0 && result == MmResult::STILLPLAYING {
        log::debug!("{op}: ignoring {result}");
        return Ok(());
    }
    check(op, errno, result)
}
