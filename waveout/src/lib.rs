pub mod backend;
pub mod error;
pub mod format;
pub mod player;

pub use backend::{install_backend, op, uninstall_backend, with_backend, SharedBackend, WaveOut};
pub use error::{check, check_close, Cause, ErrorKind, MmResult, WaveOutError};
pub use format::{
    select_device, DeviceCaps, DeviceId, HWaveOut, WaveFormat, WaveHeader, WHDR_DONE,
    WHDR_INQUEUE, WHDR_PREPARED,
};
pub use player::{PlayError, Player, PlayerConfig, Submit};
