pub mod config;
pub mod play;
pub mod tone;

pub use config::Config;
pub use play::play;
