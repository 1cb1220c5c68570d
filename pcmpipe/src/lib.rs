pub mod pipe;
pub mod signal;

// Re-export pipe types for convenience
pub use pipe::{pipe, pipe_with_config, PipeConfig, Reader, Writer, PIPE_BUF_SIZE};

pub use signal::Signal;
