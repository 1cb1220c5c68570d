pub mod device;

pub use device::MockWaveOut;
