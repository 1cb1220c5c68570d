use serde::Deserialize;
use std::io::Read;

use pcmpipe::{PipeConfig, PIPE_BUF_SIZE};
use waveout::{PlayerConfig, WaveFormat};

/// Settings of a `pcmplay` run
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tone frequency in Hz
    pub frequency: f64,
    /// Peak level, 0.0 to 1.0
    pub amplitude: f64,
    pub duration_ms: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Substring of the output device name
    pub device: Option<String>,
    /// Hardware buffer size in bytes
    pub buffer_size: usize,
    pub buffer_count: usize,
    pub pipe_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        let format = WaveFormat::default();
        let player = PlayerConfig::default();
        Self {
            frequency: 440.0,
            amplitude: 0.5,
            duration_ms: 1000,
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            device: None,
            buffer_size: player.buffer_size,
            buffer_count: player.buffer_count,
            pipe_threshold: PIPE_BUF_SIZE,
        }
    }
}

impl Config {
    /// Read the config from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The JSON input is invalid or malformed
    /// - A field is unknown or has the wrong type
    /// - There are I/O errors reading from the provided reader
    pub fn from_reader(reader: impl Read) -> Result<Config, String> {
        let mut de = serde_json::Deserializer::from_reader(reader);
        let config =
            Config::deserialize(&mut de).map_err(|e| format!("Failed to parse config: {e}"))?;
        de.end()
            .map_err(|e| format!("Trailing data after config: {e}"))?;
        Ok(config)
    }

    #[must_use]
    pub fn format(&self) -> WaveFormat {
        WaveFormat {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
        }
    }

    #[must_use]
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            device_filter: self.device.clone(),
            format: self.format(),
            buffer_size: self.buffer_size,
            buffer_count: self.buffer_count,
        }
    }

    #[must_use]
    pub fn pipe_config(&self) -> PipeConfig {
        PipeConfig {
            threshold: self.pipe_threshold,
        }
    }
}
