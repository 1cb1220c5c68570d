//! Sine tone as little-endian integer PCM

use std::f64::consts::TAU;

use crate::config::Config;

/// Render the configured tone
///
/// Every channel carries the same sample. 8-bit PCM is unsigned, the other
/// depths are signed; 24-bit samples are packed into three bytes.
#[must_use]
pub fn render(config: &Config) -> Vec<u8> {
    let format = config.format();
    let frames = u64::from(format.sample_rate) * u64::from(config.duration_ms) / 1000;
    let amplitude = config.amplitude.clamp(0.0, 1.0);
    let rate = f64::from(format.sample_rate);

    let mut pcm = Vec::new();
    for frame in 0..frames {
        #[allow(clippy::cast_precision_loss)]
        let t = frame as f64 / rate;
        let sample = amplitude * (TAU * config.frequency * t).sin();
        for _ in 0..format.channels {
            encode_sample(sample, format.bits_per_sample, &mut pcm);
        }
    }
    pcm
}

#[allow(clippy::cast_possible_truncation)]
fn encode_sample(sample: f64, bits_per_sample: u16, out: &mut Vec<u8>) {
    match bits_per_sample {
        8 => {
            let value = 128.0 + (sample * 127.0).round();
            #[allow(clippy::cast_sign_loss)]
            out.push(value as u8);
        }
        16 => {
            let value = (sample * f64::from(i16::MAX)).round() as i16;
            out.extend_from_slice(&value.to_le_bytes());
        }
        24 => {
            let value = (sample * 8_388_607.0).round() as i32;
            let [low, mid, high, _] = value.to_le_bytes();
            out.extend_from_slice(&[low, mid, high]);
        }
        _ => {
            let value = (sample * f64::from(i32::MAX)).round() as i32;
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Pad `pcm` with silence up to a multiple of `size`
pub fn pad_to_multiple(pcm: &mut Vec<u8>, size: usize, bits_per_sample: u16) {
    if size == 0 {
        return;
    }
    let silence = if bits_per_sample == 8 { 0x80 } else { 0 };
    let rem = pcm.len() % size;
    if rem != 0 {
        pcm.resize(pcm.len() + size - rem, silence);
    }
}
