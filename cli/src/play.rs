//! Tone playback through the pipe
//!
//! The tone is written into a `pcmpipe` pipe by one future while a
//! `Player` drains the other end into the device. Both run in the calling
//! task.

use std::convert::Infallible;

use pcmpipe::pipe_with_config;
use tracing::{debug, info};
use waveout::{PlayError, Player, Submit, WaveOut};

use crate::config::Config;
use crate::tone;

/// Frames handed to the pipe per write
pub const FRAMES_PER_WRITE: usize = 256;

/// Play the configured tone on `device`
///
/// `on_full` runs whenever every hardware buffer is queued, before the
/// player yields to the producer. Returns the number of bytes played.
///
/// # Errors
/// Config errors, or the device error of the failing call.
pub async fn play<D: WaveOut>(
    config: &Config,
    device: D,
    mut on_full: impl FnMut(),
) -> Result<u64, PlayError<Infallible>> {
    let (reader, mut writer) = pipe_with_config(&config.pipe_config());
    let mut player = Player::open(reader, device, &config.player_config())?;

    let mut pcm = tone::render(config);
    tone::pad_to_multiple(&mut pcm, config.buffer_size, config.bits_per_sample);
    let total = pcm.len() as u64;
    let chunk_size = FRAMES_PER_WRITE * config.format().block_align();
    debug!(total, chunk_size, "tone rendered");

    let producer = async {
        for chunk in pcm.chunks(chunk_size) {
            writer.write(chunk).await;
        }
        writer.close();
        Ok::<(), PlayError<Infallible>>(())
    };
    let consumer = async {
        while player.queued_bytes() < total {
            if player.play_chunk().await? == Submit::Full {
                on_full();
                tokio::task::yield_now().await;
            }
        }
        Ok::<(), PlayError<Infallible>>(())
    };
    tokio::try_join!(producer, consumer)?;

    player.close()?;
    let played = player.queued_bytes();
    info!(bytes = played, "playback finished");
    Ok(played)
}
