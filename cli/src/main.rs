use std::fs::File;

use cli::{play, Config};
use tracing::info;
use waveout::{install_backend, SharedBackend};
use waveout_mocked::MockWaveOut;

const MOCK_DEVICES: &[&str] = &["Mock Speakers", "Mock Headphones"];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_reader(File::open(&path)?)?,
        None => Config::default(),
    };
    info!(?config, "pcmplay");

    // No native driver binding yet; play into the in-memory device
    let mock = MockWaveOut::with_devices(MOCK_DEVICES);
    install_backend(Box::new(mock.clone()));

    let played = play(&config, SharedBackend, || mock.complete_all()).await?;
    info!(
        bytes = played,
        submitted = mock.submitted_count(),
        "done"
    );
    Ok(())
}
