#[macro_use]
extern crate hamcrest;
use cli::{play, tone, Config};
use hamcrest::prelude::*;
use waveout::{DeviceId, ErrorKind, PlayError};
use waveout_mocked::MockWaveOut;

fn short_tone() -> Config {
    Config {
        duration_ms: 50,
        sample_rate: 8000,
        buffer_size: 256,
        buffer_count: 3,
        pipe_threshold: 512,
        ..Config::default()
    }
}

#[tokio::test]
async fn plays_the_whole_tone() {
    let config = short_tone();
    let mock = MockWaveOut::with_devices(&["Speakers"]);

    let played = play(&config, mock.clone(), || mock.complete_all())
        .await
        .unwrap();

    let mut expected = tone::render(&config);
    tone::pad_to_multiple(&mut expected, config.buffer_size, config.bits_per_sample);

    // 400 frames of 4 bytes, padded to seven 256-byte buffers
    assert_that!(played, equal_to(1792));
    assert_that!(mock.played(), equal_to(expected));
    assert_that!(mock.submitted_count(), equal_to(7));
    assert_that!(mock.prepared_count(), equal_to(3));
    assert_that!(mock.is_open(), equal_to(false));
}

#[tokio::test]
async fn opens_the_filtered_device() {
    let config = Config {
        device: Some("Headphones".to_string()),
        bits_per_sample: 8,
        channels: 1,
        ..short_tone()
    };
    let mock = MockWaveOut::with_devices(&["Speakers", "Headphones"]);

    play(&config, mock.clone(), || mock.complete_all())
        .await
        .unwrap();

    let (device, format) = mock.opened_with().unwrap();
    assert_that!(device, equal_to(DeviceId::Index(1)));
    assert_that!(format, equal_to(config.format()));
}

#[tokio::test]
async fn bad_format_fails_before_playing() {
    let config = Config {
        bits_per_sample: 12,
        ..short_tone()
    };
    let mock = MockWaveOut::with_devices(&["Speakers"]);

    let result = play(&config, mock.clone(), || mock.complete_all()).await;

    let Err(PlayError::Device(err)) = result else {
        panic!("expected a device error");
    };
    assert_that!(err.kind(), equal_to(ErrorKind::BadFormat));
    assert_that!(mock.played_len(), equal_to(0));
}

#[tokio::test]
async fn empty_tone_plays_nothing() {
    let config = Config {
        duration_ms: 0,
        ..short_tone()
    };
    let mock = MockWaveOut::with_devices(&["Speakers"]);

    let played = play(&config, mock.clone(), || mock.complete_all())
        .await
        .unwrap();

    assert_that!(played, equal_to(0));
    assert_that!(mock.submitted_count(), equal_to(0));
}
