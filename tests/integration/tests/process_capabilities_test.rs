//! Capabilities installed for the whole process before any engine exists
//!
//! Kept in its own test binary: the first reader fixes the capabilities.

use anyhow::Result;
use mediacore::media::{DecoderCapabilities, MediaDecodingConfiguration, VideoConfiguration};
use mediacore::utils::CapabilitiesConfig;
use mediacore::{Config, HeadlessMediaPlayer, MediaPlayer};
use mediacore_integration_tests::streams;

fn query(content_type: &str) -> MediaDecodingConfiguration {
    MediaDecodingConfiguration {
        video: VideoConfiguration {
            content_type: content_type.to_string(),
            width: 1280,
            height: 720,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_installed_capabilities_apply_to_every_engine() -> Result<()> {
    let mut vp9_only = CapabilitiesConfig::default();
    vp9_only.codecs = vec!["vp9".to_string()];
    assert!(DecoderCapabilities::init(vp9_only));
    assert!(!DecoderCapabilities::init(CapabilitiesConfig::default()));

    // An engine's own config cannot widen what the process decodes.
    let default_engine = HeadlessMediaPlayer::new(&Config::default());
    let mut config = Config::default();
    config.capabilities.codecs.push("avc1".to_string());
    let other_engine = HeadlessMediaPlayer::new(&config);

    for engine in [&default_engine, &other_engine] {
        assert!(!engine.decoding_info(&query("video/mp4; codecs=\"avc1.42E01E\"")).supported);
        assert!(engine.decoding_info(&query("video/webm; codecs=\"vp9\"")).supported);
    }

    assert!(default_engine.attach_mse());
    assert!(!default_engine.add_mse_buffer("video/mp4; codecs=\"avc1.640028\"", true, streams::video(30, 1)));

    Ok(())
}
