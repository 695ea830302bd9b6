//! Process-wide engine selection for capability queries
//!
//! Every test here touches the global registry, so they run serially.

use anyhow::Result;
use mediacore::media::{MediaCapabilitiesInfo, MediaDecodingConfiguration, VideoConfiguration};
use mediacore::player::{media_player_for_support_checks, set_media_player_for_support_checks, MediaPlayer, SupportChecks};
use mediacore::{Config, HeadlessMediaPlayer};
use serial_test::serial;
use std::sync::Arc;

fn query(content_type: &str) -> MediaDecodingConfiguration {
    MediaDecodingConfiguration {
        video: VideoConfiguration {
            content_type: content_type.to_string(),
            width: 1280,
            height: 720,
            framerate: 30.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_no_engine_is_unsupported() -> Result<()> {
    set_media_player_for_support_checks(None);
    let registry = SupportChecks::global();

    if registry.current().is_none() {
        assert_eq!(
            registry.decoding_info(&query("video/mp4; codecs=\"avc1.42E01E\"")),
            MediaCapabilitiesInfo::unsupported()
        );
    }

    Ok(())
}

#[test]
#[serial]
fn test_registered_engine_answers() -> Result<()> {
    let engine: Arc<dyn MediaPlayer> = Arc::new(HeadlessMediaPlayer::default());
    let registry = SupportChecks::global();
    registry.register(&engine);

    let info = registry.decoding_info(&query("video/mp4; codecs=\"avc1.42E01E\""));
    assert!(info.supported && info.smooth && info.power_efficient);
    assert!(!registry.decoding_info(&query("video/x-flv")).supported);

    registry.unregister(&*engine);
    Ok(())
}

#[test]
#[serial]
fn test_chosen_engine_takes_priority() -> Result<()> {
    let mut config = Config::default();
    config.capabilities.supports_src = false;
    let registered: Arc<dyn MediaPlayer> = Arc::new(HeadlessMediaPlayer::default());
    let chosen: Arc<dyn MediaPlayer> = Arc::new(HeadlessMediaPlayer::new(&config));

    SupportChecks::global().register(&registered);
    set_media_player_for_support_checks(Some(&chosen));

    let current = media_player_for_support_checks().expect("chosen engine");
    assert!(std::ptr::addr_eq(Arc::as_ptr(&current), Arc::as_ptr(&chosen)));
    let from_chosen = SupportChecks::global().decoding_info(&query("video/mp4; codecs=\"avc1.42E01E\""));

    // Once the choice is gone, the registered engine answers, and agrees.
    drop(current);
    drop(chosen);
    assert!(media_player_for_support_checks().is_none());
    let fallback = SupportChecks::global().current().expect("registered engine");
    assert!(std::ptr::addr_eq(Arc::as_ptr(&fallback), Arc::as_ptr(&registered)));
    assert_eq!(
        SupportChecks::global().decoding_info(&query("video/mp4; codecs=\"avc1.42E01E\"")),
        from_chosen
    );

    drop(fallback);
    SupportChecks::global().unregister(&*registered);
    set_media_player_for_support_checks(None);
    Ok(())
}
