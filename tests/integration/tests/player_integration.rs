//! Integration tests for the headless playback engine
//!
//! These tests drive complete sessions through the public contract:
//! - Attach, metadata and play/pause
//! - Buffering, seeking and end of content
//! - Encrypted content waiting for keys
//! - Detach and resource cleanup

use anyhow::Result;
use mediacore::media::{ElementaryStream, EmeImplementation, TextTrackKind, VttCue};
use mediacore::player::{MediaPlayer, VideoPlaybackState, VideoReadyState};
use mediacore::{Config, HeadlessMediaPlayer, PlayerFactory, ProxyMediaPlayer};
use mediacore_integration_tests::{streams, FakeKeys, RecordingClient, TestFixture, AUDIO_MIME, VIDEO_MIME};
use std::sync::Arc;
use std::time::Duration;

const KEY_ID: &[u8] = b"kid-0001";

fn player_with_client(config: &Config) -> (HeadlessMediaPlayer, Arc<RecordingClient>) {
    let player = HeadlessMediaPlayer::new(config);
    let client = RecordingClient::new();
    player.add_client(client.clone());
    (player, client)
}

#[test]
fn test_mse_lifecycle() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());

    assert!(player.attach_mse());
    assert!(player.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 10)));
    assert!(player.add_mse_buffer(AUDIO_MIME, false, streams::audio(10)));
    player.loaded_meta_data(10.0);

    assert_eq!(
        client.take(),
        vec![
            "attach_mse",
            "ready_state NotAttached -> HaveNothing",
            "playback_state Detached -> Initializing",
            "add_video_track 1",
            "add_audio_track 2",
            "ready_state HaveNothing -> HaveMetadata",
            "ready_state HaveMetadata -> HaveEnoughData",
            "playback_state Initializing -> Paused",
        ]
    );
    assert_eq!(player.width(), 1920);
    assert_eq!(player.height(), 1080);
    assert!(player.video_tracks()[0].enabled());
    assert!(player.audio_tracks()[0].enabled());

    player.play();
    assert_eq!(client.take(), vec!["playback_state Paused -> Playing", "play"]);

    player.tick(Duration::from_secs(1));
    assert_eq!(player.current_time(), 1.0);
    assert_eq!(player.video_playback_quality().total_video_frames, 30);

    // Run past the end; the playhead stops at the duration.
    player.tick(Duration::from_secs(20));
    assert_eq!(player.playback_state(), VideoPlaybackState::Ended);
    assert!((player.current_time() - 10.0).abs() < 1e-6);
    assert!(client.contains("playback_state Playing -> Ended"));

    player.detach();
    assert_eq!(player.playback_state(), VideoPlaybackState::Detached);
    assert_eq!(player.ready_state(), VideoReadyState::NotAttached);
    assert!(player.audio_tracks().is_empty());
    assert!(player.video_tracks().is_empty());
    assert_eq!(player.current_time(), 0.0);

    Ok(())
}

#[test]
fn test_replay_after_end() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());

    player.attach_mse();
    player.add_mse_buffer(VIDEO_MIME, true, streams::video(25, 2));
    player.loaded_meta_data(2.0);
    player.play();
    player.tick(Duration::from_secs(5));
    assert_eq!(player.playback_state(), VideoPlaybackState::Ended);
    client.take();

    player.play();
    assert_eq!(player.current_time(), 0.0);
    assert_eq!(player.playback_state(), VideoPlaybackState::Playing);
    assert_eq!(
        client.take(),
        vec![
            "playback_state Ended -> Seeking",
            "seeking",
            "play",
            "playback_state Seeking -> Playing",
        ]
    );

    Ok(())
}

#[test]
fn test_buffering_until_more_data() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());
    let stream = Arc::new(ElementaryStream::new(streams::video_info()));
    streams::append(&stream, 30, 0, 60, None);

    player.attach_mse();
    player.add_mse_buffer(VIDEO_MIME, true, Arc::clone(&stream));
    player.loaded_meta_data(10.0);
    assert_eq!(player.ready_state(), VideoReadyState::HaveFutureData);

    player.play();
    player.tick(Duration::from_secs(3));
    assert_eq!(player.playback_state(), VideoPlaybackState::Buffering);
    assert!((player.current_time() - 2.0).abs() < 1e-6);

    streams::append(&stream, 30, 60, 300, None);
    player.mse_end_of_stream();

    assert_eq!(player.playback_state(), VideoPlaybackState::Playing);
    assert_eq!(player.ready_state(), VideoReadyState::HaveEnoughData);
    assert!(client.contains("playback_state Playing -> Buffering"));
    assert!(client.contains("playback_state Buffering -> Playing"));

    // End of stream pulls the duration in to the buffered end.
    assert!((player.duration() - 10.0).abs() < 1e-6);
    assert_eq!(player.buffered().len(), 1);

    Ok(())
}

#[test]
fn test_seek_while_paused() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());

    player.attach_mse();
    player.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 10));
    player.loaded_meta_data(10.0);
    client.take();

    player.set_current_time(4.0);
    assert_eq!(player.current_time(), 4.0);
    assert_eq!(player.playback_state(), VideoPlaybackState::Paused);
    assert_eq!(
        client.take(),
        vec![
            "playback_state Paused -> Seeking",
            "seeking",
            "playback_state Seeking -> Paused",
        ]
    );

    // Seeks are clamped to the content.
    player.set_current_time(99.0);
    assert_eq!(player.current_time(), 10.0);
    player.set_current_time(-3.0);
    assert_eq!(player.current_time(), 0.0);

    Ok(())
}

#[test]
fn test_waiting_for_key() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());
    let stream = Arc::new(ElementaryStream::new(streams::video_info()));
    streams::append(&stream, 30, 0, 30, None);
    streams::append(&stream, 30, 30, 60, Some(KEY_ID));
    streams::append(&stream, 30, 60, 300, None);

    let keys = FakeKeys::new();
    player.attach_mse();
    player.add_mse_buffer(VIDEO_MIME, true, stream);
    assert!(player.set_eme_implementation("org.w3.clearkey", Some(keys.clone())));
    assert_eq!(player.key_system().as_deref(), Some("org.w3.clearkey"));
    player.loaded_meta_data(10.0);

    player.play();
    player.tick(Duration::from_secs(2));
    assert_eq!(player.playback_state(), VideoPlaybackState::WaitingForKey);
    assert_eq!(player.current_time(), 1.0);
    assert!(client.contains("waiting_for_key"));

    keys.add_key(KEY_ID);
    assert!(keys.has_key(KEY_ID));
    player.keys_updated();
    assert_eq!(player.playback_state(), VideoPlaybackState::Playing);

    player.tick(Duration::from_secs(1));
    assert_eq!(player.current_time(), 2.0);

    Ok(())
}

#[test]
fn test_unknown_key_system_rejected() -> Result<()> {
    let player = HeadlessMediaPlayer::default();
    player.attach_mse();

    assert!(!player.set_eme_implementation("com.example.drm", Some(FakeKeys::new())));
    assert!(player.key_system().is_none());

    Ok(())
}

#[test]
fn test_source_session() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());

    assert!(!player.attach_source("not a url"));
    assert!(player.attach_source("https://media.example.com/movie.mp4"));
    assert!(!player.attach_mse());
    assert_eq!(player.source().as_deref(), Some("https://media.example.com/movie.mp4"));

    // Buffers belong to buffer-based sessions only.
    assert!(!player.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 1)));

    player.loaded_meta_data(60.0);
    assert_eq!(player.ready_state(), VideoReadyState::HaveEnoughData);
    assert_eq!(player.playback_state(), VideoPlaybackState::Paused);

    let buffered = player.buffered();
    assert_eq!(buffered.len(), 1);
    assert_eq!((buffered[0].start, buffered[0].end), (0.0, 60.0));

    player.set_current_time(30.0);
    assert_eq!(player.current_time(), 30.0);
    assert!(client.contains("attach_source"));
    assert!(client.contains("seeking"));

    player.detach();
    assert!(player.source().is_none());
    assert!(client.contains("detach"));

    Ok(())
}

#[test]
fn test_config_from_file() -> Result<()> {
    let mut config = Config::default();
    config.player.autoplay = true;
    config.player.default_volume = 0.25;
    config.player.default_playback_rate = 1.5;

    let fixture = TestFixture::with_config(&config)?;
    assert!(fixture.config_path.starts_with(fixture.path()));
    let loaded = Config::from_file(&fixture.config_path)?;
    loaded.validate()?;

    let (player, client) = player_with_client(&loaded);
    assert_eq!(player.volume(), 0.25);
    assert_eq!(player.playback_rate(), 1.0);

    player.attach_mse();
    assert_eq!(player.playback_rate(), 1.5);
    player.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 4));
    player.loaded_meta_data(4.0);

    // Autoplay goes straight from initializing to playing.
    assert_eq!(player.playback_state(), VideoPlaybackState::Playing);
    assert!(client.contains("playback_state Initializing -> Playing"));
    assert!(client.contains("play"));

    player.tick(Duration::from_secs(2));
    assert!((player.current_time() - 3.0).abs() < 1e-6);

    Ok(())
}

#[test]
fn test_disabled_session_types() -> Result<()> {
    let mut config = Config::default();
    config.capabilities.supports_mse = false;
    config.capabilities.supports_src = false;
    let player = HeadlessMediaPlayer::new(&config);

    assert!(!player.attach_mse());
    assert!(!player.attach_source("https://media.example.com/movie.mp4"));
    assert_eq!(player.playback_state(), VideoPlaybackState::Detached);

    Ok(())
}

#[test]
fn test_text_tracks_removed_on_detach() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());
    assert!(player.add_text_track(TextTrackKind::Subtitles, "English", "en").is_none());

    player.attach_mse();
    player.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 10));
    let track = player
        .add_text_track(TextTrackKind::Captions, "English CC", "en")
        .expect("text track while attached");
    track.add_cue(Arc::new(VttCue::new(1.0, 2.5, "Hello")));
    assert_eq!(track.cues().len(), 1);
    assert_eq!(player.text_tracks().len(), 1);
    client.take();

    player.detach();
    let trace = client.take();
    assert_eq!(trace[0], format!("remove_text_track {}", track.id));
    assert_eq!(trace[1], "remove_video_track 1");
    assert_eq!(trace.last().map(String::as_str), Some("detach"));
    assert!(player.text_tracks().is_empty());

    Ok(())
}

#[test]
fn test_fatal_error() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());

    player.attach_mse();
    player.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 10));
    player.loaded_meta_data(10.0);
    player.play();

    player.fail("decoder crashed");
    assert_eq!(player.playback_state(), VideoPlaybackState::Errored);
    assert!(client.contains("error: decoder crashed"));

    // Nothing but a detach leaves the error state.
    player.play();
    player.set_current_time(2.0);
    assert_eq!(player.playback_state(), VideoPlaybackState::Errored);

    player.detach();
    assert_eq!(player.playback_state(), VideoPlaybackState::Detached);

    Ok(())
}

#[test]
fn test_rate_and_volume() -> Result<()> {
    let (player, client) = player_with_client(&Config::default());

    player.set_playback_rate(2.0);
    assert_eq!(player.playback_rate(), 1.0);

    player.attach_mse();
    player.set_playback_rate(2.0);
    player.set_playback_rate(-1.0);
    assert_eq!(player.playback_rate(), 2.0);
    assert!(client.contains("playback_rate 1 -> 2"));

    player.set_volume(3.0);
    assert_eq!(player.volume(), 1.0);
    player.set_muted(true);
    assert!(player.muted());

    player.detach();
    assert_eq!(player.playback_rate(), 1.0);

    Ok(())
}

/// Headless engines for buffer-based sessions only
struct MseOnly;

impl PlayerFactory for MseOnly {
    fn create_mse(&self) -> Option<Arc<dyn MediaPlayer>> {
        Some(Arc::new(HeadlessMediaPlayer::default()))
    }

    fn create_source(&self, _src: &str) -> Option<Arc<dyn MediaPlayer>> {
        None
    }
}

#[test]
fn test_proxy_sessions() -> Result<()> {
    let proxy = ProxyMediaPlayer::new(Arc::new(MseOnly), &Config::default().player);
    let client = RecordingClient::new();
    proxy.add_client(client.clone());

    proxy.set_volume(0.6);
    proxy.play();
    assert!(!proxy.attach_source("https://media.example.com/movie.mp4"));
    assert!(client.take().is_empty());

    assert!(proxy.attach_mse());
    assert!(proxy.add_mse_buffer(VIDEO_MIME, true, streams::video(30, 10)));
    proxy.loaded_meta_data(10.0);
    assert_eq!(proxy.volume(), 0.6);
    assert_eq!(proxy.playback_state(), VideoPlaybackState::Playing);
    assert!(client.contains("attach_mse"));
    assert!(client.contains("playback_state Initializing -> Playing"));

    proxy.detach();
    assert!(client.contains("detach"));
    assert_eq!(proxy.volume(), 1.0);
    assert_eq!(proxy.playback_state(), VideoPlaybackState::Detached);

    // A new session gets a fresh engine and keeps reporting to the same clients.
    client.take();
    assert!(proxy.attach_mse());
    assert_eq!(client.take()[0], "attach_mse");

    Ok(())
}
