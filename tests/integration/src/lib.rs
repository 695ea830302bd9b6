//! Integration test utilities for mediacore
//!
//! This module provides common utilities for integration testing including:
//! - Synthetic elementary streams
//! - A recording client and a scriptable key store
//! - Test fixtures and helpers

use anyhow::Result;
use mediacore::media::{ElementaryStream, EmeImplementation, EncodedFrame, MediaTrack, StreamInfo, TextTrack};
use mediacore::player::{Client, VideoPlaybackState, VideoReadyState};
use mediacore::Config;
use parking_lot::Mutex;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const VIDEO_MIME: &str = "video/mp4; codecs=\"avc1.640028\"";
pub const AUDIO_MIME: &str = "audio/mp4; codecs=\"mp4a.40.2\"";

/// Test fixture with a private config directory
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestFixture {
    /// Create a fixture whose config file holds `config`
    pub fn with_config(config: &Config) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("mediacore").join("config.toml");
        config.save_to(&config_path)?;

        Ok(Self {
            temp_dir,
            config_path,
        })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Synthetic streams with frames on a fixed grid
pub mod streams {
    use super::*;

    pub fn video_info() -> Arc<StreamInfo> {
        Arc::new(StreamInfo::video("video/mp4", "avc1.640028", 1920, 1080))
    }

    pub fn audio_info() -> Arc<StreamInfo> {
        Arc::new(StreamInfo::audio("audio/mp4", "mp4a.40.2", 2, 48_000))
    }

    /// Append frames `from..to` of a `fps` stream; a key frame every second
    pub fn append(stream: &ElementaryStream, fps: u32, from: u32, to: u32, key_id: Option<&[u8]>) {
        let duration = 1.0 / f64::from(fps);
        for i in from..to {
            let t = f64::from(i) / f64::from(fps);
            let mut frame = EncodedFrame::new(Arc::clone(stream.info()), t, t, duration, i % fps == 0)
                .with_data(vec![0u8; 64]);
            if let Some(id) = key_id {
                frame = frame.with_key_id(id.to_vec());
            }
            stream.add_frame(Arc::new(frame));
        }
    }

    /// Clear stream covering `[0, seconds)`
    pub fn video(fps: u32, seconds: u32) -> Arc<ElementaryStream> {
        let stream = Arc::new(ElementaryStream::new(video_info()));
        append(&stream, fps, 0, fps * seconds, None);
        stream
    }

    pub fn audio(seconds: u32) -> Arc<ElementaryStream> {
        // 1024-sample AAC frames are close enough to 1/50 s for these tests.
        let stream = Arc::new(ElementaryStream::new(audio_info()));
        append(&stream, 50, 0, 50 * seconds, None);
        stream
    }
}

/// Client that records every callback as a line of text
#[derive(Default)]
pub struct RecordingClient {
    lines: Mutex<Vec<String>>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, line: String) {
        self.lines.lock().push(line);
    }

    /// Everything recorded so far, clearing the log
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.lock().iter().any(|l| l == line)
    }
}

impl Client for RecordingClient {
    fn on_add_audio_track(&self, track: &Arc<MediaTrack>) {
        self.push(format!("add_audio_track {}", track.id));
    }

    fn on_remove_audio_track(&self, track: &Arc<MediaTrack>) {
        self.push(format!("remove_audio_track {}", track.id));
    }

    fn on_add_video_track(&self, track: &Arc<MediaTrack>) {
        self.push(format!("add_video_track {}", track.id));
    }

    fn on_remove_video_track(&self, track: &Arc<MediaTrack>) {
        self.push(format!("remove_video_track {}", track.id));
    }

    fn on_add_text_track(&self, track: &Arc<TextTrack>) {
        self.push(format!("add_text_track {}", track.id));
    }

    fn on_remove_text_track(&self, track: &Arc<TextTrack>) {
        self.push(format!("remove_text_track {}", track.id));
    }

    fn on_ready_state_changed(&self, old: VideoReadyState, new: VideoReadyState) {
        self.push(format!("ready_state {} -> {}", old, new));
    }

    fn on_playback_state_changed(&self, old: VideoPlaybackState, new: VideoPlaybackState) {
        self.push(format!("playback_state {} -> {}", old, new));
    }

    fn on_playback_rate_changed(&self, old: f64, new: f64) {
        self.push(format!("playback_rate {} -> {}", old, new));
    }

    fn on_error(&self, error: &str) {
        self.push(format!("error: {}", error));
    }

    fn on_attach_mse(&self) {
        self.push("attach_mse".to_string());
    }

    fn on_attach_source(&self) {
        self.push("attach_source".to_string());
    }

    fn on_detach(&self) {
        self.push("detach".to_string());
    }

    fn on_play(&self) {
        self.push("play".to_string());
    }

    fn on_seeking(&self) {
        self.push("seeking".to_string());
    }

    fn on_waiting_for_key(&self) {
        self.push("waiting_for_key".to_string());
    }

    fn on_user_event(&self, name: &str, data: Option<&(dyn Any + Send + Sync)>) {
        match data.and_then(|d| d.downcast_ref::<String>()) {
            Some(payload) => self.push(format!("user_event {} {}", name, payload)),
            None => self.push(format!("user_event {}", name)),
        }
    }
}

/// Key store whose contents the test controls
#[derive(Default)]
pub struct FakeKeys {
    keys: Mutex<Vec<Vec<u8>>>,
}

impl FakeKeys {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_key(&self, key_id: &[u8]) {
        self.keys.lock().push(key_id.to_vec());
    }
}

impl EmeImplementation for FakeKeys {
    fn has_key(&self, key_id: &[u8]) -> bool {
        self.keys.lock().iter().any(|k| k == key_id)
    }
}
