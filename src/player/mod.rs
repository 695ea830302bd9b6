//! Player module for mediacore
//!
//! The playback-engine contract, its observers and state model, the
//! process-wide support-check registry, a headless reference engine, and a
//! proxy that picks an engine per session.

mod client;
mod headless;
mod proxy;
mod state;
mod support;

pub use client::{ChannelClient, Client, ClientList, MediaPlayerEvent};
pub use headless::HeadlessMediaPlayer;
pub use proxy::{PlayerFactory, ProxyMediaPlayer};
pub use state::{StateTracker, VideoPlaybackState, VideoReadyState};
pub use support::{media_player_for_support_checks, set_media_player_for_support_checks, SupportChecks};

use crate::geometry::VideoFillMode;
use crate::media::{
    BufferedRange, ElementaryStream, EmeImplementation, MediaCapabilitiesInfo,
    MediaDecodingConfiguration, MediaTrack, TextTrack, TextTrackKind,
};
use std::sync::Arc;

/// Frame counters for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoPlaybackQuality {
    /// Frames that were due for display
    pub total_video_frames: u32,

    /// Frames skipped to keep up
    pub dropped_video_frames: u32,

    /// Frames that failed to decode
    pub corrupted_video_frames: u32,
}

/// A playback engine
///
/// Implementations are internally synchronized: every method may be called
/// from any thread at any time. Client callbacks are invoked while the
/// engine holds its internal lock, so a client must never call back into
/// the engine from a callback. Doing so deadlocks.
///
/// The lifecycle methods (`attach_*`, `add_mse_buffer`, `loaded_meta_data`,
/// `mse_end_of_stream`, `set_eme_implementation`, `detach`) are driven by
/// the code that owns the engine, not by the application. The ones that
/// return `bool` return `false` for "not supported", which callers treat as
/// a failed negotiation rather than an error.
pub trait MediaPlayer: Send + Sync {
    /// Query decoding support
    ///
    /// Every engine in the process gives the same answer for the same query.
    fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo;

    fn video_playback_quality(&self) -> VideoPlaybackQuality;

    /// Register an observer; registering it again does nothing
    ///
    /// The engine holds clients weakly. The caller keeps the client alive
    /// by holding its own `Arc`: `add_client(Arc::new(MyClient))` registers
    /// a client that is dropped immediately and never hears anything.
    fn add_client(&self, client: Arc<dyn Client>);

    /// Unregister an observer; unknown observers are ignored
    fn remove_client(&self, client: &dyn Client);

    /// Buffered ranges of the attached content, sorted and disjoint
    fn buffered(&self) -> Vec<BufferedRange>;

    fn ready_state(&self) -> VideoReadyState;

    fn playback_state(&self) -> VideoPlaybackState;

    /// Audio tracks; enable or disable them through the returned handles
    fn audio_tracks(&self) -> Vec<Arc<MediaTrack>>;

    /// Video tracks; enable or disable them through the returned handles
    fn video_tracks(&self) -> Vec<Arc<MediaTrack>>;

    fn text_tracks(&self) -> Vec<Arc<TextTrack>>;

    /// Create a text track the application fills with cues
    ///
    /// # Arguments
    ///
    /// * `kind` - Role of the track
    /// * `label` - Human-readable name
    /// * `language` - BCP-47 language tag
    ///
    /// # Returns
    ///
    /// The new track, or `None` if text tracks cannot be added right now
    fn add_text_track(&self, kind: TextTrackKind, label: &str, language: &str) -> Option<Arc<TextTrack>>;

    /// Returns `false` if the mode is not supported
    fn set_video_fill_mode(&self, mode: VideoFillMode) -> bool;

    /// Natural width of the video, or 0 if unknown
    fn width(&self) -> u32;

    /// Natural height of the video, or 0 if unknown
    fn height(&self) -> u32;

    fn volume(&self) -> f64;

    /// Set the volume; values outside `[0, 1]` are clamped
    fn set_volume(&self, volume: f64);

    fn muted(&self) -> bool;

    fn set_muted(&self, muted: bool);

    /// Start or resume playback
    ///
    /// Calling this before content is attached starts playback once it is.
    fn play(&self);

    fn pause(&self);

    /// Current playhead, in seconds
    fn current_time(&self) -> f64;

    /// Seek to the given time, in seconds
    fn set_current_time(&self, time: f64);

    /// Duration in seconds; infinity if unknown
    fn duration(&self) -> f64;

    fn set_duration(&self, duration: f64);

    /// Playback rate; 1 if nothing is loaded and no rate is waiting for the
    /// next session
    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);

    /// Attach for direct-URL playback of `src`
    fn attach_source(&self, src: &str) -> bool;

    /// Attach for buffer-based playback
    fn attach_mse(&self) -> bool;

    /// Hand an elementary stream to the engine
    ///
    /// # Arguments
    ///
    /// * `mime` - Full MIME type of the stream, including codecs
    /// * `is_video` - Whether the stream carries video
    /// * `stream` - Frame source the engine pulls from as time advances
    fn add_mse_buffer(&self, mime: &str, is_video: bool, stream: Arc<ElementaryStream>) -> bool;

    /// Metadata is known; `duration` may be infinite for live content
    fn loaded_meta_data(&self, duration: f64);

    /// No more data will be appended
    fn mse_end_of_stream(&self);

    /// Install, or with `None` remove, the decryption implementation
    fn set_eme_implementation(
        &self,
        key_system: &str,
        implementation: Option<Arc<dyn EmeImplementation>>,
    ) -> bool;

    /// End the current session
    fn detach(&self);
}
