//! Audio and video track handles
//!
//! Tracks are shared between the engine and whoever observes it, so they are
//! always handed out as `Arc<MediaTrack>`; identity is the allocation, not
//! the field values.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Role of an audio or video track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaTrackKind {
    #[default]
    Unknown,
    /// An alternative to the main track, e.g. a different camera angle
    Alternative,
    /// Main video with captions burnt in
    Captions,
    /// Audio description of the video
    Descriptions,
    /// The primary audio or video track
    Main,
    /// Primary audio mixed with audio descriptions
    MainDesc,
    /// Sign-language interpretation
    Sign,
    /// Main video with subtitles burnt in
    Subtitles,
    /// Translated version of the main audio
    Translation,
    /// Commentary on the primary track
    Commentary,
}

/// An audio or video track
#[derive(Debug)]
pub struct MediaTrack {
    pub label: String,
    pub language: String,
    pub id: String,
    pub kind: MediaTrackKind,
    enabled: AtomicBool,
}

impl MediaTrack {
    /// Create a new, disabled track
    pub fn new(kind: MediaTrackKind, label: &str, language: &str, id: &str) -> Self {
        Self {
            label: label.to_string(),
            language: language.to_string(),
            id: id.to_string(),
            kind,
            enabled: AtomicBool::new(false),
        }
    }

    /// Whether the track is currently being played
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl fmt::Display for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} track '{}' ({})", self.kind, self.id, self.language)
    }
}
