//! Text tracks and their cue lists

use crate::media::vtt_cue::VttCue;
use crate::utils::ObserverSet;
use parking_lot::Mutex;
use std::sync::Arc;

/// Role of a text track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextTrackKind {
    #[default]
    Subtitles,
    Captions,
    Descriptions,
    Chapters,
    Metadata,
}

/// Whether a text track is being processed and shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextTrackMode {
    #[default]
    Disabled,
    /// Cues are tracked but not displayed
    Hidden,
    Showing,
}

/// Receives cue list changes from a [`TextTrack`]
///
/// Callbacks run while the track's cue list is locked, so they must not call
/// back into the track that invoked them.
pub trait TextTrackClient: Send + Sync {
    fn on_cue_added(&self, _cue: &Arc<VttCue>) {}

    fn on_cue_removed(&self, _cue: &Arc<VttCue>) {}
}

/// A text track
pub struct TextTrack {
    pub kind: TextTrackKind,
    pub label: String,
    pub language: String,
    pub id: String,
    mode: Mutex<TextTrackMode>,
    cues: Mutex<Vec<Arc<VttCue>>>,
    clients: ObserverSet<dyn TextTrackClient>,
}

impl TextTrack {
    pub fn new(kind: TextTrackKind, label: &str, language: &str, id: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
            language: language.to_string(),
            id: id.to_string(),
            mode: Mutex::new(TextTrackMode::Disabled),
            cues: Mutex::new(Vec::new()),
            clients: ObserverSet::new(),
        }
    }

    pub fn mode(&self) -> TextTrackMode {
        *self.mode.lock()
    }

    pub fn set_mode(&self, mode: TextTrackMode) {
        *self.mode.lock() = mode;
    }

    /// All cues, in insertion order
    pub fn cues(&self) -> Vec<Arc<VttCue>> {
        self.cues.lock().clone()
    }

    /// Cues that should be displayed at `time`
    pub fn active_cues(&self, time: f64) -> Vec<Arc<VttCue>> {
        self.cues
            .lock()
            .iter()
            .filter(|cue| cue.is_active_at(time))
            .cloned()
            .collect()
    }

    /// The next time after `time` at which the set of active cues changes
    ///
    /// Returns infinity when nothing changes after `time`.
    pub fn next_cue_change_time(&self, time: f64) -> f64 {
        self.cues
            .lock()
            .iter()
            .flat_map(|cue| [cue.start_time(), cue.end_time()])
            .filter(|&t| t > time)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn add_cue(&self, cue: Arc<VttCue>) {
        let mut cues = self.cues.lock();
        cues.push(Arc::clone(&cue));
        self.clients.notify(|client| client.on_cue_added(&cue));
    }

    /// Remove a cue; returns `false` if it was not on this track
    pub fn remove_cue(&self, cue: &Arc<VttCue>) -> bool {
        let mut cues = self.cues.lock();
        let Some(index) = cues.iter().position(|c| Arc::ptr_eq(c, cue)) else {
            return false;
        };

        let removed = cues.remove(index);
        self.clients.notify(|client| client.on_cue_removed(&removed));
        true
    }

    pub fn add_client(&self, client: &Arc<dyn TextTrackClient>) {
        self.clients.add(client);
    }

    pub fn remove_client(&self, client: &dyn TextTrackClient) {
        self.clients.remove(client);
    }
}

impl std::fmt::Debug for TextTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextTrack")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("language", &self.language)
            .field("id", &self.id)
            .field("mode", &self.mode())
            .field("cues", &self.cues.lock().len())
            .finish()
    }
}
