//! Engine observers
//!
//! A [`Client`] is told about everything an engine does. [`ClientList`] fans
//! one engine's events out to any number of clients, and [`ChannelClient`]
//! turns the callbacks into [`MediaPlayerEvent`] values on a channel for
//! consumers that prefer a single event stream.

use crate::media::{MediaTrack, TextTrack};
use crate::player::state::{VideoPlaybackState, VideoReadyState};
use crate::utils::ObserverSet;
use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Observer of a playback engine
///
/// Every callback defaults to doing nothing, so implementers only override
/// what they care about.
///
/// Callbacks run while the engine holds its internal lock. A callback must
/// never call back into the engine that invoked it; doing so deadlocks.
pub trait Client: Send + Sync {
    fn on_add_audio_track(&self, _track: &Arc<MediaTrack>) {}

    fn on_remove_audio_track(&self, _track: &Arc<MediaTrack>) {}

    fn on_add_video_track(&self, _track: &Arc<MediaTrack>) {}

    fn on_remove_video_track(&self, _track: &Arc<MediaTrack>) {}

    fn on_add_text_track(&self, _track: &Arc<TextTrack>) {}

    fn on_remove_text_track(&self, _track: &Arc<TextTrack>) {}

    fn on_ready_state_changed(&self, _old: VideoReadyState, _new: VideoReadyState) {}

    fn on_playback_state_changed(&self, _old: VideoPlaybackState, _new: VideoPlaybackState) {}

    fn on_playback_rate_changed(&self, _old: f64, _new: f64) {}

    /// A playback error; the engine is now `Errored`
    fn on_error(&self, _error: &str) {}

    /// The engine was attached for buffer-based playback
    fn on_attach_mse(&self) {}

    /// The engine was attached for direct-URL playback
    fn on_attach_source(&self) {}

    /// The engine was detached; the last event of a session
    fn on_detach(&self) {}

    /// Playback started after startup or after a pause
    fn on_play(&self) {}

    /// A seek started; may repeat while already seeking
    fn on_seeking(&self) {}

    /// Playback stopped because a decryption key is missing
    fn on_waiting_for_key(&self) {}

    /// An implementation-defined event
    ///
    /// # Arguments
    ///
    /// * `name` - Event name, chosen by the engine
    /// * `data` - Optional payload; only valid for the duration of the call
    fn on_user_event(&self, _name: &str, _data: Option<&(dyn Any + Send + Sync)>) {}
}

/// Ordered, de-duplicated set of clients that is itself a [`Client`]
///
/// Clients are held weakly; dropping a client unregisters it. Each event is
/// delivered to a snapshot taken when dispatch of that event starts: a
/// client removed while an event is being delivered still receives that
/// event, and one added meanwhile does not.
#[derive(Default)]
pub struct ClientList {
    clients: ObserverSet<dyn Client>,
}

impl ClientList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client; registering it again does nothing
    pub fn add_client(&self, client: Arc<dyn Client>) {
        if !self.clients.add(&client) {
            debug!("Client already registered");
        }
    }

    /// Unregister a client; unknown clients are ignored
    pub fn remove_client(&self, client: &dyn Client) {
        if !self.clients.remove(client) {
            debug!("Removing a client that is not registered");
        }
    }

    pub fn contains(&self, client: &dyn Client) -> bool {
        self.clients.contains(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Client for ClientList {
    fn on_add_audio_track(&self, track: &Arc<MediaTrack>) {
        self.clients.notify(|c| c.on_add_audio_track(track));
    }

    fn on_remove_audio_track(&self, track: &Arc<MediaTrack>) {
        self.clients.notify(|c| c.on_remove_audio_track(track));
    }

    fn on_add_video_track(&self, track: &Arc<MediaTrack>) {
        self.clients.notify(|c| c.on_add_video_track(track));
    }

    fn on_remove_video_track(&self, track: &Arc<MediaTrack>) {
        self.clients.notify(|c| c.on_remove_video_track(track));
    }

    fn on_add_text_track(&self, track: &Arc<TextTrack>) {
        self.clients.notify(|c| c.on_add_text_track(track));
    }

    fn on_remove_text_track(&self, track: &Arc<TextTrack>) {
        self.clients.notify(|c| c.on_remove_text_track(track));
    }

    fn on_ready_state_changed(&self, old: VideoReadyState, new: VideoReadyState) {
        self.clients.notify(|c| c.on_ready_state_changed(old, new));
    }

    fn on_playback_state_changed(&self, old: VideoPlaybackState, new: VideoPlaybackState) {
        self.clients.notify(|c| c.on_playback_state_changed(old, new));
    }

    fn on_playback_rate_changed(&self, old: f64, new: f64) {
        self.clients.notify(|c| c.on_playback_rate_changed(old, new));
    }

    fn on_error(&self, error: &str) {
        self.clients.notify(|c| c.on_error(error));
    }

    fn on_attach_mse(&self) {
        self.clients.notify(|c| c.on_attach_mse());
    }

    fn on_attach_source(&self) {
        self.clients.notify(|c| c.on_attach_source());
    }

    fn on_detach(&self) {
        self.clients.notify(|c| c.on_detach());
    }

    fn on_play(&self) {
        self.clients.notify(|c| c.on_play());
    }

    fn on_seeking(&self) {
        self.clients.notify(|c| c.on_seeking());
    }

    fn on_waiting_for_key(&self) {
        self.clients.notify(|c| c.on_waiting_for_key());
    }

    fn on_user_event(&self, name: &str, data: Option<&(dyn Any + Send + Sync)>) {
        self.clients.notify(|c| c.on_user_event(name, data));
    }
}

/// A [`Client`] callback as a value
#[derive(Debug, Clone)]
pub enum MediaPlayerEvent {
    AudioTrackAdded(Arc<MediaTrack>),
    AudioTrackRemoved(Arc<MediaTrack>),
    VideoTrackAdded(Arc<MediaTrack>),
    VideoTrackRemoved(Arc<MediaTrack>),
    TextTrackAdded(Arc<TextTrack>),
    TextTrackRemoved(Arc<TextTrack>),
    ReadyStateChanged { old: VideoReadyState, new: VideoReadyState },
    PlaybackStateChanged { old: VideoPlaybackState, new: VideoPlaybackState },
    PlaybackRateChanged { old: f64, new: f64 },
    Error(String),
    AttachMse,
    AttachSource,
    Detach,
    Play,
    Seeking,
    WaitingForKey,
    /// The payload of a user event is not carried over
    UserEvent(String),
}

impl MediaPlayerEvent {
    /// Deliver this event to a client as the matching callback
    pub fn dispatch(&self, client: &dyn Client) {
        match self {
            Self::AudioTrackAdded(t) => client.on_add_audio_track(t),
            Self::AudioTrackRemoved(t) => client.on_remove_audio_track(t),
            Self::VideoTrackAdded(t) => client.on_add_video_track(t),
            Self::VideoTrackRemoved(t) => client.on_remove_video_track(t),
            Self::TextTrackAdded(t) => client.on_add_text_track(t),
            Self::TextTrackRemoved(t) => client.on_remove_text_track(t),
            Self::ReadyStateChanged { old, new } => client.on_ready_state_changed(*old, *new),
            Self::PlaybackStateChanged { old, new } => client.on_playback_state_changed(*old, *new),
            Self::PlaybackRateChanged { old, new } => client.on_playback_rate_changed(*old, *new),
            Self::Error(message) => client.on_error(message),
            Self::AttachMse => client.on_attach_mse(),
            Self::AttachSource => client.on_attach_source(),
            Self::Detach => client.on_detach(),
            Self::Play => client.on_play(),
            Self::Seeking => client.on_seeking(),
            Self::WaitingForKey => client.on_waiting_for_key(),
            Self::UserEvent(name) => client.on_user_event(name, None),
        }
    }
}

impl fmt::Display for MediaPlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AudioTrackAdded(t) => write!(f, "add_audio_track {}", t.id),
            Self::AudioTrackRemoved(t) => write!(f, "remove_audio_track {}", t.id),
            Self::VideoTrackAdded(t) => write!(f, "add_video_track {}", t.id),
            Self::VideoTrackRemoved(t) => write!(f, "remove_video_track {}", t.id),
            Self::TextTrackAdded(t) => write!(f, "add_text_track {}", t.id),
            Self::TextTrackRemoved(t) => write!(f, "remove_text_track {}", t.id),
            Self::ReadyStateChanged { old, new } => write!(f, "ready_state {} -> {}", old, new),
            Self::PlaybackStateChanged { old, new } => write!(f, "playback_state {} -> {}", old, new),
            Self::PlaybackRateChanged { old, new } => write!(f, "playback_rate {} -> {}", old, new),
            Self::Error(message) => write!(f, "error: {}", message),
            Self::AttachMse => f.write_str("attach_mse"),
            Self::AttachSource => f.write_str("attach_source"),
            Self::Detach => f.write_str("detach"),
            Self::Play => f.write_str("play"),
            Self::Seeking => f.write_str("seeking"),
            Self::WaitingForKey => f.write_str("waiting_for_key"),
            Self::UserEvent(name) => write!(f, "user_event {}", name),
        }
    }
}

/// Forwards every callback as a [`MediaPlayerEvent`] into a channel
///
/// Sending never blocks the engine; events for a dropped receiver are
/// discarded.
pub struct ChannelClient {
    sender: Sender<MediaPlayerEvent>,
}

impl ChannelClient {
    pub fn new(sender: Sender<MediaPlayerEvent>) -> Self {
        Self { sender }
    }

    /// Create a client with its own unbounded channel
    pub fn unbounded() -> (Arc<Self>, Receiver<MediaPlayerEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Arc::new(Self::new(sender)), receiver)
    }

    fn send(&self, event: MediaPlayerEvent) {
        // A closed channel only means nobody is listening any more.
        let _ = self.sender.try_send(event);
    }
}

impl Client for ChannelClient {
    fn on_add_audio_track(&self, track: &Arc<MediaTrack>) {
        self.send(MediaPlayerEvent::AudioTrackAdded(Arc::clone(track)));
    }

    fn on_remove_audio_track(&self, track: &Arc<MediaTrack>) {
        self.send(MediaPlayerEvent::AudioTrackRemoved(Arc::clone(track)));
    }

    fn on_add_video_track(&self, track: &Arc<MediaTrack>) {
        self.send(MediaPlayerEvent::VideoTrackAdded(Arc::clone(track)));
    }

    fn on_remove_video_track(&self, track: &Arc<MediaTrack>) {
        self.send(MediaPlayerEvent::VideoTrackRemoved(Arc::clone(track)));
    }

    fn on_add_text_track(&self, track: &Arc<TextTrack>) {
        self.send(MediaPlayerEvent::TextTrackAdded(Arc::clone(track)));
    }

    fn on_remove_text_track(&self, track: &Arc<TextTrack>) {
        self.send(MediaPlayerEvent::TextTrackRemoved(Arc::clone(track)));
    }

    fn on_ready_state_changed(&self, old: VideoReadyState, new: VideoReadyState) {
        self.send(MediaPlayerEvent::ReadyStateChanged { old, new });
    }

    fn on_playback_state_changed(&self, old: VideoPlaybackState, new: VideoPlaybackState) {
        self.send(MediaPlayerEvent::PlaybackStateChanged { old, new });
    }

    fn on_playback_rate_changed(&self, old: f64, new: f64) {
        self.send(MediaPlayerEvent::PlaybackRateChanged { old, new });
    }

    fn on_error(&self, error: &str) {
        self.send(MediaPlayerEvent::Error(error.to_string()));
    }

    fn on_attach_mse(&self) {
        self.send(MediaPlayerEvent::AttachMse);
    }

    fn on_attach_source(&self) {
        self.send(MediaPlayerEvent::AttachSource);
    }

    fn on_detach(&self) {
        self.send(MediaPlayerEvent::Detach);
    }

    fn on_play(&self) {
        self.send(MediaPlayerEvent::Play);
    }

    fn on_seeking(&self) {
        self.send(MediaPlayerEvent::Seeking);
    }

    fn on_waiting_for_key(&self) {
        self.send(MediaPlayerEvent::WaitingForKey);
    }

    fn on_user_event(&self, name: &str, _data: Option<&(dyn Any + Send + Sync)>) {
        self.send(MediaPlayerEvent::UserEvent(name.to_string()));
    }
}
