//! Engine selection per session
//!
//! [`ProxyMediaPlayer`] is the player an application holds on to. It has no
//! engine of its own while detached; attaching asks a [`PlayerFactory`] for
//! one that can play the content, hands it the settings made so far, and
//! forwards everything to it until detach.

use crate::geometry::VideoFillMode;
use crate::media::{
    BufferedRange, DecoderCapabilities, ElementaryStream, EmeImplementation,
    MediaCapabilitiesInfo, MediaDecodingConfiguration, MediaTrack, TextTrack, TextTrackKind,
};
use crate::player::client::{Client, ClientList};
use crate::player::state::{VideoPlaybackState, VideoReadyState};
use crate::player::{MediaPlayer, VideoPlaybackQuality};
use crate::utils::PlayerConfig;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Creates the engine for a new session
///
/// Both methods return a fresh, detached engine, or `None` if the content
/// kind is not supported.
pub trait PlayerFactory: Send + Sync {
    /// Engine for buffer-based playback
    fn create_mse(&self) -> Option<Arc<dyn MediaPlayer>>;

    /// Engine for direct-URL playback of `src`
    fn create_source(&self, src: &str) -> Option<Arc<dyn MediaPlayer>>;
}

/// Settings made while detached, handed to the next engine
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pending {
    volume: f64,
    muted: bool,
    fill_mode: VideoFillMode,
    rate: f64,
    play: bool,
}

impl Pending {
    fn new(defaults: &PlayerConfig) -> Self {
        Self {
            volume: defaults.default_volume.clamp(0.0, 1.0),
            muted: false,
            fill_mode: defaults.fill_mode,
            rate: defaults.default_playback_rate,
            play: defaults.autoplay,
        }
    }
}

struct State {
    engine: Option<Arc<dyn MediaPlayer>>,
    pending: Pending,
}

/// A player that picks a concrete engine when content is attached
///
/// Clients register with the proxy and keep receiving events across
/// sessions; the proxy's client list is itself registered with whichever
/// engine is attached.
pub struct ProxyMediaPlayer {
    factory: Arc<dyn PlayerFactory>,
    clients: Arc<ClientList>,
    defaults: PlayerConfig,
    state: Mutex<State>,
}

impl ProxyMediaPlayer {
    pub fn new(factory: Arc<dyn PlayerFactory>, defaults: &PlayerConfig) -> Self {
        Self {
            factory,
            clients: Arc::new(ClientList::new()),
            defaults: defaults.clone(),
            state: Mutex::new(State {
                engine: None,
                pending: Pending::new(defaults),
            }),
        }
    }

    /// The engine of the current session
    pub fn engine(&self) -> Option<Arc<dyn MediaPlayer>> {
        self.state.lock().engine.clone()
    }

    /// The list events are fired through
    pub fn client_list(&self) -> &ClientList {
        &self.clients
    }

    /// Create an engine, wire it up and attach it
    fn attach_with<C, A>(&self, kind: &str, create: C, attach: A) -> bool
    where
        C: FnOnce() -> Option<Arc<dyn MediaPlayer>>,
        A: FnOnce(&dyn MediaPlayer) -> bool,
    {
        let mut state = self.state.lock();
        if state.engine.is_some() {
            warn!("Already attached");
            return false;
        }

        let Some(engine) = create() else {
            warn!("No engine available for {} playback", kind);
            return false;
        };

        let forward: Arc<dyn Client> = self.clients.clone();
        engine.add_client(forward);

        // Settings that outlive sessions go in before the attach events.
        let pending = state.pending;
        engine.set_volume(pending.volume);
        engine.set_muted(pending.muted);
        if !engine.set_video_fill_mode(pending.fill_mode) {
            debug!("Engine rejected fill mode {}", pending.fill_mode);
        }

        if !attach(&*engine) {
            warn!("Engine refused {} playback", kind);
            engine.remove_client(&*self.clients);
            return false;
        }

        info!("Attached {} engine", kind);
        engine.set_playback_rate(pending.rate);
        if pending.play {
            engine.play();
        }
        state.engine = Some(engine);
        true
    }
}

impl MediaPlayer for ProxyMediaPlayer {
    fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo {
        DecoderCapabilities::process().decoding_info(config)
    }

    fn video_playback_quality(&self) -> VideoPlaybackQuality {
        self.engine()
            .map(|e| e.video_playback_quality())
            .unwrap_or_default()
    }

    fn add_client(&self, client: Arc<dyn Client>) {
        self.clients.add_client(client);
    }

    fn remove_client(&self, client: &dyn Client) {
        self.clients.remove_client(client);
    }

    fn buffered(&self) -> Vec<BufferedRange> {
        self.engine().map(|e| e.buffered()).unwrap_or_default()
    }

    fn ready_state(&self) -> VideoReadyState {
        self.engine()
            .map_or(VideoReadyState::NotAttached, |e| e.ready_state())
    }

    fn playback_state(&self) -> VideoPlaybackState {
        self.engine()
            .map_or(VideoPlaybackState::Detached, |e| e.playback_state())
    }

    fn audio_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.engine().map(|e| e.audio_tracks()).unwrap_or_default()
    }

    fn video_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.engine().map(|e| e.video_tracks()).unwrap_or_default()
    }

    fn text_tracks(&self) -> Vec<Arc<TextTrack>> {
        self.engine().map(|e| e.text_tracks()).unwrap_or_default()
    }

    fn add_text_track(&self, kind: TextTrackKind, label: &str, language: &str) -> Option<Arc<TextTrack>> {
        self.engine()?.add_text_track(kind, label, language)
    }

    fn set_video_fill_mode(&self, mode: VideoFillMode) -> bool {
        let engine = {
            let mut state = self.state.lock();
            state.pending.fill_mode = mode;
            state.engine.clone()
        };
        engine.map_or(true, |e| e.set_video_fill_mode(mode))
    }

    fn width(&self) -> u32 {
        self.engine().map_or(0, |e| e.width())
    }

    fn height(&self) -> u32 {
        self.engine().map_or(0, |e| e.height())
    }

    fn volume(&self) -> f64 {
        let state = self.state.lock();
        match &state.engine {
            Some(engine) => engine.volume(),
            None => state.pending.volume,
        }
    }

    fn set_volume(&self, volume: f64) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }

        let engine = {
            let mut state = self.state.lock();
            state.pending.volume = volume.clamp(0.0, 1.0);
            state.engine.clone()
        };
        if let Some(engine) = engine {
            engine.set_volume(volume);
        }
    }

    fn muted(&self) -> bool {
        let state = self.state.lock();
        match &state.engine {
            Some(engine) => engine.muted(),
            None => state.pending.muted,
        }
    }

    fn set_muted(&self, muted: bool) {
        let engine = {
            let mut state = self.state.lock();
            state.pending.muted = muted;
            state.engine.clone()
        };
        if let Some(engine) = engine {
            engine.set_muted(muted);
        }
    }

    fn play(&self) {
        let engine = {
            let mut state = self.state.lock();
            state.pending.play = true;
            state.engine.clone()
        };
        match engine {
            Some(engine) => engine.play(),
            None => debug!("Play queued until attach"),
        }
    }

    fn pause(&self) {
        let engine = {
            let mut state = self.state.lock();
            state.pending.play = false;
            state.engine.clone()
        };
        if let Some(engine) = engine {
            engine.pause();
        }
    }

    fn current_time(&self) -> f64 {
        self.engine().map_or(0.0, |e| e.current_time())
    }

    fn set_current_time(&self, time: f64) {
        match self.engine() {
            Some(engine) => engine.set_current_time(time),
            None => debug!("Ignoring seek while detached"),
        }
    }

    fn duration(&self) -> f64 {
        self.engine().map_or(f64::INFINITY, |e| e.duration())
    }

    fn set_duration(&self, duration: f64) {
        if let Some(engine) = self.engine() {
            engine.set_duration(duration);
        }
    }

    fn playback_rate(&self) -> f64 {
        let state = self.state.lock();
        match &state.engine {
            Some(engine) => engine.playback_rate(),
            None => state.pending.rate,
        }
    }

    fn set_playback_rate(&self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!("Ignoring invalid playback rate {}", rate);
            return;
        }

        let engine = {
            let mut state = self.state.lock();
            state.pending.rate = rate;
            state.engine.clone()
        };
        if let Some(engine) = engine {
            engine.set_playback_rate(rate);
        }
    }

    fn attach_source(&self, src: &str) -> bool {
        self.attach_with("direct-URL", || self.factory.create_source(src), |e| e.attach_source(src))
    }

    fn attach_mse(&self) -> bool {
        self.attach_with("buffer-based", || self.factory.create_mse(), |e| e.attach_mse())
    }

    fn add_mse_buffer(&self, mime: &str, is_video: bool, stream: Arc<ElementaryStream>) -> bool {
        self.engine()
            .is_some_and(|e| e.add_mse_buffer(mime, is_video, stream))
    }

    fn loaded_meta_data(&self, duration: f64) {
        if let Some(engine) = self.engine() {
            engine.loaded_meta_data(duration);
        }
    }

    fn mse_end_of_stream(&self) {
        if let Some(engine) = self.engine() {
            engine.mse_end_of_stream();
        }
    }

    fn set_eme_implementation(
        &self,
        key_system: &str,
        implementation: Option<Arc<dyn EmeImplementation>>,
    ) -> bool {
        match self.engine() {
            Some(engine) => engine.set_eme_implementation(key_system, implementation),
            None => {
                warn!("Cannot install a key system while detached");
                false
            }
        }
    }

    fn detach(&self) {
        let engine = {
            let mut state = self.state.lock();
            state.pending = Pending::new(&self.defaults);
            state.engine.take()
        };
        let Some(engine) = engine else {
            debug!("Detach while not attached");
            return;
        };

        info!("Detaching engine");
        engine.detach();
        engine.remove_client(&*self.clients);
    }
}
