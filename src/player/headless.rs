//! Headless playback engine
//!
//! A complete [`MediaPlayer`] without a decoder or an output device. The
//! playhead runs on a simulated clock that the owner advances with
//! [`HeadlessMediaPlayer::tick`]; frames are pulled from the attached
//! elementary streams as it moves and counted as presented.

use crate::geometry::{Rational, VideoFillMode};
use crate::media::{
    intersect_ranges, BufferedRange, DecoderCapabilities, ElementaryStream, EmeImplementation,
    MediaCapabilitiesInfo, MediaDecodingConfiguration, MediaTrack, MediaTrackKind, StreamInfo,
    TextTrack, TextTrackKind,
};
use crate::player::client::{Client, ClientList};
use crate::player::state::{StateTracker, VideoPlaybackState, VideoReadyState};
use crate::player::{MediaPlayer, VideoPlaybackQuality};
use crate::utils::{BufferingConfig, Config, PlayerConfig};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// Tolerance for comparing playhead positions
const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Session {
    None,
    Mse,
    Source(String),
}

struct MseBuffer {
    is_video: bool,
    stream: Arc<ElementaryStream>,
}

struct EmeSlot {
    key_system: String,
    implementation: Arc<dyn EmeImplementation>,
}

/// Everything guarded by the engine lock
struct Inner {
    session: Session,
    state: StateTracker,
    play_requested: bool,
    metadata_loaded: bool,
    end_of_stream: bool,
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    fill_mode: VideoFillMode,
    buffers: Vec<MseBuffer>,
    audio_tracks: Vec<Arc<MediaTrack>>,
    video_tracks: Vec<Arc<MediaTrack>>,
    text_tracks: Vec<Arc<TextTrack>>,
    eme: Option<EmeSlot>,
    quality: VideoPlaybackQuality,
    next_track_id: u64,
}

impl Inner {
    fn new(defaults: &PlayerConfig) -> Self {
        Self {
            session: Session::None,
            state: StateTracker::new(defaults.default_playback_rate),
            play_requested: defaults.autoplay,
            metadata_loaded: false,
            end_of_stream: false,
            current_time: 0.0,
            duration: f64::INFINITY,
            volume: defaults.default_volume.clamp(0.0, 1.0),
            muted: false,
            fill_mode: defaults.fill_mode,
            buffers: Vec::new(),
            audio_tracks: Vec::new(),
            video_tracks: Vec::new(),
            text_tracks: Vec::new(),
            eme: None,
            quality: VideoPlaybackQuality::default(),
            next_track_id: 1,
        }
    }

    /// Forget the session; rendering settings survive
    fn reset_session(&mut self, defaults: &PlayerConfig) {
        self.session = Session::None;
        self.play_requested = defaults.autoplay;
        self.metadata_loaded = false;
        self.end_of_stream = false;
        self.current_time = 0.0;
        self.duration = f64::INFINITY;
        self.buffers.clear();
        self.eme = None;
        self.quality = VideoPlaybackQuality::default();
        self.state.reset_rate(defaults.default_playback_rate);
    }

    fn is_attached(&self) -> bool {
        self.session != Session::None
    }

    fn next_id(&mut self) -> String {
        let id = self.next_track_id;
        self.next_track_id += 1;
        id.to_string()
    }

    fn video_info(&self) -> Option<&Arc<StreamInfo>> {
        self.buffers
            .iter()
            .find(|b| b.is_video)
            .map(|b| b.stream.info())
    }

    fn buffered(&self) -> Vec<BufferedRange> {
        match self.session {
            Session::None => Vec::new(),
            // Direct-URL content is read on demand, so all of it counts as buffered.
            Session::Source(_) if self.metadata_loaded => vec![BufferedRange::new(0.0, self.duration)],
            Session::Source(_) => Vec::new(),
            Session::Mse => {
                let mut buffers = self.buffers.iter();
                let Some(first) = buffers.next() else {
                    return Vec::new();
                };
                buffers.fold(first.stream.buffered_ranges(), |ranges, buffer| {
                    intersect_ranges(&ranges, &buffer.stream.buffered_ranges())
                })
            }
        }
    }

    /// End of the buffered range that contains `time`
    fn buffered_end(&self, time: f64) -> Option<f64> {
        self.buffered()
            .into_iter()
            .find(|r| r.start <= time + EPSILON && time < r.end)
            .map(|r| r.end)
    }

    fn at_end(&self) -> bool {
        self.duration.is_finite() && self.current_time >= self.duration - EPSILON
    }

    /// How much data is available at the playhead
    fn available_data(&self, buffering: &BufferingConfig) -> VideoReadyState {
        if !self.metadata_loaded {
            return VideoReadyState::HaveNothing;
        }

        let ranges = self.buffered();
        let time = self.current_time;
        let Some(range) = ranges.iter().find(|r| r.start <= time + EPSILON && time < r.end) else {
            return VideoReadyState::HaveMetadata;
        };

        // Data that runs to the end of the content is always enough.
        let runs_to_end = match self.session {
            Session::Source(_) => true,
            Session::Mse => self.end_of_stream && ranges.last() == Some(range),
            Session::None => false,
        };

        let ahead = range.end - time;
        if ahead >= buffering.enough_data_secs || runs_to_end {
            VideoReadyState::HaveEnoughData
        } else if ahead >= buffering.future_data_secs {
            VideoReadyState::HaveFutureData
        } else {
            VideoReadyState::HaveCurrentData
        }
    }

    fn has_key(&self, key_id: &[u8]) -> bool {
        self.eme
            .as_ref()
            .is_some_and(|eme| eme.implementation.has_key(key_id))
    }

    /// Earliest time in `[start, end)` covered by a frame that cannot be decrypted
    fn first_blocked_time(&self, start: f64, end: f64) -> Option<f64> {
        self.buffers
            .iter()
            .flat_map(|b| b.stream.frames_overlapping(start, end))
            .filter(|f| f.key_id.as_deref().is_some_and(|id| !self.has_key(id)))
            .map(|f| f.pts.max(start))
            .reduce(f64::min)
    }

    fn key_blocked(&self) -> bool {
        self.first_blocked_time(self.current_time, self.current_time + EPSILON)
            .is_some()
    }

    /// Video frames presented in `[start, end)`
    fn video_frames_in(&self, start: f64, end: f64) -> u32 {
        let count: usize = self
            .buffers
            .iter()
            .filter(|b| b.is_video)
            .map(|b| {
                b.stream
                    .frames_overlapping(start, end)
                    .iter()
                    .filter(|f| f.pts >= start)
                    .count()
            })
            .sum();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Playback engine driven by an external clock
pub struct HeadlessMediaPlayer {
    clients: ClientList,
    capabilities: Arc<DecoderCapabilities>,
    supports_mse: bool,
    supports_src: bool,
    buffering: BufferingConfig,
    defaults: PlayerConfig,
    inner: Mutex<Inner>,
}

impl HeadlessMediaPlayer {
    /// Create a detached engine
    ///
    /// Codec, container and key-system support come from the process-wide
    /// [`DecoderCapabilities::process`]; `config.capabilities` only narrows
    /// which session types this engine accepts.
    pub fn new(config: &Config) -> Self {
        Self {
            clients: ClientList::new(),
            capabilities: DecoderCapabilities::process(),
            supports_mse: config.capabilities.supports_mse,
            supports_src: config.capabilities.supports_src,
            buffering: config.buffering.clone(),
            defaults: config.player.clone(),
            inner: Mutex::new(Inner::new(&config.player)),
        }
    }

    /// Advance the simulated clock
    ///
    /// While playing, the playhead moves by `elapsed` scaled by the playback
    /// rate, stopping early at the end of buffered data, at a frame whose
    /// key is missing, or at the duration.
    pub fn tick(&self, elapsed: Duration) {
        let mut inner = self.inner.lock();
        if !inner.is_attached() {
            return;
        }

        if inner.state.playback() == VideoPlaybackState::Playing {
            let delta = elapsed.as_secs_f64() * inner.state.rate();
            self.advance_playhead(&mut inner, delta);
        }
        self.evaluate(&mut inner);
    }

    /// Report an unrecoverable playback failure
    pub fn fail(&self, message: &str) {
        let mut inner = self.inner.lock();
        if !inner.is_attached() || inner.state.playback() == VideoPlaybackState::Errored {
            return;
        }

        error!("Playback failed: {}", message);
        if inner.state.set_playback_state(VideoPlaybackState::Errored, &self.clients) {
            self.clients.on_error(message);
        }
    }

    /// Re-check missing keys after the EME implementation loaded new ones
    pub fn keys_updated(&self) {
        let mut inner = self.inner.lock();
        self.evaluate(&mut inner);
    }

    /// Deliver an implementation-defined event to all clients
    pub fn raise_user_event(&self, name: &str, data: Option<&(dyn Any + Send + Sync)>) {
        let _inner = self.inner.lock();
        self.clients.on_user_event(name, data);
    }

    /// Remove a text track created with `add_text_track`
    pub fn remove_text_track(&self, track: &Arc<TextTrack>) -> bool {
        let mut inner = self.inner.lock();
        let Some(index) = inner.text_tracks.iter().position(|t| Arc::ptr_eq(t, track)) else {
            return false;
        };

        let removed = inner.text_tracks.remove(index);
        self.clients.on_remove_text_track(&removed);
        true
    }

    /// Pixel aspect ratio of the video; zero if unknown
    pub fn sample_aspect_ratio(&self) -> Rational<u32> {
        self.inner
            .lock()
            .video_info()
            .map(|info| info.sample_aspect_ratio)
            .unwrap_or_default()
    }

    pub fn fill_mode(&self) -> VideoFillMode {
        self.inner.lock().fill_mode
    }

    /// URL of the attached direct-URL content
    pub fn source(&self) -> Option<String> {
        match &self.inner.lock().session {
            Session::Source(src) => Some(src.clone()),
            _ => None,
        }
    }

    /// Key system of the installed EME implementation
    pub fn key_system(&self) -> Option<String> {
        self.inner.lock().eme.as_ref().map(|eme| eme.key_system.clone())
    }

    fn start_session(&self, inner: &mut Inner) {
        inner.state.reset_rate(self.defaults.default_playback_rate);
        inner.state.reset_ready_state(VideoReadyState::HaveNothing, &self.clients);
        inner.state.set_playback_state(VideoPlaybackState::Initializing, &self.clients);
    }

    fn enter(&self, inner: &mut Inner, next: VideoPlaybackState) {
        if inner.state.set_playback_state(next, &self.clients)
            && next == VideoPlaybackState::WaitingForKey
        {
            self.clients.on_waiting_for_key();
        }
    }

    /// State to continue in once the playhead has data
    fn resume_state(&self, inner: &Inner, available: VideoReadyState) -> VideoPlaybackState {
        if !inner.play_requested {
            VideoPlaybackState::Paused
        } else if inner.key_blocked() {
            VideoPlaybackState::WaitingForKey
        } else if available >= VideoReadyState::HaveFutureData {
            VideoPlaybackState::Playing
        } else {
            VideoPlaybackState::Buffering
        }
    }

    fn advance_playhead(&self, inner: &mut Inner, delta: f64) {
        let start = inner.current_time;
        let mut target = start + delta;
        if inner.duration.is_finite() {
            target = target.min(inner.duration);
        }

        let data_end = inner.buffered_end(start).unwrap_or(start);
        let stalled = target > data_end;
        target = target.min(data_end);

        let blocked = inner.first_blocked_time(start, target);
        if let Some(at) = blocked {
            target = at;
        }

        let frames = inner.video_frames_in(start, target);
        inner.quality.total_video_frames = inner.quality.total_video_frames.saturating_add(frames);
        inner.current_time = target;
        debug!("Playhead {:.3} -> {:.3} ({} frames)", start, target, frames);

        if blocked.is_some() {
            self.enter(inner, VideoPlaybackState::WaitingForKey);
        } else if inner.at_end() {
            self.enter(inner, VideoPlaybackState::Ended);
        } else if stalled {
            self.enter(inner, VideoPlaybackState::Buffering);
        }
    }

    /// Bring ready and playback state in line with the available data
    fn evaluate(&self, inner: &mut Inner) {
        use VideoPlaybackState::*;

        if !inner.is_attached() || inner.state.playback() == Errored {
            return;
        }

        let available = inner.available_data(&self.buffering);
        inner.state.advance_ready_state(available, &self.clients);

        let playback = inner.state.playback();
        if inner.at_end() && matches!(playback, Playing | Buffering | Seeking) {
            self.enter(inner, Ended);
            return;
        }

        let has_current = available >= VideoReadyState::HaveCurrentData;
        match playback {
            Initializing if has_current => {
                if !inner.play_requested {
                    self.enter(inner, Paused);
                } else if inner.state.set_playback_state(Playing, &self.clients) {
                    self.clients.on_play();
                }
            }
            Seeking if has_current => {
                let next = self.resume_state(inner, available);
                self.enter(inner, next);
            }
            Buffering if available >= VideoReadyState::HaveFutureData => {
                let next = self.resume_state(inner, available);
                self.enter(inner, next);
            }
            WaitingForKey if !inner.key_blocked() => {
                let next = self.resume_state(inner, available);
                self.enter(inner, next);
            }
            _ => {}
        }
    }
}

impl Default for HeadlessMediaPlayer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// `scheme://rest` with a non-empty scheme and rest
fn is_valid_url(src: &str) -> bool {
    let Some((scheme, rest)) = src.split_once("://") else {
        return false;
    };

    !rest.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl MediaPlayer for HeadlessMediaPlayer {
    fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo {
        self.capabilities.decoding_info(config)
    }

    fn video_playback_quality(&self) -> VideoPlaybackQuality {
        self.inner.lock().quality
    }

    fn add_client(&self, client: Arc<dyn Client>) {
        self.clients.add_client(client);
    }

    fn remove_client(&self, client: &dyn Client) {
        self.clients.remove_client(client);
    }

    fn buffered(&self) -> Vec<BufferedRange> {
        self.inner.lock().buffered()
    }

    fn ready_state(&self) -> VideoReadyState {
        self.inner.lock().state.ready()
    }

    fn playback_state(&self) -> VideoPlaybackState {
        self.inner.lock().state.playback()
    }

    fn audio_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.inner.lock().audio_tracks.clone()
    }

    fn video_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.inner.lock().video_tracks.clone()
    }

    fn text_tracks(&self) -> Vec<Arc<TextTrack>> {
        self.inner.lock().text_tracks.clone()
    }

    fn add_text_track(&self, kind: TextTrackKind, label: &str, language: &str) -> Option<Arc<TextTrack>> {
        let mut inner = self.inner.lock();
        if !inner.is_attached() {
            debug!("Cannot add a text track while detached");
            return None;
        }

        let id = inner.next_id();
        let track = Arc::new(TextTrack::new(kind, label, language, &id));
        inner.text_tracks.push(Arc::clone(&track));
        self.clients.on_add_text_track(&track);
        Some(track)
    }

    fn set_video_fill_mode(&self, mode: VideoFillMode) -> bool {
        self.inner.lock().fill_mode = mode;
        true
    }

    fn width(&self) -> u32 {
        self.inner.lock().video_info().map_or(0, |info| info.width)
    }

    fn height(&self) -> u32 {
        self.inner.lock().video_info().map_or(0, |info| info.height)
    }

    fn volume(&self) -> f64 {
        self.inner.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        self.inner.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn muted(&self) -> bool {
        self.inner.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        self.inner.lock().muted = muted;
    }

    fn play(&self) {
        use VideoPlaybackState::*;

        let mut inner = self.inner.lock();
        inner.play_requested = true;

        match inner.state.playback() {
            Paused => {
                let available = inner.available_data(&self.buffering);
                let next = self.resume_state(&inner, available);
                self.enter(&mut inner, next);
                self.clients.on_play();
            }
            Ended => {
                inner.current_time = 0.0;
                inner.state.set_playback_state(Seeking, &self.clients);
                self.clients.on_seeking();
                self.clients.on_play();
                self.evaluate(&mut inner);
            }
            Detached | Initializing => debug!("Play requested before content is ready"),
            _ => {}
        }
    }

    fn pause(&self) {
        use VideoPlaybackState::*;

        let mut inner = self.inner.lock();
        inner.play_requested = false;

        if matches!(inner.state.playback(), Playing | Buffering | WaitingForKey) {
            self.enter(&mut inner, Paused);
        }
    }

    fn current_time(&self) -> f64 {
        self.inner.lock().current_time
    }

    fn set_current_time(&self, time: f64) {
        let mut inner = self.inner.lock();
        if !inner.metadata_loaded || inner.state.playback() == VideoPlaybackState::Errored {
            debug!("Ignoring seek to {} before metadata", time);
            return;
        }
        if time.is_nan() {
            warn!("Ignoring seek to NaN");
            return;
        }

        let mut time = time.max(0.0);
        if inner.duration.is_finite() {
            time = time.min(inner.duration);
        }
        inner.current_time = time;

        if inner.state.playback() != VideoPlaybackState::Initializing {
            inner.state.set_playback_state(VideoPlaybackState::Seeking, &self.clients);
            self.clients.on_seeking();
        }
        self.evaluate(&mut inner);
    }

    fn duration(&self) -> f64 {
        self.inner.lock().duration
    }

    fn set_duration(&self, duration: f64) {
        let mut inner = self.inner.lock();
        if !inner.is_attached() {
            return;
        }
        if duration.is_nan() || duration < 0.0 {
            warn!("Ignoring invalid duration {}", duration);
            return;
        }

        inner.duration = duration;
        if inner.current_time > duration {
            inner.current_time = duration;
        }
        self.evaluate(&mut inner);
    }

    fn playback_rate(&self) -> f64 {
        let inner = self.inner.lock();
        if inner.is_attached() {
            inner.state.rate()
        } else {
            1.0
        }
    }

    fn set_playback_rate(&self, rate: f64) {
        let mut inner = self.inner.lock();
        if !inner.is_attached() {
            debug!("Ignoring playback rate while detached");
            return;
        }
        if !rate.is_finite() || rate <= 0.0 {
            warn!("Ignoring invalid playback rate {}", rate);
            return;
        }

        inner.state.set_rate(rate, &self.clients);
    }

    fn attach_source(&self, src: &str) -> bool {
        if !(self.supports_src && self.capabilities.supports_src()) {
            warn!("Direct-URL playback is not supported");
            return false;
        }
        if !is_valid_url(src) {
            warn!("Not a URL: '{}'", src);
            return false;
        }

        let mut inner = self.inner.lock();
        if inner.is_attached() {
            warn!("Already attached");
            return false;
        }

        info!("Attaching source {}", src);
        inner.session = Session::Source(src.to_string());
        self.clients.on_attach_source();
        self.start_session(&mut inner);
        true
    }

    fn attach_mse(&self) -> bool {
        if !(self.supports_mse && self.capabilities.supports_mse()) {
            warn!("Buffer-based playback is not supported");
            return false;
        }

        let mut inner = self.inner.lock();
        if inner.is_attached() {
            warn!("Already attached");
            return false;
        }

        info!("Attaching for buffer-based playback");
        inner.session = Session::Mse;
        self.clients.on_attach_mse();
        self.start_session(&mut inner);
        true
    }

    fn add_mse_buffer(&self, mime: &str, is_video: bool, stream: Arc<ElementaryStream>) -> bool {
        let mut inner = self.inner.lock();
        if inner.session != Session::Mse {
            warn!("Buffers can only be added to a buffer-based session");
            return false;
        }
        if inner.metadata_loaded {
            warn!("Buffers cannot be added after metadata is loaded");
            return false;
        }
        if let Err(e) = self.capabilities.check_type(mime) {
            warn!("Rejecting buffer '{}': {}", mime, e);
            return false;
        }

        let id = inner.next_id();
        let track = Arc::new(MediaTrack::new(MediaTrackKind::Main, &stream.info().codec, "", &id));
        debug!("Adding {} buffer {} as track {}", if is_video { "video" } else { "audio" }, mime, id);

        if is_video {
            track.set_enabled(inner.video_tracks.is_empty());
            inner.video_tracks.push(Arc::clone(&track));
            self.clients.on_add_video_track(&track);
        } else {
            track.set_enabled(inner.audio_tracks.is_empty());
            inner.audio_tracks.push(Arc::clone(&track));
            self.clients.on_add_audio_track(&track);
        }

        inner.buffers.push(MseBuffer { is_video, stream });
        true
    }

    fn loaded_meta_data(&self, duration: f64) {
        let mut inner = self.inner.lock();
        if !inner.is_attached() {
            return;
        }

        inner.duration = if duration.is_nan() { f64::INFINITY } else { duration.max(0.0) };
        inner.metadata_loaded = true;
        info!("Metadata loaded, duration {}", inner.duration);

        inner.state.advance_ready_state(VideoReadyState::HaveMetadata, &self.clients);
        self.evaluate(&mut inner);
    }

    fn mse_end_of_stream(&self) {
        let mut inner = self.inner.lock();
        if inner.session != Session::Mse {
            return;
        }

        inner.end_of_stream = true;
        if let Some(last) = inner.buffered().last() {
            if !inner.duration.is_finite() || inner.duration > last.end {
                debug!("Clamping duration to buffered end {}", last.end);
                inner.duration = last.end;
            }
        }
        self.evaluate(&mut inner);
    }

    fn set_eme_implementation(
        &self,
        key_system: &str,
        implementation: Option<Arc<dyn EmeImplementation>>,
    ) -> bool {
        let mut inner = self.inner.lock();

        let Some(implementation) = implementation else {
            inner.eme = None;
            return true;
        };
        if !self.capabilities.supports_key_system(key_system) {
            warn!("Key system '{}' is not supported", key_system);
            return false;
        }

        inner.eme = Some(EmeSlot {
            key_system: key_system.to_string(),
            implementation,
        });
        self.evaluate(&mut inner);
        true
    }

    fn detach(&self) {
        let mut inner = self.inner.lock();
        if !inner.is_attached() {
            debug!("Detach while not attached");
            return;
        }

        info!("Detaching");
        for track in std::mem::take(&mut inner.text_tracks) {
            self.clients.on_remove_text_track(&track);
        }
        for track in std::mem::take(&mut inner.audio_tracks) {
            self.clients.on_remove_audio_track(&track);
        }
        for track in std::mem::take(&mut inner.video_tracks) {
            self.clients.on_remove_video_track(&track);
        }

        inner.state.set_playback_state(VideoPlaybackState::Detached, &self.clients);
        inner.state.reset_ready_state(VideoReadyState::NotAttached, &self.clients);
        inner.reset_session(&self.defaults);
        self.clients.on_detach();
    }
}
