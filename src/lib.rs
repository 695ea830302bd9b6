//! mediacore - the backend-agnostic core of a media player
//!
//! The playback-engine contract ([`player::MediaPlayer`]) and its observer
//! model, the state enumerations engines report, the data handed between an
//! engine and its demuxer, decryption and rendering collaborators, and the
//! geometry that places decoded frames on screen.
//!
//! [`player::HeadlessMediaPlayer`] implements the whole contract on a
//! simulated clock and serves as the reference engine.
//! [`player::ProxyMediaPlayer`] picks an engine per session through a
//! [`player::PlayerFactory`].

pub mod geometry;
pub mod media;
pub mod player;
pub mod utils;

pub use geometry::{fit_video_to_region, Rational, Rect, VideoFillMode};
pub use player::{
    Client, ClientList, HeadlessMediaPlayer, MediaPlayer, PlayerFactory, ProxyMediaPlayer,
    VideoPlaybackState, VideoReadyState,
};
pub use utils::{Config, MediaError, Result};
