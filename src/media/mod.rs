//! Media module for mediacore
//!
//! Data shared between a playback engine and its collaborators: tracks and
//! cues, demuxed elementary streams, capability queries and the encrypted
//! media hooks.

pub mod capabilities;
pub mod eme;
pub mod streams;
pub mod text_track;
pub mod track;
pub mod vtt_cue;

pub use capabilities::{
    AudioConfiguration, DecoderCapabilities, MediaCapabilitiesInfo, MediaDecodingConfiguration,
    MediaDecodingType, MimeType, VideoConfiguration,
};
pub use eme::EmeImplementation;
pub use streams::{
    intersect_ranges, BufferedRange, ElementaryStream, EncodedFrame, FrameLocation, StreamInfo,
    MAX_GAP_SIZE,
};
pub use text_track::{TextTrack, TextTrackClient, TextTrackKind, TextTrackMode};
pub use track::{MediaTrack, MediaTrackKind};
pub use vtt_cue::VttCue;
