//! Decoding capability queries
//!
//! [`DecoderCapabilities`] is derived from configuration only, so every
//! engine built from the same config gives the same answers. That is what
//! lets support checks ask any live engine before a specific one is chosen.

use crate::media::eme::{MediaKeyInitDataType, MediaKeySessionType, MediaKeysRequirement};
use crate::utils::{CapabilitiesConfig, MediaError, Result};
use log::debug;
use once_cell::sync::OnceCell;
use std::ops::BitAnd;
use std::str::FromStr;
use std::sync::Arc;

/// Where the content being queried will come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaDecodingType {
    /// Direct-URL playback
    File,
    /// Buffer-based playback
    #[default]
    MediaSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HdrMetadataType {
    #[default]
    Unspecified,
    SmpteSt2086,
    SmpteSt2094_10,
    SmpteSt2094_40,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorGamut {
    #[default]
    Unspecified,
    Srgb,
    P3,
    Rec2020,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransferFunction {
    #[default]
    Unspecified,
    Srgb,
    Pq,
    Hlg,
}

/// Video half of a decoding query; an empty `content_type` means "no video"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoConfiguration {
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub bitrate: u64,
    pub framerate: f64,
    pub has_alpha_channel: bool,
    pub hdr_metadata_type: HdrMetadataType,
    pub color_gamut: ColorGamut,
    pub transfer_function: TransferFunction,
}

/// Audio half of a decoding query; an empty `content_type` means "no audio"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioConfiguration {
    pub content_type: String,
    pub channels: String,
    pub bitrate: u64,
    pub samplerate: u32,
    pub spatial_rendering: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySystemTrackConfiguration {
    pub robustness: String,
}

/// Encryption half of a decoding query; an empty `key_system` means clear content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaCapabilitiesKeySystemConfiguration {
    pub key_system: String,
    pub init_data_type: MediaKeyInitDataType,
    pub distinctive_identifier: MediaKeysRequirement,
    pub persistent_state: MediaKeysRequirement,
    pub session_types: Vec<MediaKeySessionType>,
    pub audio: KeySystemTrackConfiguration,
    pub video: KeySystemTrackConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaDecodingConfiguration {
    pub decoding_type: MediaDecodingType,
    pub video: VideoConfiguration,
    pub audio: AudioConfiguration,
    pub key_system_configuration: MediaCapabilitiesKeySystemConfiguration,
}

/// Answer to a decoding query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MediaCapabilitiesInfo {
    pub supported: bool,
    pub smooth: bool,
    pub power_efficient: bool,
}

impl MediaCapabilitiesInfo {
    pub const fn unsupported() -> Self {
        Self {
            supported: false,
            smooth: false,
            power_efficient: false,
        }
    }
}

/// Both halves must allow a property for the combination to allow it
impl BitAnd for MediaCapabilitiesInfo {
    type Output = Self;

    fn bitand(self, other: Self) -> Self {
        Self {
            supported: self.supported && other.supported,
            smooth: self.smooth && other.smooth,
            power_efficient: self.power_efficient && other.power_efficient,
        }
    }
}

/// A parsed MIME type such as `video/mp4; codecs="avc1.42E01E,mp4a.40.2"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    /// `type/subtype`, lower-cased
    pub essence: String,
    pub codecs: Vec<String>,
}

impl FromStr for MimeType {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

        match essence.split_once('/') {
            Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() => {}
            _ => return Err(MediaError::invalid_input(format!("malformed MIME type '{}'", s))),
        }

        let mut codecs = Vec::new();
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("codecs") {
                codecs = value
                    .trim()
                    .trim_matches('"')
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
            }
        }

        Ok(Self { essence, codecs })
    }
}

static PROCESS: OnceCell<Arc<DecoderCapabilities>> = OnceCell::new();

/// Decoder capabilities of this process
#[derive(Debug, Clone)]
pub struct DecoderCapabilities {
    config: CapabilitiesConfig,
}

impl DecoderCapabilities {
    pub fn new(config: CapabilitiesConfig) -> Self {
        Self { config }
    }

    /// Fix the capabilities every engine in the process answers with
    ///
    /// Only the first call wins, and only if no engine has read them yet.
    /// Returns whether `config` was installed.
    pub fn init(config: CapabilitiesConfig) -> bool {
        let installed = PROCESS.set(Arc::new(Self::new(config))).is_ok();
        if !installed {
            debug!("Process capabilities already fixed");
        }
        installed
    }

    /// The process-wide capabilities; the defaults unless `init` ran first
    pub fn process() -> Arc<DecoderCapabilities> {
        Arc::clone(PROCESS.get_or_init(|| Arc::new(Self::default())))
    }

    pub fn supports_mse(&self) -> bool {
        self.config.supports_mse
    }

    pub fn supports_src(&self) -> bool {
        self.config.supports_src
    }

    pub fn supports_key_system(&self, key_system: &str) -> bool {
        self.config.key_systems.iter().any(|k| k == key_system)
    }

    /// Parse `mime` and check its container and every codec in it
    pub fn check_type(&self, mime: &str) -> Result<MimeType> {
        let parsed: MimeType = mime.parse()?;

        if !self.config.containers.iter().any(|c| c.eq_ignore_ascii_case(&parsed.essence)) {
            return Err(MediaError::Unsupported(format!("container '{}'", parsed.essence)));
        }

        for codec in &parsed.codecs {
            let prefix = codec.split('.').next().unwrap_or_default();
            if !self.config.codecs.iter().any(|c| c.eq_ignore_ascii_case(prefix)) {
                return Err(MediaError::Unsupported(format!("codec '{}'", codec)));
            }
        }

        Ok(parsed)
    }

    /// Whether content of the given MIME type can be decoded
    pub fn is_type_supported(&self, mime: &str) -> bool {
        match self.check_type(mime) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Type '{}' not supported: {}", mime, e);
                false
            }
        }
    }

    /// Answer a decoding query
    pub fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo {
        let has_video = !config.video.content_type.is_empty();
        let has_audio = !config.audio.content_type.is_empty();
        if !has_video && !has_audio {
            return MediaCapabilitiesInfo::unsupported();
        }

        let type_ok = match config.decoding_type {
            MediaDecodingType::File => self.config.supports_src,
            MediaDecodingType::MediaSource => self.config.supports_mse,
        };
        let key_system = &config.key_system_configuration.key_system;
        if !type_ok || (!key_system.is_empty() && !self.supports_key_system(key_system)) {
            return MediaCapabilitiesInfo::unsupported();
        }

        let mut info = MediaCapabilitiesInfo {
            supported: true,
            smooth: true,
            power_efficient: true,
        };
        if has_video {
            info = info & self.video_info(&config.video);
        }
        if has_audio {
            info = info & self.audio_info(&config.audio);
        }

        if info.supported {
            info
        } else {
            MediaCapabilitiesInfo::unsupported()
        }
    }

    fn video_info(&self, video: &VideoConfiguration) -> MediaCapabilitiesInfo {
        let supported = self.is_type_supported(&video.content_type)
            && video.width <= self.config.max_width
            && video.height <= self.config.max_height;

        // Zero means the caller did not say.
        let smooth = video.framerate <= 0.0 || video.framerate <= self.config.max_smooth_framerate;
        let pixels = u64::from(video.width) * u64::from(video.height);

        MediaCapabilitiesInfo {
            supported,
            smooth,
            power_efficient: pixels <= self.config.max_efficient_pixels,
        }
    }

    fn audio_info(&self, audio: &AudioConfiguration) -> MediaCapabilitiesInfo {
        MediaCapabilitiesInfo {
            supported: self.is_type_supported(&audio.content_type),
            smooth: true,
            power_efficient: true,
        }
    }
}

impl Default for DecoderCapabilities {
    fn default() -> Self {
        Self::new(CapabilitiesConfig::default())
    }
}
