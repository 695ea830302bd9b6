//! Configuration management for mediacore
//!
//! This module handles loading and managing the engine configuration
//! from config files and environment variables.

use crate::geometry::VideoFillMode;
use crate::utils::error::{MediaError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "MEDIACORE_";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback defaults
    pub player: PlayerConfig,

    /// Ready-state thresholds
    pub buffering: BufferingConfig,

    /// What the engines report as decodable
    pub capabilities: CapabilitiesConfig,

    /// General settings
    pub general: GeneralConfig,
}

/// Playback defaults applied to a new engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial volume (0.0 - 1.0)
    pub default_volume: f64,

    /// Initial playback rate
    pub default_playback_rate: f64,

    /// Initial fill mode
    pub fill_mode: VideoFillMode,

    /// Start playing as soon as content is available
    pub autoplay: bool,
}

/// Buffered-ahead thresholds, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferingConfig {
    /// Buffered time ahead of the playhead needed for `HaveFutureData`
    pub future_data_secs: f64,

    /// Buffered time ahead of the playhead needed for `HaveEnoughData`
    pub enough_data_secs: f64,
}

/// Decoder capabilities shared by every engine in the process
///
/// Installed once with `DecoderCapabilities::init`; an engine built from a
/// config reads only `supports_mse` and `supports_src` to gate its sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    /// Buffer-based playback is available
    pub supports_mse: bool,

    /// Direct-URL playback is available
    pub supports_src: bool,

    /// Container MIME types (without parameters)
    pub containers: Vec<String>,

    /// Codec prefixes, matched against the part before the first '.'
    pub codecs: Vec<String>,

    /// Largest decodable frame
    pub max_width: u32,
    pub max_height: u32,

    /// Frame rates above this are reported as not smooth
    pub max_smooth_framerate: f64,

    /// Frames above this many pixels are reported as not power efficient
    pub max_efficient_pixels: u64,

    /// Key systems an EME implementation may be installed for
    pub key_systems: Vec<String>,
}

/// General application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            default_playback_rate: 1.0,
            fill_mode: VideoFillMode::MaintainRatio,
            autoplay: false,
        }
    }
}

impl Default for BufferingConfig {
    fn default() -> Self {
        Self {
            future_data_secs: 0.5,
            enough_data_secs: 5.0,
        }
    }
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            supports_mse: true,
            supports_src: true,
            containers: ["video/mp4", "audio/mp4", "video/webm", "audio/webm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            codecs: ["avc1", "avc3", "hev1", "hvc1", "vp8", "vp9", "vp09", "av01", "mp4a", "opus", "vorbis"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_width: 3840,
            max_height: 2160,
            max_smooth_framerate: 60.0,
            max_efficient_pixels: 1920 * 1080,
            key_systems: vec!["org.w3.clearkey".to_string()],
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the user config file and the environment
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. User config file (~/.config/mediacore/config.toml on Linux)
    /// 3. Environment variables (MEDIACORE_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = match Self::user_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from an explicit file, then apply the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .config_err("Failed to read config file")?;

        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Save configuration to the given file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| MediaError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Apply overrides looked up by variable name
    ///
    /// `lookup` receives full variable names such as `MEDIACORE_VOLUME`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(volume) = var("VOLUME") {
            self.player.default_volume = volume
                .parse()
                .config_err("Invalid MEDIACORE_VOLUME")?;
        }

        if let Some(rate) = var("PLAYBACK_RATE") {
            self.player.default_playback_rate = rate
                .parse()
                .config_err("Invalid MEDIACORE_PLAYBACK_RATE")?;
        }

        if let Some(log_level) = var("LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.player.default_volume) {
            return Err(MediaError::Config("Volume must be between 0.0 and 1.0".to_string()));
        }

        let rate = self.player.default_playback_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(MediaError::Config(format!("Invalid playback rate {}", rate)));
        }

        let buffering = &self.buffering;
        if buffering.future_data_secs < 0.0 || buffering.enough_data_secs < buffering.future_data_secs {
            return Err(MediaError::Config(
                "Buffering thresholds must satisfy 0 <= future_data_secs <= enough_data_secs".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(MediaError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level,
                valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mediacore").join("config.toml"))
    }
}
