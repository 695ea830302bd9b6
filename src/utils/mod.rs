//! Utility module for mediacore
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Weak observer registration shared by the observer lists
//! - Common helper functions

pub mod config;
pub mod error;
pub mod observer;

// Re-export commonly used items
pub use config::{BufferingConfig, CapabilitiesConfig, Config, GeneralConfig, PlayerConfig};
pub use error::{MediaError, Result, ResultExt};
pub use observer::ObserverSet;

/// Format a media time in seconds for display
///
/// # Arguments
///
/// * `seconds` - Media time; infinite or NaN values mean "unknown"
///
/// # Returns
///
/// Formatted string in the format "HH:MM:SS.mmm" or "MM:SS.mmm" for times under an hour
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }

    let total_ms = (seconds * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, secs, millis)
    }
}
