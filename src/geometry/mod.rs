//! Geometry module for mediacore
//!
//! Exact rational arithmetic, pixel rectangles and the fill-mode placement
//! the rendering layer uses to position video frames.

mod fit;
mod rational;
mod rect;

pub use fit::fit_video_to_region;
pub use rational::Rational;
pub use rect::Rect;

use crate::utils::error::{MediaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a video frame is resized to fit a drawing region
///
/// The frame is always centered within the region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFillMode {
    /// Keep the aspect ratio and fit the whole frame; bars fill the rest
    #[default]
    MaintainRatio,

    /// Fill the region exactly, ignoring the aspect ratio
    Stretch,

    /// Keep the aspect ratio and cover the whole region; the frame is cropped
    Zoom,
}

impl fmt::Display for VideoFillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoFillMode::MaintainRatio => "maintain_ratio",
            VideoFillMode::Stretch => "stretch",
            VideoFillMode::Zoom => "zoom",
        };
        f.write_str(name)
    }
}

impl FromStr for VideoFillMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "maintain" | "maintain_ratio" | "maintain-ratio" => Ok(VideoFillMode::MaintainRatio),
            "stretch" => Ok(VideoFillMode::Stretch),
            "zoom" => Ok(VideoFillMode::Zoom),
            other => Err(MediaError::invalid_input(format!("unknown fill mode '{}'", other))),
        }
    }
}
