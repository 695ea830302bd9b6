//! Error types for mediacore
//!
//! The playback contract itself reports "unsupported" through `bool` returns
//! and playback failures through the observer callbacks. This error type
//! covers the library plumbing around it: configuration, parsing and
//! conversions. We use thiserror for the library and anyhow in the binary.

use thiserror::Error;

/// Main error type for mediacore
#[derive(Error, Debug)]
pub enum MediaError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation or content not supported
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Operation not valid in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl MediaError {
    /// Create an invalid input error from string
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        MediaError::InvalidInput(msg.into())
    }
}

/// Convenience type alias for Results in mediacore
pub type Result<T> = std::result::Result<T, MediaError>;

/// Extension trait for converting other errors to MediaError
pub trait ResultExt<T> {
    /// Convert this error into a `MediaError::Config` with the given context
    fn config_err(self, context: &str) -> Result<T>;

    /// Convert this error into a `MediaError::InvalidInput` with the given context
    fn input_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MediaError::Config(format!("{}: {}", context, e)))
    }

    fn input_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MediaError::InvalidInput(format!("{}: {}", context, e)))
    }
}
