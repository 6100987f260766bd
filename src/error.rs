/// Error types shared across the application
///
/// None of these are fatal: every one of them ends the current user
/// action and is surfaced as a notice.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while managing capture files on disk
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture directory {path} is unavailable: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not allocate a capture file: {0}")]
    Allocate(#[source] std::io::Error),
}

/// Failure of a single recognition request
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    #[error("OCR models unavailable: {0}")]
    Models(String),

    #[error("could not open image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("{0}")]
    Engine(String),

    #[error("recognition worker stopped: {0}")]
    Worker(String),
}
