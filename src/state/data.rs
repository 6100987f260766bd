/// Shared data structures for the application state
///
/// These types flow between the capability layer (camera, picker,
/// recognizer) and the session that drives the UI.

use std::fmt;
use std::path::{Path, PathBuf};

/// Where an image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Picked from existing files
    Gallery,
    /// Freshly written by the camera program
    Camera,
}

/// Reference to an image on disk (not the bytes themselves)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    path: PathBuf,
    source: ImageSource,
}

impl ImageHandle {
    pub fn new(path: impl Into<PathBuf>, source: ImageSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    pub fn gallery(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ImageSource::Gallery)
    }

    pub fn camera(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ImageSource::Camera)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Tag attached to each recognition request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Camera permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

/// Result of one camera capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The pre-allocated file now holds the photo
    Captured(ImageHandle),
    /// Cancelled, failed, or the file could not be allocated
    Failed,
}

/// Result of one recognition request, as the UI sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Non-blank recognized text
    Text(String),
    /// The engine succeeded but found nothing (blank or whitespace only)
    Empty,
    /// The engine failed; carries a human-readable cause
    Failed(String),
}
