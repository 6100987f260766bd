/// User settings
///
/// Read once at startup from `settings.json` in the user's config directory:
/// - Linux: ~/.config/text-capture/settings.json
/// - macOS: ~/Library/Application Support/text-capture/settings.json
/// - Windows: %APPDATA%\text-capture\settings.json
///
/// Every field has a default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Directory name used under the platform config/data/cache directories
pub const APP_DIR: &str = "text-capture";

/// Placeholder replaced by the capture destination in `camera.command`
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// How long a notice stays on screen
    pub notice_duration_ms: u64,
    pub camera: CameraSettings,
    pub captures: CaptureSettings,
    pub recognition: RecognitionSettings,
    pub permissions: PermissionSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    /// Program and arguments that write one photo to `{output}`
    pub command: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CaptureSettings {
    /// Where the capture subdirectory is created (None = cache directory)
    pub directory: Option<PathBuf>,
    /// Number of captures kept on disk
    pub max_files: usize,
    /// Delete every capture when the window closes
    pub purge_on_exit: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Text detection model (None = data directory)
    pub detection_model: Option<PathBuf>,
    /// Text recognition model (None = data directory)
    pub recognition_model: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PermissionSettings {
    /// Remember a granted camera permission across restarts
    pub remember_grant: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            // Same as a short Android toast
            notice_duration_ms: 2000,
            camera: CameraSettings::default(),
            captures: CaptureSettings::default(),
            recognition: RecognitionSettings::default(),
            permissions: PermissionSettings::default(),
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            command: ["fswebcam", "--no-banner", "-r", "1280x720", OUTPUT_PLACEHOLDER]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            directory: None,
            max_files: 5,
            purge_on_exit: true,
        }
    }
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self { remember_grant: true }
    }
}

impl Settings {
    /// Load settings from the default location.
    /// A missing file is not an error: defaults are returned.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the path where the settings file is expected
    pub fn path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push(APP_DIR);
        path.push("settings.json");
        Some(path)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    /// Location the capture store works under, falling back to
    /// ~/.cache/text-capture. Captures go in a subdirectory of it.
    pub fn capture_dir(&self) -> PathBuf {
        if let Some(dir) = &self.captures.directory {
            return dir.clone();
        }

        let mut path = dirs_next::cache_dir()
            .or_else(dirs_next::home_dir)
            .unwrap_or_else(std::env::temp_dir);
        path.push(APP_DIR);
        path
    }

    /// Detection model path, falling back to the data directory
    pub fn detection_model(&self) -> PathBuf {
        self.recognition
            .detection_model
            .clone()
            .unwrap_or_else(|| data_dir().join("models").join("text-detection.rten"))
    }

    /// Recognition model path, falling back to the data directory
    pub fn recognition_model(&self) -> PathBuf {
        self.recognition
            .recognition_model
            .clone()
            .unwrap_or_else(|| data_dir().join("models").join("text-recognition.rten"))
    }
}

/// ~/.local/share/text-capture on Linux
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir);
    path.push(APP_DIR);
    path
}
