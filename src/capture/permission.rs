/// Camera permission gate
///
/// Desktop systems have no runtime camera permission, so the prompt is a
/// native yes/no dialog. A grant can be remembered in the user data
/// directory (~/.local/share/text-capture/permissions.json on Linux);
/// a denial never is.

use async_trait::async_trait;
use rfd::{AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use super::CameraPermission;
use crate::config;
use crate::state::data::PermissionState;

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Grants {
    camera: bool,
}

/// JSON file holding remembered grants
#[derive(Debug, Clone)]
pub struct GrantFile {
    path: PathBuf,
}

impl GrantFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        config::data_dir().join("permissions.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the camera grant was remembered. Unreadable means no.
    pub fn camera_granted(&self) -> bool {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|json| serde_json::from_str::<Grants>(&json).ok())
            .is_some_and(|grants| grants.camera)
    }

    pub async fn remember_camera(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&Grants { camera: true })?;
        tokio::fs::write(&self.path, json).await
    }
}

pub struct DialogPermission {
    granted: AtomicBool,
    grants: Option<GrantFile>,
}

impl DialogPermission {
    /// `grants` = None disables remembering
    pub fn new(grants: Option<GrantFile>) -> Self {
        let granted = grants.as_ref().is_some_and(GrantFile::camera_granted);
        if granted {
            tracing::debug!("camera permission previously granted");
        }

        Self {
            granted: AtomicBool::new(granted),
            grants,
        }
    }
}

#[async_trait]
impl CameraPermission for DialogPermission {
    fn check(&self) -> PermissionState {
        if self.granted.load(Ordering::Acquire) {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    async fn request(&self) -> PermissionState {
        let answer = AsyncMessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title("Permissão de câmera")
            .set_description("Permitir que o Text Capture use a câmera?")
            .set_buttons(MessageButtons::YesNo)
            .show()
            .await;

        if !matches!(answer, MessageDialogResult::Yes) {
            return PermissionState::Denied;
        }

        self.granted.store(true, Ordering::Release);

        if let Some(grants) = &self.grants {
            if let Err(e) = grants.remember_camera().await {
                tracing::warn!(path = %grants.path().display(), error = %e, "could not remember camera permission");
            }
        }

        PermissionState::Granted
    }
}
