/// Image acquisition and the platform capabilities behind it
///
/// This module handles:
/// - The camera permission gate (permission.rs)
/// - Picking an existing image (gallery.rs)
/// - Capturing a new photo with an external program (camera.rs)
/// - Ownership of captured files (store.rs)
///
/// Each capability is a trait so the session can be driven with fakes.

pub mod camera;
pub mod gallery;
pub mod permission;
pub mod store;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::ocr::Recognizer;
use crate::state::data::{CaptureOutcome, ImageHandle, PermissionState, RecognitionOutcome};
use crate::state::session::{Effect, Event};

pub use camera::CommandCamera;
pub use gallery::FileDialogPicker;
pub use permission::{DialogPermission, GrantFile};
pub use store::CaptureStore;

#[async_trait]
pub trait CameraPermission: Send + Sync {
    /// Current state, without prompting
    fn check(&self) -> PermissionState;

    /// Prompt the user
    async fn request(&self) -> PermissionState;
}

#[async_trait]
pub trait ImagePicker: Send + Sync {
    /// None when the user cancels
    async fn pick(&self) -> Option<ImageHandle>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// Write one photo to `destination`. True means the file is populated.
    async fn capture(&self, destination: &Path) -> bool;
}

/// Everything the session's effects need from the outside world
#[derive(Clone)]
pub struct Capabilities {
    pub permission: Arc<dyn CameraPermission>,
    pub picker: Arc<dyn ImagePicker>,
    pub camera: Arc<dyn Camera>,
    pub store: Arc<CaptureStore>,
    pub recognizer: Arc<dyn Recognizer>,
}

impl Capabilities {
    /// Run one effect and report what happened
    pub async fn perform(&self, effect: Effect) -> Event {
        match effect {
            Effect::EnsureCameraPermission => {
                Event::PermissionResolved(self.ensure_permission().await)
            }
            Effect::CaptureFromCamera => Event::CaptureFinished(self.capture().await),
            Effect::PickImage => Event::ImagePicked(self.picker.pick().await),
            Effect::Recognize { request, image } => {
                let result = self.recognizer.recognize(&image).await;
                Event::Recognized {
                    request,
                    outcome: RecognitionOutcome::from_result(result),
                }
            }
        }
    }

    async fn ensure_permission(&self) -> PermissionState {
        match self.permission.check() {
            PermissionState::Granted => PermissionState::Granted,
            PermissionState::Denied => self.permission.request().await,
        }
    }

    async fn capture(&self) -> CaptureOutcome {
        let destination = match self.store.allocate() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "treating capture as failed");
                return CaptureOutcome::Failed;
            }
        };

        if self.camera.capture(&destination).await && is_populated(&destination).await {
            tracing::info!(path = %destination.display(), "photo captured");
            return CaptureOutcome::Captured(ImageHandle::camera(destination));
        }

        self.store.discard(&destination);
        CaptureOutcome::Failed
    }
}

async fn is_populated(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|m| m.len() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use crate::state::data::RequestId;
    use crate::state::notice;
    use crate::state::session::Session;
    use std::collections::{HashMap, VecDeque};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakePermission {
        granted: AtomicBool,
        answer: PermissionState,
        prompts: AtomicUsize,
    }

    #[async_trait]
    impl CameraPermission for FakePermission {
        fn check(&self) -> PermissionState {
            if self.granted.load(Ordering::SeqCst) {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            }
        }

        async fn request(&self) -> PermissionState {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            if self.answer.is_granted() {
                self.granted.store(true, Ordering::SeqCst);
            }
            self.answer
        }
    }

    struct FakePicker {
        picks: Mutex<VecDeque<Option<PathBuf>>>,
    }

    #[async_trait]
    impl ImagePicker for FakePicker {
        async fn pick(&self) -> Option<ImageHandle> {
            self.picks
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .map(ImageHandle::gallery)
        }
    }

    /// Writes `bytes` to the destination and reports `succeeds`
    struct FakeCamera {
        succeeds: bool,
        bytes: &'static [u8],
        shots: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Camera for FakeCamera {
        async fn capture(&self, destination: &Path) -> bool {
            self.shots.lock().unwrap().push(destination.to_path_buf());
            std::fs::write(destination, self.bytes).unwrap();
            self.succeeds
        }
    }

    /// Recognizes text by file name
    struct FakeRecognizer {
        texts: HashMap<String, Result<String, RecognitionError>>,
    }

    #[async_trait]
    impl Recognizer for FakeRecognizer {
        async fn recognize(&self, image: &ImageHandle) -> Result<String, RecognitionError> {
            let name = image
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.texts.get(&name).cloned().unwrap_or(Ok(String::new()))
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        permission: Arc<FakePermission>,
        camera: Arc<FakeCamera>,
        caps: Capabilities,
        session: Session,
    }

    struct Setup {
        granted: bool,
        answer: PermissionState,
        camera_succeeds: bool,
        camera_bytes: &'static [u8],
        picks: Vec<Option<&'static str>>,
        texts: Vec<(&'static str, Result<String, RecognitionError>)>,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                granted: false,
                answer: PermissionState::Granted,
                camera_succeeds: true,
                camera_bytes: b"jpeg",
                picks: Vec::new(),
                texts: Vec::new(),
            }
        }
    }

    impl Harness {
        fn new(setup: Setup) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let permission = Arc::new(FakePermission {
                granted: AtomicBool::new(setup.granted),
                answer: setup.answer,
                prompts: AtomicUsize::new(0),
            });
            let camera = Arc::new(FakeCamera {
                succeeds: setup.camera_succeeds,
                bytes: setup.camera_bytes,
                shots: Mutex::new(Vec::new()),
            });
            let picker = Arc::new(FakePicker {
                picks: Mutex::new(
                    setup
                        .picks
                        .into_iter()
                        .map(|p| p.map(|name| dir.path().join(name)))
                        .collect(),
                ),
            });
            let recognizer = Arc::new(FakeRecognizer {
                texts: setup
                    .texts
                    .into_iter()
                    .map(|(name, text)| (name.to_string(), text))
                    .collect(),
            });
            let store = Arc::new(CaptureStore::new(dir.path().join("captures"), 5));

            let caps = Capabilities {
                permission: permission.clone(),
                picker,
                camera: camera.clone(),
                store,
                recognizer,
            };

            Self {
                _dir: dir,
                permission,
                camera,
                caps,
                session: Session::new(),
            }
        }

        /// Feed a user action through the session until it settles
        async fn run(&mut self, action: Event) {
            let mut effect = self.session.handle(action);
            while let Some(next) = effect {
                let event = self.caps.perform(next).await;
                effect = self.session.handle(event);
            }
        }

        fn notice(&self) -> Option<&str> {
            self.session.notice().map(|n| n.message.as_str())
        }

        fn prompts(&self) -> usize {
            self.permission.prompts.load(Ordering::SeqCst)
        }

        fn shots(&self) -> Vec<PathBuf> {
            self.camera.shots.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_gallery_image_text_is_displayed() {
        let mut harness = Harness::new(Setup {
            picks: vec![Some("cat.jpg")],
            texts: vec![("cat.jpg", Ok("MEOW".to_string()))],
            ..Setup::default()
        });

        harness.run(Event::PickFromGallery).await;

        assert_eq!(harness.session.text(), "MEOW");
        assert!(harness.session.image().unwrap().path().ends_with("cat.jpg"));
        assert_eq!(harness.notice(), None);
        assert_eq!(harness.prompts(), 0, "the gallery needs no permission");
    }

    #[tokio::test]
    async fn test_granted_permission_never_prompts() {
        let mut harness = Harness::new(Setup {
            granted: true,
            ..Setup::default()
        });

        harness.run(Event::TakePicture).await;
        harness.run(Event::TakePicture).await;

        assert_eq!(harness.prompts(), 0);
        assert_eq!(harness.shots().len(), 2);
    }

    #[tokio::test]
    async fn test_prompt_only_until_granted() {
        let mut harness = Harness::new(Setup::default());

        harness.run(Event::TakePicture).await;
        harness.run(Event::TakePicture).await;

        assert_eq!(harness.prompts(), 1);
    }

    #[tokio::test]
    async fn test_denied_permission_halts_capture() {
        let mut harness = Harness::new(Setup {
            answer: PermissionState::Denied,
            ..Setup::default()
        });

        harness.run(Event::TakePicture).await;

        assert!(harness.shots().is_empty());
        assert!(harness.session.image().is_none());
        assert_eq!(harness.notice(), Some(notice::PERMISSION_DENIED));
        assert!(!harness.session.is_acquiring());
    }

    #[tokio::test]
    async fn test_capture_failure_shows_notice_and_discards_file() {
        let mut harness = Harness::new(Setup {
            granted: true,
            camera_succeeds: false,
            ..Setup::default()
        });

        harness.run(Event::TakePicture).await;

        assert_eq!(harness.notice(), Some("Erro ao capturar a imagem"));
        assert_eq!(harness.session.text(), "");
        assert!(harness.session.image().is_none());
        assert!(!harness.shots()[0].exists());
    }

    #[tokio::test]
    async fn test_empty_capture_counts_as_failure() {
        let mut harness = Harness::new(Setup {
            granted: true,
            camera_bytes: b"",
            ..Setup::default()
        });

        harness.run(Event::TakePicture).await;

        assert_eq!(harness.notice(), Some(notice::CAPTURE_FAILED));
        assert!(harness.session.image().is_none());
    }

    #[tokio::test]
    async fn test_captured_photo_is_recognized() {
        let mut harness = Harness::new(Setup {
            granted: true,
            ..Setup::default()
        });

        // The camera path goes through the store, so the fake recognizer
        // sees an unknown name and finds nothing
        harness.run(Event::TakePicture).await;

        let image = harness.session.image().unwrap();
        assert_eq!(image.path(), harness.shots()[0].as_path());
        assert_eq!(harness.notice(), Some(notice::NO_TEXT_FOUND));
    }

    #[tokio::test]
    async fn test_cancelled_selection_keeps_screen() {
        let mut harness = Harness::new(Setup {
            picks: vec![Some("cat.jpg"), None],
            texts: vec![("cat.jpg", Ok("MEOW".to_string()))],
            ..Setup::default()
        });

        harness.run(Event::PickFromGallery).await;
        harness.run(Event::PickFromGallery).await;

        assert_eq!(harness.session.text(), "MEOW");
        assert!(harness.session.image().unwrap().path().ends_with("cat.jpg"));
        assert_eq!(harness.notice(), Some(notice::NO_IMAGE_SELECTED));
    }

    #[tokio::test]
    async fn test_whitespace_result_keeps_text() {
        let mut harness = Harness::new(Setup {
            picks: vec![Some("cat.jpg"), Some("blank.png")],
            texts: vec![
                ("cat.jpg", Ok("MEOW".to_string())),
                ("blank.png", Ok("  \n ".to_string())),
            ],
            ..Setup::default()
        });

        harness.run(Event::PickFromGallery).await;
        harness.run(Event::PickFromGallery).await;

        assert_eq!(harness.session.text(), "MEOW");
        assert_eq!(harness.notice(), Some("Nenhum texto encontrado"));
    }

    #[tokio::test]
    async fn test_recognition_error_keeps_text() {
        let mut harness = Harness::new(Setup {
            picks: vec![Some("cat.jpg"), Some("broken.png")],
            texts: vec![
                ("cat.jpg", Ok("MEOW".to_string())),
                (
                    "broken.png",
                    Err(RecognitionError::Engine("failed to detect words".to_string())),
                ),
            ],
            ..Setup::default()
        });

        harness.run(Event::PickFromGallery).await;
        harness.run(Event::PickFromGallery).await;

        assert_eq!(harness.session.text(), "MEOW");
        assert_eq!(
            harness.notice(),
            Some("Erro ao reconhecer o texto: failed to detect words")
        );
    }

    #[tokio::test]
    async fn test_late_result_for_replaced_image_is_discarded() {
        let mut harness = Harness::new(Setup {
            picks: vec![Some("first.png"), Some("second.png")],
            texts: vec![
                ("first.png", Ok("FIRST".to_string())),
                ("second.png", Ok("SECOND".to_string())),
            ],
            ..Setup::default()
        });

        // Start two selections without letting the first recognition finish
        let pick = harness.session.handle(Event::PickFromGallery).unwrap();
        let picked = harness.caps.perform(pick).await;
        let first = harness.session.handle(picked).unwrap();

        let pick = harness.session.handle(Event::PickFromGallery).unwrap();
        let picked = harness.caps.perform(pick).await;
        let second = harness.session.handle(picked).unwrap();

        let second_done = harness.caps.perform(second).await;
        let first_done = harness.caps.perform(first).await;
        assert!(matches!(
            first_done,
            Event::Recognized { request: RequestId(1), .. }
        ));

        harness.session.handle(second_done);
        harness.session.handle(first_done);

        assert_eq!(harness.session.text(), "SECOND");
        assert!(harness.session.image().unwrap().path().ends_with("second.png"));
        assert!(!harness.session.is_recognizing());
    }
}
