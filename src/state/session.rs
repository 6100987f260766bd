/// The screen's orchestration logic, without any I/O
///
/// `Session::handle` takes an event (a button press or the result of some
/// background work) and returns the effect to run next, if any. Effects are
/// executed by `capture::Capabilities`, whose result comes back as another
/// event. The iced shell only wires the two together, so the whole flow can
/// be driven headlessly in tests.

use std::time::{Duration, Instant};

use super::data::{
    CaptureOutcome, ImageHandle, ImageSource, PermissionState, RecognitionOutcome, RequestId,
};
use super::notice::{self, Notice};

/// Things that happen to the session
#[derive(Debug, Clone)]
pub enum Event {
    /// User pressed the camera trigger
    TakePicture,
    /// User pressed the gallery trigger
    PickFromGallery,
    /// Camera permission check/prompt finished
    PermissionResolved(PermissionState),
    /// Camera program returned
    CaptureFinished(CaptureOutcome),
    /// File picker returned (None = cancelled)
    ImagePicked(Option<ImageHandle>),
    /// Recognition finished for the request it was issued as
    Recognized {
        request: RequestId,
        outcome: RecognitionOutcome,
    },
}

/// Background work the session asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    EnsureCameraPermission,
    CaptureFromCamera,
    PickImage,
    Recognize {
        request: RequestId,
        image: ImageHandle,
    },
}

/// What the session is waiting on before it has an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Permission,
    Image(ImageSource),
}

/// The image on screen and the recognition request issued for it
#[derive(Debug, Clone)]
struct Current {
    image: ImageHandle,
    request: RequestId,
    pending: bool,
}

#[derive(Debug, Default)]
pub struct Session {
    current: Option<Current>,
    text: String,
    acquiring: Option<Acquisition>,
    notice: Option<Notice>,
    next_request: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event and return the effect to run next
    pub fn handle(&mut self, event: Event) -> Option<Effect> {
        match event {
            Event::TakePicture => {
                self.begin(Acquisition::Permission, Effect::EnsureCameraPermission)
            }
            Event::PickFromGallery => {
                self.begin(Acquisition::Image(ImageSource::Gallery), Effect::PickImage)
            }
            Event::PermissionResolved(state) => {
                if !self.expecting(Acquisition::Permission) {
                    return None;
                }

                if state.is_granted() {
                    self.acquiring = Some(Acquisition::Image(ImageSource::Camera));
                    Some(Effect::CaptureFromCamera)
                } else {
                    tracing::info!("camera permission denied");
                    self.acquiring = None;
                    self.notify(notice::PERMISSION_DENIED);
                    None
                }
            }
            Event::CaptureFinished(outcome) => {
                if !self.expecting(Acquisition::Image(ImageSource::Camera)) {
                    return None;
                }
                self.acquiring = None;

                match outcome {
                    CaptureOutcome::Captured(image) => Some(self.show(image)),
                    CaptureOutcome::Failed => {
                        self.notify(notice::CAPTURE_FAILED);
                        None
                    }
                }
            }
            Event::ImagePicked(picked) => {
                if !self.expecting(Acquisition::Image(ImageSource::Gallery)) {
                    return None;
                }
                self.acquiring = None;

                match picked {
                    Some(image) => Some(self.show(image)),
                    None => {
                        self.notify(notice::NO_IMAGE_SELECTED);
                        None
                    }
                }
            }
            Event::Recognized { request, outcome } => {
                self.apply_recognition(request, outcome);
                None
            }
        }
    }

    /// Image currently shown as the thumbnail
    pub fn image(&self) -> Option<&ImageHandle> {
        self.current.as_ref().map(|c| &c.image)
    }

    /// Last successfully recognized text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Waiting on a permission prompt, the camera or the picker
    pub fn is_acquiring(&self) -> bool {
        self.acquiring.is_some()
    }

    pub fn acquisition(&self) -> Option<Acquisition> {
        self.acquiring
    }

    /// The image on screen still has a recognition request in flight
    pub fn is_recognizing(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.pending)
    }

    /// Drop the notice once it has been visible for `ttl`
    pub fn expire_notice(&mut self, now: Instant, ttl: Duration) {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now, ttl)) {
            self.notice = None;
        }
    }

    fn begin(&mut self, acquisition: Acquisition, effect: Effect) -> Option<Effect> {
        if let Some(busy) = self.acquiring {
            tracing::debug!(?busy, ?acquisition, "ignoring action while acquiring an image");
            return None;
        }

        self.acquiring = Some(acquisition);
        Some(effect)
    }

    fn expecting(&self, acquisition: Acquisition) -> bool {
        if self.acquiring == Some(acquisition) {
            return true;
        }

        tracing::debug!(
            expected = ?acquisition,
            actual = ?self.acquiring,
            "ignoring unexpected acquisition result"
        );
        false
    }

    /// Put `image` on screen and issue a recognition request for it.
    /// Any request still in flight for the previous image becomes stale.
    fn show(&mut self, image: ImageHandle) -> Effect {
        self.next_request += 1;
        let request = RequestId(self.next_request);

        tracing::info!(%request, %image, source = ?image.source(), "recognizing text");

        self.current = Some(Current {
            image: image.clone(),
            request,
            pending: true,
        });

        Effect::Recognize { request, image }
    }

    fn apply_recognition(&mut self, request: RequestId, outcome: RecognitionOutcome) {
        let Some(current) = self.current.as_mut().filter(|c| c.request == request && c.pending)
        else {
            tracing::debug!(%request, "discarding stale recognition result");
            return;
        };
        current.pending = false;

        match outcome {
            RecognitionOutcome::Text(text) => {
                tracing::info!(%request, chars = text.chars().count(), "text recognized");
                self.text = text;
            }
            RecognitionOutcome::Empty => {
                tracing::info!(%request, "no text found");
                self.notify(notice::NO_TEXT_FOUND);
            }
            RecognitionOutcome::Failed(cause) => {
                tracing::error!(%request, %cause, "text recognition failed");
                self.notify(notice::recognition_failed(&cause));
            }
        }
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice::new(message));
    }
}
