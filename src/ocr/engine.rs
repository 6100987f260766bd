/// ocrs-backed recognizer
///
/// Models are loaded from `.rten` files on the first request and kept for
/// the rest of the session. A load failure is kept too and reported on
/// every request, so missing models show up as a notice instead of a crash.

use async_trait::async_trait;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::task;

use super::Recognizer;
use crate::error::RecognitionError;
use crate::state::data::ImageHandle;

#[derive(Clone)]
pub struct OcrsRecognizer {
    inner: Arc<Inner>,
}

struct Inner {
    detection_model: PathBuf,
    recognition_model: PathBuf,
    engine: OnceLock<Result<OcrEngine, RecognitionError>>,
}

impl OcrsRecognizer {
    pub fn new(detection_model: PathBuf, recognition_model: PathBuf) -> Self {
        Self {
            inner: Arc::new(Inner {
                detection_model,
                recognition_model,
                engine: OnceLock::new(),
            }),
        }
    }
}

#[async_trait]
impl Recognizer for OcrsRecognizer {
    async fn recognize(&self, image: &ImageHandle) -> Result<String, RecognitionError> {
        let inner = Arc::clone(&self.inner);
        let path = image.path().to_path_buf();

        // Model loading and inference are CPU-intensive
        task::spawn_blocking(move || inner.recognize_blocking(&path))
            .await
            .map_err(|e| RecognitionError::Worker(e.to_string()))?
    }
}

impl Inner {
    fn engine(&self) -> Result<&OcrEngine, RecognitionError> {
        self.engine
            .get_or_init(|| load_engine(&self.detection_model, &self.recognition_model))
            .as_ref()
            .map_err(Clone::clone)
    }

    fn recognize_blocking(&self, path: &Path) -> Result<String, RecognitionError> {
        let engine = self.engine()?;

        let image = image::open(path).map_err(|e| RecognitionError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // ocrs expects packed RGB8
        let rgb_image = image.to_rgb8();
        let source = ImageSource::from_bytes(rgb_image.as_raw(), rgb_image.dimensions())
            .map_err(|e| RecognitionError::Engine(format!("invalid image layout: {}", e)))?;

        let input = engine
            .prepare_input(source)
            .map_err(|e| RecognitionError::Engine(format!("failed to prepare input: {}", e)))?;

        let word_rects = engine
            .detect_words(&input)
            .map_err(|e| RecognitionError::Engine(format!("failed to detect words: {}", e)))?;
        let line_rects = engine.find_text_lines(&input, &word_rects);
        let line_texts = engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| RecognitionError::Engine(format!("failed to recognize text: {}", e)))?;

        let text = line_texts
            .iter()
            .filter_map(|line| line.as_ref().map(|l| l.to_string()))
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(path = %path.display(), lines = line_rects.len(), "ocr finished");
        Ok(text)
    }
}

fn load_engine(detection: &Path, recognition: &Path) -> Result<OcrEngine, RecognitionError> {
    tracing::info!(
        detection = %detection.display(),
        recognition = %recognition.display(),
        "loading OCR models"
    );

    let detection_model = Model::load_file(detection).map_err(|e| {
        RecognitionError::Models(format!("{}: {}", detection.display(), e))
    })?;
    let recognition_model = Model::load_file(recognition).map_err(|e| {
        RecognitionError::Models(format!("{}: {}", recognition.display(), e))
    })?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| RecognitionError::Models(e.to_string()))
}
