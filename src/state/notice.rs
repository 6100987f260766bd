/// Transient, non-blocking messages shown at the bottom of the screen

use std::time::{Duration, Instant};

pub const PERMISSION_DENIED: &str = "Permissão de câmera negada";
pub const NO_IMAGE_SELECTED: &str = "Nenhuma imagem selecionada";
pub const CAPTURE_FAILED: &str = "Erro ao capturar a imagem";
pub const NO_TEXT_FOUND: &str = "Nenhum texto encontrado";

/// Notice for a recognition that failed with `cause`
pub fn recognition_failed(cause: &str) -> String {
    format!("Erro ao reconhecer o texto: {}", cause)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.raised_at) >= ttl
    }
}
