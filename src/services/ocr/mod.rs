//! OCR capability feeding the text parser. Output is unstructured and
//! unreliable by construction; downstream parsing must tolerate garbage.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ImportConfig;
use crate::services::parser::ImportError;

pub mod ai;
pub mod local;

pub use ai::AiOcrEngine;
pub use local::LocalOcrEngine;

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image_bytes: &[u8]) -> Result<String, ImportError>;
}

/// Select the OCR implementation for the configured backend (same switch as
/// the recipe parser).
pub fn for_backend(config: &ImportConfig) -> Arc<dyn OcrEngine> {
    if config.backend == "ai" {
        Arc::new(AiOcrEngine)
    } else {
        Arc::new(LocalOcrEngine::new(config))
    }
}
