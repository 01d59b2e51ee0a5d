use async_trait::async_trait;

use crate::services::parser::ImportError;

use super::OcrEngine;

/// Placeholder for a model-backed OCR engine. Keeps the capability surface
/// in place; every call reports that it is not configured.
pub struct AiOcrEngine;

#[async_trait]
impl OcrEngine for AiOcrEngine {
    async fn extract_text(&self, _image_bytes: &[u8]) -> Result<String, ImportError> {
        Err(ImportError::NotConfigured("AI OCR"))
    }
}
