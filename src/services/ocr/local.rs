//! On-device text recognition via the `tesseract` CLI.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ImportConfig;
use crate::services::parser::ImportError;

use super::OcrEngine;

pub struct LocalOcrEngine {
    timeout: Duration,
}

impl LocalOcrEngine {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.ocr_timeout_seconds),
        }
    }

    async fn run_tesseract(&self, image_bytes: &[u8]) -> Result<String, ImportError> {
        let mut child = Command::new("tesseract")
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ImportError::NotConfigured("tesseract binary")
                } else {
                    ImportError::Ocr(format!("failed to start tesseract: {}", e))
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image_bytes)
                .await
                .map_err(|e| ImportError::Ocr(format!("failed to send image: {}", e)))?;
            // Close stdin so tesseract sees EOF.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ImportError::Ocr(format!("tesseract failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ImportError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrEngine for LocalOcrEngine {
    async fn extract_text(&self, image_bytes: &[u8]) -> Result<String, ImportError> {
        tokio::time::timeout(self.timeout, self.run_tesseract(image_bytes))
            .await
            .map_err(|_| ImportError::Ocr("text recognition timed out".to_string()))?
    }
}
