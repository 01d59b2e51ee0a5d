//! Recipe import pipeline: normalize heterogeneous source data (scraped web
//! pages, OCR text) into one `ParsedRecipe` shape.
//!
//! Backends are interchangeable behind the `RecipeParser` trait; callers only
//! ever hold the trait object handed out by `for_backend`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ImportConfig;

pub mod ai;
pub mod local;

pub use ai::AiRecipeParser;
pub use local::LocalRecipeParser;

/// Normalized intermediate recipe, prior to persistence. Every field the
/// source does not yield stays `None`/empty; partial extraction is success.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecipe {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub servings: Option<String>,
    /// Minutes
    pub prep_time: Option<i64>,
    /// Minutes
    pub cook_time: Option<i64>,
    /// Minutes
    pub total_time: Option<i64>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Total import failure. Field-level extraction problems never surface here;
/// only a source that yields no document at all (or an unconfigured backend)
/// does.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Could not fetch recipe page: {0}")]
    Fetch(String),

    #[error("Could not read text from image: {0}")]
    Ocr(String),

    #[error("{0} not configured. Set PARSER_BACKEND=local or configure OPENAI_API_KEY.")]
    NotConfigured(&'static str),
}

#[async_trait]
pub trait RecipeParser: Send + Sync {
    /// Fetch and scrape a page into a normalized recipe.
    async fn parse_url(&self, url: &str) -> Result<ParsedRecipe, ImportError>;

    /// Low-fidelity fallback for unstructured text (OCR output): first line
    /// is the title, the rest become ingredients.
    async fn parse_text(&self, text: &str) -> Result<ParsedRecipe, ImportError>;
}

/// Select the parser implementation for the configured backend.
pub fn for_backend(config: &ImportConfig) -> Arc<dyn RecipeParser> {
    if config.backend == "ai" {
        Arc::new(AiRecipeParser)
    } else {
        Arc::new(LocalRecipeParser::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;

    fn import_config(backend: &str) -> ImportConfig {
        ImportConfig {
            backend: backend.to_string(),
            openai_api_key: None,
            fetch_timeout_seconds: 15,
            ocr_timeout_seconds: 30,
        }
    }

    #[tokio::test]
    async fn ai_backend_reports_not_configured() {
        let parser = for_backend(&import_config("ai"));
        let err = parser.parse_url("https://example.com").await.unwrap_err();
        assert!(matches!(err, ImportError::NotConfigured(_)));
        let err = parser.parse_text("anything").await.unwrap_err();
        assert!(matches!(err, ImportError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn local_backend_parses_text() {
        let parser = for_backend(&import_config("local"));
        let parsed = parser.parse_text("Soup\ncarrots").await.unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Soup"));
    }
}
