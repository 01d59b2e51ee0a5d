use async_trait::async_trait;

use super::{ImportError, ParsedRecipe, RecipeParser};

/// Placeholder for a model-backed parser. Keeps the capability surface in
/// place; every call reports that it is not configured.
pub struct AiRecipeParser;

#[async_trait]
impl RecipeParser for AiRecipeParser {
    async fn parse_url(&self, _url: &str) -> Result<ParsedRecipe, ImportError> {
        Err(ImportError::NotConfigured("AI parser"))
    }

    async fn parse_text(&self, _text: &str) -> Result<ParsedRecipe, ImportError> {
        Err(ImportError::NotConfigured("AI parser"))
    }
}
