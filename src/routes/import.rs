use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthUser;
use crate::routes::recipes::{IngredientBody, RecipeBody, StepBody};
use crate::services::parser::ParsedRecipe;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/url", post(import_url))
        .route("/image", post(import_image))
}

#[derive(Debug, Deserialize)]
struct ImportUrlRequest {
    url: String,
}

/// An imported recipe is returned as a draft in the recipe-creation shape so
/// the client can review, edit, and POST it to /api/recipes. Nothing is
/// persisted here.
fn draft_from(parsed: ParsedRecipe) -> RecipeBody {
    RecipeBody {
        title: parsed.title.unwrap_or_else(|| "Untitled Recipe".to_string()),
        description: parsed.description,
        image_url: parsed.image_url,
        source_url: parsed.source_url,
        author: parsed.author,
        servings: parsed.servings,
        prep_time: parsed.prep_time,
        cook_time: parsed.cook_time,
        total_time: parsed.total_time,
        cuisine: parsed.cuisine,
        category: parsed.category,
        ingredients: parsed
            .ingredients
            .into_iter()
            .enumerate()
            .map(|(idx, name)| IngredientBody {
                name,
                quantity: None,
                unit: None,
                notes: None,
                order: idx as i64,
            })
            .collect(),
        steps: parsed
            .steps
            .into_iter()
            .enumerate()
            .map(|(idx, description)| StepBody {
                title: None,
                description,
                order: idx as i64,
                timer_seconds: None,
            })
            .collect(),
        ..Default::default()
    }
}

async fn import_url(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<ImportUrlRequest>,
) -> AppResult<Json<RecipeBody>> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }

    let parsed = state.parser.parse_url(url).await?;
    info!(
        household_id = %user.household_id,
        url,
        ingredients = parsed.ingredients.len(),
        steps = parsed.steps.len(),
        "imported recipe from url"
    );

    Ok(Json(draft_from(parsed)))
}

async fn import_image(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<RecipeBody>> {
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("could not read upload: {}", e)))?;
            image = Some(bytes.to_vec());
        }
    }

    let image = image
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;

    let text = state.ocr.extract_text(&image).await?;
    let parsed = state.parser.parse_text(&text).await?;
    info!(
        household_id = %user.household_id,
        bytes = image.len(),
        ingredients = parsed.ingredients.len(),
        "imported recipe from image"
    );

    Ok(Json(draft_from(parsed)))
}
