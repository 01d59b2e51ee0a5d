use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Recipe row without its child collections. Repositories hydrate
/// ingredients, steps and tags separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub household_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub servings: Option<String>,
    // Minutes
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub total_time: Option<i64>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    pub cooking_method: Option<String>,
    pub suitable_for_diet: Option<Vec<String>>,
    pub nutrition: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub recipe_id: String,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    /// Zero-based list position.
    pub ord: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub recipe_id: String,
    pub title: Option<String>,
    pub description: String,
    /// Zero-based list position.
    pub ord: i64,
    pub timer_seconds: Option<i64>,
}

/// Household-scoped label, many-to-many with recipes via recipe_tags.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub household_id: String,
    pub name: String,
    pub color: String,
}
