use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: String,
    pub household_id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// A line on a shopping list. When seeded from a recipe the name/quantity/unit
/// are copied at insert time; renaming the ingredient later does not touch
/// existing items. `recipe_id` is provenance only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: String,
    pub list_id: String,
    pub recipe_id: Option<String>,
    pub ingredient_name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub checked: bool,
}
