use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::models::{ShoppingItem, ShoppingList};
use crate::db::{RecipeRepository, ShoppingRepository};
use crate::error::{require, AppResult};
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_lists).post(create_list))
        .route("/:list_id", get(get_list).delete(delete_list))
        .route("/:list_id/items", post(add_item))
        .route("/:list_id/add-from-recipe", post(add_from_recipe))
        .route("/:list_id/items/:item_id/check", patch(toggle_item))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreateListRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AddItemRequest {
    ingredient_name: String,
    #[serde(default)]
    quantity: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    /// Provenance of a manually-added item, when the client knows it.
    #[serde(default)]
    recipe_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddFromRecipeRequest {
    recipe_id: String,
    /// Ingredients to copy. An empty set copies nothing.
    ingredient_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ItemResponse {
    id: String,
    list_id: String,
    recipe_id: Option<String>,
    ingredient_name: String,
    quantity: Option<String>,
    unit: Option<String>,
    checked: bool,
}

impl From<ShoppingItem> for ItemResponse {
    fn from(item: ShoppingItem) -> Self {
        Self {
            id: item.id,
            list_id: item.list_id,
            recipe_id: item.recipe_id,
            ingredient_name: item.ingredient_name,
            quantity: item.quantity,
            unit: item.unit,
            checked: item.checked,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListResponse {
    id: String,
    name: String,
    created_at: NaiveDateTime,
    items: Vec<ItemResponse>,
}

impl ListResponse {
    fn new(list: ShoppingList, items: Vec<ShoppingItem>) -> Self {
        Self {
            id: list.id,
            name: list.name,
            created_at: list.created_at,
            items: items.into_iter().map(ItemResponse::from).collect(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_lists(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ListResponse>>> {
    let lists = ShoppingRepository::list(&state.db, &user.household_id).await?;

    let mut out = Vec::with_capacity(lists.len());
    for list in lists {
        let items = ShoppingRepository::items_for(&state.db, &list.id).await?;
        out.push(ListResponse::new(list, items));
    }
    Ok(Json(out))
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateListRequest>,
) -> AppResult<(StatusCode, Json<ListResponse>)> {
    let list = ShoppingRepository::create(&state.db, &user.household_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(ListResponse::new(list, Vec::new()))))
}

async fn get_list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
) -> AppResult<Json<ListResponse>> {
    let list = require(
        ShoppingRepository::find_owned(&state.db, &list_id, &user.household_id).await?,
        "Shopping list",
    )?;
    let items = ShoppingRepository::items_for(&state.db, &list.id).await?;
    Ok(Json(ListResponse::new(list, items)))
}

async fn delete_list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
) -> AppResult<StatusCode> {
    let list = require(
        ShoppingRepository::find_owned(&state.db, &list_id, &user.household_id).await?,
        "Shopping list",
    )?;
    ShoppingRepository::delete(&state.db, &list.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
    Json(body): Json<AddItemRequest>,
) -> AppResult<(StatusCode, Json<ListResponse>)> {
    let list = require(
        ShoppingRepository::find_owned(&state.db, &list_id, &user.household_id).await?,
        "Shopping list",
    )?;

    ShoppingRepository::add_item(
        &state.db,
        &list.id,
        &body.ingredient_name,
        body.quantity.as_deref(),
        body.unit.as_deref(),
        body.recipe_id.as_deref(),
    )
    .await?;

    let items = ShoppingRepository::items_for(&state.db, &list.id).await?;
    Ok((StatusCode::CREATED, Json(ListResponse::new(list, items))))
}

async fn add_from_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<String>,
    Json(body): Json<AddFromRecipeRequest>,
) -> AppResult<Json<ListResponse>> {
    let list = require(
        ShoppingRepository::find_owned(&state.db, &list_id, &user.household_id).await?,
        "Shopping list",
    )?;
    let recipe = require(
        RecipeRepository::find_owned(&state.db, &body.recipe_id, &user.household_id).await?,
        "Recipe",
    )?;

    // Ids outside this recipe are silently skipped; an empty set matches
    // nothing, so nothing is copied.
    let ingredients =
        RecipeRepository::ingredients_by_ids(&state.db, &recipe.id, &body.ingredient_ids).await?;

    let mut tx = state.db.begin().await?;
    ShoppingRepository::add_from_recipe(&mut tx, &list.id, &recipe.id, &ingredients).await?;
    tx.commit().await?;

    let items = ShoppingRepository::items_for(&state.db, &list.id).await?;
    Ok(Json(ListResponse::new(list, items)))
}

async fn toggle_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((list_id, item_id)): Path<(String, String)>,
) -> AppResult<Json<ListResponse>> {
    let list = require(
        ShoppingRepository::find_owned(&state.db, &list_id, &user.household_id).await?,
        "Shopping list",
    )?;
    let item = require(
        ShoppingRepository::find_item(&state.db, &list.id, &item_id).await?,
        "Shopping item",
    )?;

    ShoppingRepository::set_item_checked(&state.db, &item.id, !item.checked).await?;

    let items = ShoppingRepository::items_for(&state.db, &list.id).await?;
    Ok(Json(ListResponse::new(list, items)))
}
