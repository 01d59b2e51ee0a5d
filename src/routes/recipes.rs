use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::repository::recipe::{NewIngredient, NewStep, RecipeData};
use crate::db::{models::Recipe, RecipeRepository};
use crate::error::{require, AppResult};
use crate::routes::auth::AuthUser;
use crate::routes::tags::TagResponse;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route(
            "/:recipe_id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Recipe-creation input. Also the shape import endpoints return as a draft,
/// so a draft can be posted back unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecipeBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
    #[serde(default)]
    pub prep_time: Option<i64>,
    #[serde(default)]
    pub cook_time: Option<i64>,
    #[serde(default)]
    pub total_time: Option<i64>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cooking_method: Option<String>,
    #[serde(default)]
    pub suitable_for_diet: Option<Vec<String>>,
    #[serde(default)]
    pub nutrition: Option<serde_json::Value>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientBody>,
    #[serde(default)]
    pub steps: Vec<StepBody>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientBody {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Accepted for wire compatibility; list position is authoritative.
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepBody {
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    /// Accepted for wire compatibility; list position is authoritative.
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub timer_seconds: Option<i64>,
}

impl From<RecipeBody> for RecipeData {
    fn from(body: RecipeBody) -> Self {
        RecipeData {
            title: body.title,
            description: body.description,
            image_url: body.image_url,
            source_url: body.source_url,
            author: body.author,
            servings: body.servings,
            prep_time: body.prep_time,
            cook_time: body.cook_time,
            total_time: body.total_time,
            cuisine: body.cuisine,
            category: body.category,
            cooking_method: body.cooking_method,
            suitable_for_diet: body.suitable_for_diet,
            nutrition: body.nutrition,
            ingredients: body
                .ingredients
                .into_iter()
                .map(|i| NewIngredient {
                    name: i.name,
                    quantity: i.quantity,
                    unit: i.unit,
                    notes: i.notes,
                })
                .collect(),
            steps: body
                .steps
                .into_iter()
                .map(|s| NewStep {
                    title: s.title,
                    description: s.description,
                    timer_seconds: s.timer_seconds,
                })
                .collect(),
            tag_ids: body.tag_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub tag_id: Option<String>,
    pub cuisine: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: String,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub order: i64,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub id: String,
    pub title: Option<String>,
    pub description: String,
    pub order: i64,
    pub timer_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: String,
    pub household_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub servings: Option<String>,
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
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
    pub steps: Vec<StepResponse>,
}

/// Slim listing entry: no children beyond tags.
#[derive(Debug, Serialize)]
pub struct RecipeListItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub cuisine: Option<String>,
    pub total_time: Option<i64>,
    pub servings: Option<String>,
    pub tags: Vec<TagResponse>,
    pub created_at: NaiveDateTime,
}

async fn hydrate(state: &AppState, recipe: Recipe) -> AppResult<RecipeResponse> {
    let ingredients = RecipeRepository::ingredients_for(&state.db, &recipe.id).await?;
    let steps = RecipeRepository::steps_for(&state.db, &recipe.id).await?;
    let tags = RecipeRepository::tags_for(&state.db, &recipe.id).await?;

    Ok(RecipeResponse {
        id: recipe.id,
        household_id: recipe.household_id,
        title: recipe.title,
        description: recipe.description,
        image_url: recipe.image_url,
        source_url: recipe.source_url,
        author: recipe.author,
        servings: recipe.servings,
        prep_time: recipe.prep_time,
        cook_time: recipe.cook_time,
        total_time: recipe.total_time,
        cuisine: recipe.cuisine,
        category: recipe.category,
        cooking_method: recipe.cooking_method,
        suitable_for_diet: recipe.suitable_for_diet,
        nutrition: recipe.nutrition,
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
        tags: tags.into_iter().map(TagResponse::from).collect(),
        ingredients: ingredients
            .into_iter()
            .map(|i| IngredientResponse {
                id: i.id,
                name: i.name,
                quantity: i.quantity,
                unit: i.unit,
                notes: i.notes,
                order: i.ord,
            })
            .collect(),
        steps: steps
            .into_iter()
            .map(|s| StepResponse {
                id: s.id,
                title: s.title,
                description: s.description,
                order: s.ord,
                timer_seconds: s.timer_seconds,
            })
            .collect(),
    })
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_recipes(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<RecipeListItem>>> {
    let recipes = RecipeRepository::list(
        &state.db,
        &user.household_id,
        query.q.as_deref(),
        query.tag_id.as_deref(),
        query.cuisine.as_deref(),
    )
    .await?;

    let mut items = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let tags = RecipeRepository::tags_for(&state.db, &recipe.id).await?;
        items.push(RecipeListItem {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            image_url: recipe.image_url,
            cuisine: recipe.cuisine,
            total_time: recipe.total_time,
            servings: recipe.servings,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            created_at: recipe.created_at,
        });
    }

    Ok(Json(items))
}

async fn create_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<RecipeBody>,
) -> AppResult<(StatusCode, Json<RecipeResponse>)> {
    let data: RecipeData = body.into();

    // Recipe, children and tag links commit together or not at all.
    let mut tx = state.db.begin().await?;
    let id = RecipeRepository::insert(&mut tx, &user.household_id, &data).await?;
    tx.commit().await?;

    let recipe = require(
        RecipeRepository::find_owned(&state.db, &id, &user.household_id).await?,
        "Recipe",
    )?;
    Ok((StatusCode::CREATED, Json(hydrate(&state, recipe).await?)))
}

async fn get_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<String>,
) -> AppResult<Json<RecipeResponse>> {
    let recipe = require(
        RecipeRepository::find_owned(&state.db, &recipe_id, &user.household_id).await?,
        "Recipe",
    )?;
    Ok(Json(hydrate(&state, recipe).await?))
}

async fn update_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<String>,
    Json(body): Json<RecipeBody>,
) -> AppResult<Json<RecipeResponse>> {
    let existing = require(
        RecipeRepository::find_owned(&state.db, &recipe_id, &user.household_id).await?,
        "Recipe",
    )?;

    let data: RecipeData = body.into();

    let mut tx = state.db.begin().await?;
    RecipeRepository::update(&mut tx, &existing.id, &user.household_id, &data).await?;
    tx.commit().await?;

    let recipe = require(
        RecipeRepository::find_owned(&state.db, &recipe_id, &user.household_id).await?,
        "Recipe",
    )?;
    Ok(Json(hydrate(&state, recipe).await?))
}

async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<String>,
) -> AppResult<StatusCode> {
    let recipe = require(
        RecipeRepository::find_owned(&state.db, &recipe_id, &user.household_id).await?,
        "Recipe",
    )?;

    let mut tx = state.db.begin().await?;
    RecipeRepository::delete(&mut tx, &recipe.id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{body_json, register_user, request, test_app};

    fn sample_recipe() -> serde_json::Value {
        json!({
            "title": "Shakshuka",
            "description": "Eggs poached in tomato sauce",
            "cuisine": "Middle Eastern",
            "servings": "4",
            "prep_time": 10,
            "cook_time": 20,
            "ingredients": [
                { "name": "eggs", "quantity": "6" },
                { "name": "tomatoes", "quantity": "800", "unit": "g" },
                { "name": "cumin" }
            ],
            "steps": [
                { "description": "Simmer the tomatoes." },
                { "description": "Crack in the eggs.", "timer_seconds": 300 }
            ]
        })
    }

    #[tokio::test]
    async fn create_and_fetch_preserves_children_and_order() {
        let (app, _state) = test_app().await;
        let token = register_user(&app, "a@example.com").await;

        let res = request(&app, "POST", "/api/recipes", Some(&token), Some(sample_recipe())).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created = body_json(res).await;
        let id = created["id"].as_str().unwrap().to_string();

        let res = request(&app, "GET", &format!("/api/recipes/{}", id), Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let recipe = body_json(res).await;

        let ingredients = recipe["ingredients"].as_array().unwrap();
        assert_eq!(ingredients.len(), 3);
        assert_eq!(ingredients[0]["name"], "eggs");
        assert_eq!(ingredients[1]["name"], "tomatoes");
        assert_eq!(ingredients[2]["name"], "cumin");
        assert_eq!(ingredients[0]["order"], 0);
        assert_eq!(ingredients[2]["order"], 2);

        let steps = recipe["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0]["description"], "Simmer the tomatoes.");
        assert_eq!(steps[1]["timer_seconds"], 300);
    }

    #[tokio::test]
    async fn update_fully_replaces_ingredient_list() {
        let (app, _state) = test_app().await;
        let token = register_user(&app, "a@example.com").await;

        let res = request(&app, "POST", "/api/recipes", Some(&token), Some(sample_recipe())).await;
        let id = body_json(res).await["id"].as_str().unwrap().to_string();

        let res = request(
            &app,
            "PUT",
            &format!("/api/recipes/{}", id),
            Some(&token),
            Some(json!({
                "title": "Shakshuka v2",
                "ingredients": [{ "name": "feta" }],
                "steps": []
            })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let recipe = body_json(res).await;

        assert_eq!(recipe["title"], "Shakshuka v2");
        let ingredients = recipe["ingredients"].as_array().unwrap();
        // No residue from the previous list.
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0]["name"], "feta");
        assert!(recipe["steps"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tags_attach_only_within_household() {
        let (app, _state) = test_app().await;
        let token_a = register_user(&app, "a@example.com").await;
        let token_b = register_user(&app, "b@example.com").await;

        let res = request(
            &app,
            "POST",
            "/api/tags",
            Some(&token_a),
            Some(json!({ "name": "dinner" })),
        )
        .await;
        let own_tag = body_json(res).await["id"].as_str().unwrap().to_string();

        let res = request(
            &app,
            "POST",
            "/api/tags",
            Some(&token_b),
            Some(json!({ "name": "foreign" })),
        )
        .await;
        let foreign_tag = body_json(res).await["id"].as_str().unwrap().to_string();

        let mut body = sample_recipe();
        body["tag_ids"] = json!([own_tag, foreign_tag]);
        let res = request(&app, "POST", "/api/recipes", Some(&token_a), Some(body)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let recipe = body_json(res).await;

        let tags = recipe["tags"].as_array().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0]["name"], "dinner");
    }

    #[tokio::test]
    async fn cross_household_recipe_is_404() {
        let (app, _state) = test_app().await;
        let token_a = register_user(&app, "a@example.com").await;
        let token_b = register_user(&app, "b@example.com").await;

        let res = request(&app, "POST", "/api/recipes", Some(&token_a), Some(sample_recipe())).await;
        let id = body_json(res).await["id"].as_str().unwrap().to_string();

        for (method, body) in [
            ("GET", None),
            ("PUT", Some(json!({ "title": "x" }))),
            ("DELETE", None),
        ] {
            let res = request(
                &app,
                method,
                &format!("/api/recipes/{}", id),
                Some(&token_b),
                body,
            )
            .await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{} leaked", method);
        }
    }

    #[tokio::test]
    async fn list_filters_by_query_and_tag() {
        let (app, _state) = test_app().await;
        let token = register_user(&app, "a@example.com").await;

        let res = request(
            &app,
            "POST",
            "/api/tags",
            Some(&token),
            Some(json!({ "name": "breakfast" })),
        )
        .await;
        let tag_id = body_json(res).await["id"].as_str().unwrap().to_string();

        let mut tagged = sample_recipe();
        tagged["tag_ids"] = json!([tag_id]);
        request(&app, "POST", "/api/recipes", Some(&token), Some(tagged)).await;
        request(
            &app,
            "POST",
            "/api/recipes",
            Some(&token),
            Some(json!({ "title": "Carbonara", "cuisine": "Italian" })),
        )
        .await;

        let res = request(&app, "GET", "/api/recipes", Some(&token), None).await;
        assert_eq!(body_json(res).await.as_array().unwrap().len(), 2);

        let res = request(&app, "GET", "/api/recipes?q=shak", Some(&token), None).await;
        let items = body_json(res).await;
        assert_eq!(items.as_array().unwrap().len(), 1);
        assert_eq!(items[0]["title"], "Shakshuka");

        let res = request(
            &app,
            "GET",
            &format!("/api/recipes?tag_id={}", tag_id),
            Some(&token),
            None,
        )
        .await;
        let items = body_json(res).await;
        assert_eq!(items.as_array().unwrap().len(), 1);
        assert_eq!(items[0]["tags"][0]["name"], "breakfast");

        let res = request(&app, "GET", "/api/recipes?cuisine=ital", Some(&token), None).await;
        let items = body_json(res).await;
        assert_eq!(items.as_array().unwrap().len(), 1);
        assert_eq!(items[0]["title"], "Carbonara");
    }

    #[tokio::test]
    async fn delete_removes_recipe() {
        let (app, _state) = test_app().await;
        let token = register_user(&app, "a@example.com").await;

        let res = request(&app, "POST", "/api/recipes", Some(&token), Some(sample_recipe())).await;
        let id = body_json(res).await["id"].as_str().unwrap().to_string();

        let res = request(&app, "DELETE", &format!("/api/recipes/{}", id), Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = request(&app, "GET", &format!("/api/recipes/{}", id), Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
