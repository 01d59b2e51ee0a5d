use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{models::Tag, TagRepository};
use crate::error::{require, AppResult};
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/:tag_id", put(update_tag).delete(delete_tag))
}

// ============================================================================
// Request/Response Types
// ============================================================================

fn default_color() -> String {
    "#84cc16".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: String,
    pub name: String,
    pub color: String,
    pub household_id: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        TagResponse {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            household_id: tag.household_id,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_tags(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<TagResponse>>> {
    let tags = TagRepository::list(&state.db, &user.household_id).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

async fn create_tag(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<TagBody>,
) -> AppResult<(StatusCode, Json<TagResponse>)> {
    let tag = TagRepository::create(&state.db, &user.household_id, &body.name, &body.color).await?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

async fn update_tag(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(tag_id): Path<String>,
    Json(body): Json<TagBody>,
) -> AppResult<Json<TagResponse>> {
    let tag = require(
        TagRepository::find_owned(&state.db, &tag_id, &user.household_id).await?,
        "Tag",
    )?;

    TagRepository::update(&state.db, &tag.id, &body.name, &body.color).await?;

    Ok(Json(TagResponse {
        id: tag.id,
        name: body.name,
        color: body.color,
        household_id: tag.household_id,
    }))
}

async fn delete_tag(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(tag_id): Path<String>,
) -> AppResult<StatusCode> {
    let tag = require(
        TagRepository::find_owned(&state.db, &tag_id, &user.household_id).await?,
        "Tag",
    )?;

    TagRepository::delete(&state.db, &tag.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{body_json, register_user, request, test_app};

    #[tokio::test]
    async fn tag_crud_round_trip() {
        let (app, _state) = test_app().await;
        let token = register_user(&app, "a@example.com").await;

        let res = request(
            &app,
            "POST",
            "/api/tags",
            Some(&token),
            Some(json!({ "name": "weeknight" })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let tag = body_json(res).await;
        assert_eq!(tag["name"], "weeknight");
        assert_eq!(tag["color"], "#84cc16");
        let tag_id = tag["id"].as_str().unwrap().to_string();

        let res = request(
            &app,
            "PUT",
            &format!("/api/tags/{}", tag_id),
            Some(&token),
            Some(json!({ "name": "quick", "color": "#ff0000" })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["name"], "quick");

        let res = request(&app, "GET", "/api/tags", Some(&token), None).await;
        let tags = body_json(res).await;
        assert_eq!(tags.as_array().unwrap().len(), 1);
        assert_eq!(tags[0]["color"], "#ff0000");

        let res = request(
            &app,
            "DELETE",
            &format!("/api/tags/{}", tag_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = request(&app, "GET", "/api/tags", Some(&token), None).await;
        assert!(body_json(res).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_household_tag_is_invisible() {
        let (app, _state) = test_app().await;
        let token_a = register_user(&app, "a@example.com").await;
        let token_b = register_user(&app, "b@example.com").await;

        let res = request(
            &app,
            "POST",
            "/api/tags",
            Some(&token_a),
            Some(json!({ "name": "secret" })),
        )
        .await;
        let tag_id = body_json(res).await["id"].as_str().unwrap().to_string();

        // Exact correct id, wrong household: 404, never 403.
        let res = request(
            &app,
            "PUT",
            &format!("/api/tags/{}", tag_id),
            Some(&token_b),
            Some(json!({ "name": "stolen" })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = request(
            &app,
            "DELETE",
            &format!("/api/tags/{}", tag_id),
            Some(&token_b),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = request(&app, "GET", "/api/tags", Some(&token_b), None).await;
        assert!(body_json(res).await.as_array().unwrap().is_empty());
    }
}
