//! Shared harness for route tests: an app wired to a fresh in-memory SQLite
//! database, plus small request helpers.

use std::sync::Arc;

use axum::body::Body;
use axum::response::Response;
use axum::Router;
use http::{header, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use crate::config::Config;
use crate::services::{ocr, parser};
use crate::{app_router, routes, AppState};

pub async fn test_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.jwt.secret = "test-secret".to_string();

    // One connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let state = Arc::new(AppState {
        db: pool,
        parser: parser::for_backend(&config.import),
        ocr: ocr::for_backend(&config.import),
        config,
    });

    let app = app_router(routes::auth::router()).with_state(state.clone());
    (app, state)
}

pub async fn request(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a fresh household for `email` and return its access token.
pub async fn register_user(app: &Router, email: &str) -> String {
    let res = request(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "household_name": format!("{} household", email),
            "name": "Test User",
            "email": email,
            "password": "correct horse battery staple",
        })),
    )
    .await;
    assert_eq!(res.status(), http::StatusCode::CREATED, "registration failed");
    body_json(res).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
