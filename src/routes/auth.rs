use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{HouseholdRepository, UserRepository, UserRole};
use crate::error::{require, AppError, AppResult};
use crate::services::auth::AuthService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub household_name: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub household_id: String,
    pub household_name: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a household and its first (admin) user, then issue a token.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if body.password.is_empty() {
        return Err(AppError::Validation("A password is required".to_string()));
    }

    if UserRepository::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let hashed = AuthService::hash_password(&body.password)?;

    // Household + admin user commit together or not at all.
    let mut tx = state.db.begin().await?;
    let household = HouseholdRepository::create(&mut tx, &body.household_name).await?;
    let user = UserRepository::create(
        &mut tx,
        &household.id,
        &email,
        &body.name,
        &hashed,
        UserRole::Admin,
    )
    .await?;
    tx.commit().await?;

    tracing::info!("Registered household {} for user {}", household.id, user.id);

    let token = AuthService::create_jwt(&state.config.jwt, &user.id, &household.id)?;
    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let email = body.email.trim().to_lowercase();
    let user = UserRepository::find_by_email(&state.db, &email).await?;

    // One rejection path for unknown email, passwordless account and wrong
    // password, so responses don't reveal which it was.
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized),
    };
    let hashed = user.hashed_password.as_deref().ok_or(AppError::Unauthorized)?;
    if !AuthService::verify_password(&body.password, hashed) {
        return Err(AppError::Unauthorized);
    }

    let token = AuthService::create_jwt(&state.config.jwt, &user.id, &user.household_id)?;
    Ok(Json(TokenResponse::bearer(token)))
}

async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<UserResponse>> {
    let household = require(
        HouseholdRepository::find_by_id(&state.db, &user.household_id).await?,
        "Household",
    )?;

    Ok(Json(UserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        household_id: user.household_id,
        household_name: household.name,
    }))
}

// ============================================================================
// Auth Middleware / Extractor
// ============================================================================

/// Extractor for the authenticated user. Missing header, malformed token,
/// bad signature, expiry and a deleted user all reject identically.
pub struct AuthUser(pub crate::db::User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let claims = AuthService::decode_jwt(&state.config.jwt, token).map_err(|e| {
            tracing::debug!("Failed to decode bearer token: {:?}", e);
            AppError::Unauthorized
        })?;

        let user = UserRepository::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::services::auth::AuthService;
    use crate::test_support::{body_json, request, test_app};

    #[tokio::test]
    async fn register_returns_token_for_new_household() {
        let (app, state) = test_app().await;

        let res = request(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "household_name": "Hill House",
                "name": "Eleanor",
                "email": "eleanor@example.com",
                "password": "secret"
            })),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        let token = body["access_token"].as_str().unwrap().to_string();

        // The token's subject resolves to a user in the registered household.
        let claims = AuthService::decode_jwt(&state.config.jwt, &token).unwrap();
        let user = crate::db::UserRepository::find_by_id(&state.db, &claims.sub)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.household_id, claims.household_id);
        assert_eq!(user.email, "eleanor@example.com");
        assert_eq!(user.role, crate::db::UserRole::Admin);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (app, _state) = test_app().await;

        let payload = json!({
            "household_name": "Hill House",
            "name": "Eleanor",
            "email": "eleanor@example.com",
            "password": "secret"
        });
        let res = request(&app, "POST", "/api/auth/register", None, Some(payload.clone())).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = request(&app, "POST", "/api/auth/register", None, Some(payload)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn login_happy_and_wrong_password() {
        let (app, _state) = test_app().await;

        request(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "household_name": "Hill House",
                "name": "Eleanor",
                "email": "eleanor@example.com",
                "password": "secret"
            })),
        )
        .await;

        let res = request(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "eleanor@example.com", "password": "secret" })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert!(body["access_token"].as_str().is_some());

        let res = request(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "eleanor@example.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_and_reflects_token() {
        let (app, _state) = test_app().await;

        let res = request(&app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = request(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "household_name": "Hill House",
                "name": "Eleanor",
                "email": "eleanor@example.com",
                "password": "secret"
            })),
        )
        .await;
        let token = body_json(res).await["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        let res = request(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["email"], "eleanor@example.com");
        assert_eq!(body["role"], "admin");
        assert_eq!(body["household_name"], "Hill House");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let (app, _state) = test_app().await;
        let res = request(&app, "GET", "/api/auth/me", Some("not-a-token"), None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
