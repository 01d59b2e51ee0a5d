use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub household_id: String,
    pub iat: usize,
    pub exp: usize,
}

pub struct AuthService;

impl AuthService {
    /// Salted bcrypt hash. Two calls on the same password produce different
    /// output; `verify_password` succeeds against either.
    pub fn hash_password(password: &str) -> AppResult<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
    }

    /// A malformed stored hash counts as a non-match, not an error.
    pub fn verify_password(password: &str, hashed: &str) -> bool {
        bcrypt::verify(password, hashed).unwrap_or(false)
    }

    /// Create a signed JWT carrying the user and household ids.
    pub fn create_jwt(config: &JwtConfig, user_id: &str, household_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::minutes(config.expiration_minutes);
        let claims = Claims {
            sub: user_id.to_string(),
            household_id: household_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a JWT. Expiry, bad signature and malformed input
    /// all surface as the same `Err`; callers treat them uniformly as
    /// unauthenticated.
    pub fn decode_jwt(config: &JwtConfig, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
