use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tenancy boundary. Created once at registration; never merged or split.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Household {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}
