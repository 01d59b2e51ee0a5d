use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::db::models::Household;
use crate::error::AppResult;

pub struct HouseholdRepository;

impl HouseholdRepository {
    /// Insert a new household. Runs inside the registration transaction so a
    /// failed user insert never leaves an empty household behind.
    pub async fn create(conn: &mut SqliteConnection, name: &str) -> AppResult<Household> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("INSERT INTO households (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        Ok(Household {
            id,
            name: name.to_string(),
            created_at: now,
        })
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Household>> {
        let row = sqlx::query("SELECT id, name, created_at FROM households WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| Household {
            id: r.get("id"),
            name: r.get("name"),
            created_at: r.get("created_at"),
        }))
    }
}
