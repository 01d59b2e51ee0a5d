use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::db::models::{User, UserRole};
use crate::error::AppResult;

pub struct UserRepository;

const USER_COLUMNS: &str =
    "id, household_id, email, name, google_id, hashed_password, role, created_at";

fn map_user(r: SqliteRow) -> User {
    let role: String = r.get("role");
    User {
        id: r.get("id"),
        household_id: r.get("household_id"),
        email: r.get("email"),
        name: r.get("name"),
        google_id: r.get("google_id"),
        hashed_password: r.get("hashed_password"),
        role: UserRole::from_str(&role).unwrap_or(UserRole::Member),
        created_at: r.get("created_at"),
    }
}

impl UserRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(map_user))
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(map_user))
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        household_id: &str,
        email: &str,
        name: &str,
        hashed_password: &str,
        role: UserRole,
    ) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO users (id, household_id, email, name, hashed_password, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(household_id)
        .bind(email)
        .bind(name)
        .bind(hashed_password)
        .bind(role.as_str())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(User {
            id,
            household_id: household_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            google_id: None,
            hashed_password: Some(hashed_password.to_string()),
            role,
            created_at: now,
        })
    }
}
