use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::models::Tag;
use crate::error::AppResult;

pub struct TagRepository;

fn map_tag(r: SqliteRow) -> Tag {
    Tag {
        id: r.get("id"),
        household_id: r.get("household_id"),
        name: r.get("name"),
        color: r.get("color"),
    }
}

impl TagRepository {
    pub async fn list(pool: &SqlitePool, household_id: &str) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, household_id, name, color FROM tags \
             WHERE household_id = ? ORDER BY name",
        )
        .bind(household_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(map_tag).collect())
    }

    pub async fn find_owned(
        pool: &SqlitePool,
        id: &str,
        household_id: &str,
    ) -> AppResult<Option<Tag>> {
        let row = sqlx::query(
            "SELECT id, household_id, name, color FROM tags \
             WHERE id = ? AND household_id = ?",
        )
        .bind(id)
        .bind(household_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(map_tag))
    }

    pub async fn create(
        pool: &SqlitePool,
        household_id: &str,
        name: &str,
        color: &str,
    ) -> AppResult<Tag> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO tags (id, household_id, name, color) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(household_id)
            .bind(name)
            .bind(color)
            .execute(pool)
            .await?;

        Ok(Tag {
            id,
            household_id: household_id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        })
    }

    pub async fn update(pool: &SqlitePool, id: &str, name: &str, color: &str) -> AppResult<()> {
        sqlx::query("UPDATE tags SET name = ?, color = ? WHERE id = ?")
            .bind(name)
            .bind(color)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remove the tag and its recipe links together.
    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM recipe_tags WHERE tag_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
