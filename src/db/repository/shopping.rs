use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::db::models::{Ingredient, ShoppingItem, ShoppingList};
use crate::error::AppResult;

pub struct ShoppingRepository;

fn map_list(r: SqliteRow) -> ShoppingList {
    ShoppingList {
        id: r.get("id"),
        household_id: r.get("household_id"),
        name: r.get("name"),
        created_at: r.get("created_at"),
    }
}

fn map_item(r: SqliteRow) -> ShoppingItem {
    ShoppingItem {
        id: r.get("id"),
        list_id: r.get("list_id"),
        recipe_id: r.get("recipe_id"),
        ingredient_name: r.get("ingredient_name"),
        quantity: r.get("quantity"),
        unit: r.get("unit"),
        checked: r.get::<i64, _>("checked") != 0,
    }
}

impl ShoppingRepository {
    pub async fn list(pool: &SqlitePool, household_id: &str) -> AppResult<Vec<ShoppingList>> {
        let rows = sqlx::query(
            "SELECT id, household_id, name, created_at FROM shopping_lists \
             WHERE household_id = ? ORDER BY created_at DESC",
        )
        .bind(household_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(map_list).collect())
    }

    pub async fn find_owned(
        pool: &SqlitePool,
        id: &str,
        household_id: &str,
    ) -> AppResult<Option<ShoppingList>> {
        let row = sqlx::query(
            "SELECT id, household_id, name, created_at FROM shopping_lists \
             WHERE id = ? AND household_id = ?",
        )
        .bind(id)
        .bind(household_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(map_list))
    }

    pub async fn create(
        pool: &SqlitePool,
        household_id: &str,
        name: &str,
    ) -> AppResult<ShoppingList> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            "INSERT INTO shopping_lists (id, household_id, name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(household_id)
        .bind(name)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(ShoppingList {
            id,
            household_id: household_id.to_string(),
            name: name.to_string(),
            created_at: now,
        })
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM shopping_items WHERE list_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shopping_lists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn items_for(pool: &SqlitePool, list_id: &str) -> AppResult<Vec<ShoppingItem>> {
        let rows = sqlx::query(
            "SELECT id, list_id, recipe_id, ingredient_name, quantity, unit, checked \
             FROM shopping_items WHERE list_id = ? ORDER BY rowid",
        )
        .bind(list_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(map_item).collect())
    }

    pub async fn add_item(
        pool: &SqlitePool,
        list_id: &str,
        ingredient_name: &str,
        quantity: Option<&str>,
        unit: Option<&str>,
        recipe_id: Option<&str>,
    ) -> AppResult<ShoppingItem> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO shopping_items (id, list_id, recipe_id, ingredient_name, quantity, unit, checked)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&id)
        .bind(list_id)
        .bind(recipe_id)
        .bind(ingredient_name)
        .bind(quantity)
        .bind(unit)
        .execute(pool)
        .await?;

        Ok(ShoppingItem {
            id,
            list_id: list_id.to_string(),
            recipe_id: recipe_id.map(str::to_string),
            ingredient_name: ingredient_name.to_string(),
            quantity: quantity.map(str::to_string),
            unit: unit.map(str::to_string),
            checked: false,
        })
    }

    /// Copy recipe ingredients onto a list in one transaction. The copies are
    /// snapshots: later ingredient edits do not touch them.
    pub async fn add_from_recipe(
        conn: &mut SqliteConnection,
        list_id: &str,
        recipe_id: &str,
        ingredients: &[Ingredient],
    ) -> AppResult<()> {
        for ing in ingredients {
            sqlx::query(
                r#"
                INSERT INTO shopping_items (id, list_id, recipe_id, ingredient_name, quantity, unit, checked)
                VALUES (?, ?, ?, ?, ?, ?, 0)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(list_id)
            .bind(recipe_id)
            .bind(&ing.name)
            .bind(&ing.quantity)
            .bind(&ing.unit)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Item lookup scoped to its list, so a foreign item id is a plain miss.
    pub async fn find_item(
        pool: &SqlitePool,
        list_id: &str,
        item_id: &str,
    ) -> AppResult<Option<ShoppingItem>> {
        let row = sqlx::query(
            "SELECT id, list_id, recipe_id, ingredient_name, quantity, unit, checked \
             FROM shopping_items WHERE id = ? AND list_id = ?",
        )
        .bind(item_id)
        .bind(list_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(map_item))
    }

    pub async fn set_item_checked(pool: &SqlitePool, item_id: &str, checked: bool) -> AppResult<()> {
        sqlx::query("UPDATE shopping_items SET checked = ? WHERE id = ?")
            .bind(checked as i64)
            .bind(item_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
