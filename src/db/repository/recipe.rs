use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::db::models::{Ingredient, Recipe, Step, Tag};
use crate::error::AppResult;

/// Scalar recipe columns plus child collections, as accepted on create and
/// update. Incoming child order values are ignored; list position wins.
#[derive(Debug, Clone, Default)]
pub struct RecipeData {
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
    pub ingredients: Vec<NewIngredient>,
    pub steps: Vec<NewStep>,
    pub tag_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStep {
    pub title: Option<String>,
    pub description: String,
    pub timer_seconds: Option<i64>,
}

const RECIPE_COLUMNS: &str = "id, household_id, title, description, image_url, source_url, \
     author, servings, prep_time, cook_time, total_time, cuisine, category, cooking_method, \
     suitable_for_diet, nutrition, created_at, updated_at";

fn map_recipe(r: SqliteRow) -> Recipe {
    // JSON-in-TEXT columns; unreadable stored values degrade to None.
    let diet: Option<String> = r.get("suitable_for_diet");
    let nutrition: Option<String> = r.get("nutrition");

    Recipe {
        id: r.get("id"),
        household_id: r.get("household_id"),
        title: r.get("title"),
        description: r.get("description"),
        image_url: r.get("image_url"),
        source_url: r.get("source_url"),
        author: r.get("author"),
        servings: r.get("servings"),
        prep_time: r.get("prep_time"),
        cook_time: r.get("cook_time"),
        total_time: r.get("total_time"),
        cuisine: r.get("cuisine"),
        category: r.get("category"),
        cooking_method: r.get("cooking_method"),
        suitable_for_diet: diet.and_then(|s| serde_json::from_str(&s).ok()),
        nutrition: nutrition.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn map_ingredient(r: SqliteRow) -> Ingredient {
    Ingredient {
        id: r.get("id"),
        recipe_id: r.get("recipe_id"),
        name: r.get("name"),
        quantity: r.get("quantity"),
        unit: r.get("unit"),
        notes: r.get("notes"),
        ord: r.get("ord"),
    }
}

fn map_step(r: SqliteRow) -> Step {
    Step {
        id: r.get("id"),
        recipe_id: r.get("recipe_id"),
        title: r.get("title"),
        description: r.get("description"),
        ord: r.get("ord"),
        timer_seconds: r.get("timer_seconds"),
    }
}

fn map_tag(r: SqliteRow) -> Tag {
    Tag {
        id: r.get("id"),
        household_id: r.get("household_id"),
        name: r.get("name"),
        color: r.get("color"),
    }
}

fn json_text(value: &Option<impl serde::Serialize>) -> Option<String> {
    value
        .as_ref()
        .and_then(|v| serde_json::to_string(v).ok())
}

pub struct RecipeRepository;

impl RecipeRepository {
    /// List a household's recipes, newest first, with optional filters:
    /// free-text on title/description, cuisine substring, tag membership.
    pub async fn list(
        pool: &SqlitePool,
        household_id: &str,
        q: Option<&str>,
        tag_id: Option<&str>,
        cuisine: Option<&str>,
    ) -> AppResult<Vec<Recipe>> {
        let mut sql = format!(
            "SELECT DISTINCT r.{} FROM recipes r",
            RECIPE_COLUMNS.replace(", ", ", r.")
        );
        if tag_id.is_some() {
            sql.push_str(" JOIN recipe_tags rt ON rt.recipe_id = r.id");
        }
        sql.push_str(" WHERE r.household_id = ?");
        if q.is_some() {
            sql.push_str(" AND (LOWER(r.title) LIKE ? OR LOWER(r.description) LIKE ?)");
        }
        if cuisine.is_some() {
            sql.push_str(" AND LOWER(r.cuisine) LIKE ?");
        }
        if tag_id.is_some() {
            sql.push_str(" AND rt.tag_id = ?");
        }
        sql.push_str(" ORDER BY r.created_at DESC");

        let mut query = sqlx::query(&sql).bind(household_id);
        if let Some(q) = q {
            let pattern = format!("%{}%", q.to_lowercase());
            query = query.bind(pattern.clone()).bind(pattern);
        }
        if let Some(cuisine) = cuisine {
            query = query.bind(format!("%{}%", cuisine.to_lowercase()));
        }
        if let Some(tag_id) = tag_id {
            query = query.bind(tag_id);
        }

        let rows = query.fetch_all(pool).await?;
        Ok(rows.into_iter().map(map_recipe).collect())
    }

    /// Household-scoped lookup: a cross-tenant id comes back as None.
    pub async fn find_owned(
        pool: &SqlitePool,
        id: &str,
        household_id: &str,
    ) -> AppResult<Option<Recipe>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM recipes WHERE id = ? AND household_id = ?",
            RECIPE_COLUMNS
        ))
        .bind(id)
        .bind(household_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(map_recipe))
    }

    /// Insert a recipe with its children. Caller holds the transaction.
    pub async fn insert(
        conn: &mut SqliteConnection,
        household_id: &str,
        data: &RecipeData,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO recipes (
                id, household_id, title, description, image_url, source_url,
                author, servings, prep_time, cook_time, total_time,
                cuisine, category, cooking_method, suitable_for_diet, nutrition,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(household_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(&data.source_url)
        .bind(&data.author)
        .bind(&data.servings)
        .bind(data.prep_time)
        .bind(data.cook_time)
        .bind(data.total_time)
        .bind(&data.cuisine)
        .bind(&data.category)
        .bind(&data.cooking_method)
        .bind(json_text(&data.suitable_for_diet))
        .bind(json_text(&data.nutrition))
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Self::insert_children(conn, &id, household_id, data).await?;

        Ok(id)
    }

    /// Full-replace update: scalar columns are overwritten and every child
    /// collection is deleted and reinserted. No diffing, by contract.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        household_id: &str,
        data: &RecipeData,
    ) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE recipes SET
                title = ?, description = ?, image_url = ?, source_url = ?,
                author = ?, servings = ?, prep_time = ?, cook_time = ?, total_time = ?,
                cuisine = ?, category = ?, cooking_method = ?,
                suitable_for_diet = ?, nutrition = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(&data.source_url)
        .bind(&data.author)
        .bind(&data.servings)
        .bind(data.prep_time)
        .bind(data.cook_time)
        .bind(data.total_time)
        .bind(&data.cuisine)
        .bind(&data.category)
        .bind(&data.cooking_method)
        .bind(json_text(&data.suitable_for_diet))
        .bind(json_text(&data.nutrition))
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Self::delete_children(conn, id).await?;
        Self::insert_children(conn, id, household_id, data).await?;

        Ok(())
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> AppResult<()> {
        Self::delete_children(conn, id).await?;
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn delete_children(conn: &mut SqliteConnection, recipe_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM ingredients WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM steps WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn insert_children(
        conn: &mut SqliteConnection,
        recipe_id: &str,
        household_id: &str,
        data: &RecipeData,
    ) -> AppResult<()> {
        for (i, ing) in data.ingredients.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO ingredients (id, recipe_id, name, quantity, unit, notes, ord)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(recipe_id)
            .bind(&ing.name)
            .bind(&ing.quantity)
            .bind(&ing.unit)
            .bind(&ing.notes)
            .bind(i as i64)
            .execute(&mut *conn)
            .await?;
        }

        for (i, step) in data.steps.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO steps (id, recipe_id, title, description, ord, timer_seconds)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(recipe_id)
            .bind(&step.title)
            .bind(&step.description)
            .bind(i as i64)
            .bind(step.timer_seconds)
            .execute(&mut *conn)
            .await?;
        }

        // Link only tags that actually belong to this household; a foreign
        // tag id is dropped silently rather than linked or reported.
        for tag_id in &data.tag_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO recipe_tags (recipe_id, tag_id)
                SELECT ?, id FROM tags WHERE id = ? AND household_id = ?
                "#,
            )
            .bind(recipe_id)
            .bind(tag_id)
            .bind(household_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn ingredients_for(pool: &SqlitePool, recipe_id: &str) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query(
            "SELECT id, recipe_id, name, quantity, unit, notes, ord \
             FROM ingredients WHERE recipe_id = ? ORDER BY ord",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(map_ingredient).collect())
    }

    pub async fn steps_for(pool: &SqlitePool, recipe_id: &str) -> AppResult<Vec<Step>> {
        let rows = sqlx::query(
            "SELECT id, recipe_id, title, description, ord, timer_seconds \
             FROM steps WHERE recipe_id = ? ORDER BY ord",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(map_step).collect())
    }

    pub async fn tags_for(pool: &SqlitePool, recipe_id: &str) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.household_id, t.name, t.color
            FROM tags t
            JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(map_tag).collect())
    }

    /// Fetch ingredients matching both the id set and the recipe. Ids that
    /// belong to some other recipe simply do not come back.
    pub async fn ingredients_by_ids(
        pool: &SqlitePool,
        recipe_id: &str,
        ids: &[String],
    ) -> AppResult<Vec<Ingredient>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, recipe_id, name, quantity, unit, notes, ord \
             FROM ingredients WHERE recipe_id = ? AND id IN ({}) ORDER BY ord",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(recipe_id);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(pool).await?;
        Ok(rows.into_iter().map(map_ingredient).collect())
    }
}
