//! Tag registry: a deduplicated name table, populated lazily the first time
//! a video uses a name. Tags are never reference-counted or garbage-collected
//! when the last video using them goes away.

use sqlx::{SqliteConnection, SqlitePool};

use super::new_id;
use crate::{error::AppError, models::Tag};

/// Trim and lower-case a tag name. Returns `None` for blank input.
pub fn normalize(name: &str) -> Option<String> {
    let normalized = name.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

/// Insert the name if the registry does not know it yet.
/// Expects an already-normalized name.
pub async fn upsert(conn: &mut SqliteConnection, name: &str) -> Result<(), AppError> {
    sqlx::query("INSERT OR IGNORE INTO tags (id, name) VALUES (?, ?)")
        .bind(new_id())
        .bind(name)
        .execute(conn)
        .await?;
    Ok(())
}

/// Explicit registry creation; rejects names already present.
pub async fn create(pool: &SqlitePool, name: &str) -> Result<Tag, AppError> {
    let name = normalize(name).ok_or(AppError::Validation(vec!["name"]))?;

    let result = sqlx::query("INSERT OR IGNORE INTO tags (id, name) VALUES (?, ?)")
        .bind(new_id())
        .bind(&name)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("This tag already exists"));
    }

    let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
        .bind(&name)
        .fetch_one(pool)
        .await?;
    Ok(tag)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(tags)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Tag"));
    }
    Ok(())
}
