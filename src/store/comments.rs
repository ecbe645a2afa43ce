use sqlx::SqlitePool;

use super::{new_id, now};
use crate::{auth::Identity, error::AppError, models::Comment};

/// Post a comment, snapshotting the author's display name and avatar as they
/// are right now. The snapshot is deliberate denormalization: the original
/// client renders comments without joining accounts, at the cost of staleness
/// when the author later edits their profile.
pub async fn create(
    pool: &SqlitePool,
    video_id: &str,
    author: &Identity,
    author_avatar: &str,
    text: &str,
) -> Result<Comment, AppError> {
    let id = new_id();
    let ts = now();

    sqlx::query(
        "INSERT INTO comments (id, video_id, author_id, author_name, author_avatar, text, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(video_id)
    .bind(&author.id)
    .bind(&author.name)
    .bind(author_avatar)
    .bind(text)
    .bind(ts)
    .bind(ts)
    .execute(pool)
    .await?;

    fetch(pool, &id).await
}

pub async fn fetch(pool: &SqlitePool, id: &str) -> Result<Comment, AppError> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Comment"))
}

pub async fn list_for_video(pool: &SqlitePool, video_id: &str) -> Result<Vec<Comment>, AppError> {
    let comments = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE video_id = ? ORDER BY created_at DESC",
    )
    .bind(video_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

/// Edit the text of a comment; only its author may do so.
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    requester: &str,
    text: &str,
) -> Result<Comment, AppError> {
    let comment = fetch(pool, id).await?;
    if comment.author_id != requester {
        return Err(AppError::Forbidden("Only the author can edit this comment"));
    }

    sqlx::query("UPDATE comments SET text = ?, updated_at = ? WHERE id = ?")
        .bind(text)
        .bind(now())
        .bind(id)
        .execute(pool)
        .await?;

    fetch(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: &str, requester: &str) -> Result<(), AppError> {
    let comment = fetch(pool, id).await?;
    if comment.author_id != requester {
        return Err(AppError::Forbidden(
            "Only the author can delete this comment",
        ));
    }

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
