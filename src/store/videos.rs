use sqlx::{SqliteConnection, SqlitePool};

use super::{channels, new_id, now, tags};
use crate::{
    error::AppError,
    models::{OwnerSummary, Video, VideoDetail},
};

pub struct NewVideo<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub video_url: String,
    pub thumbnail_url: String,
    pub owner: &'a str,
    pub channel_id: &'a str,
    pub tags: Vec<String>,
}

/// Insert a video, its tag rows, and any tag names new to the registry.
pub async fn create(pool: &SqlitePool, video: NewVideo<'_>) -> Result<Video, AppError> {
    let id = new_id();
    let ts = now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO videos (id, title, description, video_url, thumbnail_url, duration, views, owner, channel_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(video.title)
    .bind(video.description)
    .bind(&video.video_url)
    .bind(&video.thumbnail_url)
    .bind(video.owner)
    .bind(video.channel_id)
    .bind(ts)
    .bind(ts)
    .execute(&mut *tx)
    .await?;

    set_tags(&mut *tx, &id, &video.tags).await?;

    tx.commit().await?;

    fetch(pool, &id).await
}

pub async fn by_id(pool: &SqlitePool, id: &str) -> Result<Option<Video>, AppError> {
    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(video)
}

pub async fn fetch(pool: &SqlitePool, id: &str) -> Result<Video, AppError> {
    by_id(pool, id).await?.ok_or(AppError::NotFound("Video"))
}

pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub async fn update(pool: &SqlitePool, id: &str, update: VideoUpdate) -> Result<Video, AppError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE videos
         SET title = COALESCE(?, title),
             description = COALESCE(?, description),
             video_url = COALESCE(?, video_url),
             thumbnail_url = COALESCE(?, thumbnail_url),
             updated_at = ?
         WHERE id = ?",
    )
    .bind(update.title)
    .bind(update.description)
    .bind(update.video_url)
    .bind(update.thumbnail_url)
    .bind(now())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Video"));
    }

    if let Some(tag_names) = update.tags {
        sqlx::query("DELETE FROM video_tags WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        set_tags(&mut *tx, id, &tag_names).await?;
    }

    tx.commit().await?;

    fetch(pool, id).await
}

/// Attach normalized tag rows to a video and register unseen names.
/// Positions record submission order so listings come back as sent.
async fn set_tags(
    conn: &mut SqliteConnection,
    video_id: &str,
    tag_names: &[String],
) -> Result<(), AppError> {
    for (position, name) in tag_names.iter().enumerate() {
        let Some(normalized) = tags::normalize(name) else {
            continue;
        };

        tags::upsert(&mut *conn, &normalized).await?;

        sqlx::query("INSERT OR IGNORE INTO video_tags (video_id, tag, position) VALUES (?, ?, ?)")
            .bind(video_id)
            .bind(&normalized)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn increment_views(pool: &SqlitePool, id: &str) -> Result<Video, AppError> {
    let result = sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Video"));
    }

    fetch(pool, id).await
}

pub async fn tag_names(pool: &SqlitePool, video_id: &str) -> Result<Vec<String>, AppError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT tag FROM video_tags WHERE video_id = ? ORDER BY position",
    )
    .bind(video_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

pub async fn liker_ids(pool: &SqlitePool, video_id: &str) -> Result<Vec<String>, AppError> {
    let ids = sqlx::query_scalar::<_, String>("SELECT account_id FROM likes WHERE video_id = ?")
        .bind(video_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Video with populated owner/channel and its tag and like edges.
pub async fn detail(pool: &SqlitePool, video: Video) -> Result<VideoDetail, AppError> {
    let owner =
        sqlx::query_as::<_, OwnerSummary>("SELECT id, name, avatar FROM accounts WHERE id = ?")
            .bind(&video.owner)
            .fetch_one(pool)
            .await?;

    let channel = match &video.channel_id {
        Some(channel_id) => channels::summary(pool, channel_id).await?,
        None => None,
    };

    let tags = tag_names(pool, &video.id).await?;
    let likes = liker_ids(pool, &video.id).await?;

    Ok(VideoDetail {
        id: video.id,
        title: video.title,
        description: video.description,
        video_url: video.video_url,
        thumbnail_url: video.thumbnail_url,
        duration: video.duration,
        views: video.views,
        owner,
        channel,
        tags,
        likes,
        created_at: video.created_at,
        updated_at: video.updated_at,
    })
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<VideoDetail>, AppError> {
    let videos = sqlx::query_as::<_, Video>("SELECT * FROM videos ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    details(pool, videos).await
}

pub async fn list_by_owner(pool: &SqlitePool, owner: &str) -> Result<Vec<VideoDetail>, AppError> {
    let videos =
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE owner = ? ORDER BY created_at DESC")
            .bind(owner)
            .fetch_all(pool)
            .await?;
    details(pool, videos).await
}

async fn details(pool: &SqlitePool, videos: Vec<Video>) -> Result<Vec<VideoDetail>, AppError> {
    let mut out = Vec::with_capacity(videos.len());
    for video in videos {
        out.push(detail(pool, video).await?);
    }
    Ok(out)
}
