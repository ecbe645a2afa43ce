use sqlx::SqlitePool;

use super::{accounts, new_id, now};
use crate::{
    error::AppError,
    models::{Channel, ChannelDetail, ChannelSummary, OwnerSummary},
};

pub const DEFAULT_AVATAR: &str = "/assets/defaults/channel-avatar.png";
pub const DEFAULT_BANNER: &str = "/assets/defaults/channel-banner.png";

/// Create a channel for `owner` and mark the account as a channel owner.
/// An account owns at most one channel.
pub async fn create(
    pool: &SqlitePool,
    owner: &str,
    name: &str,
    handle: &str,
) -> Result<Channel, AppError> {
    let account = accounts::fetch(pool, owner).await?;
    if account.has_channel {
        return Err(AppError::Conflict("Account already owns a channel"));
    }

    let taken = sqlx::query_scalar::<_, String>("SELECT id FROM channels WHERE handle = ?")
        .bind(handle)
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("This handle is already taken"));
    }

    let id = new_id();
    let ts = now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO channels (id, name, handle, description, avatar, banner, owner, created_at, updated_at)
         VALUES (?, ?, ?, '', ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(handle)
    .bind(DEFAULT_AVATAR)
    .bind(DEFAULT_BANNER)
    .bind(owner)
    .bind(ts)
    .bind(ts)
    .execute(&mut *tx)
    .await?;

    accounts::set_channel(&mut *tx, owner, Some(&id)).await?;

    tx.commit().await?;

    fetch(pool, &id).await
}

pub async fn by_id(pool: &SqlitePool, id: &str) -> Result<Option<Channel>, AppError> {
    let channel = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(channel)
}

pub async fn fetch(pool: &SqlitePool, id: &str) -> Result<Channel, AppError> {
    by_id(pool, id).await?.ok_or(AppError::NotFound("Channel"))
}

pub struct ChannelUpdate {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

pub async fn update(
    pool: &SqlitePool,
    id: &str,
    update: ChannelUpdate,
) -> Result<Channel, AppError> {
    if let Some(handle) = &update.handle {
        let taken =
            sqlx::query_scalar::<_, String>("SELECT id FROM channels WHERE handle = ? AND id != ?")
                .bind(handle)
                .bind(id)
                .fetch_optional(pool)
                .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("This handle is already taken"));
        }
    }

    let result = sqlx::query(
        "UPDATE channels
         SET name = COALESCE(?, name),
             handle = COALESCE(?, handle),
             description = COALESCE(?, description),
             avatar = COALESCE(?, avatar),
             banner = COALESCE(?, banner),
             updated_at = ?
         WHERE id = ?",
    )
    .bind(update.name)
    .bind(update.handle)
    .bind(update.description)
    .bind(update.avatar)
    .bind(update.banner)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Channel"));
    }

    fetch(pool, id).await
}

pub async fn subscriber_ids(pool: &SqlitePool, channel_id: &str) -> Result<Vec<String>, AppError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT account_id FROM subscriptions WHERE channel_id = ?",
    )
    .bind(channel_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn video_ids(pool: &SqlitePool, channel_id: &str) -> Result<Vec<String>, AppError> {
    let ids = sqlx::query_scalar::<_, String>("SELECT id FROM videos WHERE channel_id = ?")
        .bind(channel_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Channel with its owner populated and subscriber/video edges attached.
pub async fn detail(pool: &SqlitePool, id: &str) -> Result<ChannelDetail, AppError> {
    let channel = fetch(pool, id).await?;

    let owner = sqlx::query_as::<_, OwnerSummary>("SELECT id, name, avatar FROM accounts WHERE id = ?")
        .bind(&channel.owner)
        .fetch_one(pool)
        .await?;

    let subscribers = subscriber_ids(pool, id).await?;
    let videos = video_ids(pool, id).await?;

    Ok(ChannelDetail {
        id: channel.id,
        name: channel.name,
        handle: channel.handle,
        description: channel.description,
        avatar: channel.avatar,
        banner: channel.banner,
        owner,
        subscribers,
        videos,
        created_at: channel.created_at,
        updated_at: channel.updated_at,
    })
}

pub async fn summary(pool: &SqlitePool, id: &str) -> Result<Option<ChannelSummary>, AppError> {
    let summary =
        sqlx::query_as::<_, ChannelSummary>("SELECT id, name, handle, avatar FROM channels WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(summary)
}
