use sqlx::{SqliteConnection, SqlitePool};

use super::{new_id, now};
use crate::{
    error::AppError,
    models::{Account, PublicAccount},
};

/// Avatar assigned at registration until the account uploads one.
pub const DEFAULT_AVATAR: &str = "/assets/defaults/avatar.png";

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Account, AppError> {
    let existing = sqlx::query_scalar::<_, String>("SELECT id FROM accounts WHERE email = ? OR name = ?")
        .bind(email)
        .bind(name)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "An account with this email or name already exists",
        ));
    }

    let id = new_id();
    let ts = now();

    sqlx::query(
        "INSERT INTO accounts (id, name, email, password_hash, avatar, has_channel, channel_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, NULL, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(DEFAULT_AVATAR)
    .bind(ts)
    .bind(ts)
    .execute(pool)
    .await?;

    fetch(pool, &id).await
}

pub async fn by_id(pool: &SqlitePool, id: &str) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(account)
}

pub async fn fetch(pool: &SqlitePool, id: &str) -> Result<Account, AppError> {
    by_id(pool, id).await?.ok_or(AppError::NotFound("Account"))
}

pub async fn by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(account)
}

pub struct AccountUpdate<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: String,
    pub avatar: Option<String>,
}

pub async fn update(
    pool: &SqlitePool,
    id: &str,
    update: AccountUpdate<'_>,
) -> Result<Account, AppError> {
    let taken = sqlx::query_scalar::<_, String>(
        "SELECT id FROM accounts WHERE (email = ? OR name = ?) AND id != ?",
    )
    .bind(update.email)
    .bind(update.name)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if taken.is_some() {
        return Err(AppError::Conflict(
            "An account with this email or name already exists",
        ));
    }

    let result = sqlx::query(
        "UPDATE accounts
         SET name = ?, email = ?, password_hash = ?, avatar = COALESCE(?, avatar), updated_at = ?
         WHERE id = ?",
    )
    .bind(update.name)
    .bind(update.email)
    .bind(&update.password_hash)
    .bind(update.avatar)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Account"));
    }

    fetch(pool, id).await
}

/// Point the account at its owned channel, or clear the link.
pub async fn set_channel(
    conn: &mut SqliteConnection,
    account_id: &str,
    channel_id: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE accounts SET has_channel = ?, channel_id = ?, updated_at = ? WHERE id = ?")
        .bind(channel_id.is_some())
        .bind(channel_id)
        .bind(now())
        .bind(account_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn subscription_ids(pool: &SqlitePool, account_id: &str) -> Result<Vec<String>, AppError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT channel_id FROM subscriptions WHERE account_id = ?",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn liked_video_ids(pool: &SqlitePool, account_id: &str) -> Result<Vec<String>, AppError> {
    let ids = sqlx::query_scalar::<_, String>("SELECT video_id FROM likes WHERE account_id = ?")
        .bind(account_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Public projection with the subscription and like edges attached.
pub async fn public(pool: &SqlitePool, account: Account) -> Result<PublicAccount, AppError> {
    let subscriptions = subscription_ids(pool, &account.id).await?;
    let likes = liked_video_ids(pool, &account.id).await?;
    Ok(PublicAccount::from_account(account, subscriptions, likes))
}
