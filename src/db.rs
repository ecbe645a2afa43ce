//! SQLite connection pool and schema.
//!
//! All entity collections live in one database. Relationship edges
//! (subscriptions, likes) are stored once in dedicated edge tables, so the
//! two sides of an edge can never disagree; structural deletes are still
//! cascaded explicitly inside transactions rather than left to the schema.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        id            TEXT PRIMARY KEY,
        name          TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        avatar        TEXT NOT NULL,
        has_channel   INTEGER NOT NULL DEFAULT 0,
        channel_id    TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS channels (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        handle      TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        avatar      TEXT NOT NULL,
        banner      TEXT NOT NULL,
        owner       TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS videos (
        id            TEXT PRIMARY KEY,
        title         TEXT NOT NULL,
        description   TEXT NOT NULL,
        video_url     TEXT NOT NULL,
        thumbnail_url TEXT NOT NULL,
        duration      INTEGER NOT NULL DEFAULT 0,
        views         INTEGER NOT NULL DEFAULT 0,
        owner         TEXT NOT NULL,
        channel_id    TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_videos_owner ON videos (owner)",
    "CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos (channel_id)",
    "CREATE TABLE IF NOT EXISTS video_tags (
        video_id TEXT NOT NULL,
        tag      TEXT NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY (video_id, tag)
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id            TEXT PRIMARY KEY,
        video_id      TEXT NOT NULL,
        author_id     TEXT NOT NULL,
        author_name   TEXT NOT NULL,
        author_avatar TEXT NOT NULL,
        text          TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_comments_video ON comments (video_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_author ON comments (author_id)",
    "CREATE TABLE IF NOT EXISTS tags (
        id   TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS subscriptions (
        account_id TEXT NOT NULL,
        channel_id TEXT NOT NULL,
        PRIMARY KEY (account_id, channel_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_channel ON subscriptions (channel_id)",
    "CREATE TABLE IF NOT EXISTS likes (
        account_id TEXT NOT NULL,
        video_id   TEXT NOT NULL,
        PRIMARY KEY (account_id, video_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_likes_video ON likes (video_id)",
];

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        // Prevent transient "database is locked" errors under concurrent access.
        .busy_timeout(Duration::from_secs(5));

    // A single connection keeps in-memory databases alive and sidesteps
    // SQLite's limited write concurrency.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Fresh in-memory database, used throughout the test suites.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    connect("sqlite::memory:").await.expect("in-memory pool")
}
