//! Entity rows and the JSON shapes the API exposes.
//!
//! Rows map 1:1 onto the tables in [`crate::db`]. Response types never carry
//! the password hash; relationship edges are loaded from the edge tables and
//! attached as id lists, matching what the web client consumes.

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Standard response envelope: `{ status, data, message }`.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub data: T,
    pub message: &'static str,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: &'static str) -> impl IntoResponse {
        Self::with_status(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: &'static str) -> impl IntoResponse {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    fn with_status(status: StatusCode, data: T, message: &'static str) -> impl IntoResponse {
        (
            status,
            Json(Self {
                status: status.as_u16(),
                data,
                message,
            }),
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub has_channel: bool,
    pub channel_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account as returned by the API: hash stripped, edges attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub has_channel: bool,
    pub channel_id: Option<String>,
    pub subscriptions: Vec<String>,
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublicAccount {
    pub fn from_account(account: Account, subscriptions: Vec<String>, likes: Vec<String>) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            avatar: account.avatar,
            has_channel: account.has_channel,
            channel_id: account.channel_id,
            subscriptions,
            likes,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Minimal owner projection embedded in channel and video responses.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub description: String,
    pub avatar: String,
    pub banner: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDetail {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub description: String,
    pub avatar: String,
    pub banner: String,
    pub owner: OwnerSummary,
    pub subscribers: Vec<String>,
    pub videos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Channel projection embedded in video responses.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub avatar: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: i64,
    pub views: i64,
    pub owner: String,
    pub channel_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: i64,
    pub views: i64,
    pub owner: OwnerSummary,
    pub channel: Option<ChannelSummary>,
    pub tags: Vec<String>,
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment row. `author_name`/`author_avatar` are a point-in-time snapshot
/// taken when the comment was posted; later profile edits do not touch them.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
}
