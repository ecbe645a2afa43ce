use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::Identity,
    cascade,
    error::{require_fields, AppError},
    models::ApiResponse,
    state::AppState,
    store::{accounts, videos},
};

use super::{parse_tag_list, upload, FormData};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/allVideo", get(all_videos))
        .route("/videoData/{id}", get(video_data))
        .route("/allUserVideo/{owner}", get(all_user_videos))
        .route("/publish", post(publish))
        .route("/update/{id}", put(update_video))
        .route("/delete/{id}", delete(delete_video))
        .route("/incrementView/{id}", put(increment_view))
        .route("/like", post(like))
        .route("/removelike", post(remove_like))
}

async fn all_videos(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let videos = videos::list_all(&state.pool).await?;
    Ok(ApiResponse::ok(videos, "Fetched all videos"))
}

async fn video_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video = videos::fetch(&state.pool, &id).await?;
    let detail = videos::detail(&state.pool, video).await?;
    Ok(ApiResponse::ok(detail, "Video details fetched successfully"))
}

async fn all_user_videos(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let videos = videos::list_by_owner(&state.pool, &owner).await?;
    Ok(ApiResponse::ok(videos, "Fetched user's videos"))
}

async fn publish(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = FormData::read(multipart).await?;

    require_fields(&[
        ("title", form.text("title")),
        ("description", form.text("description")),
        ("thumbnail", form.file("thumbnail").map(|f| f.name.as_str())),
        ("videoFile", form.file("videoFile").map(|f| f.name.as_str())),
    ])?;

    let account = accounts::fetch(&state.pool, &identity.id).await?;
    let channel_id = account.channel_id.ok_or(AppError::NotFound("Channel"))?;

    // Both uploads complete before any database write; a failed upload
    // leaves no partial video behind.
    let thumbnail_url = match form.file("thumbnail") {
        Some(file) => upload(&state, "thumbnail", file).await?,
        None => return Err(AppError::Validation(vec!["thumbnail"])),
    };
    let video_url = match form.file("videoFile") {
        Some(file) => upload(&state, "videoFile", file).await?,
        None => return Err(AppError::Validation(vec!["videoFile"])),
    };

    let tags = form.text("tags").map(parse_tag_list).unwrap_or_default();

    let video = videos::create(
        &state.pool,
        videos::NewVideo {
            title: form.text("title").unwrap_or_default(),
            description: form.text("description").unwrap_or_default(),
            video_url,
            thumbnail_url,
            owner: &identity.id,
            channel_id: &channel_id,
            tags,
        },
    )
    .await?;
    let detail = videos::detail(&state.pool, video).await?;

    Ok(ApiResponse::created(detail, "Video published successfully"))
}

async fn update_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let video = videos::fetch(&state.pool, &id).await?;
    if video.owner != identity.id {
        return Err(AppError::Forbidden("Only the owner can update this video"));
    }

    let form = FormData::read(multipart).await?;

    let thumbnail_url = match form.file("thumbnail") {
        Some(file) => Some(upload(&state, "thumbnail", file).await?),
        None => None,
    };
    let video_url = match form.file("videoFile") {
        Some(file) => Some(upload(&state, "videoFile", file).await?),
        None => None,
    };

    let video = videos::update(
        &state.pool,
        &id,
        videos::VideoUpdate {
            title: form.text("title").map(str::to_string),
            description: form.text("description").map(str::to_string),
            video_url,
            thumbnail_url,
            tags: form.text("tags").map(parse_tag_list),
        },
    )
    .await?;
    let detail = videos::detail(&state.pool, video).await?;

    Ok(ApiResponse::ok(detail, "Video details updated successfully"))
}

async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    cascade::delete_video(&state.pool, &id, &identity.id).await?;
    Ok(ApiResponse::ok(json!(null), "Video deleted successfully"))
}

async fn increment_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let video = videos::increment_views(&state.pool, &id).await?;
    let detail = videos::detail(&state.pool, video).await?;
    Ok(ApiResponse::ok(detail, "View count updated"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikePayload {
    video_id: Option<String>,
}

async fn like(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<LikePayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[("videoId", payload.video_id.as_deref())])?;

    cascade::like(&state.pool, &identity.id, &payload.video_id.unwrap_or_default()).await?;
    Ok(ApiResponse::ok(json!(null), "Video liked successfully"))
}

async fn remove_like(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<LikePayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[("videoId", payload.video_id.as_deref())])?;

    cascade::unlike(&state.pool, &identity.id, &payload.video_id.unwrap_or_default()).await?;
    Ok(ApiResponse::ok(json!(null), "Video unliked successfully"))
}
