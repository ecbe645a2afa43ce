use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::Identity,
    error::{require_fields, AppError},
    models::ApiResponse,
    state::AppState,
    store::{accounts, comments, videos},
};

pub fn router() -> Router<Arc<AppState>> {
    // GET/POST address a video id, PUT/DELETE a comment id, mirroring the
    // original route table.
    Router::new().route(
        "/{id}",
        get(comments_for_video)
            .post(add_comment)
            .put(update_comment)
            .delete(delete_comment),
    )
}

async fn comments_for_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let comments = comments::list_for_video(&state.pool, &video_id).await?;
    Ok(ApiResponse::ok(comments, "Comments retrieved successfully"))
}

#[derive(Deserialize)]
struct AddCommentPayload {
    comment: Option<String>,
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    identity: Identity,
    Json(payload): Json<AddCommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[("comment", payload.comment.as_deref())])?;

    // The comment must point at a live video and author.
    videos::fetch(&state.pool, &video_id).await?;
    let author = accounts::fetch(&state.pool, &identity.id).await?;

    let comment = comments::create(
        &state.pool,
        &video_id,
        &identity,
        &author.avatar,
        payload.comment.unwrap_or_default().trim(),
    )
    .await?;

    Ok(ApiResponse::created(comment, "Comment posted successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCommentPayload {
    new_comment: Option<String>,
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<String>,
    identity: Identity,
    Json(payload): Json<UpdateCommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[("newComment", payload.new_comment.as_deref())])?;

    let comment = comments::update(
        &state.pool,
        &comment_id,
        &identity.id,
        payload.new_comment.unwrap_or_default().trim(),
    )
    .await?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    comments::delete(&state.pool, &comment_id, &identity.id).await?;
    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}
