use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::Identity,
    error::{require_fields, AppError},
    models::ApiResponse,
    state::AppState,
    store::tags,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_tag))
        .route("/all", get(all_tags))
        .route("/delete/{id}", delete(delete_tag))
}

#[derive(Deserialize)]
struct CreateTagPayload {
    name: Option<String>,
}

async fn create_tag(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
    Json(payload): Json<CreateTagPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[("name", payload.name.as_deref())])?;

    let tag = tags::create(&state.pool, &payload.name.unwrap_or_default()).await?;
    Ok(ApiResponse::created(tag, "New tag created successfully"))
}

async fn all_tags(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let tags = tags::list(&state.pool).await?;
    Ok(ApiResponse::ok(tags, "All tags retrieved"))
}

async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    tags::delete(&state.pool, &id).await?;
    Ok(ApiResponse::ok(json!({}), "Tag removed successfully"))
}
