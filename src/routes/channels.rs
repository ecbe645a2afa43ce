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
    store::channels,
};

use super::{upload, FormData};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/data/{id}", get(channel_data))
        .route("/create", post(create_channel))
        .route("/update/{id}", put(update_channel))
        .route("/delete/{id}", delete(delete_channel))
        .route("/subscribe/{id}", post(subscribe))
        .route("/unsubscribe/{id}", post(unsubscribe))
}

async fn channel_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = channels::detail(&state.pool, &id).await?;
    Ok(ApiResponse::ok(detail, "Channel details found"))
}

#[derive(Deserialize)]
struct CreateChannelPayload {
    name: Option<String>,
    handle: Option<String>,
}

async fn create_channel(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<CreateChannelPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[
        ("name", payload.name.as_deref()),
        ("handle", payload.handle.as_deref()),
    ])?;

    let channel = channels::create(
        &state.pool,
        &identity.id,
        &payload.name.unwrap_or_default(),
        &payload.handle.unwrap_or_default(),
    )
    .await?;
    let detail = channels::detail(&state.pool, &channel.id).await?;

    Ok(ApiResponse::created(detail, "Channel created successfully"))
}

async fn update_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let channel = channels::fetch(&state.pool, &id).await?;
    if channel.owner != identity.id {
        return Err(AppError::Forbidden("Only the owner can update this channel"));
    }

    let form = FormData::read(multipart).await?;

    let banner = match form.file("banner") {
        Some(file) => Some(upload(&state, "banner", file).await?),
        None => None,
    };
    let avatar = match form.file("avatar") {
        Some(file) => Some(upload(&state, "avatar", file).await?),
        None => None,
    };

    let channel = channels::update(
        &state.pool,
        &id,
        channels::ChannelUpdate {
            name: form.text("name").map(str::to_string),
            handle: form.text("handle").map(str::to_string),
            description: form.text("description").map(str::to_string),
            avatar,
            banner,
        },
    )
    .await?;
    let detail = channels::detail(&state.pool, &channel.id).await?;

    Ok(ApiResponse::ok(detail, "Channel updated"))
}

async fn delete_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    cascade::delete_channel(&state.pool, &id, &identity.id).await?;
    Ok(ApiResponse::ok(json!({}), "Channel deleted"))
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    cascade::subscribe(&state.pool, &identity.id, &id).await?;
    let detail = channels::detail(&state.pool, &id).await?;
    Ok(ApiResponse::ok(detail, "Subscribed successfully"))
}

async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    cascade::unsubscribe(&state.pool, &identity.id, &id).await?;
    let detail = channels::detail(&state.pool, &id).await?;
    Ok(ApiResponse::ok(detail, "Unsubscribed"))
}
