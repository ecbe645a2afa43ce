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
    auth::{self, Identity},
    cascade,
    error::{require_fields, AppError},
    models::ApiResponse,
    state::AppState,
    store::accounts,
};

use super::{upload, FormData};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/data/{id}", get(account_data))
        .route("/update/{id}", put(update_account))
        .route("/delete/{id}", delete(delete_account))
}

#[derive(Deserialize)]
struct RegisterPayload {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[
        ("name", payload.name.as_deref()),
        ("email", payload.email.as_deref()),
        ("password", payload.password.as_deref()),
    ])?;

    let name = payload.name.unwrap_or_default();
    let email = payload.email.unwrap_or_default();
    let password_hash = auth::hash_password(&payload.password.unwrap_or_default())?;

    let account = accounts::create(&state.pool, &name, &email, &password_hash).await?;
    let public = accounts::public(&state.pool, account).await?;

    Ok(ApiResponse::created(public, "User registered successfully"))
}

#[derive(Deserialize)]
struct LoginPayload {
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_fields(&[
        ("email", payload.email.as_deref()),
        ("password", payload.password.as_deref()),
    ])?;

    let account = accounts::by_email(&state.pool, &payload.email.unwrap_or_default())
        .await?
        .ok_or(AppError::NotFound("Account"))?;

    if !auth::verify_password(&payload.password.unwrap_or_default(), &account.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    let token = auth::issue_token(&account, &state.config.token_secret, state.config.token_ttl_secs)?;
    let public = accounts::public(&state.pool, account).await?;

    Ok(ApiResponse::ok(
        json!({ "user": public, "token": token }),
        "Login successful",
    ))
}

/// Tokens are stateless; logging out is an acknowledgement that the client
/// discards its token.
async fn logout(_identity: Identity) -> impl IntoResponse {
    ApiResponse::ok(json!({}), "Logout successful")
}

async fn account_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let account = accounts::fetch(&state.pool, &id).await?;
    let public = accounts::public(&state.pool, account).await?;
    Ok(ApiResponse::ok(public, "User details fetched"))
}

async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    if identity.id != id {
        return Err(AppError::Forbidden("You can only update your own account"));
    }

    let form = FormData::read(multipart).await?;
    require_fields(&[
        ("name", form.text("name")),
        ("email", form.text("email")),
        ("password", form.text("password")),
    ])?;

    // Upload before touching the database so a failed upload changes nothing.
    let avatar = match form.file("avatar") {
        Some(file) => Some(upload(&state, "avatar", file).await?),
        None => None,
    };

    let password_hash = auth::hash_password(form.text("password").unwrap_or_default())?;

    let account = accounts::update(
        &state.pool,
        &id,
        accounts::AccountUpdate {
            name: form.text("name").unwrap_or_default(),
            email: form.text("email").unwrap_or_default(),
            password_hash,
            avatar,
        },
    )
    .await?;
    let public = accounts::public(&state.pool, account).await?;

    Ok(ApiResponse::ok(public, "Account updated successfully"))
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    if identity.id != id {
        return Err(AppError::Forbidden("You can only delete your own account"));
    }

    cascade::delete_account(&state.pool, &id).await?;

    Ok(ApiResponse::ok(json!({}), "User account and all data deleted"))
}
