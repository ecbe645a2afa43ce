//! Tubelet: a video-sharing platform backend.
//!
//! A stateless REST API over SQLite: accounts, channels, videos, comments,
//! likes, subscriptions and a tag registry. Media bytes never touch the
//! database; uploads go to an [`assets::AssetStore`] and only the returned
//! URL is persisted. Authentication is an HMAC-signed bearer token verified
//! per request.
//!
//! Structural deletes (account, channel, video) cascade across every table
//! that references the deleted row; see [`cascade`] for the contract.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub mod assets;
pub mod auth;
pub mod cascade;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

use state::AppState;

/// Full application router: the API plus static serving of stored assets.
pub fn app(state: Arc<AppState>) -> Router {
    let origin = match state.config.cors_origin.as_str() {
        "*" => AllowOrigin::any(),
        configured => match configured.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Invalid CORS_ORIGIN value: {e}");
                AllowOrigin::any()
            }
        },
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    routes::api_router()
        .nest_service("/assets", ServeDir::new(&state.config.assets_dir))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
