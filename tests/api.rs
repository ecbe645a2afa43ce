//! End-to-end tests driving the full router over in-memory state.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use tubelet::{
    assets::LocalAssetStore,
    config::Config,
    db,
    state::AppState,
};

async fn test_app() -> (Router, SqlitePool, TempDir) {
    let pool = db::connect("sqlite::memory:").await.unwrap();
    let assets_dir = tempfile::tempdir().unwrap();

    let config = Config {
        port: 0,
        database_url: "sqlite::memory:".into(),
        token_secret: "test-secret".into(),
        token_ttl_secs: 3600,
        assets_dir: assets_dir.path().display().to_string(),
        asset_base_url: "/assets".into(),
        cors_origin: "*".into(),
    };

    let state = Arc::new(AppState {
        config,
        pool: pool.clone(),
        assets: Arc::new(LocalAssetStore::new(assets_dir.path(), "/assets")),
    });

    (tubelet::app(state), pool, assets_dir)
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

const BOUNDARY: &str = "tubelet-test-boundary";

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send_multipart(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Vec<u8>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

#[tokio::test]
async fn register_login_publish_delete_flow() {
    let (app, pool, _assets) = test_app().await;

    // Register: 201, the stored password is a hash, never the plaintext.
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/register",
        None,
        Some(json!({ "name": "alice", "email": "a@x.com", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let alice_id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());

    let stored_hash: String =
        sqlx::query_scalar("SELECT password_hash FROM accounts WHERE id = ?")
            .bind(&alice_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_ne!(stored_hash, "p");

    // Wrong password is rejected.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Correct password yields a token.
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Channel creation requires auth.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/channel/create",
        None,
        Some(json!({ "name": "Alice Ch", "handle": "@alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/channel/create",
        Some(&token),
        Some(json!({ "name": "Alice Ch", "handle": "@alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let channel_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        Method::GET,
        &format!("/api/v1/account/data/{alice_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["hasChannel"], json!(true));
    assert_eq!(body["data"]["channelId"], json!(channel_id));

    // Publish a video under the channel.
    let upload = multipart_body(
        &[
            ("title", "First clip"),
            ("description", "hello"),
            ("tags", "Music, LoFi"),
        ],
        &[
            ("thumbnail", "thumb.jpg", b"jpeg"),
            ("videoFile", "clip.mp4", b"mp4"),
        ],
    );
    let (status, body) =
        send_multipart(&app, Method::POST, "/api/v1/videos/publish", &token, upload).await;
    assert_eq!(status, StatusCode::CREATED);
    let video_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["tags"], json!(["music", "lofi"]));

    let (status, body) = send_json(
        &app,
        Method::GET,
        &format!("/api/v1/channel/data/{channel_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["videos"], json!([video_id.clone()]));

    // Deleting the account cascades to the channel and the video.
    let (status, _) = send_json(
        &app,
        Method::DELETE,
        &format!("/api/v1/account/delete/{alice_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        Method::GET,
        &format!("/api/v1/channel/data/{channel_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &app,
        Method::GET,
        &format!("/api/v1/videos/videoData/{video_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_lists_missing_fields() {
    let (app, _pool, _assets) = test_app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/register",
        None,
        Some(json!({ "email": "a@x.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("name"));
    assert!(message.contains("password"));
    assert!(!message.contains("email"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _pool, _assets) = test_app().await;

    let payload = json!({ "name": "alice", "email": "a@x.com", "password": "p" });
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/register",
        None,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/register",
        None,
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn subscribe_and_like_through_the_api() {
    let (app, _pool, _assets) = test_app().await;

    for (name, email) in [("alice", "a@x.com"), ("bob", "b@x.com")] {
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/account/register",
            None,
            Some(json!({ "name": name, "email": email, "password": "p" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "p" })),
    )
    .await;
    let alice_token = body["data"]["token"].as_str().unwrap().to_string();

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/account/login",
        None,
        Some(json!({ "email": "b@x.com", "password": "p" })),
    )
    .await;
    let bob_token = body["data"]["token"].as_str().unwrap().to_string();
    let bob_id = body["data"]["user"]["id"].as_str().unwrap().to_string();

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/channel/create",
        Some(&alice_token),
        Some(json!({ "name": "Alice Ch", "handle": "@alice" })),
    )
    .await;
    let channel_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/api/v1/channel/subscribe/{channel_id}"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscribers"], json!([bob_id.clone()]));

    // Subscribing twice is a conflict, not a no-op.
    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/v1/channel/subscribe/{channel_id}"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Publish a video as alice, then like it twice as bob: both succeed.
    let upload = multipart_body(
        &[("title", "clip"), ("description", "d")],
        &[
            ("thumbnail", "t.jpg", b"j"),
            ("videoFile", "v.mp4", b"m"),
        ],
    );
    let (status, body) = send_multipart(
        &app,
        Method::POST,
        "/api/v1/videos/publish",
        &alice_token,
        upload,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let video_id = body["data"]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/videos/like",
            Some(&bob_token),
            Some(json!({ "videoId": video_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send_json(
        &app,
        Method::GET,
        &format!("/api/v1/videos/videoData/{video_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(body["data"]["likes"], json!([bob_id]));
}
