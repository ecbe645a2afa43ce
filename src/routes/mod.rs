//! HTTP surface: one module per resource, assembled under `/api/v1`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{body::Bytes, extract::Multipart, Router};

use crate::{error::AppError, state::AppState};

pub mod accounts;
pub mod channels;
pub mod comments;
pub mod tags;
pub mod videos;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/v1/account", accounts::router())
        .nest("/api/v1/channel", channels::router())
        .nest("/api/v1/videos", videos::router())
        .nest("/api/v1/comments", comments::router())
        .nest("/api/v1/tags", tags::router())
}

pub(crate) struct UploadedFile {
    pub name: String,
    pub bytes: Bytes,
}

/// A fully-read multipart form: text fields by name, files by field name.
pub(crate) struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = HashMap::new();
        let mut files = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| AppError::MalformedPayload)?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await.map_err(|_| AppError::MalformedPayload)?;
                files.insert(
                    name,
                    UploadedFile {
                        name: file_name,
                        bytes,
                    },
                );
            } else {
                let value = field.text().await.map_err(|_| AppError::MalformedPayload)?;
                fields.insert(name, value);
            }
        }

        Ok(Self { fields, files })
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

/// Push a file to the asset store. Called before any database write, so an
/// upload failure aborts the whole operation with nothing persisted.
pub(crate) async fn upload(
    state: &AppState,
    field: &str,
    file: &UploadedFile,
) -> Result<String, AppError> {
    state
        .assets
        .store(field, &file.name, file.bytes.clone())
        .await
        .map_err(|err| AppError::Upstream(err.to_string()))
}

/// Split a comma-separated tag list as submitted by the upload form.
pub(crate) fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
