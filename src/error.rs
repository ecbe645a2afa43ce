use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Database(_) | AppError::Internal(_)) {
            error!("request failed: {self}");
        }

        let status = self.status();
        let body = json!({
            "status": status.as_u16(),
            "data": null,
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Collect the names of required fields that are absent or blank.
/// Returns `Validation` listing every missing field, not just the first.
pub fn require_fields(fields: &[(&'static str, Option<&str>)]) -> Result<(), AppError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter_map(|(name, value)| match value {
            Some(v) if !v.trim().is_empty() => None,
            _ => Some(*name),
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_fields_reports_every_missing_field() {
        let err = require_fields(&[
            ("name", None),
            ("email", Some("a@x.com")),
            ("password", Some("  ")),
        ])
        .unwrap_err();

        match err {
            AppError::Validation(missing) => assert_eq!(missing, vec!["name", "password"]),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn require_fields_accepts_complete_input() {
        assert!(require_fields(&[("name", Some("alice"))]).is_ok());
    }
}
