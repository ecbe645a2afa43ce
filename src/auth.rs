//! Password hashing and the signed-token scheme.
//!
//! Tokens are an HMAC-SHA256 signed base64url claims blob carrying the
//! account id, email, display name and expiry. Verification is a pure
//! function over the incoming request; handlers receive the resulting
//! [`Identity`] explicitly instead of consulting ambient session state.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{error::AppError, models::Account, state::AppState};

type HmacSha256 = Hmac<Sha256>;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub exp: i64,
}

pub fn issue_token(account: &Account, secret: &str, ttl_secs: i64) -> Result<String, AppError> {
    let claims = Claims {
        sub: account.id.clone(),
        email: account.email.clone(),
        name: account.name.clone(),
        exp: Utc::now().timestamp() + ttl_secs,
    };

    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&claims)
            .map_err(|e| AppError::Internal(format!("claims serialization failed: {e}")))?,
    );
    let signature = URL_SAFE_NO_PAD.encode(sign(payload.as_bytes(), secret)?);

    Ok(format!("{payload}.{signature}"))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let (payload, signature) = token
        .split_once('.')
        .ok_or(AppError::Unauthorized("Invalid token"))?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AppError::Unauthorized("Invalid token"))?;

    let mut mac = new_mac(secret)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized("Invalid token signature"))?;

    let claims: Claims = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|raw| serde_json::from_slice(&raw).ok())
        .ok_or(AppError::Unauthorized("Invalid token"))?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(AppError::Unauthorized("Token expired"));
    }

    Ok(claims)
}

fn sign(payload: &[u8], secret: &str) -> Result<Vec<u8>, AppError> {
    let mut mac = new_mac(secret)?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn new_mac(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("invalid token secret: {e}")))
}

/// Authenticated identity, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized("Expected a bearer token"))?;

        let claims = verify_token(token, &state.config.token_secret)?;

        Ok(Identity {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }
}
