use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub assets_dir: String,
    pub asset_base_url: String,
    pub cors_origin: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "8000"),
            database_url: try_load("DATABASE_URL", "sqlite:tubelet.db"),
            token_secret: load_secret("TOKEN_SECRET"),
            token_ttl_secs: try_load("TOKEN_TTL_SECS", "86400"),
            assets_dir: try_load("ASSETS_DIR", "public/assets"),
            asset_base_url: try_load("ASSET_BASE_URL", "/assets"),
            cors_origin: try_load("CORS_ORIGIN", "*"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Token secret comes from the environment, or from a mounted secret file
/// when deployed behind docker secrets.
fn load_secret(key: &str) -> String {
    if let Ok(value) = env::var(key) {
        return value;
    }

    let path = format!("/run/secrets/{key}");
    if let Ok(value) = std::fs::read_to_string(&path) {
        return value.trim().to_string();
    }

    warn!("{key} not set, falling back to a development-only secret");
    "insecure-dev-secret".to_string()
}
