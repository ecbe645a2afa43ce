use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    assets::{AssetStore, LocalAssetStore},
    config::Config,
    db,
};

pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
    pub assets: Arc<dyn AssetStore>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let pool = db::connect(&config.database_url)
            .await
            .expect("Database misconfigured!");

        let assets = Arc::new(LocalAssetStore::new(
            config.assets_dir.clone(),
            config.asset_base_url.clone(),
        ));

        Arc::new(Self {
            config,
            pool,
            assets,
        })
    }
}
