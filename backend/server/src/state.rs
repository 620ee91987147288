use std::sync::Arc;

use anyhow::Result;
use sheets::SheetsClient;

use super::{
    config::Config,
    database::{DEFAULT_SEED, ItemStore, SqliteItemStore},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ItemStore>,
    pub sheets: SheetsClient,
}

impl AppState {
    /// Opens and seeds the row store named in `config`.
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let path = config.database_path.clone();

        let store = tokio::task::spawn_blocking(move || -> Result<SqliteItemStore> {
            let store = SqliteItemStore::open(&path)?;
            store.seed_if_empty(DEFAULT_SEED)?;
            Ok(store)
        })
        .await??;

        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: Config, store: Arc<dyn ItemStore>) -> Result<Arc<Self>> {
        let sheets = SheetsClient::new(
            &config.token_uri,
            &config.sheets_api_base,
            config.upstream_timeout,
        )?;

        Ok(Arc::new(Self {
            config,
            store,
            sheets,
        }))
    }
}
