use std::sync::Arc;

use crate::{config::AppConfig, db::DbPool, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            pool,
            store,
            config: Arc::new(config),
        }
    }
}
