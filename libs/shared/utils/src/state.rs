use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::{DocumentStore, StoreConnection};
use shared_models::error::AppError;

/// Router state shared by every cell.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub connection: StoreConnection,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, connection: StoreConnection) -> Self {
        Self { config, connection }
    }

    /// The connected store, or 503 while disconnected.
    pub async fn store(&self) -> Result<Arc<dyn DocumentStore>, AppError> {
        Ok(self.connection.store().await?)
    }
}
