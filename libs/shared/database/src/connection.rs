use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use shared_config::{AppConfig, StoreBackend};

use crate::memory::InMemoryStore;
use crate::store::{DocumentStore, StoreError};
use crate::supabase::SupabaseStore;

/// Process-scoped handle to the document store.
///
/// Starts disconnected. `connect` builds the configured backend and pings it;
/// `disconnect` drops it. Clones share the same state.
#[derive(Clone, Default)]
pub struct StoreConnection {
    inner: Arc<RwLock<Option<Arc<dyn DocumentStore>>>>,
}

impl StoreConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection already attached to `store`.
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(store))),
        }
    }

    pub async fn connect(&self, config: &AppConfig) -> Result<(), StoreError> {
        let store: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Supabase => Arc::new(SupabaseStore::new(config)),
            StoreBackend::Memory => {
                warn!("Using the in-memory store; data is lost on restart");
                Arc::new(InMemoryStore::new())
            }
        };

        store.ping().await?;
        self.attach(store).await;
        info!("Document store connected ({:?})", config.store_backend);
        Ok(())
    }

    pub async fn attach(&self, store: Arc<dyn DocumentStore>) {
        *self.inner.write().await = Some(store);
    }

    pub async fn disconnect(&self) {
        if self.inner.write().await.take().is_some() {
            info!("Document store disconnected");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn store(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        self.inner.read().await.clone().ok_or(StoreError::Disconnected)
    }
}
