//! In-memory storage for tests and embedding.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use seven_core::{ProgressRecord, TaskCatalog};
use tokio::sync::Mutex;

use super::trait_::checked;
use super::{Result, Storage};

/// `HashMap`-backed storage. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    records: Arc<Mutex<HashMap<String, ProgressRecord>>>,
    catalog: Arc<Mutex<TaskCatalog>>,
}

impl InMemoryStorage {
    /// Empty storage with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty storage preloaded with `catalog`.
    pub fn with_catalog(catalog: TaskCatalog) -> Self {
        Self {
            records: Arc::default(),
            catalog: Arc::new(Mutex::new(catalog)),
        }
    }

    /// Number of stored records.
    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn load_record(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        let record = self.records.lock().await.get(user_id).cloned();
        record.map(|record| checked(user_id, record)).transpose()
    }

    async fn save_record(&self, user_id: &str, record: &ProgressRecord) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(user_id.to_string(), record.clone());
        Ok(())
    }

    async fn load_catalog(&self) -> Result<TaskCatalog> {
        Ok(self.catalog.lock().await.clone())
    }

    async fn save_catalog(&self, catalog: &TaskCatalog) -> Result<()> {
        *self.catalog.lock().await = catalog.clone();
        Ok(())
    }
}
