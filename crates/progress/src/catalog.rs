//! Task catalog lookups and admin replacement.

use std::sync::Arc;

use seven_core::TaskCatalog;
use seven_storage::{Storage, StorageError};
use tracing::{debug, info};

/// Errors returned by [`CatalogService`].
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No tasks are configured for the day
    #[error("tasks not found for day {0}")]
    NotFound(u32),

    /// Store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Read and replace the day-to-tasks catalog.
#[derive(Clone)]
pub struct CatalogService {
    storage: Arc<dyn Storage>,
}

impl CatalogService {
    /// Create a catalog service over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Tasks for one day.
    pub async fn get_tasks(&self, day: u32) -> Result<Vec<String>, CatalogError> {
        let catalog = self.storage.load_catalog().await?;
        let tasks = catalog.get(day).ok_or(CatalogError::NotFound(day))?;
        debug!("Tasks sent for day{}: {} tasks", day, tasks.len());
        Ok(tasks.to_vec())
    }

    /// The whole catalog.
    pub async fn all_tasks(&self) -> Result<TaskCatalog, CatalogError> {
        Ok(self.storage.load_catalog().await?)
    }

    /// Replace the whole catalog. Entries are stored as given.
    pub async fn put_tasks(&self, catalog: &TaskCatalog) -> Result<(), CatalogError> {
        self.storage.save_catalog(catalog).await?;
        info!("Tasks updated: {} days", catalog.len());
        Ok(())
    }
}
