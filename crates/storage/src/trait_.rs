//! Storage trait abstraction.

use async_trait::async_trait;
use seven_core::{InvalidRecord, ProgressRecord, TaskCatalog};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored record that fails validation
    #[error("invalid record for {user_id}: {source}")]
    InvalidRecord {
        /// Owner of the record
        user_id: String,
        /// What is wrong with it
        #[source]
        source: InvalidRecord,
    },
}

/// Pass a loaded record through only if it validates.
pub(crate) fn checked(user_id: &str, record: ProgressRecord) -> Result<ProgressRecord> {
    record
        .validate()
        .map_err(|source| StorageError::InvalidRecord {
            user_id: user_id.to_string(),
            source,
        })?;
    Ok(record)
}

/// Storage abstraction for Seven data.
///
/// Each method is a single whole-value read or replacement; callers that
/// need read-modify-write atomicity serialize access themselves.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Progress operations ===

    /// Load the progress record for a user. Records that fail
    /// [`ProgressRecord::validate`] are reported as
    /// [`StorageError::InvalidRecord`].
    async fn load_record(&self, user_id: &str) -> Result<Option<ProgressRecord>>;

    /// Save (create or overwrite) the progress record for a user.
    async fn save_record(&self, user_id: &str, record: &ProgressRecord) -> Result<()>;

    // === Catalog operations ===

    /// Load the task catalog. A store that has never been given one returns
    /// an empty catalog.
    async fn load_catalog(&self) -> Result<TaskCatalog>;

    /// Replace the whole task catalog.
    async fn save_catalog(&self, catalog: &TaskCatalog) -> Result<()>;
}
