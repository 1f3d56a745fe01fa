//! JSON file storage implementation.
//!
//! Keeps all progress records in `users.json` (a map keyed by user id) and
//! the catalog in `tasks.json`, plus small per-file meta markers
//! (version + updated_at) under `meta/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use seven_core::{ProgressRecord, TaskCatalog};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::trait_::checked;
use super::{Result, Storage};

const USERS_FILE: &str = "users.json";
const TASKS_FILE: &str = "tasks.json";

type UserMap = BTreeMap<String, ProgressRecord>;

/// File-based JSON storage backend.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    /// Serializes file access within this process.
    io: Arc<Mutex<()>>,
}

impl JsonStorage {
    /// Open storage rooted at `root`, creating the directory and an empty
    /// `users.json` if they do not exist yet.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("meta")).await?;

        let storage = Self {
            root,
            io: Arc::new(Mutex::new(())),
        };

        let users = storage.users_path();
        if !fs::try_exists(&users).await? {
            info!("Creating {}", users.display());
            write_atomic(&users, b"{}").await?;
        }

        Ok(storage)
    }

    /// Root directory of this storage.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `catalog` to `tasks.json` if the file does not exist yet.
    ///
    /// Returns whether the catalog was written. An existing file is never
    /// touched, even if it holds an empty catalog.
    pub async fn seed_catalog(&self, catalog: &TaskCatalog) -> Result<bool> {
        let _guard = self.io.lock().await;
        let path = self.tasks_path();
        if fs::try_exists(&path).await? {
            debug!("{} exists, not seeding", path.display());
            return Ok(false);
        }

        info!("Seeding {} with {} days", path.display(), catalog.len());
        write_json(&path, catalog).await?;
        self.bump_version(TASKS_FILE).await?;
        Ok(true)
    }

    fn users_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }

    fn tasks_path(&self) -> PathBuf {
        self.root.join(TASKS_FILE)
    }

    fn meta_path(&self, file: &str) -> PathBuf {
        self.root.join("meta").join(format!("{}.meta.json", file))
    }

    /// Read and increment the per-file version, return new version.
    async fn bump_version(&self, file: &str) -> Result<u64> {
        let path = self.meta_path(file);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        write_atomic(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    async fn read_users(&self) -> Result<UserMap> {
        Ok(read_json(&self.users_path()).await?.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn load_record(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        let _guard = self.io.lock().await;
        let mut users = self.read_users().await?;
        users.remove(user_id).map(|record| checked(user_id, record)).transpose()
    }

    async fn save_record(&self, user_id: &str, record: &ProgressRecord) -> Result<()> {
        let _guard = self.io.lock().await;
        let mut users = self.read_users().await?;
        users.insert(user_id.to_string(), record.clone());
        write_json(&self.users_path(), &users).await?;
        self.bump_version(USERS_FILE).await?;
        Ok(())
    }

    async fn load_catalog(&self) -> Result<TaskCatalog> {
        let _guard = self.io.lock().await;
        Ok(read_json(&self.tasks_path()).await?.unwrap_or_default())
    }

    async fn save_catalog(&self, catalog: &TaskCatalog) -> Result<()> {
        let _guard = self.io.lock().await;
        write_json(&self.tasks_path(), catalog).await?;
        self.bump_version(TASKS_FILE).await?;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes()).await
}

/// Write through a sibling temp file and rename, so readers never see a
/// partially written file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
