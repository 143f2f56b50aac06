//! Durable storage scope backed by a JSON file

use super::StorageScope;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, PoisonError};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Write locks shared by every handle on the same file
static WRITE_LOCKS: LazyLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| std::sync::Mutex::new(HashMap::new()));

/// Durable scope persisted as a flat JSON object on disk.
///
/// Writes go to a uniquely named temporary file that is renamed over the
/// target, so a crash never leaves a half-written file. Read-modify-write
/// cycles are serialized across all handles in the process that point at the
/// same file. Permissions are owner-only on Unix.
#[derive(Debug, Clone)]
pub struct FileScope {
    path: PathBuf,
}

impl FileScope {
    /// Open (lazily) the scope file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Create the parent directory (owner-only on Unix) and take the write
    /// lock registered for the resolved file path.
    async fn lock(&self) -> Result<OwnedMutexGuard<()>> {
        let parent = self.parent_dir();
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to create directory: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            let _ = tokio::fs::set_permissions(&parent, perms).await;
        }

        let resolved = match (tokio::fs::canonicalize(&parent).await, self.path.file_name()) {
            (Ok(dir), Some(name)) => dir.join(name),
            _ => self.path.clone(),
        };

        let lock = WRITE_LOCKS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(resolved)
            .or_default()
            .clone();

        Ok(lock.lock_owned().await)
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StoreError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, items: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_vec(items)?;
        let dir = self.parent_dir();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)
                .map_err(|e| StoreError::Storage(format!("Failed to create temp file: {}", e)))?;
            tmp.write_all(&json)
                .and_then(|()| tmp.as_file().sync_all())
                .map_err(|e| StoreError::Storage(format!("Failed to write: {}", e)))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o600);
                let _ = std::fs::set_permissions(tmp.path(), perms);
            }

            tmp.persist(&path).map_err(|e| {
                StoreError::Storage(format!("Failed to commit write: {}", e.error))
            })?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Storage(format!("Write task failed: {}", e)))??;

        debug!(path = %self.path.display(), entries = items.len(), "Saved durable scope");
        Ok(())
    }
}

#[async_trait]
impl StorageScope for FileScope {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock().await?;
        let mut items = self.load().await?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock().await?;
        let mut items = self.load().await?;
        if items.remove(key).is_some() {
            self.save(&items).await?;
        }
        Ok(())
    }
}
