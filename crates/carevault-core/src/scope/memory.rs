//! In-process storage scope

use super::StorageScope;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory scope, used as the session-bound half of the key split.
///
/// Contents live exactly as long as the process (or until [`clear`]).
/// Clones share the same map.
///
/// [`clear`]: MemoryScope::clear
#[derive(Debug, Clone, Default)]
pub struct MemoryScope {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryScope {
    /// Create an empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry, as a browser does when the session ends
    pub async fn clear(&self) {
        self.items.write().await.clear();
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the scope holds nothing
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl StorageScope for MemoryScope {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
