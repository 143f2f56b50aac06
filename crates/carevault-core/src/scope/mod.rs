//! Key-value storage scopes
//!
//! The store persists into two scopes with different lifetimes:
//! - **Durable**: survives restarts (`FileScope`)
//! - **Session**: dies with the process or session (`MemoryScope`)
//!
//! All access is by direct key lookup; there is no iteration.

mod file;
mod memory;

pub use file::FileScope;
pub use memory::MemoryScope;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lifetime class of a storage scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Persists across restarts
    Durable,
    /// Cleared when the session ends
    Session,
}

/// String key-value storage
#[async_trait]
pub trait StorageScope: Send + Sync {
    /// Read a value, `None` if absent
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing an absent key is not an error
    async fn remove_item(&self, key: &str) -> Result<()>;
}
