//! Key-Value Storage Abstraction
//!
//! Durable string storage for small records such as the persisted session.
//! Desktop hosts back this with SQLite; tests use [`MemoryKvStore`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;

/// Durable key-value store
///
/// Values are opaque strings; callers serialize their own records (the core
/// stores JSON). Implementations must survive process restarts, except for
/// deliberately ephemeral ones like [`MemoryKvStore`].
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KvStore;
///
/// async fn remember(store: &dyn KvStore) -> Result<()> {
///     store.put("session.user", r#"{"email":"a@b.c"}"#).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Retrieve the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value stored under `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// List all stored keys
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove all stored entries
    async fn clear(&self) -> Result<()>;
}

/// In-memory store for tests and throwaway profiles
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}
