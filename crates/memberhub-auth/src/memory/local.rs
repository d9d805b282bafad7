//! In-memory local state store.

use async_trait::async_trait;
use dashmap::DashMap;

use memberhub_core::result::AppResult;
use memberhub_core::traits::local_state::LocalStateStore;

/// In-memory key/value state; the process-local analog of browser
/// local storage.
#[derive(Debug, Default)]
pub struct MemoryLocalState {
    entries: DashMap<String, String>,
}

impl MemoryLocalState {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LocalStateStore for MemoryLocalState {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.clear();
        Ok(())
    }
}
