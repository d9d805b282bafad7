//! Local persisted state the presentation layer keeps between visits.

use async_trait::async_trait;

use crate::result::AppResult;

/// Key/value state persisted locally on the client device.
///
/// The session guard wipes this store during forced sign-out so no
/// authenticated remnants survive the teardown, even when the remote
/// provider call fails.
#[async_trait]
pub trait LocalStateStore: Send + Sync + std::fmt::Debug + 'static {
    /// Read a value by key.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Write a value.
    async fn put(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove every stored entry.
    async fn clear(&self) -> AppResult<()>;
}
