use crate::errors::StoreError;
use async_trait::async_trait;

/// Trait abstraction for the string-keyed store the bridge writes to.
/// Implementations can be file-backed, in-memory, or remote KV.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a key; `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Write a key, overwriting any prior value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Delete a key; returns whether an entry existed.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
    /// Enumerate all keys, used by `clear` to pick its victims.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
    /// Availability check run at bridge registration.
    async fn probe(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
