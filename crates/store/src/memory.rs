use async_trait::async_trait;
use dashmap::DashMap;

use crate::errors::StoreError;
use crate::kv::KvStore;

/// In-memory key-value store.
///
/// Backs tests and hosts that do not want persistence. An optional byte
/// capacity (sum of key and value lengths) mimics the host-defined quota
/// of a real persistent store.
#[derive(Default)]
pub struct MemoryStore {
    map: DashMap<String, String>,
    max_bytes: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once `max_bytes` of keys+values is held.
    pub fn with_capacity(max_bytes: u64) -> Self {
        Self { map: DashMap::new(), max_bytes: Some(max_bytes) }
    }

    fn used_bytes(&self) -> u64 {
        self.map
            .iter()
            .map(|entry| (entry.key().len() + entry.value().len()) as u64)
            .sum()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.max_bytes {
            let replaced = self
                .map
                .get(key)
                .map(|v| (key.len() + v.len()) as u64)
                .unwrap_or(0);
            let incoming = (key.len() + value.len()) as u64;
            if self.used_bytes() - replaced + incoming > limit {
                return Err(StoreError::QuotaExceeded { limit });
            }
        }
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.map.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.map.iter().map(|entry| entry.key().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_crud() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();

        assert!(store.get("a").await?.is_none());

        store.set("a", "1").await?;
        assert_eq!(store.get("a").await?.as_deref(), Some("1"));

        store.set("a", "2").await?;
        assert_eq!(store.get("a").await?.as_deref(), Some("2"));

        assert!(store.remove("a").await?);
        assert!(!store.remove("a").await?);
        assert!(store.get("a").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn quota_rejects_oversized_write() -> Result<(), anyhow::Error> {
        let store = MemoryStore::with_capacity(8);

        // "key" + "val" = 6 bytes, fits
        store.set("key", "val").await?;

        // another 6 bytes would exceed the 8-byte cap
        let err = store.set("big", "xxx").await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { limit: 8 }));

        // overwriting in place stays within quota
        store.set("key", "ok!").await?;
        assert_eq!(store.get("key").await?.as_deref(), Some("ok!"));
        Ok(())
    }

    #[tokio::test]
    async fn keys_lists_everything() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.set("a", "1").await?;
        store.set("b", "2").await?;
        let mut keys = store.keys().await?;
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        Ok(())
    }
}
