use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};

use crate::errors::StoreError;
use crate::kv::KvStore;

/// JSON file-backed key-value store.
///
/// Persists a `HashMap<String, String>` to a JSON file on every mutation.
/// This is the durable, host-owned storage the bridge serves: it outlives
/// the process and carries a host-defined byte quota (`max_bytes`, 0 for
/// unlimited).
pub struct JsonFileStore {
    inner: RwLock<HashMap<String, String>>,
    file_path: PathBuf,
    max_bytes: u64,
}

fn io_error(e: std::io::Error) -> StoreError {
    if e.kind() == ErrorKind::PermissionDenied {
        StoreError::AccessDenied(e.to_string())
    } else {
        StoreError::Io(e.to_string())
    }
}

impl JsonFileStore {
    /// Open the store at `path`, creating the file with an empty map if
    /// missing. A corrupt file is treated as empty rather than fatal.
    pub async fn open<P: Into<PathBuf>>(path: P, max_bytes: u64) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<String, String> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let empty: HashMap<String, String> = HashMap::new();
                let data = serde_json::to_vec(&empty)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                fs::write(&file_path, data).await.map_err(io_error)?;
                empty
            }
            Err(e) => return Err(io_error(e)),
        };

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path, max_bytes }))
    }

    async fn save(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        let data =
            serde_json::to_vec(map).map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(&self.file_path, data).await.map_err(io_error)?;
        Ok(())
    }

    fn used_bytes(map: &HashMap<String, String>) -> u64 {
        map.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum()
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.inner.read().await;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        if self.max_bytes > 0 {
            let replaced = map.get(key).map(|v| (key.len() + v.len()) as u64).unwrap_or(0);
            let incoming = (key.len() + value.len()) as u64;
            if Self::used_bytes(&map) - replaced + incoming > self.max_bytes {
                return Err(StoreError::QuotaExceeded { limit: self.max_bytes });
            }
        }
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.write().await;
        let existed = map.remove(key).is_some();
        if existed {
            self.save(&map).await?;
        }
        Ok(existed)
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let map = self.inner.read().await;
        Ok(map.keys().cloned().collect())
    }

    /// The file must still be writable; the host may have revoked access
    /// or removed the directory since `open`.
    async fn probe(&self) -> Result<(), StoreError> {
        fs::OpenOptions::new()
            .write(true)
            .open(&self.file_path)
            .await
            .map_err(io_error)?;
        Ok(())
    }
}
