use thiserror::Error;

/// Errors a storage backend can raise on a single operation.
///
/// Input validation (empty keys, malformed payloads) is the caller's
/// business; this enum covers real backend failures only.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would push the store past its capacity limit.
    #[error("quota exceeded: store is limited to {limit} bytes")]
    QuotaExceeded { limit: u64 },
    /// The host denied access to the backing storage.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// Reading or writing the backing storage failed.
    #[error("io error: {0}")]
    Io(String),
    /// Encoding or decoding the persisted map failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
