use store::StoreError;
use thiserror::Error;

/// Errors surfaced by [`crate::StorageBridge::register`].
///
/// Fatal to bridge setup only; once the relay task is running, per-command
/// store failures go to the diagnostic sink instead.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("ports already registered with this bridge")]
    AlreadyRegistered,
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}
