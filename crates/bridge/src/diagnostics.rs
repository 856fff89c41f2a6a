use store::StoreError;
use tracing::error;

use crate::observability;

/// Side channel for per-command store failures.
///
/// The bridge never surfaces a store error to the core; it hands the
/// error here and moves on. Tests substitute a collecting sink.
pub trait DiagnosticSink: Send + Sync {
    fn store_error(&self, op: &'static str, key: Option<&str>, err: &StoreError);
}

/// Default sink: structured error log plus the error counter.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn store_error(&self, op: &'static str, key: Option<&str>, err: &StoreError) {
        observability::STORE_ERRORS_TOTAL.inc();
        error!(op, key = key.unwrap_or("-"), error = %err, "store operation failed");
    }
}
