//! Storage port bridge.
//!
//! Relays `StorageCommand` messages from an opaque application core to a
//! [`store::KvStore`], and `StorageResponse` messages back. The core and
//! the bridge each hold one end of a pair of mpsc channels; the bridge
//! processes commands strictly in arrival order, one at a time, and no
//! store failure ever crosses back into the core as an error.

pub mod diagnostics;
pub mod errors;
pub mod observability;
pub mod ports;
pub mod relay;

pub use diagnostics::{DiagnosticSink, TracingSink};
pub use errors::InitError;
pub use ports::{port_pair, CorePorts, PortHandle, StorageCommand, StorageResponse};
pub use relay::StorageBridge;
