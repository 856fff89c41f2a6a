//! Key-value store boundary for the storage bridge.
//! - `KvStore` is the synchronous-per-call, string-keyed contract the
//!   bridge relays commands to.
//! - `JsonFileStore` persists entries to a JSON file, the durable state
//!   that outlives the process.
//! - `MemoryStore` is process-local, for tests and ephemeral hosts.

pub mod errors;
pub mod json_file;
pub mod kv;
pub mod memory;

pub use errors::StoreError;
pub use json_file::JsonFileStore;
pub use kv::KvStore;
pub use memory::MemoryStore;
