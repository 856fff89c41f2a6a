use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use store::KvStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::diagnostics::DiagnosticSink;
use crate::errors::InitError;
use crate::observability;
use crate::ports::{PortHandle, StorageCommand, StorageResponse};

/// The bridge between an application core's ports and a key-value store.
///
/// Holds no durable state of its own; the injected store is the only
/// thing that outlives the relay task.
pub struct StorageBridge {
    store: Arc<dyn KvStore>,
    sink: Arc<dyn DiagnosticSink>,
    clear_scope: Option<String>,
    registered: AtomicBool,
}

impl StorageBridge {
    /// `clear_scope` is the key prefix `Clear` is limited to; `None` wipes
    /// the whole store.
    pub fn new(
        store: Arc<dyn KvStore>,
        sink: Arc<dyn DiagnosticSink>,
        clear_scope: Option<String>,
    ) -> Self {
        Self { store, sink, clear_scope, registered: AtomicBool::new(false) }
    }

    /// Subscribe to the port pair and spawn the relay task.
    ///
    /// Probes the store first and refuses a second registration; both
    /// failures belong to the host's startup path. The returned handle
    /// completes when the core drops its command sender.
    pub async fn register(&self, ports: PortHandle) -> Result<JoinHandle<()>, InitError> {
        self.store.probe().await?;
        if self.registered.swap(true, Ordering::SeqCst) {
            return Err(InitError::AlreadyRegistered);
        }
        let relay = Relay {
            store: self.store.clone(),
            sink: self.sink.clone(),
            clear_scope: self.clear_scope.clone(),
        };
        info!("storage bridge registered");
        Ok(tokio::spawn(relay.run(ports)))
    }
}

struct Relay {
    store: Arc<dyn KvStore>,
    sink: Arc<dyn DiagnosticSink>,
    clear_scope: Option<String>,
}

impl Relay {
    /// Drain the command port in arrival order, one command to completion
    /// at a time. Runs until the core drops its sender.
    async fn run(self, mut ports: PortHandle) {
        while let Some(cmd) = ports.commands.recv().await {
            observability::COMMANDS_TOTAL.inc();
            self.handle(cmd, &ports.responses).await;
        }
        debug!("command port closed, bridge relay finished");
    }

    async fn handle(&self, cmd: StorageCommand, responses: &mpsc::Sender<StorageResponse>) {
        match cmd {
            StorageCommand::Set { key, value } => {
                if let Err(e) = self.store.set(&key, &value).await {
                    self.sink.store_error("set", Some(&key), &e);
                }
            }
            StorageCommand::Get { key } => {
                // a failed read answers Absent so every Get gets its reply
                let value = match self.store.get(&key).await {
                    Ok(v) => v,
                    Err(e) => {
                        self.sink.store_error("get", Some(&key), &e);
                        None
                    }
                };
                let resp = match value {
                    Some(value) => StorageResponse::Value { key, value },
                    None => StorageResponse::Absent { key },
                };
                if responses.send(resp).await.is_ok() {
                    observability::RESPONSES_TOTAL.inc();
                } else {
                    warn!("response port closed, dropping reply");
                }
            }
            StorageCommand::Remove { key } => {
                // absent key is a silent no-op: remove returns Ok(false)
                if let Err(e) = self.store.remove(&key).await {
                    self.sink.store_error("remove", Some(&key), &e);
                }
            }
            StorageCommand::Clear => self.clear().await,
        }
    }

    async fn clear(&self) {
        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                self.sink.store_error("clear", None, &e);
                return;
            }
        };
        for key in keys {
            if let Some(prefix) = &self.clear_scope {
                if !key.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            if let Err(e) = self.store.remove(&key).await {
                self.sink.store_error("clear", Some(&key), &e);
            }
        }
    }
}
