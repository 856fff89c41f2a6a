use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Command emitted by the application core on its outbound port.
///
/// Keys and values are strings; `Set` overwrites, `Remove` of an absent
/// key is a no-op, and only `Get` expects a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum StorageCommand {
    Get { key: String },
    Set { key: String, value: String },
    Remove { key: String },
    Clear,
}

/// Reply the bridge publishes on the core's inbound port.
///
/// A failed read is indistinguishable from a miss: both come back as
/// `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resp", rename_all = "snake_case")]
pub enum StorageResponse {
    Value { key: String, value: String },
    Absent { key: String },
}

/// The core's end of the port pair: send commands, receive responses.
pub struct CorePorts {
    pub commands: mpsc::Sender<StorageCommand>,
    pub responses: mpsc::Receiver<StorageResponse>,
}

/// The bridge's end of the port pair, moved into the relay task at
/// registration.
pub struct PortHandle {
    pub(crate) commands: mpsc::Receiver<StorageCommand>,
    pub(crate) responses: mpsc::Sender<StorageResponse>,
}

/// Build a connected port pair with the given channel depth.
pub fn port_pair(capacity: usize) -> (CorePorts, PortHandle) {
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    let (resp_tx, resp_rx) = mpsc::channel(capacity);
    (
        CorePorts { commands: cmd_tx, responses: resp_rx },
        PortHandle { commands: cmd_rx, responses: resp_tx },
    )
}
