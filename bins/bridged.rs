use std::sync::Arc;

use anyhow::Context;
use bridge::{port_pair, CorePorts, StorageBridge, StorageCommand, TracingSink};
use common::utils::logging::{init_logging_default, init_logging_json};
use configs::BridgeConfig;
use dotenvy::dotenv;
use store::{JsonFileStore, KvStore, MemoryStore};
use tokio::io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use uuid::Uuid;

fn init_logging() {
    // Load .env first so RUST_LOG and LOG_FORMAT can come from it
    dotenv().ok();
    // LOG_FORMAT=compact for human-readable output; JSON otherwise
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("compact") => init_logging_default(),
        _ => init_logging_json(),
    }
    info!(service = "bridged", event = "logger_init", "tracing subscriber initialized");
}

async fn build_store(config: &BridgeConfig) -> anyhow::Result<Arc<dyn KvStore>> {
    let store: Arc<dyn KvStore> = match config.store.backend.as_str() {
        "memory" => {
            if config.store.max_bytes > 0 {
                Arc::new(MemoryStore::with_capacity(config.store.max_bytes))
            } else {
                Arc::new(MemoryStore::new())
            }
        }
        _ => {
            JsonFileStore::open(&config.store.path, config.store.max_bytes)
                .await
                .with_context(|| format!("cannot open store at {}", config.store.path))?
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "bridged",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    info!(
        service = "bridged",
        event = "starting",
        %service_id,
        pid,
        version,
        "storage bridge starting"
    );

    let config = BridgeConfig::load_and_validate().unwrap_or_else(|e| {
        warn!("failed to load config file: {}, using defaults", e);
        BridgeConfig::default()
    });
    info!("loaded configuration: {:?}", config);

    let store = build_store(&config).await?;

    if config.admin.enabled {
        common::admin_http::spawn_admin_server(
            &config.admin.listen,
            bridge::observability::encode_metrics,
        )
        .await?;
    }

    let bridge = StorageBridge::new(
        store,
        Arc::new(TracingSink),
        config.bridge.clear_scope.clone(),
    );
    let (core, handle) = port_pair(config.ports.capacity);
    let relay = bridge.register(handle).await.context("register storage bridge")?;

    let CorePorts { commands, mut responses } = core;

    // stdout side: one JSON line per response
    let writer = tokio::spawn(async move {
        let mut out = stdout();
        while let Some(resp) = responses.recv().await {
            match serde_json::to_string(&resp) {
                Ok(line) => {
                    if out.write_all(line.as_bytes()).await.is_err()
                        || out.write_all(b"\n").await.is_err()
                    {
                        break;
                    }
                    let _ = out.flush().await;
                }
                Err(e) => error!(error = %e, "cannot encode response"),
            }
        }
    });

    // stdin side: one JSON command per line; malformed lines are skipped
    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<StorageCommand>(line) {
            Ok(cmd) => {
                if commands.send(cmd).await.is_err() {
                    warn!("command port closed, stopping input loop");
                    break;
                }
            }
            Err(e) => warn!(error = %e, "skipping malformed command line"),
        }
    }

    // EOF: close the command port so the relay drains and finishes
    drop(commands);
    relay.await.ok();
    writer.await.ok();

    info!(service = "bridged", event = "shutdown", "storage bridge stopped");
    Ok(())
}
