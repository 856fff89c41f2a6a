use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ports: PortsConfig,
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Storage backend selection. `file` persists to a JSON file under `path`;
/// `memory` keeps everything process-local (useful for tests and dry runs).
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Capacity limit in bytes (sum of key and value lengths); 0 = unlimited.
    #[serde(default)]
    pub max_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
            max_bytes: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortsConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self { capacity: default_capacity() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BridgeSection {
    /// Key prefix `clear` is scoped to. Unset wipes the whole store.
    #[serde(default)]
    pub clear_scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_admin_listen")]
    pub listen: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { enabled: false, listen: default_admin_listen() }
    }
}

fn default_backend() -> String { "file".to_string() }
fn default_store_path() -> String { "data/store.json".to_string() }
fn default_capacity() -> usize { 64 }
fn default_admin_listen() -> String { "127.0.0.1:9188".to_string() }

pub fn load_default() -> Result<BridgeConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<BridgeConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: BridgeConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl BridgeConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.store.normalize_from_env();
        self.store.validate()?;
        self.ports.validate()?;
        self.admin.validate()?;
        Ok(())
    }
}

impl StoreConfig {
    pub fn normalize_from_env(&mut self) {
        // Fill the path from the environment if the TOML left it empty
        if self.path.trim().is_empty() {
            if let Ok(path) = std::env::var("STORAGE_PATH") {
                self.path = path;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.backend.as_str() {
            "file" => {
                if self.path.trim().is_empty() {
                    return Err(anyhow!(
                        "store.path is empty; set it in config.toml or via STORAGE_PATH"
                    ));
                }
                Ok(())
            }
            "memory" => Ok(()),
            other => Err(anyhow!("store.backend must be \"file\" or \"memory\", got {other:?}")),
        }
    }
}

impl PortsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(anyhow!("ports.capacity must be >= 1"));
        }
        Ok(())
    }
}

impl AdminConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.listen.trim().is_empty() {
            return Err(anyhow!("admin.listen is empty while admin.enabled = true"));
        }
        Ok(())
    }
}
