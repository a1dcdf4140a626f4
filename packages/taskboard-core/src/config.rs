/// Store configuration shared by every front end.
/// Read from ~/.config/taskboard/config.json (or platform equivalent).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::storage::local::LocalStore;
use crate::storage::{PersistenceGateway, StoreKeys, DEFAULT_KEY_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the store files. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Report changes made by other processes (needs the `file-watcher` feature).
    #[serde(default = "default_watch_external")]
    pub watch_external: bool,
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_watch_external() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key_prefix: default_key_prefix(),
            watch_external: default_watch_external(),
        }
    }
}

/// Default config path: ~/.config/taskboard/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("config.json")
}

/// Default data directory: ~/.local/share/taskboard (or platform equivalent)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
}

/// Load config from path. Returns defaults if the file is missing or unreadable.
pub fn load_config(path: &Path) -> StoreConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("[taskboard.config] Failed to parse config {}: {}", path.display(), e);
            StoreConfig::default()
        }),
        Err(_) => {
            log::info!("[taskboard.config] No config at {}, using defaults", path.display());
            StoreConfig::default()
        }
    }
}

impl StoreConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn keys(&self) -> StoreKeys {
        StoreKeys::new(self.key_prefix.clone())
    }

    /// Open the file store described by this config.
    /// Falls back to a gateway without storage when the directory is unusable.
    pub fn open_gateway(&self) -> PersistenceGateway {
        let dir = self.data_dir();
        let store = match LocalStore::open(&dir) {
            Ok(store) => store,
            Err(e) => {
                log::warn!(
                    "[taskboard.config] Cannot open store at {}: {}; running without persistence",
                    dir.display(),
                    e
                );
                return PersistenceGateway::unavailable();
            }
        };

        #[cfg(feature = "file-watcher")]
        if self.watch_external {
            if let Err(e) = store.watch() {
                log::warn!("[taskboard.config] Failed to watch {}: {}", dir.display(), e);
            }
        }

        PersistenceGateway::with_keys(Arc::new(store), self.keys())
    }
}
