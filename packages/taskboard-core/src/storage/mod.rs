pub mod local;
pub mod memory;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::watcher::types::StoreChangeEvent;

/// Abstract key-value backend holding raw JSON text.
/// Implementations: LocalStore (one file per key), MemoryStore.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value for `key`. `Ok(None)` when the key does not exist.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value for `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Receiver for changes made outside this process, if the backend can observe them.
    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChangeEvent>>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

/// Key layout of the persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    prefix: String,
}

pub const DEFAULT_KEY_PREFIX: &str = "taskboard";

impl StoreKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key of the board registry, e.g. `taskboard_boards`.
    pub fn registry(&self) -> String {
        format!("{}_boards", self.prefix)
    }

    /// Key of one board's document, e.g. `taskboard_board_k3x9a0b`.
    pub fn board(&self, board_id: &str) -> String {
        format!("{}_board_{}", self.prefix, board_id)
    }
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

/// JSON front of a key-value backend.
///
/// Every operation is total: a missing backend, a failing backend and corrupt
/// data all degrade to "nothing stored" with a logged warning.
pub struct PersistenceGateway {
    backend: Option<Arc<dyn KeyValueStore>>,
    keys: StoreKeys,
}

impl PersistenceGateway {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_keys(backend, StoreKeys::default())
    }

    pub fn with_keys(backend: Arc<dyn KeyValueStore>, keys: StoreKeys) -> Self {
        Self {
            backend: Some(backend),
            keys,
        }
    }

    /// Gateway with no backend: reads are absent, writes are dropped.
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            keys: StoreKeys::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Read and deserialize `key`. Missing, unreadable and corrupt values are all `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let raw = match backend.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("[taskboard.storage.read] Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!(
                    "[taskboard.storage.read] Ignoring corrupt value under {}: {}",
                    key,
                    e
                );
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|raw| backend.write(key, &raw));
        if let Err(e) = result {
            log::warn!("[taskboard.storage.write] Failed to write {}: {}", key, e);
        }
    }

    pub fn remove(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.delete(key) {
            log::warn!("[taskboard.storage.remove] Failed to remove {}: {}", key, e);
        }
    }

    /// Subscribe to changes of `key` made outside this process.
    pub fn on_external_change(&self, key: &str) -> ChangeSubscription {
        ChangeSubscription {
            key: key.to_string(),
            rx: self.backend.as_ref().and_then(|b| b.subscribe()),
        }
    }
}

/// Key-filtered view of a backend's change events.
pub struct ChangeSubscription {
    key: String,
    rx: Option<broadcast::Receiver<StoreChangeEvent>>,
}

impl ChangeSubscription {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Drain every pending event without waiting.
    /// Returns true if at least one of them concerned this key.
    pub fn poll_changed(&mut self) -> bool {
        use broadcast::error::TryRecvError;

        let Some(rx) = self.rx.as_mut() else {
            return false;
        };
        let mut changed = false;
        loop {
            match rx.try_recv() {
                Ok(event) => changed |= event.key() == self.key,
                Err(TryRecvError::Lagged(n)) => {
                    log::warn!("[taskboard.storage.events] Lagged by {} events", n);
                    changed = true;
                }
                Err(TryRecvError::Empty) => return changed,
                Err(TryRecvError::Closed) => {
                    self.rx = None;
                    return changed;
                }
            }
        }
    }

    /// Wait for the next change of this key.
    /// Returns false once no further changes can arrive.
    pub async fn changed(&mut self) -> bool {
        use broadcast::error::RecvError;

        let Some(rx) = self.rx.as_mut() else {
            return false;
        };
        loop {
            match rx.recv().await {
                Ok(event) if event.key() == self.key => return true,
                Ok(_) => continue,
                // Missed events may have touched our key.
                Err(RecvError::Lagged(n)) => {
                    log::warn!("[taskboard.storage.events] Lagged by {} events", n);
                    return true;
                }
                Err(RecvError::Closed) => {
                    self.rx = None;
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
        fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
        fn subscribe(&self) -> Option<broadcast::Receiver<StoreChangeEvent>> {
            None
        }
    }

    #[test]
    fn test_keys_layout() {
        let keys = StoreKeys::default();
        assert_eq!(keys.registry(), "taskboard_boards");
        assert_eq!(keys.board("abc1234"), "taskboard_board_abc1234");
        assert_eq!(StoreKeys::new("demo").registry(), "demo_boards");
    }

    #[test]
    fn test_get_set_remove_roundtrip() {
        let gateway = PersistenceGateway::new(Arc::new(MemoryStore::new()));
        assert_eq!(gateway.get::<Vec<String>>("k"), None);

        gateway.set("k", &vec!["a".to_string()]);
        assert_eq!(gateway.get::<Vec<String>>("k"), Some(vec!["a".to_string()]));

        gateway.remove("k");
        assert_eq!(gateway.get::<Vec<String>>("k"), None);
    }

    #[test]
    fn test_corrupt_value_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.write("k", "{not json").unwrap();
        let gateway = PersistenceGateway::new(store);
        assert_eq!(gateway.get::<Vec<String>>("k"), None);
    }

    #[test]
    fn test_unavailable_gateway_is_silent() {
        let gateway = PersistenceGateway::unavailable();
        assert!(!gateway.is_available());
        gateway.set("k", &1u32);
        assert_eq!(gateway.get::<u32>("k"), None);
        gateway.remove("k");
        assert!(!gateway.on_external_change("k").poll_changed());
    }

    #[test]
    fn test_failing_backend_never_propagates() {
        let gateway = PersistenceGateway::new(Arc::new(BrokenStore));
        gateway.set("k", &1u32);
        assert_eq!(gateway.get::<u32>("k"), None);
        gateway.remove("k");
    }

    #[test]
    fn test_subscription_filters_by_key() {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone());
        let mut sub = gateway.on_external_change("watched");

        store.external_set("other", "1");
        assert!(!sub.poll_changed());

        store.external_set("watched", "2");
        store.external_set("watched", "3");
        assert!(sub.poll_changed());
        assert!(!sub.poll_changed());
    }

    #[test]
    fn test_local_writes_are_not_external() {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store);
        let mut sub = gateway.on_external_change("k");
        gateway.set("k", &1u32);
        assert!(!sub.poll_changed());
    }
}
