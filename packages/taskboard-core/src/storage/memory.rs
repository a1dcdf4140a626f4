/// In-process storage backend.
///
/// Nothing survives the process. Used by tests and by embedders that want a
/// throwaway store. `external_set` / `external_remove` stand in for another window
/// writing the same store: they change the data and publish a change event,
/// while the regular trait methods stay silent like any local write.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{KeyValueStore, StorageError};
use crate::watcher::types::StoreChangeEvent;

pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    event_tx: broadcast::Sender<StoreChangeEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            entries: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write `value` as if another context had done it, and announce the change.
    pub fn external_set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self.publish(StoreChangeEvent::KeyChanged {
            key: key.to_string(),
        });
    }

    /// Remove `key` as if another context had done it, and announce the change.
    pub fn external_remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self.publish(StoreChangeEvent::KeyRemoved {
            key: key.to_string(),
        });
    }

    fn publish(&self, event: StoreChangeEvent) {
        if let Err(e) = self.event_tx.send(event) {
            log::debug!("[taskboard.storage.memory] No subscribers: {}", e);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChangeEvent>> {
        Some(self.event_tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.read("a").unwrap(), None);
        store.write("a", "1").unwrap();
        assert_eq!(store.read("a").unwrap().as_deref(), Some("1"));
        store.delete("a").unwrap();
        store.delete("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_external_writes_publish_events() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe().unwrap();

        store.write("local", "1").unwrap();
        store.external_set("shared", "2");
        store.external_remove("shared");

        assert_eq!(
            rx.try_recv().unwrap(),
            StoreChangeEvent::KeyChanged { key: "shared".into() }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreChangeEvent::KeyRemoved { key: "shared".into() }
        );
        assert!(rx.try_recv().is_err());
        assert!(store.contains_key("local"));
        assert!(!store.contains_key("shared"));
    }
}
