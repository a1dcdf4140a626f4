/// Local filesystem storage backend.
///
/// Stores each key as `<dir>/<percent-encoded key>.json` with:
/// - Atomic writes (write to .tmp, fsync, rename)
/// - Self-write registration so the watcher only reports foreign changes
/// - A single write mutex so concurrent writers never interleave a rename

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::sync::broadcast;

use super::{KeyValueStore, StorageError};
use crate::watcher::self_write::SelfWriteTracker;
use crate::watcher::types::StoreChangeEvent;

const FILE_SUFFIX: &str = ".json";

/// Everything except ASCII alphanumerics, `_` and `-` is escaped in file names.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// File name used for `key`.
pub(crate) fn file_name_for_key(key: &str) -> Result<String, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(format!("{}{}", utf8_percent_encode(key, KEY_ENCODE_SET), FILE_SUFFIX))
}

/// Key stored at `path`, or `None` for files that are not store entries
/// (temp files, foreign files, undecodable names).
pub(crate) fn key_for_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let encoded = name.strip_suffix(FILE_SUFFIX)?;
    if encoded.is_empty() {
        return None;
    }
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

pub struct LocalStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
    self_writes: Arc<Mutex<SelfWriteTracker>>,
    event_tx: broadcast::Sender<StoreChangeEvent>,
    #[cfg(feature = "file-watcher")]
    watcher: Mutex<Option<crate::watcher::file_watcher::StoreWatcher>>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let (event_tx, _) = broadcast::channel(256);
        log::info!("[taskboard.storage.local] Opened store at {:?}", dir);
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
            self_writes: Arc::new(Mutex::new(SelfWriteTracker::new())),
            event_tx,
            #[cfg(feature = "file-watcher")]
            watcher: Mutex::new(None),
        })
    }

    pub fn path_for_key(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(self.dir.join(file_name_for_key(key)?))
    }

    /// Start reporting changes made to the directory by other processes.
    /// Calling it again while already watching does nothing.
    #[cfg(feature = "file-watcher")]
    pub fn watch(&self) -> Result<(), notify::Error> {
        let mut slot = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }
        let watcher = crate::watcher::file_watcher::StoreWatcher::new(
            &self.dir,
            self.self_writes.clone(),
            self.event_tx.clone(),
        )?;
        *slot = Some(watcher);
        Ok(())
    }

    #[cfg(feature = "file-watcher")]
    pub fn is_watching(&self) -> bool {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        let tmp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl KeyValueStore for LocalStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for_key(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for_key(key)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.self_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register_write(key, value);

        Self::atomic_write(&path, value)?;
        log::debug!("[taskboard.storage.local] Wrote {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for_key(key)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if !path.exists() {
            return Ok(());
        }
        self.self_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register_removal(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChangeEvent>> {
        Some(self.event_tx.subscribe())
    }
}
