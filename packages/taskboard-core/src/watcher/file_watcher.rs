/// Directory watcher for `LocalStore` using notify-debouncer-full.
///
/// Watches the store directory and publishes a `StoreChangeEvent` for every
/// entry changed or removed by another process. Our own writes are matched
/// against the self-write tracker and dropped. Access events are ignored so
/// reading an entry back never triggers another round.
/// 500ms debounce window for macOS FSEvents and cloud sync stability.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebouncedEvent, Debouncer, RecommendedCache};
use tokio::sync::broadcast;

use super::self_write::{Observed, SelfWriteTracker};
use super::types::StoreChangeEvent;
use crate::storage::local::key_for_path;

const DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

pub struct StoreWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher, RecommendedCache>,
}

impl StoreWatcher {
    pub fn new(
        dir: &Path,
        self_writes: Arc<Mutex<SelfWriteTracker>>,
        event_tx: broadcast::Sender<StoreChangeEvent>,
    ) -> Result<Self, notify::Error> {
        let mut debouncer = new_debouncer(
            DEBOUNCE_DURATION,
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
                Ok(events) => {
                    // One batch may hold several events for the same file.
                    let paths: BTreeSet<PathBuf> = events
                        .iter()
                        .filter(|event| changes_content(&event.kind))
                        .flat_map(|event| event.paths.iter().cloned())
                        .collect();
                    for path in paths {
                        if let Some(change) = external_change_for(&path, &self_writes) {
                            if let Err(e) = event_tx.send(change) {
                                log::debug!("[taskboard.watcher.send] No receivers: {}", e);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        log::error!("[taskboard.watcher.error] Watch error: {}", e);
                    }
                }
            },
        )?;

        debouncer.watch(dir, RecursiveMode::NonRecursive)?;
        log::info!("[taskboard.watcher] Watching store directory {:?}", dir);

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

fn changes_content(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Turn a filesystem notification for `path` into a change event,
/// unless the path is not a store entry or the change was our own.
fn external_change_for(
    path: &Path,
    self_writes: &Mutex<SelfWriteTracker>,
) -> Option<StoreChangeEvent> {
    let key = key_for_path(path)?;

    let current = match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("[taskboard.watcher.read] Cannot read {:?}: {}", path, e);
            return None;
        }
    };

    let observed = self_writes
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .observe(&key, current.as_deref());
    match observed {
        Observed::OwnWrite => {
            log::debug!("[taskboard.watcher] Suppressed self-write for {}", key);
            return None;
        }
        Observed::Unchanged => return None,
        Observed::External => {}
    }

    log::info!("[taskboard.watcher] External change to {}", key);
    Some(match current {
        Some(_) => StoreChangeEvent::KeyChanged { key },
        None => StoreChangeEvent::KeyRemoved { key },
    })
}
