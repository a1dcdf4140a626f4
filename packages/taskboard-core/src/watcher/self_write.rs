/// Self-write tracker for the file-backed store.
///
/// Before every write or delete the store registers what the key is about to
/// become. The watcher reports each state it reads back from disk; the tracker
/// sorts it into one of our own writes, a state already seen, or a change made
/// by another process.
///
/// Per key it keeps the writes not yet seen on disk (oldest first) and the last
/// state known to be on disk. Seeing a pending write settles it and discards
/// every older pending write, which the newer one has overwritten. Notifications
/// can repeat across debouncer batches; those match the settled state and are
/// dropped until the key moves on.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::types::ContentFingerprint;

/// Pending writes never seen on disk are forgotten after this long.
const PENDING_TTL: Duration = Duration::from_secs(10);

/// State of a key: its content fingerprint, or gone.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyState {
    Content(ContentFingerprint),
    Removed,
}

impl KeyState {
    fn of(content: Option<&str>) -> Self {
        match content {
            Some(content) => KeyState::Content(ContentFingerprint::from_content(content)),
            None => KeyState::Removed,
        }
    }
}

struct PendingWrite {
    state: KeyState,
    registered_at: Instant,
}

#[derive(Default)]
struct KeyTrack {
    pending: Vec<PendingWrite>,
    settled: Option<KeyState>,
}

/// How an observed key state relates to what we already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    /// One of our own writes or deletes landing.
    OwnWrite,
    /// A repeat notification for the state already on record.
    Unchanged,
    /// A state nobody here produced.
    External,
}

#[derive(Default)]
pub struct SelfWriteTracker {
    keys: HashMap<String, KeyTrack>,
}

impl SelfWriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content about to be written under `key`.
    pub fn register_write(&mut self, key: &str, content: &str) {
        self.push(key, KeyState::of(Some(content)));
    }

    /// Register that `key` is about to be removed.
    pub fn register_removal(&mut self, key: &str) {
        self.push(key, KeyState::Removed);
    }

    fn push(&mut self, key: &str, state: KeyState) {
        self.cleanup_expired();
        self.keys
            .entry(key.to_string())
            .or_default()
            .pending
            .push(PendingWrite {
                state,
                registered_at: Instant::now(),
            });
    }

    /// Classify the state just read for `key`: its content, or `None` if the
    /// key no longer exists. The observed state becomes the settled one.
    pub fn observe(&mut self, key: &str, current: Option<&str>) -> Observed {
        self.cleanup_expired();
        let state = KeyState::of(current);
        let track = self.keys.entry(key.to_string()).or_default();

        if let Some(pos) = track.pending.iter().position(|p| p.state == state) {
            track.pending.drain(..=pos);
            track.settled = Some(state);
            return Observed::OwnWrite;
        }
        if track.settled.as_ref() == Some(&state) {
            return Observed::Unchanged;
        }
        track.settled = Some(state);
        Observed::External
    }

    /// Drop pending writes older than the TTL. Settled states are kept.
    pub fn cleanup_expired(&mut self) {
        let now = Instant::now();
        for track in self.keys.values_mut() {
            track
                .pending
                .retain(|p| now.duration_since(p.registered_at) < PENDING_TTL);
        }
    }

    /// Whether a registered write for `key` has not been seen on disk yet.
    pub fn has_pending(&self, key: &str) -> bool {
        self.keys.get(key).map_or(false, |t| !t.pending.is_empty())
    }
}
