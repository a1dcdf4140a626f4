/// Event types published by storage backends.

use serde::{Deserialize, Serialize};

/// SHA-256 fingerprint of stored content, used for self-write detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(pub String);

impl ContentFingerprint {
    /// Compute SHA-256 fingerprint of content with normalized line endings.
    pub fn from_content(content: &str) -> Self {
        use sha2::{Digest, Sha256};
        let normalized = content.replace("\r\n", "\n");
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }
}

/// A key was changed by someone other than this process.
///
/// Level-triggered: carries which key changed, never the new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreChangeEvent {
    KeyChanged { key: String },
    KeyRemoved { key: String },
}

impl StoreChangeEvent {
    pub fn key(&self) -> &str {
        match self {
            StoreChangeEvent::KeyChanged { key } | StoreChangeEvent::KeyRemoved { key } => key,
        }
    }
}
