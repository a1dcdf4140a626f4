/// Identifier generation for boards, lists and tasks.
///
/// Ids are 7 lowercase base36 characters. An atomic counter gives
/// intra-process uniqueness; mixing in a nanosecond timestamp and hashing
/// through SHA-256 spreads values across the id space so ids from separate
/// processes (other windows writing the same store) are unlikely to meet.
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

pub const ID_LEN: usize = 7;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new short opaque id.
pub fn generate_id() -> String {
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    let mut n = u64::from_le_bytes(bytes);

    let mut out = [b'0'; ID_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(n % 36) as usize];
        n /= 36;
    }
    out.iter().map(|&b| b as char).collect()
}

/// Generate an id for which `taken` returns false.
pub fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = generate_id();
        if !taken(&id) {
            return id;
        }
        log::debug!("[taskboard.ids] Discarded colliding id {}", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_ids_unique_in_practice() {
        let ids: HashSet<String> = (0..2_000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 2_000);
    }

    #[test]
    fn test_fresh_id_skips_taken() {
        let taken: HashSet<String> = (0..50).map(|_| generate_id()).collect();
        for _ in 0..100 {
            let id = fresh_id(|candidate| taken.contains(candidate));
            assert!(!taken.contains(&id));
        }
    }
}
