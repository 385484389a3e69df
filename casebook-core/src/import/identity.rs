/// Record identifiers.
///
/// Ids are opaque: an atomic counter for intra-process uniqueness combined
/// with a nanosecond timestamp, hashed via SHA-256 and prefixed with the
/// record kind.
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

pub const PAGE_PREFIX: &str = "page";
pub const CATEGORY_PREFIX: &str = "cat";
pub const TEST_CASE_PREFIX: &str = "tc";

/// Generate a new id such as `tc-3f9a1c0d7b2e`.
pub fn generate_id(prefix: &str) -> String {
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    format!("{}-{}", prefix, hex::encode(&hash[..6]))
}
