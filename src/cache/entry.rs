//! Cache entry definitions.

use serde::{Deserialize, Serialize};

use crate::scanner::Fingerprint;

/// A stored fingerprint together with the freshness metadata it was
/// computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content fingerprint
    pub hash: Fingerprint,
    /// Size in bytes at hashing time
    pub size: u64,
    /// Modification time (seconds) at hashing time
    pub mtime: i64,
}

impl CacheEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(hash: Fingerprint, size: u64, mtime: i64) -> Self {
        Self { hash, size, mtime }
    }

    /// Whether the entry still describes content of this size and mtime.
    #[must_use]
    pub fn is_fresh(&self, size: u64, mtime: i64) -> bool {
        self.size == size && self.mtime == mtime
    }
}
