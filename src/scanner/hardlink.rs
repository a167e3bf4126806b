//! Hardlink detection to avoid hashing the same inode twice.
//!
//! # Overview
//!
//! Hardlinks are multiple directory entries pointing to the same inode on
//! disk. Their content is identical by construction, so the finder hashes
//! one of them and lets the others adopt that fingerprint; they still land
//! in the same duplicate set.
//!
//! # Platform Support
//!
//! - **Unix**: Uses `(device_id, inode)` pairs from file metadata
//! - **Other**: Detection disabled (every file is hashed on its own)
//!
//! # Example
//!
//! ```no_run
//! use ftwin::scanner::hardlink::{HardlinkTracker, InodeKey};
//! use std::path::Path;
//!
//! let mut tracker = HardlinkTracker::new();
//! for (index, path) in ["a.txt", "b.txt"].iter().enumerate() {
//!     if let Some(key) = InodeKey::for_path(Path::new(path)) {
//!         if let Some(original) = tracker.observe(key, index) {
//!             println!("{} is a hardlink of entry {}", path, original);
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fs::Metadata;
use std::path::Path;

/// Remembers the first entry seen for every inode.
///
/// `HardlinkTracker` is NOT thread-safe. The finder uses one per size
/// bucket on the coordinating thread.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    first_seen: HashMap<InodeKey, usize>,
}

impl HardlinkTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            first_seen: HashMap::with_capacity(capacity),
        }
    }

    /// Record that entry `index` has inode `key`.
    ///
    /// Returns the index of the earlier entry sharing this inode, or `None`
    /// if this is the first occurrence.
    pub fn observe(&mut self, key: InodeKey, index: usize) -> Option<usize> {
        match self.first_seen.get(&key) {
            Some(&original) => Some(original),
            None => {
                self.first_seen.insert(key, index);
                None
            }
        }
    }

    /// Number of distinct inodes recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.first_seen.len()
    }

    /// Whether hardlink detection works on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

/// Platform-specific `(device, inode)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    /// Extract the inode key from file metadata.
    ///
    /// Returns `None` where the platform does not expose inode numbers.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Stat `path` and extract its inode key.
    #[must_use]
    pub fn for_path(path: &Path) -> Option<Self> {
        std::fs::metadata(path)
            .ok()
            .and_then(|m| Self::from_metadata(&m))
    }
}
