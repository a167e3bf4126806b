//! Duplicate grouping and size-based file organization.
//!
//! # Overview
//!
//! This module provides structures for grouping files by size (the first
//! phase of duplicate detection) and the confirmed [`DuplicateGroup`]s the
//! finder emits.
//!
//! ## Size Grouping
//!
//! Files with different sizes cannot be duplicates, so bucketing by exact
//! size discards most candidates without reading a byte. Zero-byte files
//! form an ordinary bucket; the finder resolves it without hashing.
//!
//! # Example
//!
//! ```
//! use ftwin::scanner::FileEntry;
//! use ftwin::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024, 0),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024, 0),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048, 0),
//! ];
//!
//! // Only buckets with 2+ files are potential duplicates
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::HashMap;

use crate::scanner::{FileEntry, Fingerprint};

/// A bucket of files with the same size.
#[derive(Debug, Clone)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size
    pub files: Vec<FileEntry>,
}

impl SizeGroup {
    /// Create a size group with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileEntry>) -> Self {
        Self { size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this group has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }
}

/// Confirmed set of byte-identical files.
///
/// `files[0]` is the representative: the prioritized member if there is
/// one, otherwise the first member in comparator order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Shared content fingerprint
    pub hash: Fingerprint,
    /// Size in bytes of each member
    pub size: u64,
    /// Members, representative first
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(hash: Fingerprint, size: u64, files: Vec<FileEntry>) -> Self {
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The member to keep.
    #[must_use]
    pub fn representative(&self) -> Option<&FileEntry> {
        self.files.first()
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Hash as a 32-character lowercase hex string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        self.hash.to_hex()
    }

    /// Display paths of all members, in order.
    #[must_use]
    pub fn display_paths(&self) -> Vec<String> {
        self.files.iter().map(FileEntry::display_path).collect()
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of zero-byte files encountered
    pub empty_files: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size.
///
/// # Returns
///
/// A tuple of:
/// - `HashMap<u64, Vec<FileEntry>>` - Files grouped by size (only groups with 2+ files)
/// - `GroupingStats` - Statistics about the grouping operation
///
/// Every input file lands in exactly one bucket; buckets of one are then
/// dropped. No file I/O is performed.
///
/// # Example
///
/// ```
/// use ftwin::scanner::FileEntry;
/// use ftwin::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100, 0),
///     FileEntry::new(PathBuf::from("/b.txt"), 100, 0),
///     FileEntry::new(PathBuf::from("/c.txt"), 200, 0),
/// ];
///
/// let (groups, stats) = group_by_size(files);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
) -> (HashMap<u64, Vec<FileEntry>>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
        }
        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let filtered_groups: HashMap<u64, Vec<FileEntry>> = all_groups
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    files[0].display_path()
                );
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    size,
                    files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered_groups, stats)
}

/// Group files by size, returning [`SizeGroup`]s sorted by size descending.
#[must_use]
pub fn group_by_size_structured(
    files: impl IntoIterator<Item = FileEntry>,
) -> (Vec<SizeGroup>, GroupingStats) {
    let (groups_map, stats) = group_by_size(files);

    let mut groups: Vec<SizeGroup> = groups_map
        .into_iter()
        .map(|(size, files)| SizeGroup::with_files(size, files))
        .collect();

    // Largest first so the biggest reads start early
    groups.sort_by(|a, b| b.size.cmp(&a.size));

    (groups, stats)
}
