//! Min-heap of hashed records ordered by [`compare_fingerprints`].
//!
//! Draining the heap yields records sorted by fingerprint, so every set of
//! identical content comes out as one consecutive run with its preferred
//! representative first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::compare::compare_fingerprints;
use crate::scanner::FileEntry;

/// Heap slot with the comparator inverted.
#[derive(Debug)]
struct HeapItem(FileEntry);

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so reverse comparison for min-heap behavior
        compare_fingerprints(&other.0, &self.0)
    }
}

/// Priority queue yielding the smallest record first.
#[derive(Debug, Default)]
pub struct FingerprintHeap {
    heap: BinaryHeap<HeapItem>,
}

impl FingerprintHeap {
    /// Create an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Add a record. O(log n).
    pub fn insert(&mut self, entry: FileEntry) {
        self.heap.push(HeapItem(entry));
    }

    /// Remove and return the smallest record. O(log n).
    pub fn extract_min(&mut self) -> Option<FileEntry> {
        self.heap.pop().map(|item| item.0)
    }

    /// Peek at the smallest record.
    #[must_use]
    pub fn peek_min(&self) -> Option<&FileEntry> {
        self.heap.peek().map(|item| &item.0)
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Extend<FileEntry> for FingerprintHeap {
    fn extend<I: IntoIterator<Item = FileEntry>>(&mut self, iter: I) {
        self.heap.extend(iter.into_iter().map(HeapItem));
    }
}

impl FromIterator<FileEntry> for FingerprintHeap {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}
