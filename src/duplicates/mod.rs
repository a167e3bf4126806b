//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping
//! - Content hashing with cache reuse and hard-link sharing
//! - Fingerprint ordering through a min-heap
//! - Duplicate group management

pub mod compare;
pub mod finder;
pub mod groups;
pub mod heap;

pub use compare::compare_fingerprints;
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_size, group_by_size_structured, DuplicateGroup, GroupingStats, SizeGroup};
pub use heap::FingerprintHeap;
