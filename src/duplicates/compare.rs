//! Total order over hashed file records.
//!
//! Records sort by fingerprint, so equal content is adjacent. Within equal
//! content a prioritized record comes first, and the remaining ties fall
//! back to `path` then `subpath`. The order never depends on the order in
//! which records were discovered or hashed.

use std::cmp::Ordering;

use crate::scanner::FileEntry;

/// Compare two records for duplicate aggregation.
///
/// 1. `hash.high`, then `hash.low`, ascending (unhashed records first)
/// 2. prioritized before non-prioritized
/// 3. `path`, then `subpath` (plain files before archive members)
#[must_use]
pub fn compare_fingerprints(a: &FileEntry, b: &FileEntry) -> Ordering {
    a.hash
        .cmp(&b.hash)
        .then_with(|| b.prioritized.cmp(&a.prioritized))
        .then_with(|| a.path.cmp(&b.path))
        .then_with(|| a.subpath.cmp(&b.subpath))
}
