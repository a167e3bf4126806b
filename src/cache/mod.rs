//! Fingerprint caching module for ftwin.
//!
//! This module provides persistent storage for content fingerprints so that
//! subsequent runs avoid re-reading unchanged files.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence, schema management and lookups.
//! * [`entry`]: The record stored per identity key.
//! * [`lock`]: The sidecar lock file that makes a cache single-process.
//!
//! # Cache Invalidation
//!
//! Records are keyed by a stable [`IdentityKey`](crate::scanner::IdentityKey)
//! (device, inode, size and mtime for regular files). A lookup additionally
//! checks the stored size and mtime; a mismatch deletes the record and
//! reports a miss, so the file is hashed again.

pub mod database;
pub mod entry;
pub mod lock;

pub use database::{lock_path_for, CacheError, CacheResult, HashCache};
pub use entry::CacheEntry;
pub use lock::CacheLock;
