//! SQLite-backed hash cache database.
//!
//! # Overview
//!
//! [`HashCache`] maps an [`IdentityKey`] to a [`CacheEntry`]. The store is
//! a single SQLite file in WAL mode guarded by a sidecar lock file, so at
//! most one process uses a given cache at a time.
//!
//! # Lifecycle
//!
//! Opening takes the lock first and then opens the database. If anything
//! after the lock fails, the lock is released before the error is
//! returned. Dropping or closing the handle releases the connection first
//! and the lock second.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::entry::CacheEntry;
use super::lock::CacheLock;
use crate::scanner::{Fingerprint, IdentityKey};

/// Current on-disk layout. Bump when the key or row format changes.
const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS fingerprints (
    key BLOB PRIMARY KEY NOT NULL,
    hash_high INTEGER NOT NULL,
    hash_low INTEGER NOT NULL,
    size INTEGER NOT NULL,
    mtime INTEGER NOT NULL
) WITHOUT ROWID;";

/// Errors that can occur while using the hash cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Another process holds the cache lock.
    #[error("Cache is in use by another process: {0}")]
    Busy(PathBuf),

    /// The cache file exists but is not a valid database.
    #[error("Cache file is corrupt or not a database: {0}")]
    Corrupt(PathBuf),

    /// An I/O error occurred on the cache or its lock file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A database operation failed.
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Path of the lock file guarding the cache at `path`.
///
/// The full file name gets a `.lock` suffix: `fingerprints.db` becomes
/// `fingerprints.db.lock`.
#[must_use]
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Persistent cache for file hashes using SQLite.
///
/// The handle is `Send + Sync`; the connection sits behind a mutex so
/// parallel hashing workers can share one handle.
#[derive(Debug)]
pub struct HashCache {
    // Field order matters: the connection drops before the lock.
    conn: Mutex<Connection>,
    path: PathBuf,
    _lock: CacheLock,
}

impl HashCache {
    /// Open or create the cache at `path`.
    ///
    /// # Errors
    ///
    /// * [`CacheError::Busy`] if another handle holds the lock
    /// * [`CacheError::Corrupt`] if `path` is not a database
    /// * [`CacheError::Io`] / [`CacheError::Database`] otherwise
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let lock = CacheLock::acquire(&lock_path_for(path))?;
        // From here on, returning early drops `lock` and releases it.
        let conn = Connection::open(path).map_err(|e| classify(path, e))?;
        configure(&conn).map_err(|e| classify(path, e))?;
        migrate(&conn).map_err(|e| classify(path, e))?;

        log::debug!("Opened hash cache at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panicking worker cannot leave the connection half-written
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a fingerprint for `key`.
    ///
    /// Returns `None` if the key is absent. A record whose size or mtime no
    /// longer matches is deleted and also reported as a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn lookup(
        &self,
        key: &IdentityKey,
        size: u64,
        mtime: i64,
    ) -> CacheResult<Option<Fingerprint>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT hash_high, hash_low, size, mtime FROM fingerprints WHERE key = ?1",
                params![key.as_bytes()],
                |row| {
                    let high: i64 = row.get(0)?;
                    let low: i64 = row.get(1)?;
                    let stored_size: i64 = row.get(2)?;
                    Ok(CacheEntry::new(
                        Fingerprint::new(high as u64, low as u64),
                        stored_size as u64,
                        row.get(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some(entry) if entry.is_fresh(size, mtime) => Ok(Some(entry.hash)),
            Some(_) => {
                log::trace!("Stale cache entry for {:?}", key);
                conn.execute(
                    "DELETE FROM fingerprints WHERE key = ?1",
                    params![key.as_bytes()],
                )?;
                Ok(None)
            }
        }
    }

    /// Insert or replace the record for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The handle remains usable.
    pub fn store(&self, key: &IdentityKey, entry: &CacheEntry) -> CacheResult<()> {
        self.conn().execute(
            "INSERT INTO fingerprints (key, hash_high, hash_low, size, mtime)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                hash_high = excluded.hash_high,
                hash_low = excluded.hash_low,
                size = excluded.size,
                mtime = excluded.mtime",
            params![
                key.as_bytes(),
                entry.hash.high as i64,
                entry.hash.low as i64,
                entry.size as i64,
                entry.mtime
            ],
        )?;
        Ok(())
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn len(&self) -> CacheResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Whether the cache holds no records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear(&self) -> CacheResult<()> {
        self.conn().execute("DELETE FROM fingerprints", [])?;
        log::info!("Cleared hash cache at {}", self.path.display());
        Ok(())
    }

    /// Flush the WAL, close the database and release the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint or close fails. The lock is
    /// released either way.
    pub fn close(self) -> CacheResult<()> {
        let Self { conn, path, _lock } = self;
        let conn = conn.into_inner().unwrap_or_else(PoisonError::into_inner);

        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        conn.close().map_err(|(_, e)| CacheError::Database(e))?;
        log::debug!("Closed hash cache at {}", path.display());
        Ok(())
    }
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    log::trace!("Cache journal mode: {}", mode);
    conn.pragma_update(None, "synchronous", "NORMAL")
}

/// Ensure the schema exists and matches [`SCHEMA_VERSION`].
///
/// Cached fingerprints are derived data, so an outdated layout is dropped
/// rather than converted.
fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version != SCHEMA_VERSION {
        if version != 0 {
            log::info!(
                "Cache schema version {} != {}, recreating",
                version,
                SCHEMA_VERSION
            );
        }
        conn.execute_batch("DROP TABLE IF EXISTS fingerprints;")?;
    }
    conn.execute_batch(SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

fn classify(path: &Path, error: rusqlite::Error) -> CacheError {
    match error.sqlite_error_code() {
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => {
            log::warn!("Cache {} is not a valid database", path.display());
            CacheError::Corrupt(path.to_path_buf())
        }
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            CacheError::Busy(path.to_path_buf())
        }
        _ => CacheError::Database(error),
    }
}
