//! Advisory lock-file guard for the cache.
//!
//! The sidecar `<cache-path>.lock` is held with an exclusive, non-blocking
//! `fs4` lock for the whole lifetime of a [`HashCache`](super::HashCache).
//! Dropping the guard removes the file and then releases the lock, so a
//! successful lock only counts once the locked inode is still the file at
//! that path.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs4::FileExt;

use super::CacheError;

const ACQUIRE_ATTEMPTS: usize = 3;

/// Exclusive hold on a lock file.
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
    file: File,
}

impl CacheLock {
    /// Try to take the lock at `path` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Busy`] if another handle holds the lock, or
    /// [`CacheError::Io`] if the file cannot be opened.
    pub fn acquire(path: &Path) -> Result<Self, CacheError> {
        for _ in 0..ACQUIRE_ATTEMPTS {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .map_err(|source| CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

            if let Some(lock) = Self::lock_opened(path, file)? {
                return Ok(lock);
            }
            log::debug!("Cache lock {} was replaced while locking, retrying", path.display());
        }
        Err(CacheError::Busy(path.to_path_buf()))
    }

    /// Lock an already opened `file` and check it is still the one at `path`.
    ///
    /// Returns `None` when the previous holder removed or replaced the file
    /// between opening and locking.
    fn lock_opened(path: &Path, file: File) -> Result<Option<Self>, CacheError> {
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                log::debug!("Cache lock {} is held elsewhere", path.display());
                return Err(CacheError::Busy(path.to_path_buf()));
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let current = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let locked = file.metadata().map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !same_file(&locked, &current) {
            // Dropping `file` releases the lock on the orphaned inode.
            return Ok(None);
        }

        log::debug!("Acquired cache lock {}", path.display());
        Ok(Some(Self {
            path: path.to_path_buf(),
            file,
        }))
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        // Remove while still holding the lock. A process that opened the
        // old file in the meantime sees the inode change and retries.
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("Failed to remove lock file {}: {}", self.path.display(), e);
            }
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
        log::debug!("Released cache lock {}", self.path.display());
    }
}

#[cfg(unix)]
fn same_file(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;

    a.dev() == b.dev() && a.ino() == b.ino()
}

// Without inode numbers an open handle keeps the file from being deleted,
// so the file at the path is the one that was opened.
#[cfg(not(unix))]
fn same_file(_a: &Metadata, _b: &Metadata) -> bool {
    true
}
