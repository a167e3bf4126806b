//! Scanner module for candidate discovery and file hashing.
//!
//! This module provides functionality for:
//! - Directory walking using jwalk, with optional archive expansion
//! - Content hashing with xxHash3-128
//! - Stable file identities for the fingerprint cache
//! - Hardlink detection
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Streaming content fingerprints
//! - [`identity`]: Identity keys used by the cache
//! - [`hardlink`]: `(device, inode)` tracking
//!
//! A [`FileEntry`] is the uniform "comparable byte stream": its bytes live
//! either directly on disk or inside an archive member.
//!
//! # Example
//!
//! ```no_run
//! use ftwin::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     recursive: true,
//!     min_size: Some(1024),
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.display_path(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hardlink;
pub mod hasher;
pub mod identity;
pub mod walker;

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::archive::{self, ArchiveError, ScopedPath};

// Re-export main types
pub use hasher::{files_equal, hash_to_hex, Fingerprint, Hasher};
pub use identity::{identity_key, IdentityKey};
pub use walker::Walker;

/// One comparable entity: a regular file, or a member of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path on disk (the file itself, or the containing archive)
    pub path: PathBuf,
    /// Member name inside the archive, if archived
    pub subpath: Option<String>,
    /// Size in bytes of the comparable content
    pub size: u64,
    /// Last modification time, seconds since the Unix epoch
    pub mtime: i64,
    /// Preferred representative within a duplicate set
    pub prioritized: bool,
    /// Content fingerprint, set once the content has been hashed
    pub hash: Option<Fingerprint>,
}

impl FileEntry {
    /// Create an entry for a regular file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `mtime` - Modification time in seconds
    #[must_use]
    pub fn new(path: PathBuf, size: u64, mtime: i64) -> Self {
        Self {
            path,
            subpath: None,
            size,
            mtime,
            prioritized: false,
            hash: None,
        }
    }

    /// Create an entry for an archive member.
    #[must_use]
    pub fn archived(archive: PathBuf, member: impl Into<String>, size: u64, mtime: i64) -> Self {
        Self {
            subpath: Some(member.into()),
            ..Self::new(archive, size, mtime)
        }
    }

    /// Mark this entry as prioritized.
    #[must_use]
    pub fn with_prioritized(mut self, prioritized: bool) -> Self {
        self.prioritized = prioritized;
        self
    }

    /// Attach a known fingerprint.
    #[must_use]
    pub fn with_hash(mut self, hash: Fingerprint) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Size of the comparable content.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time in seconds.
    #[must_use]
    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Whether the bytes live inside an archive.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.subpath.is_some()
    }

    /// Human-facing location: `path`, or `archive:member` for archive members.
    #[must_use]
    pub fn display_path(&self) -> String {
        match &self.subpath {
            Some(member) => format!("{}:{}", self.path.display(), member),
            None => self.path.display().to_string(),
        }
    }

    /// A path on disk holding this entry's bytes.
    ///
    /// Regular files return their own path. Archive members are extracted
    /// to a temporary file that lives as long as the returned value.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive member cannot be extracted.
    pub fn comparison_path(&self) -> Result<ComparisonPath, ArchiveError> {
        self.comparison_path_in(&std::env::temp_dir())
    }

    /// Like [`comparison_path`](Self::comparison_path), extracting under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive member cannot be extracted.
    pub fn comparison_path_in(&self, dir: &Path) -> Result<ComparisonPath, ArchiveError> {
        match &self.subpath {
            None => Ok(ComparisonPath::Direct(self.path.clone())),
            Some(member) => {
                archive::extract_member_in(&self.path, member, dir).map(ComparisonPath::Extracted)
            }
        }
    }
}

/// A path to compare bytes against, with scope-bound cleanup.
#[derive(Debug)]
pub enum ComparisonPath {
    /// A regular file; nothing to clean up
    Direct(PathBuf),
    /// An extracted archive member; deleted on drop
    Extracted(ScopedPath),
}

impl ComparisonPath {
    /// The path on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Direct(path) => path,
            Self::Extracted(scoped) => scoped.path(),
        }
    }
}

impl AsRef<Path> for ComparisonPath {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Obtain on-disk paths for two entries at once.
///
/// If the second extraction fails, the first temporary is removed before
/// the error is returned.
///
/// # Errors
///
/// Returns [`ScanError::ComparisonFailed`] naming the entry that could not
/// be materialized.
pub fn get_comparison_paths(
    a: &FileEntry,
    b: &FileEntry,
) -> Result<(ComparisonPath, ComparisonPath), ScanError> {
    get_comparison_paths_in(a, b, &std::env::temp_dir())
}

/// Like [`get_comparison_paths`], extracting under `dir`.
///
/// # Errors
///
/// See [`get_comparison_paths`].
pub fn get_comparison_paths_in(
    a: &FileEntry,
    b: &FileEntry,
    dir: &Path,
) -> Result<(ComparisonPath, ComparisonPath), ScanError> {
    let first = a
        .comparison_path_in(dir)
        .map_err(|source| ScanError::comparison(a, source))?;
    let second = match b.comparison_path_in(dir) {
        Ok(path) => path,
        Err(source) => {
            drop(first);
            return Err(ScanError::comparison(b, source));
        }
    };
    Ok((first, second))
}

/// Configuration for directory walking.
///
/// Controls filtering, symlink handling, priority roots and archive
/// expansion.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into subdirectories.
    pub recursive: bool,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Include hidden files and directories (names starting with `.`).
    pub include_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// If non-empty, a display path must match one of these to be included.
    pub whitelist: Vec<Regex>,

    /// Display paths matching any of these are excluded.
    pub exclude: Vec<Regex>,

    /// Files under these roots are marked as prioritized.
    pub priority_paths: Vec<PathBuf>,

    /// Expand tar archives into their members.
    pub untar: bool,
}

impl WalkerConfig {
    /// Whether `path` lies under one of the priority roots.
    ///
    /// This is a plain component prefix test, so both sides must be spelled
    /// the same way. [`Walker`] canonicalizes them before asking.
    #[must_use]
    pub fn is_prioritized(&self, path: &Path) -> bool {
        self.priority_paths.iter().any(|root| path.starts_with(root))
    }

    /// Replace every priority root with its canonical form.
    ///
    /// Roots that cannot be resolved (usually because they do not exist)
    /// are kept as given.
    pub fn canonicalize_priority_paths(&mut self) {
        for root in &mut self.priority_paths {
            match std::fs::canonicalize(&*root) {
                Ok(canonical) => *root = canonical,
                Err(e) => log::debug!("Keeping priority root {} as given: {}", root.display(), e),
            }
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An archive could not be listed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A file failed to hash.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A hard link was left out because the path sharing its inode failed
    /// to hash.
    #[error("Skipped {path}: hard-linked original {original} could not be hashed")]
    HardlinkSkipped {
        /// The skipped link
        path: PathBuf,
        /// The path that was hashed on its behalf
        original: PathBuf,
    },

    /// Bytes for a comparison could not be materialized.
    #[error("Failed to prepare {path} for comparison: {source}")]
    ComparisonFailed {
        /// Display path of the entry
        path: String,
        /// The extraction error
        #[source]
        source: ArchiveError,
    },
}

impl ScanError {
    fn comparison(entry: &FileEntry, source: ArchiveError) -> Self {
        Self::ComparisonFailed {
            path: entry.display_path(),
            source,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The archive holding the content could not be read.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing cancelled")]
    Cancelled,
}

impl HashError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
