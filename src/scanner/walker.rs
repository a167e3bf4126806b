//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing directories
//! and producing [`FileEntry`] candidates for duplicate detection.
//!
//! # Features
//!
//! - Deterministic (sorted) traversal, recursive or single-level
//! - Configurable symlink following
//! - Regex whitelist/exclusion on the full path
//! - Size filtering (min/max)
//! - Hidden file filtering
//! - Priority roots that mark entries as preferred representatives
//! - Optional expansion of tar archives into their members
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use ftwin::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     recursive: true,
//!     untar: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), config);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} candidates", files.len());
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::identity::mtime_secs;
use super::{FileEntry, ScanError, WalkerConfig};
use crate::archive;

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Canonical form of `root`, used to match priority roots
    canonical_root: Option<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory (or single file) to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, mut config: WalkerConfig) -> Self {
        config.canonicalize_priority_paths();
        Self {
            root: path.to_path_buf(),
            canonical_root: std::fs::canonicalize(path).ok(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check if a size passes the min/max filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Whether `path`, yielded under `root`, lies under a priority root.
    fn is_prioritized(&self, path: &Path) -> bool {
        match (&self.canonical_root, path.strip_prefix(&self.root)) {
            (Some(root), Ok(rest)) if rest.as_os_str().is_empty() => {
                self.config.is_prioritized(root)
            }
            (Some(root), Ok(rest)) => self.config.is_prioritized(&root.join(rest)),
            _ => self.config.is_prioritized(path),
        }
    }

    /// Check a candidate's display path against the regex filters.
    fn passes_regex_filter(&self, display: &str) -> bool {
        if !self.config.whitelist.is_empty()
            && !self.config.whitelist.iter().any(|re| re.is_match(display))
        {
            return false;
        }
        !self.config.exclude.iter().any(|re| re.is_match(display))
    }

    /// Walk the tree, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. When the root is a regular file it is yielded on its own.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(!self.config.include_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });
        if !self.config.recursive {
            walk_dir = walk_dir.max_depth(1);
        }

        walk_dir.into_iter().flat_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return Vec::new();
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return Vec::new();
                    }
                    if file_type.is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        return Vec::new();
                    }

                    let metadata = match std::fs::metadata(&path) {
                        Ok(m) => m,
                        Err(e) => {
                            log::warn!("Cannot stat {}: {}", path.display(), e);
                            return vec![Err(ScanError::io(&path, e))];
                        }
                    };
                    if !metadata.is_file() {
                        return Vec::new();
                    }

                    self.process_file(path, &metadata)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    vec![Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    })]
                }
            }
        })
    }

    /// Turn a regular file into zero or more candidates.
    fn process_file(
        &self,
        path: PathBuf,
        metadata: &Metadata,
    ) -> Vec<Result<FileEntry, ScanError>> {
        let prioritized = self.is_prioritized(&path);

        if self.config.untar && archive::is_archive(&path) {
            return self.expand_archive(path, prioritized);
        }

        let size = metadata.len();
        if !self.passes_size_filter(size) {
            log::trace!("Skipping file due to size filter ({}): {}", size, path.display());
            return Vec::new();
        }

        let entry = FileEntry::new(path, size, mtime_secs(metadata)).with_prioritized(prioritized);
        if !self.passes_regex_filter(&entry.display_path()) {
            log::trace!("Skipping file due to regex filter: {}", entry.path.display());
            return Vec::new();
        }
        vec![Ok(entry)]
    }

    /// Yield one candidate per regular member of an archive.
    fn expand_archive(
        &self,
        path: PathBuf,
        prioritized: bool,
    ) -> Vec<Result<FileEntry, ScanError>> {
        let members = match archive::list_members(&path) {
            Ok(members) => members,
            Err(e) => {
                log::warn!("Cannot read archive {}: {}", path.display(), e);
                return vec![Err(ScanError::Archive(e))];
            }
        };

        members
            .into_iter()
            .filter(|m| self.passes_size_filter(m.size))
            .map(|m| {
                FileEntry::archived(path.clone(), m.name, m.size, m.mtime)
                    .with_prioritized(prioritized)
            })
            .filter(|entry| self.passes_regex_filter(&entry.display_path()))
            .map(Ok)
            .collect()
    }
}
