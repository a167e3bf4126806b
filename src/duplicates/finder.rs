//! Duplicate finder implementation.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Size grouping**: bucket candidates by exact size (see [`crate::duplicates::groups`])
//! 2. **Hashing**: fingerprint every member of a non-singleton bucket, reusing
//!    cached fingerprints and sharing one digest between hard links
//! 3. **Ordering**: push hashed records through a [`FingerprintHeap`]
//! 4. **Grouping**: drain the heap into runs of equal fingerprints
//! 5. **Verification** (optional): byte-compare each member with its representative
//!
//! # Example
//!
//! ```no_run
//! use ftwin::duplicates::{DuplicateFinder, FinderConfig};
//! use ftwin::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let files = walker.walk().filter_map(Result::ok).collect();
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let (groups, summary) = finder.find_duplicates(files).unwrap();
//! println!("{} sets, {} reclaimable", groups.len(), summary.reclaimable_display());
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{group_by_size_structured, DuplicateGroup};
use super::heap::FingerprintHeap;
use crate::cache::{CacheEntry, HashCache};
use crate::config::Options;
use crate::output::format_size;
use crate::progress::ProgressCallback;
use crate::scanner::hardlink::{HardlinkTracker, InodeKey};
use crate::scanner::{
    files_equal, get_comparison_paths, identity_key, FileEntry, Fingerprint, HashError, Hasher,
    ScanError, Walker, WalkerConfig,
};

/// Files above this size are logged when hashing starts.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional fingerprint cache for faster rescans.
    pub cache: Option<Arc<HashCache>>,
    /// Enable byte-by-byte verification after hash matching (paranoid mode).
    pub paranoid: bool,
    /// Accept archive members as candidates.
    pub untar: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("cache", &self.cache.as_ref().map(|c| c.path().to_path_buf()))
            .field("paranoid", &self.paranoid)
            .field("untar", &self.untar)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            cache: None,
            paranoid: false,
            untar: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the fingerprint cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<HashCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enable paranoid mode (byte-by-byte verification).
    #[must_use]
    pub fn with_paranoid(mut self, enabled: bool) -> Self {
        self.paranoid = enabled;
        self
    }

    /// Accept or reject archive members.
    #[must_use]
    pub fn with_untar(mut self, enabled: bool) -> Self {
        self.untar = enabled;
        self
    }

    /// Apply the detector-relevant parts of a run's [`Options`].
    #[must_use]
    pub fn with_options(self, options: &Options) -> Self {
        self.with_untar(options.untar)
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of candidates considered
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Archive members dropped because archive support was off
    pub rejected_archived: usize,
    /// Number of candidates eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Candidates that shared an inode with an earlier candidate
    pub hardlinks: usize,
    /// Fingerprints adopted from the cache
    pub cache_hits: usize,
    /// Fingerprints computed because the cache had none
    pub cache_misses: usize,
    /// Bytes read to compute fingerprints
    pub bytes_hashed: u64,
    /// Members dropped by paranoid verification
    pub verification_mismatches: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding representatives)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Per-file errors, reported as warnings
    pub errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        format_size(self.reclaimable_space)
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        format_size(self.total_size)
    }

    /// Whether any per-file error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn record_groups(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was cancelled (Ctrl+C or shutdown flag).
    #[error("Scan cancelled")]
    Cancelled,

    /// The hashing thread pool could not be built.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(String),
}

/// A candidate scheduled for hashing, and whether it was a cache hit.
type HashOutcome = Result<(Fingerprint, bool), HashError>;

/// Duplicate finder that orchestrates the detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Walk `roots` and find duplicates among everything found.
    ///
    /// Walk errors are added to the summary as warnings.
    ///
    /// # Errors
    ///
    /// See [`find_duplicates`](Self::find_duplicates).
    pub fn find_duplicates_in_paths(
        &self,
        roots: &[PathBuf],
        walker_config: &WalkerConfig,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let mut files = Vec::new();
        let mut walk_errors = Vec::new();
        for root in roots {
            log::info!("Walking {}", root.display());
            let mut walker = Walker::new(root, walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }
            for result in walker.walk() {
                match result {
                    Ok(file) => {
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_progress(files.len() + 1, &file.display_path());
                        }
                        files.push(file);
                    }
                    Err(e) => walk_errors.push(e),
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Cancelled);
        }

        let (groups, mut summary) = self.find_duplicates(files)?;
        walk_errors.append(&mut summary.errors);
        summary.errors = walk_errors;
        Ok((groups, summary))
    }

    /// Find all duplicate sets among `files`.
    ///
    /// Sets come out ordered by fingerprint, each with its representative
    /// first. Files that cannot be read are reported in
    /// [`ScanSummary::errors`] and take no part in any set.
    ///
    /// # Errors
    ///
    /// * [`FinderError::Cancelled`] if shutdown was requested
    /// * [`FinderError::ThreadPool`] if the hashing pool cannot start
    pub fn find_duplicates(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Cancelled);
        }

        let files: Vec<FileEntry> = files
            .into_iter()
            .filter(|file| {
                if file.is_archived() && !self.config.untar {
                    log::debug!("Rejecting archive member {}", file.display_path());
                    summary.rejected_archived += 1;
                    false
                } else {
                    true
                }
            })
            .collect();
        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();

        let (size_groups, size_stats) = group_by_size_structured(files);
        summary.eliminated_by_size = size_stats.eliminated_unique;

        // Plan the hashing work: empty buckets resolve immediately and
        // hard links ride along with the first path of their inode.
        let mut resolved: Vec<FileEntry> = Vec::new();
        let mut jobs: Vec<FileEntry> = Vec::new();
        let mut links: Vec<(usize, FileEntry)> = Vec::new();

        for group in size_groups {
            if group.size == 0 {
                resolved.extend(
                    group
                        .files
                        .into_iter()
                        .map(|f| f.with_hash(Fingerprint::empty())),
                );
                continue;
            }

            let mut tracker = HardlinkTracker::with_capacity(group.len());
            for file in group.files {
                let inode = if file.is_archived() {
                    None
                } else {
                    InodeKey::for_path(&file.path)
                };
                if let Some(key) = inode {
                    if let Some(original) = tracker.observe(key, jobs.len()) {
                        log::trace!("Hard link: {}", file.display_path());
                        summary.hardlinks += 1;
                        links.push((original, file));
                        continue;
                    }
                }
                jobs.push(file);
            }
        }

        let outcomes = self.hash_all(&jobs)?;

        if self.config.is_shutdown_requested()
            || outcomes
                .iter()
                .any(|o| matches!(o, Err(HashError::Cancelled)))
        {
            summary.interrupted = true;
            log::info!("Hashing interrupted by shutdown signal");
            return Err(FinderError::Cancelled);
        }

        let mut fingerprints: Vec<Result<Fingerprint, PathBuf>> = Vec::with_capacity(jobs.len());
        let mut heap = FingerprintHeap::with_capacity(resolved.len() + jobs.len() + links.len());
        heap.extend(resolved);

        for (file, outcome) in jobs.into_iter().zip(outcomes) {
            match outcome {
                Ok((hash, cache_hit)) => {
                    if cache_hit {
                        summary.cache_hits += 1;
                    } else {
                        summary.cache_misses += 1;
                        summary.bytes_hashed += file.size;
                    }
                    fingerprints.push(Ok(hash));
                    heap.insert(file.with_hash(hash));
                }
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", file.display_path(), e);
                    fingerprints.push(Err(file.path.clone()));
                    summary.errors.push(ScanError::Hash(e));
                }
            }
        }

        for (original, file) in links {
            match fingerprints.get(original) {
                Some(Ok(hash)) => heap.insert(file.with_hash(*hash)),
                Some(Err(original)) => {
                    log::warn!(
                        "Skipping {}: its hard-linked original could not be hashed",
                        file.display_path()
                    );
                    summary.errors.push(ScanError::HardlinkSkipped {
                        path: file.path,
                        original: original.clone(),
                    });
                }
                None => log::debug!("No hashing job for hard link {}", file.display_path()),
            }
        }

        let mut groups = drain_groups(&mut heap);

        if self.config.paranoid {
            groups = self.verify_groups(groups, &mut summary)?;
        }

        summary.record_groups(&groups);
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable, {} cache hits",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.cache_hits
        );

        Ok((groups, summary))
    }

    /// Fingerprint every job on a pool limited to `io_threads`.
    ///
    /// The result is index-aligned with `jobs`.
    fn hash_all(&self, jobs: &[FileEntry]) -> Result<Vec<HashOutcome>, FinderError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
            .map_err(|e| FinderError::ThreadPool(e.to_string()))?;

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("hashing", jobs.len());
        }
        log::info!(
            "Hashing {} files on {} threads",
            jobs.len(),
            self.config.io_threads
        );

        let completed = AtomicUsize::new(0);
        let outcomes = pool.install(|| {
            jobs.par_iter()
                .map(|file| {
                    let outcome = self.fingerprint(file);
                    if let Some(ref callback) = self.config.progress_callback {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(done, &file.display_path());
                        callback.on_item_completed(file.size);
                    }
                    outcome
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hashing");
        }
        Ok(outcomes)
    }

    /// Fingerprint one file, consulting the cache first.
    fn fingerprint(&self, file: &FileEntry) -> HashOutcome {
        if self.config.is_shutdown_requested() {
            return Err(HashError::Cancelled);
        }

        let Some(cache) = self.config.cache.as_deref() else {
            return self.hash_uncached(file).map(|hash| (hash, false));
        };

        let key = identity_key(file)?;
        match cache.lookup(&key, file.size, file.mtime) {
            Ok(Some(hash)) => {
                log::trace!("Cache hit: {}", file.display_path());
                return Ok((hash, true));
            }
            Ok(None) => log::trace!("Cache miss: {}", file.display_path()),
            Err(e) => log::warn!("Failed to query cache for {}: {}", file.display_path(), e),
        }

        let hash = self.hash_uncached(file)?;
        if let Err(e) = cache.store(&key, &CacheEntry::new(hash, file.size, file.mtime)) {
            log::warn!("Failed to update cache for {}: {}", file.display_path(), e);
        }
        Ok((hash, false))
    }

    fn hash_uncached(&self, file: &FileEntry) -> Result<Fingerprint, HashError> {
        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({} MB): {}",
                file.size / (1024 * 1024),
                file.display_path()
            );
        }
        self.hasher.hash_entry(file)
    }

    /// Byte-compare every member with its representative.
    ///
    /// Members that differ, or cannot be read, leave the set; sets that
    /// shrink below two members disappear.
    fn verify_groups(
        &self,
        groups: Vec<DuplicateGroup>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        let total: usize = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("verifying", total);
        }

        let mut verified = Vec::with_capacity(groups.len());
        let mut checked = 0usize;
        for group in groups {
            let DuplicateGroup { hash, size, files } = group;
            let mut members = files.into_iter();
            let Some(representative) = members.next() else {
                continue;
            };

            let mut kept = vec![representative];
            for member in members {
                if self.config.is_shutdown_requested() {
                    return Err(FinderError::Cancelled);
                }
                checked += 1;
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(checked, &member.display_path());
                }

                let identical = get_comparison_paths(&kept[0], &member).and_then(|(a, b)| {
                    files_equal(a.path(), b.path()).map_err(ScanError::from)
                });
                match identical {
                    Ok(true) => kept.push(member),
                    Ok(false) => {
                        log::warn!(
                            "Content mismatch despite equal hash: {} vs {}",
                            kept[0].display_path(),
                            member.display_path()
                        );
                        summary.verification_mismatches += 1;
                    }
                    Err(e) => {
                        log::warn!("Failed to verify {}: {}", member.display_path(), e);
                        summary.errors.push(e);
                    }
                }
            }

            if kept.len() > 1 {
                verified.push(DuplicateGroup::new(hash, size, kept));
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("verifying");
        }
        Ok(verified)
    }
}

/// Drain `heap` min-first into maximal runs of equal fingerprints.
///
/// A run is split by size, so a file that changed length after the walk
/// never joins a set of another size. Runs of a single record are dropped.
pub(crate) fn drain_groups(heap: &mut FingerprintHeap) -> Vec<DuplicateGroup> {
    let mut groups = Vec::new();
    let mut run: Vec<FileEntry> = Vec::new();

    while let Some(entry) = heap.extract_min() {
        if run.last().is_some_and(|last| last.hash != entry.hash) {
            flush_run(&mut run, &mut groups);
        }
        run.push(entry);
    }
    flush_run(&mut run, &mut groups);

    groups
}

fn flush_run(run: &mut Vec<FileEntry>, groups: &mut Vec<DuplicateGroup>) {
    let files = std::mem::take(run);
    if files.len() < 2 {
        return;
    }
    let Some(hash) = files[0].hash else {
        return;
    };

    // Comparator order is kept inside each size
    let mut by_size: BTreeMap<u64, Vec<FileEntry>> = BTreeMap::new();
    for file in files {
        by_size.entry(file.size).or_default().push(file);
    }
    if by_size.len() > 1 {
        log::warn!(
            "Fingerprint {} seen at {} different sizes, files changed during the scan",
            hash,
            by_size.len()
        );
    }

    for (size, files) in by_size {
        if files.len() < 2 {
            continue;
        }
        log::debug!(
            "Duplicate group {}: {} files, {} bytes each",
            hash,
            files.len(),
            size
        );
        groups.push(DuplicateGroup::new(hash, size, files));
    }
}
