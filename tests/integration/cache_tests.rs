use filetime::{set_file_mtime, FileTime};
use ftwin::cache::{lock_path_for, CacheError, HashCache};
use ftwin::duplicates::{DuplicateFinder, FinderConfig};
use ftwin::scanner::WalkerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn scan(root: &Path, cache: &Arc<HashCache>) -> ftwin::duplicates::ScanSummary {
    let finder = DuplicateFinder::new(FinderConfig::default().with_cache(Arc::clone(cache)));
    let (_, summary) = finder
        .find_duplicates_in_paths(&[root.to_path_buf()], &WalkerConfig::default())
        .unwrap();
    summary
}

fn populate(dir: &Path) -> Vec<PathBuf> {
    let files = vec![dir.join("a"), dir.join("b"), dir.join("c")];
    for path in &files {
        fs::write(path, b"cached content").unwrap();
    }
    files
}

#[test]
fn test_cache_exclusivity() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("fingerprints.db");

    let h1 = HashCache::open(&db).unwrap();
    assert!(lock_path_for(&db).exists());
    assert!(matches!(HashCache::open(&db), Err(CacheError::Busy(_))));

    h1.close().unwrap();
    assert!(!lock_path_for(&db).exists());

    let h2 = HashCache::open(&db).unwrap();
    drop(h2);
    assert!(!lock_path_for(&db).exists());
}

#[test]
fn test_second_scan_hits_cache() {
    let data = tempdir().unwrap();
    let state = tempdir().unwrap();
    populate(data.path());
    let cache = Arc::new(HashCache::open(&state.path().join("cache.db")).unwrap());

    let first = scan(data.path(), &cache);
    assert_eq!(first.cache_hits, 0);
    assert_eq!(first.cache_misses, 3);
    assert_eq!(cache.len().unwrap(), 3);

    let second = scan(data.path(), &cache);
    assert_eq!(second.cache_hits, 3);
    assert_eq!(second.cache_misses, 0);
    assert_eq!(second.bytes_hashed, 0);
}

#[test]
fn test_cache_survives_reopen() {
    let data = tempdir().unwrap();
    let state = tempdir().unwrap();
    let db = state.path().join("cache.db");
    populate(data.path());

    let cache = Arc::new(HashCache::open(&db).unwrap());
    scan(data.path(), &cache);
    Arc::try_unwrap(cache).unwrap().close().unwrap();

    let cache = Arc::new(HashCache::open(&db).unwrap());
    let summary = scan(data.path(), &cache);
    assert_eq!(summary.cache_hits, 3);
    assert_eq!(summary.duplicate_groups, 1);
}

#[test]
fn test_modified_file_is_rehashed() {
    let data = tempdir().unwrap();
    let state = tempdir().unwrap();
    let files = populate(data.path());
    let cache = Arc::new(HashCache::open(&state.path().join("cache.db")).unwrap());

    scan(data.path(), &cache);

    // Same size, new content and a new mtime
    fs::write(&files[0], b"cached CONTENT").unwrap();
    set_file_mtime(&files[0], FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let summary = scan(data.path(), &cache);
    assert_eq!(summary.cache_hits, 2);
    assert_eq!(summary.cache_misses, 1);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
}

#[test]
fn test_cleared_cache_rehashes() {
    let data = tempdir().unwrap();
    let state = tempdir().unwrap();
    populate(data.path());
    let cache = Arc::new(HashCache::open(&state.path().join("cache.db")).unwrap());

    scan(data.path(), &cache);
    cache.clear().unwrap();
    assert!(cache.is_empty().unwrap());

    let summary = scan(data.path(), &cache);
    assert_eq!(summary.cache_misses, 3);
}

#[test]
fn test_cache_shared_across_threads() {
    let state = tempdir().unwrap();
    let cache = Arc::new(HashCache::open(&state.path().join("cache.db")).unwrap());

    let data = tempdir().unwrap();
    for i in 0..32 {
        fs::write(data.path().join(format!("f{i}")), format!("{}", i % 4)).unwrap();
    }

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_cache(Arc::clone(&cache))
            .with_io_threads(8),
    );
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[data.path().to_path_buf()], &WalkerConfig::default())
        .unwrap();

    assert_eq!(groups.len(), 4);
    assert_eq!(summary.cache_misses, 32);
    assert_eq!(cache.len().unwrap(), 32);
}
