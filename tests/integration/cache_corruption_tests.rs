use ftwin::cache::{lock_path_for, CacheError, HashCache};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_garbage_database_is_corrupt() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    fs::write(&db, vec![0xA5u8; 4096]).unwrap();

    let result = HashCache::open(&db);
    assert!(matches!(result, Err(CacheError::Corrupt(_))), "{result:?}");
}

#[test]
fn test_lock_released_after_open_error() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    fs::write(&db, vec![0xA5u8; 4096]).unwrap();

    assert!(matches!(HashCache::open(&db), Err(CacheError::Corrupt(_))));
    assert!(!lock_path_for(&db).exists());

    // A leaked lock would make the retry report Busy instead
    assert!(matches!(HashCache::open(&db), Err(CacheError::Corrupt(_))));
}

#[test]
fn test_recovers_after_removing_corrupt_file() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    fs::write(&db, b"this is definitely not sqlite, padded out to a page....").unwrap();
    let _ = HashCache::open(&db);

    fs::remove_file(&db).unwrap();
    let cache = HashCache::open(&db).unwrap();
    assert!(cache.is_empty().unwrap());
}

#[test]
fn test_empty_file_becomes_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    fs::write(&db, b"").unwrap();

    let cache = HashCache::open(&db).unwrap();
    assert_eq!(cache.len().unwrap(), 0);
}

#[test]
fn test_stale_lock_file_is_not_busy() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    // Left behind by a crashed process: present but unlocked
    fs::write(lock_path_for(&db), b"").unwrap();

    let cache = HashCache::open(&db).unwrap();
    cache.close().unwrap();
    assert!(!lock_path_for(&db).exists());
}

#[test]
fn test_unwritable_location_is_io_error() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"x").unwrap();

    let result = HashCache::open(&blocker.join("sub").join("cache.db"));
    assert!(matches!(result, Err(CacheError::Io { .. })), "{result:?}");
}
