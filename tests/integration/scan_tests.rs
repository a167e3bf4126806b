use ftwin::duplicates::{DuplicateFinder, FinderConfig};
use ftwin::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn recursive() -> WalkerConfig {
    WalkerConfig {
        recursive: true,
        ..WalkerConfig::default()
    }
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content b");
    write(dir.path(), "c.txt", b"content c");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"duplicate");
    write(dir.path(), "b.txt", b"duplicate");
    write(dir.path(), "c.txt", b"unique!!!");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(groups[0].size, 9);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 9);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"nested dup");
    write(dir.path(), "sub/deeper/b.txt", b"nested dup");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();
    assert_eq!(groups.len(), 1);

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &WalkerConfig::default())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_scan_multiple_roots() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write(first.path(), "photo.jpg", b"same picture bytes");
    write(second.path(), "copy.jpg", b"same picture bytes");

    let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&roots, &recursive())
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"aaaa");
    write(dir.path(), "b", b"bbbb");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.cache_misses, 2);
    assert_eq!(summary.bytes_hashed, 8);
}

#[test]
fn test_groups_are_ordered_by_fingerprint() {
    let dir = tempdir().unwrap();
    for (i, content) in [b"first set".as_slice(), b"second set", b"third  set"]
        .iter()
        .enumerate()
    {
        write(dir.path(), &format!("{i}-a"), content);
        write(dir.path(), &format!("{i}-b"), content);
    }

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();

    assert_eq!(groups.len(), 3);
    assert!(groups.windows(2).all(|w| w[0].hash < w[1].hash));
}

#[test]
fn test_min_size_filter_skips_small_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "small1", b"tiny");
    write(dir.path(), "small2", b"tiny");
    write(dir.path(), "large1", &[7u8; 2048]);
    write(dir.path(), "large2", &[7u8; 2048]);

    let config = WalkerConfig {
        min_size: Some(1024),
        ..recursive()
    };
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &config)
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 2048);
}

#[test]
fn test_empty_files_form_a_set() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 0);
    assert_eq!(summary.bytes_hashed, 0);
}

#[test]
fn test_paranoid_mode_confirms_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"paranoid content");
    write(dir.path(), "b", b"paranoid content");

    let finder = DuplicateFinder::new(FinderConfig::default().with_paranoid(true));
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &recursive())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.verification_mismatches, 0);
}

#[test]
fn test_single_thread_matches_parallel() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(dir.path(), &format!("f{i:02}"), format!("content {}", i % 5).as_bytes());
    }
    let roots = [dir.path().to_path_buf()];

    let (serial, _) = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates_in_paths(&roots, &recursive())
        .unwrap();
    let (parallel, _) = DuplicateFinder::new(FinderConfig::default().with_io_threads(8))
        .find_duplicates_in_paths(&roots, &recursive())
        .unwrap();

    assert_eq!(serial.len(), 5);
    assert_eq!(serial, parallel);
}
