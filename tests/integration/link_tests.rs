use ftwin::duplicates::DuplicateFinder;
use ftwin::scanner::hardlink::HardlinkTracker;
use ftwin::scanner::WalkerConfig;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_hardlinks_share_one_digest() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    let hardlink = dir.path().join("hardlink.txt");
    fs::write(&original, b"identical content").unwrap();

    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {e}");
        return;
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &WalkerConfig::default())
        .unwrap();

    // Both names point at the same bytes, so they are reported together
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    if HardlinkTracker::is_supported() {
        assert_eq!(summary.hardlinks, 1);
        assert_eq!(summary.cache_misses, 1);
    } else {
        assert_eq!(summary.cache_misses, 2);
    }
}

#[cfg(unix)]
#[test]
fn test_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, b"symlinked content").unwrap();
    std::os::unix::fs::symlink(&original, dir.path().join("symlink.txt")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &WalkerConfig::default())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[cfg(unix)]
#[test]
fn test_symlinks_followed_when_enabled() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, b"symlinked content").unwrap();
    std::os::unix::fs::symlink(&original, dir.path().join("symlink.txt")).unwrap();

    let config = WalkerConfig {
        follow_symlinks: true,
        ..WalkerConfig::default()
    };
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &config)
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
}
