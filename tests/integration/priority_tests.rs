use ftwin::duplicates::DuplicateFinder;
use ftwin::scanner::WalkerConfig;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_priority_member_is_representative() {
    let dir = tempdir().unwrap();
    let keep = dir.path().join("zz-keep");
    let other = dir.path().join("aa-other");
    fs::create_dir(&keep).unwrap();
    fs::create_dir(&other).unwrap();
    fs::write(other.join("copy.txt"), b"duplicate content").unwrap();
    fs::write(keep.join("original.txt"), b"duplicate content").unwrap();

    let config = WalkerConfig {
        recursive: true,
        priority_paths: vec![keep.clone()],
        ..WalkerConfig::default()
    };
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &config)
        .unwrap();

    assert_eq!(groups.len(), 1);
    let representative = groups[0].representative().unwrap();
    assert!(representative.prioritized);
    assert_eq!(representative.path, keep.join("original.txt"));
    assert!(!groups[0].files[1].prioritized);
}

#[test]
fn test_without_priority_first_path_wins() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.txt"), b"same bytes").unwrap();
    fs::write(dir.path().join("a.txt"), b"same bytes").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &WalkerConfig::default())
        .unwrap();

    assert_eq!(groups[0].files[0].path, dir.path().join("a.txt"));
    assert_eq!(groups[0].files[1].path, dir.path().join("b.txt"));
}

#[test]
fn test_multiple_priority_roots() {
    let dir = tempdir().unwrap();
    let roots: Vec<_> = ["p1", "p2", "plain"]
        .iter()
        .map(|name| {
            let root = dir.path().join(name);
            fs::create_dir(&root).unwrap();
            fs::write(root.join("f"), b"triplicate").unwrap();
            root
        })
        .collect();

    let config = WalkerConfig {
        recursive: true,
        priority_paths: vec![roots[0].clone(), roots[1].clone()],
        ..WalkerConfig::default()
    };
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &config)
        .unwrap();

    let flags: Vec<bool> = groups[0].files.iter().map(|f| f.prioritized).collect();
    assert_eq!(flags, vec![true, true, false]);
}

fn relative_tree() -> tempfile::TempDir {
    let dir = tempfile::Builder::new()
        .prefix("ftwin-priority")
        .tempdir_in(".")
        .unwrap();
    fs::create_dir(dir.path().join("keep")).unwrap();
    fs::create_dir(dir.path().join("other")).unwrap();
    fs::write(dir.path().join("keep").join("z.txt"), b"shared bytes").unwrap();
    fs::write(dir.path().join("other").join("a.txt"), b"shared bytes").unwrap();
    dir
}

#[test]
fn test_relative_walk_root_with_absolute_priority_root() {
    let dir = relative_tree();
    assert!(dir.path().is_relative());

    let config = WalkerConfig {
        recursive: true,
        priority_paths: vec![fs::canonicalize(dir.path().join("keep")).unwrap()],
        ..WalkerConfig::default()
    };
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &config)
        .unwrap();

    assert_eq!(groups.len(), 1);
    let representative = groups[0].representative().unwrap();
    assert!(representative.prioritized);
    assert_eq!(representative.path, dir.path().join("keep").join("z.txt"));
}

#[test]
fn test_absolute_walk_root_with_relative_priority_root() {
    let dir = relative_tree();
    let root = fs::canonicalize(dir.path()).unwrap();

    let config = WalkerConfig {
        recursive: true,
        priority_paths: vec![dir.path().join("keep")],
        ..WalkerConfig::default()
    };
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[root.clone()], &config)
        .unwrap();

    assert_eq!(groups.len(), 1);
    let representative = groups[0].representative().unwrap();
    assert!(representative.prioritized);
    assert_eq!(representative.path, root.join("keep").join("z.txt"));
}
