use ftwin::config::Options;
use ftwin::duplicates::DuplicateFinder;
use ftwin::output::TextOutput;
use ftwin::scanner::WalkerConfig;
use regex::Regex;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn scan(root: &Path, config: &WalkerConfig) -> Vec<ftwin::duplicates::DuplicateGroup> {
    DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[root.to_path_buf()], config)
        .unwrap()
        .0
}

#[cfg(unix)]
#[test]
fn test_paths_with_quotes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("file_with_\"quote\".txt"), b"content").unwrap();
    fs::write(dir.path().join("duplicate.txt"), b"content").unwrap();

    let groups = scan(dir.path(), &WalkerConfig::default());
    assert_eq!(groups.len(), 1);
    assert!(groups[0]
        .files
        .iter()
        .any(|f| f.path.to_string_lossy().contains('"')));
}

#[cfg(unix)]
#[test]
fn test_paths_with_newlines_use_custom_separator() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("line\nbreak"), b"content").unwrap();
    fs::write(dir.path().join("plain"), b"content").unwrap();

    let groups = scan(dir.path(), &WalkerConfig::default());
    assert_eq!(groups.len(), 1);

    let options = Options {
        sep: '\0',
        ..Options::default()
    };
    let text = TextOutput::new(&groups, &options).render();
    assert_eq!(text.split('\0').count(), 2);
    assert!(text.contains("line\nbreak"));
}

#[test]
fn test_unicode_file_names() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("café.txt"), b"unicode").unwrap();
    fs::write(dir.path().join("日本語.txt"), b"unicode").unwrap();

    let groups = scan(dir.path(), &WalkerConfig::default());
    assert_eq!(groups.len(), 1);
    let names = groups[0].display_paths().join("|");
    assert!(names.contains("café.txt"));
    assert!(names.contains("日本語.txt"));
}

#[test]
fn test_deeply_nested_paths() {
    let dir = tempdir().unwrap();
    let mut deep = dir.path().to_path_buf();
    for i in 0..40 {
        deep.push(format!("level{i}"));
    }
    fs::create_dir_all(&deep).unwrap();
    fs::write(deep.join("bottom.txt"), b"deep").unwrap();
    fs::write(dir.path().join("top.txt"), b"deep").unwrap();

    let config = WalkerConfig {
        recursive: true,
        ..WalkerConfig::default()
    };
    let groups = scan(dir.path(), &config);
    assert_eq!(groups.len(), 1);
}

#[test]
fn test_exclude_pattern_matches_directory_part() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("skipme")).unwrap();
    fs::write(dir.path().join("skipme").join("a"), b"twin").unwrap();
    fs::write(dir.path().join("b"), b"twin").unwrap();

    let config = WalkerConfig {
        recursive: true,
        exclude: vec![Regex::new("/skipme/").unwrap()],
        ..WalkerConfig::default()
    };
    assert!(scan(dir.path(), &config).is_empty());
}

#[test]
fn test_hidden_files_opt_in() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden"), b"secret").unwrap();
    fs::write(dir.path().join("visible"), b"secret").unwrap();

    assert!(scan(dir.path(), &WalkerConfig::default()).is_empty());

    let config = WalkerConfig {
        include_hidden: true,
        ..WalkerConfig::default()
    };
    assert_eq!(scan(dir.path(), &config).len(), 1);
}
