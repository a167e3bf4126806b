use ftwin::config::Options;
use ftwin::duplicates::{DuplicateFinder, DuplicateGroup};
use ftwin::output::TextOutput;
use ftwin::scanner::{FileEntry, Fingerprint, WalkerConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn equal_pair(size: u64, mtime: i64) -> Vec<DuplicateGroup> {
    vec![DuplicateGroup::new(
        Fingerprint::new(0xdead_beef_dead_beef, 0xdead_beef_dead_beef),
        size,
        vec![
            FileEntry::new(PathBuf::from("file1"), size, mtime),
            FileEntry::new(PathBuf::from("file2"), size, mtime),
        ],
    )]
}

#[test]
fn test_text_report_sized_with_separator() {
    let groups = equal_pair(1024, 0);
    let options = Options {
        sized: true,
        sep: ';',
        ..Options::default()
    };

    let text = TextOutput::new(&groups, &options).render();
    assert!(text.contains("1.0K"));
    assert!(text.contains(';'));
    assert!(text.contains("file1"));
    assert!(text.contains("file2"));
}

#[test]
fn test_hash_hex_formatting() {
    let groups = equal_pair(4, 0);
    assert_eq!(groups[0].hash_hex(), "deadbeefdeadbeefdeadbeefdeadbeef");
}

#[test]
fn test_text_report_from_real_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one"), b"alpha").unwrap();
    fs::write(dir.path().join("two"), b"alpha").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()], &WalkerConfig::default())
        .unwrap();

    let mut out = Vec::new();
    TextOutput::new(&groups, &Options::default())
        .write_to(&mut out)
        .unwrap();
    let expected = format!(
        "{}\n{}\n",
        dir.path().join("one").display(),
        dir.path().join("two").display()
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[cfg(feature = "json")]
mod json {
    use super::*;
    use ftwin::output::JsonOutput;

    #[test]
    fn test_json_report_shape() {
        let groups = equal_pair(1024, 1_672_531_200);
        let json = JsonOutput::new(&groups).to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let sets = value.as_array().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0]["size_bytes"], 1024);
        for member in sets[0]["duplicates"].as_array().unwrap() {
            assert_eq!(member["mtime_iso8601_utc"], "2023-01-01T00:00:00Z");
        }
    }

    #[test]
    fn test_json_report_from_real_scan() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"json dup").unwrap();
        fs::write(&b, b"json dup").unwrap();
        let stamp = filetime::FileTime::from_unix_time(1_672_531_200, 0);
        filetime::set_file_mtime(&a, stamp).unwrap();
        filetime::set_file_mtime(&b, stamp).unwrap();

        let (groups, _) = DuplicateFinder::with_defaults()
            .find_duplicates_in_paths(&[dir.path().to_path_buf()], &WalkerConfig::default())
            .unwrap();

        let mut out = Vec::new();
        JsonOutput::new(&groups).write_to(&mut out, false).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value[0]["size_bytes"], 8);
        assert_eq!(value[0]["hash_hex"].as_str().unwrap().len(), 32);
        assert_eq!(value[0]["duplicates"][0]["path"], a.to_string_lossy().as_ref());
        assert_eq!(
            value[0]["duplicates"][1]["mtime_iso8601_utc"],
            "2023-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_json_no_duplicates_is_empty_array() {
        let mut out = Vec::new();
        JsonOutput::new(&[]).write_to(&mut out, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }
}
