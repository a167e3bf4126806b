//! JSON output formatter for duplicate scan results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! [
//!   {
//!     "size_bytes": 1024,
//!     "hash_hex": "0123456789abcdef0123456789abcdef",
//!     "duplicates": [
//!       { "path": "/photos/a.jpg", "mtime_iso8601_utc": "2023-01-01T00:00:00Z" },
//!       {
//!         "path": "/backup.tar.gz",
//!         "archive_subpath": "a.jpg",
//!         "mtime_iso8601_utc": "2023-01-01T00:00:00Z"
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ftwin::duplicates::DuplicateFinder;
//! use ftwin::output::json::JsonOutput;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _) = finder.find_duplicates(Vec::new()).unwrap();
//!
//! let output = JsonOutput::new(&groups);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::duplicates::DuplicateGroup;
use crate::scanner::FileEntry;

/// One member of a duplicate set.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicate {
    /// Path on disk (the file, or the containing archive)
    pub path: String,
    /// Member name inside the archive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_subpath: Option<String>,
    /// Modification time, RFC 3339 in UTC with a `Z` suffix
    pub mtime_iso8601_utc: String,
}

impl JsonDuplicate {
    /// Create a JSON member from a file entry.
    #[must_use]
    pub fn from_file_entry(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.to_string_lossy().into_owned(),
            archive_subpath: entry.subpath.clone(),
            mtime_iso8601_utc: format_mtime(entry.mtime),
        }
    }
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Size in bytes of each member
    pub size_bytes: u64,
    /// Fingerprint as 32 lowercase hex characters
    pub hash_hex: String,
    /// Members, representative first
    pub duplicates: Vec<JsonDuplicate>,
}

impl JsonDuplicateGroup {
    /// Create a JSON duplicate group from a DuplicateGroup.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            size_bytes: group.size,
            hash_hex: group.hash_hex(),
            duplicates: group
                .files
                .iter()
                .map(JsonDuplicate::from_file_entry)
                .collect(),
        }
    }
}

/// Complete JSON report: a top-level array of sets.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct JsonOutput {
    /// All duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
}

impl JsonOutput {
    /// Create a JSON output from duplicate groups.
    #[must_use]
    pub fn new(groups: &[DuplicateGroup]) -> Self {
        Self {
            duplicates: groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Arguments
    ///
    /// * `writer` - The writer to output to (e.g., stdout)
    /// * `pretty` - Whether to pretty-print the output
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Render seconds since the epoch as `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Out-of-range timestamps fall back to the epoch.
fn format_mtime(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
