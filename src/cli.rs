//! Command-line interface definitions for ftwin.
//!
//! This module defines all CLI arguments using the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Recursively report duplicates under two trees
//! ftwin -r ~/Photos /mnt/backup/Photos
//!
//! # Prefer copies under ~/Photos, show sizes, separate members with ';'
//! ftwin -r -d -s ';' -p ~/Photos ~/Photos /mnt/backup
//!
//! # Look inside tarballs and emit JSON
//! ftwin -r -t -J ~/Downloads
//!
//! # Verbose mode for debugging
//! ftwin -vv -r .
//! ```

use clap::Parser;
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;

use crate::config::Options;

/// Find duplicate files, including inside tar archives.
///
/// ftwin groups candidates by size, confirms them with a 128-bit content
/// hash and prints each set of identical files. Fingerprints are cached
/// between runs so unchanged files are not read again.
#[derive(Debug, Parser)]
#[command(name = "ftwin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long = "recurse")]
    pub recursive: bool,

    /// Include hidden files and directories (starting with .)
    #[arg(short = 'a', long = "hidden")]
    pub include_hidden: bool,

    /// Follow symbolic links
    ///
    /// Warning: May visit the same file twice if links form cycles.
    #[arg(short, long)]
    pub follow_symlinks: bool,

    /// Minimum file size to consider (e.g., 512, 4K, 1M)
    #[arg(short, long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 512, 4K, 1G)
    #[arg(short = 'M', long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Only consider paths matching this regex (repeatable)
    #[arg(short, long, value_name = "REGEX")]
    pub whitelist: Vec<String>,

    /// Skip paths matching this regex (repeatable)
    #[arg(short, long, value_name = "REGEX")]
    pub exclude: Vec<String>,

    /// Match whitelist and exclude regexes case-insensitively
    #[arg(short, long)]
    pub case_insensitive: bool,

    /// Prefer files under this path as the kept copy (repeatable)
    #[arg(short, long = "priority", value_name = "PATH")]
    pub priority_paths: Vec<PathBuf>,

    /// Look for duplicates inside tar archives (.tar, .tar.gz, .tar.bz2, .tar.xz)
    #[arg(short = 't', long)]
    pub untar: bool,

    /// Prefix each set with its human-readable size
    #[arg(short = 'd', long = "display-size")]
    pub display_size: bool,

    /// Separator between members of a set (default: newline)
    ///
    /// Accepts a single character or one of the escapes \n, \t, \0.
    #[arg(short, long, value_name = "CHAR", value_parser = parse_separator)]
    pub separator: Option<char>,

    /// Report only; never act on files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Emit the report as JSON
    #[arg(short = 'J', long)]
    pub json: bool,

    /// Enable paranoid mode: byte-by-byte verification after hash match
    #[arg(short = 'x', long)]
    pub paranoid: bool,

    /// Path to the fingerprint cache database
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Disable fingerprint caching
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Clear the fingerprint cache before scanning
    #[arg(long, conflicts_with = "no_cache")]
    pub clear_cache: bool,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// The run's option mask; `default_sep` applies when `-s` is absent.
    #[must_use]
    pub fn options(&self, default_sep: char) -> Options {
        Options {
            sized: self.display_size,
            dry_run: self.dry_run,
            untar: self.untar,
            json: self.json,
            sep: self.separator.unwrap_or(default_sep),
        }
    }

    /// Compile whitelist patterns.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid pattern.
    pub fn whitelist_regexes(&self) -> Result<Vec<Regex>, regex::Error> {
        compile_patterns(&self.whitelist, self.case_insensitive)
    }

    /// Compile exclusion patterns, `extra` (from configuration) first.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid pattern.
    pub fn exclude_regexes(&self, extra: &[String]) -> Result<Vec<Regex>, regex::Error> {
        let patterns: Vec<String> = extra.iter().chain(&self.exclude).cloned().collect();
        compile_patterns(&patterns, self.case_insensitive)
    }
}

/// Compile `patterns`, optionally case-insensitive.
///
/// # Errors
///
/// Returns the first compilation error.
pub fn compile_patterns(
    patterns: &[String],
    case_insensitive: bool,
) -> Result<Vec<Regex>, regex::Error> {
    patterns
        .iter()
        .map(|p| RegexBuilder::new(p).case_insensitive(case_insensitive).build())
        .collect()
}

/// Parse a separator argument.
///
/// # Errors
///
/// Returns an error unless the value is one character or a known escape.
pub fn parse_separator(s: &str) -> Result<char, String> {
    match s {
        "\\n" => Ok('\n'),
        "\\t" => Ok('\t'),
        "\\0" => Ok('\0'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("Separator must be a single character, got '{s}'")),
            }
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, K/KB/KiB, M/MB/MiB, G/GB/GiB, T/TB/TiB.
/// Case-insensitive, binary multiples. Numbers without suffix are bytes.
///
/// # Examples
///
/// ```
/// use ftwin::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1K").unwrap(), 1024);
/// assert_eq!(parse_size("1.5M").unwrap(), 1_572_864);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1 << 10,
        "M" | "MB" | "MIB" => 1 << 20,
        "G" | "GB" | "GIB" => 1 << 30,
        "T" | "TB" | "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
