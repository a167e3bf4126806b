//! Output formatters for duplicate scan results.
//!
//! This module provides the report formats:
//! - Plain text, one member per field, for shells and humans
//! - JSON for automation and scripting (cargo feature `json`)
//!
//! # Example
//!
//! ```no_run
//! use ftwin::config::Options;
//! use ftwin::duplicates::DuplicateFinder;
//! use ftwin::output::text::TextOutput;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Vec::new()).unwrap();
//!
//! let options = Options::default();
//! TextOutput::new(&groups, &options)
//!     .write_to(&mut std::io::stdout())
//!     .unwrap();
//! ```

#[cfg(feature = "json")]
pub mod json;
pub mod text;

// Re-export main types
#[cfg(feature = "json")]
pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

/// Format a byte size as a short human-readable string.
///
/// Sizes below 1024 print as `"<n>B"`; larger sizes use one decimal and a
/// binary `K`, `M`, `G` or `T` suffix.
///
/// ```
/// use ftwin::output::format_size;
///
/// assert_eq!(format_size(512), "512B");
/// assert_eq!(format_size(1024), "1.0K");
/// assert_eq!(format_size(1536 * 1024), "1.5M");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [char; 4] = ['K', 'M', 'G', 'T'];

    if bytes < 1024 {
        return format!("{bytes}B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}
