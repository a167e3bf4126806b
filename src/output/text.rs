//! Plain-text report.
//!
//! Each duplicate set is printed as its members joined by the configured
//! separator, representative first. With `sized`, the set starts with its
//! human-readable size followed by `:` and the separator. Sets are
//! separated by a blank line.
//!
//! ```text
//! 1.0K:
//! /photos/a.jpg
//! /backup/a.jpg
//!
//! 12B:
//! /notes.txt
//! /old.tar.gz:notes.txt
//! ```

use std::io::{self, Write};

use super::format_size;
use crate::config::Options;
use crate::duplicates::DuplicateGroup;

/// Text output formatter.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    sized: bool,
    sep: char,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter using the report options of `options`.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], options: &Options) -> Self {
        Self {
            groups,
            sized: options.sized,
            sep: options.sep,
        }
    }

    /// Render one set.
    fn render_group(&self, group: &DuplicateGroup) -> String {
        let sep = self.sep.to_string();
        let members = group.display_paths().join(&sep);
        if self.sized {
            format!("{}:{}{}", format_size(group.size), sep, members)
        } else {
            members
        }
    }

    /// Render the whole report.
    #[must_use]
    pub fn render(&self) -> String {
        self.groups
            .iter()
            .map(|g| self.render_group(g))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write the report to `writer`, ending with a newline if non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.groups.is_empty() {
            return Ok(());
        }
        writer.write_all(self.render().as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}
