//! Scoped extraction of archive members to temporary files.
//!
//! Byte-level comparison needs a real path on disk. [`extract_member`]
//! copies one member into a fresh temporary file and hands back a
//! [`ScopedPath`]; dropping the `ScopedPath` deletes the file, on success
//! and error paths alike.

use std::io::{self, Write};
use std::path::Path;

use tempfile::TempPath;

use super::{with_member, ArchiveError};

const TEMP_PREFIX: &str = "ftwin-";

/// A filesystem path whose file is deleted when this value is dropped.
#[derive(Debug)]
pub struct ScopedPath {
    inner: TempPath,
}

impl ScopedPath {
    /// The path of the temporary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner
    }
}

impl AsRef<Path> for ScopedPath {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

impl Drop for ScopedPath {
    fn drop(&mut self) {
        log::trace!("Removing extracted temporary {}", self.inner.display());
    }
}

/// Extract `member` of `archive` into the system temporary directory.
///
/// # Errors
///
/// Returns [`ArchiveError::NotFound`] if the member is absent,
/// [`ArchiveError::Unsupported`] if the archive format is not recognized,
/// or [`ArchiveError::Io`] on read/write failure.
pub fn extract_member(archive: &Path, member: &str) -> Result<ScopedPath, ArchiveError> {
    extract_member_in(archive, member, &std::env::temp_dir())
}

/// Extract `member` of `archive` into a temporary file under `dir`.
///
/// # Errors
///
/// See [`extract_member`].
pub fn extract_member_in(
    archive: &Path,
    member: &str,
    dir: &Path,
) -> Result<ScopedPath, ArchiveError> {
    with_member(archive, member, |reader| {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| ArchiveError::io(dir, e))?;

        // A failed copy drops `temp`, which deletes the partial file
        io::copy(reader, temp.as_file_mut()).map_err(|e| ArchiveError::io(temp.path(), e))?;
        temp.as_file_mut()
            .flush()
            .map_err(|e| ArchiveError::io(temp.path(), e))?;

        let inner = temp.into_temp_path();
        log::debug!(
            "Extracted {}:{} to {}",
            archive.display(),
            member,
            inner.display()
        );
        Ok(ScopedPath { inner })
    })
}
