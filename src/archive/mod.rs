//! Archive container support.
//!
//! Duplicate candidates may live inside tar archives, optionally wrapped in
//! a gzip, bzip2 or xz stream. This module provides:
//!
//! * [`ArchiveFormat`]: container detection by magic bytes
//! * [`list_members`]: enumerate the regular-file members of an archive
//! * [`with_member`]: stream one member's bytes without touching disk
//! * [`extract`]: materialize one member to a [`ScopedPath`] that is deleted
//!   when it goes out of scope
//!
//! Archives are read sequentially, so every access re-opens the container
//! and scans forward to the requested member.

pub mod extract;

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

pub use extract::{extract_member, extract_member_in, ScopedPath};

/// Size of a tar header block.
const TAR_BLOCK: usize = 512;
/// Offset of the `ustar` magic inside a tar header.
const USTAR_MAGIC_OFFSET: usize = 257;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const USTAR_MAGIC: &[u8] = b"ustar";

/// Errors raised while reading archive containers.
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    /// The requested member does not exist in the archive.
    #[error("Member {member} not found in {}", .archive.display())]
    NotFound {
        /// Archive that was searched
        archive: PathBuf,
        /// Member name that was requested
        member: String,
    },

    /// The file is not an archive format we can read.
    #[error("Unsupported archive format: {0}")]
    Unsupported(PathBuf),

    /// Reading or writing failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Recognized container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed POSIX tar
    Tar,
    /// gzip-compressed tar
    TarGz,
    /// bzip2-compressed tar
    TarBz2,
    /// xz-compressed tar
    TarXz,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
        };
        f.write_str(name)
    }
}

impl ArchiveFormat {
    /// Detect the container format of `path`.
    ///
    /// Compressed streams are only accepted when the decompressed content
    /// starts with a tar header.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Unsupported`] for anything that is not a
    /// (possibly compressed) tar archive, or [`ArchiveError::Io`] if the
    /// file cannot be read.
    pub fn detect(path: &Path) -> Result<Self, ArchiveError> {
        let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let mut head = [0u8; TAR_BLOCK];
        let n = read_up_to(&mut file, &mut head).map_err(|e| ArchiveError::io(path, e))?;
        let head = &head[..n];

        let format = if head.starts_with(GZIP_MAGIC) {
            Self::TarGz
        } else if head.starts_with(BZIP2_MAGIC) {
            Self::TarBz2
        } else if head.starts_with(XZ_MAGIC) {
            Self::TarXz
        } else if has_ustar_magic(head) {
            return Ok(Self::Tar);
        } else {
            return Err(ArchiveError::Unsupported(path.to_path_buf()));
        };

        // Peek inside the compressed stream for a tar header
        let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let mut decoder = format.decoder(BufReader::new(file));
        let mut inner = [0u8; TAR_BLOCK];
        match read_up_to(&mut decoder, &mut inner) {
            Ok(n) if has_ustar_magic(&inner[..n]) => Ok(format),
            Ok(_) => Err(ArchiveError::Unsupported(path.to_path_buf())),
            Err(e) => {
                log::debug!("Failed to decode {} as {}: {}", path.display(), format, e);
                Err(ArchiveError::Unsupported(path.to_path_buf()))
            }
        }
    }

    /// Wrap `reader` in the decompressor for this format.
    fn decoder<R: Read + 'static>(self, reader: R) -> Box<dyn Read> {
        match self {
            Self::Tar => Box::new(reader),
            Self::TarGz => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Self::TarBz2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Self::TarXz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
        }
    }
}

/// Check whether `path` is an archive this module can read.
#[must_use]
pub fn is_archive(path: &Path) -> bool {
    ArchiveFormat::detect(path).is_ok()
}

/// A regular-file member of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Member name as recorded in the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Member modification time (seconds since the Unix epoch)
    pub mtime: i64,
}

fn open(path: &Path) -> Result<tar::Archive<Box<dyn Read>>, ArchiveError> {
    let format = ArchiveFormat::detect(path)?;
    let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
    log::trace!("Opening {} archive {}", format, path.display());
    Ok(tar::Archive::new(format.decoder(BufReader::new(file))))
}

/// List the regular-file members of an archive, in archive order.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or its headers are
/// malformed.
pub fn list_members(path: &Path) -> Result<Vec<ArchiveMember>, ArchiveError> {
    let mut archive = open(path)?;
    let entries = archive.entries().map_err(|e| ArchiveError::io(path, e))?;

    let mut members = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::io(path, e))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .map_err(|e| ArchiveError::io(path, e))?
            .to_string_lossy()
            .into_owned();
        let mtime = entry.header().mtime().unwrap_or(0);
        members.push(ArchiveMember {
            name,
            size: entry.size(),
            mtime: i64::try_from(mtime).unwrap_or(i64::MAX),
        });
    }

    log::debug!("{}: {} members", path.display(), members.len());
    Ok(members)
}

/// Run `f` over the bytes of `member` inside `archive_path`.
///
/// The member is streamed straight out of the (decompressed) archive.
///
/// # Errors
///
/// Returns [`ArchiveError::NotFound`] if the member does not exist, any
/// error from opening the archive, or whatever `f` returns.
pub fn with_member<T, E, F>(archive_path: &Path, member: &str, f: F) -> Result<T, E>
where
    F: FnOnce(&mut dyn Read) -> Result<T, E>,
    E: From<ArchiveError>,
{
    let mut archive = open(archive_path)?;
    let entries = archive
        .entries()
        .map_err(|e| ArchiveError::io(archive_path, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| ArchiveError::io(archive_path, e))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .map_err(|e| ArchiveError::io(archive_path, e))?
            .to_string_lossy()
            == member;
        if matches {
            return f(&mut entry);
        }
    }

    Err(ArchiveError::NotFound {
        archive: archive_path.to_path_buf(),
        member: member.to_string(),
    }
    .into())
}

fn has_ustar_magic(block: &[u8]) -> bool {
    block.len() >= USTAR_MAGIC_OFFSET + USTAR_MAGIC.len()
        && &block[USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + USTAR_MAGIC.len()] == USTAR_MAGIC
}

fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
