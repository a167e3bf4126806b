//! xxHash3-128 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing 128-bit content
//! fingerprints with bounded memory: content is fed through a fixed-size
//! buffer regardless of file size. Archive members are streamed directly out
//! of their container, so hashing never needs a temporary file.
//!
//! The digest is not cryptographic. It is only used for equality and
//! ordering of `(high, low)` pairs.
//!
//! # Example
//!
//! ```no_run
//! use ftwin::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let fingerprint = hasher.hash_file(Path::new("some/file.bin")).unwrap();
//! println!("{}", fingerprint.to_hex());
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use super::{FileEntry, HashError};
use crate::archive;

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// A 128-bit content fingerprint.
///
/// Ordering is lexicographic on `(high, low)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Fingerprint {
    /// Upper 64 bits of the digest
    pub high: u64,
    /// Lower 64 bits of the digest
    pub low: u64,
}

impl Fingerprint {
    /// Create a fingerprint from its two halves.
    #[must_use]
    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// Split a 128-bit digest into a fingerprint.
    #[must_use]
    pub const fn from_u128(digest: u128) -> Self {
        Self {
            high: (digest >> 64) as u64,
            low: digest as u64,
        }
    }

    /// Big-endian byte representation (`high` first).
    #[must_use]
    pub fn to_bytes(self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.high.to_be_bytes());
        bytes[8..].copy_from_slice(&self.low.to_be_bytes());
        bytes
    }

    /// Build a fingerprint from its big-endian byte representation.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&bytes[..8]);
        low.copy_from_slice(&bytes[8..]);
        Self {
            high: u64::from_be_bytes(high),
            low: u64::from_be_bytes(low),
        }
    }

    /// 32 lowercase hex characters, `high` then `low`, big-endian.
    #[must_use]
    pub fn to_hex(self) -> String {
        hash_to_hex(&self.to_bytes())
    }

    /// Fingerprint of empty content.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_u128(Xxh3::new().digest128())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}

/// Convert raw digest bytes to a lowercase hexadecimal string.
///
/// # Example
///
/// ```
/// use ftwin::scanner::hash_to_hex;
///
/// let bytes = [0xDE, 0xAD, 0xBE, 0xEF];
/// assert_eq!(hash_to_hex(&bytes), "deadbeef");
/// ```
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Override the read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Abort hashing at the next buffer boundary once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash everything readable from `reader`.
    ///
    /// `label` is only used to annotate errors.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Cancelled`] when the shutdown flag is observed,
    /// or [`HashError::Io`] on read failure.
    pub fn hash_reader<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        label: &Path,
    ) -> Result<Fingerprint, HashError> {
        let mut state = Xxh3::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Cancelled);
            }
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::io(label, e)),
            };
            state.update(&buffer[..n]);
        }

        Ok(Fingerprint::from_u128(state.digest128()))
    }

    /// Hash a regular file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn hash_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::io(path, e))?;
        self.hash_reader(&mut file, path)
    }

    /// Hash the comparable content of a file entry.
    ///
    /// Archive members are streamed out of their archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read, or the archive
    /// member cannot be located.
    pub fn hash_entry(&self, entry: &FileEntry) -> Result<Fingerprint, HashError> {
        match entry.subpath.as_deref() {
            None => self.hash_file(&entry.path),
            Some(member) => archive::with_member(&entry.path, member, |reader| {
                self.hash_reader(reader, &entry.path)
            }),
        }
    }
}

/// Compare two files byte by byte.
///
/// # Errors
///
/// Returns an error if either file cannot be read.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool, HashError> {
    let mut fa = File::open(a).map_err(|e| HashError::io(a, e))?;
    let mut fb = File::open(b).map_err(|e| HashError::io(b, e))?;

    let ma = fa.metadata().map_err(|e| HashError::io(a, e))?;
    let mb = fb.metadata().map_err(|e| HashError::io(b, e))?;
    if ma.len() != mb.len() {
        return Ok(false);
    }

    let mut buf_a = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut buf_b = vec![0u8; DEFAULT_BUFFER_SIZE];
    loop {
        let n = read_full(&mut fa, &mut buf_a).map_err(|e| HashError::io(a, e))?;
        let m = read_full(&mut fb, &mut buf_b).map_err(|e| HashError::io(b, e))?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as possible, returning fewer bytes only at EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
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
