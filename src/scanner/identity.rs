//! Stable identity keys for the fingerprint cache.
//!
//! An identity key recognizes the same underlying content across runs
//! without reading it:
//!
//! * regular files: `(device, inode, size, mtime)`
//! * archive members: `(canonical archive path, member name, archive mtime,
//!   member size)`
//!
//! `ctime` never participates, so permission or ownership changes do not
//! invalidate cached fingerprints. On platforms without inode numbers the
//! canonical path stands in for `(device, inode)`.

use std::fmt;
use std::fs::{self, Metadata};
use std::path::Path;
use std::time::UNIX_EPOCH;

use super::{FileEntry, HashError};

const TAG_REGULAR: u8 = b'F';
const TAG_ARCHIVED: u8 = b'A';

/// Opaque identity bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(Vec<u8>);

impl IdentityKey {
    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for IdentityKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({})", super::hash_to_hex(&self.0))
    }
}

/// Derive the identity key of `entry` from current filesystem state.
///
/// # Errors
///
/// Returns an error if the file (or its archive) cannot be stat'ed.
pub fn identity_key(entry: &FileEntry) -> Result<IdentityKey, HashError> {
    let metadata = fs::metadata(&entry.path).map_err(|e| HashError::io(&entry.path, e))?;
    let mtime = mtime_secs(&metadata);

    let mut key = Vec::with_capacity(64);
    match &entry.subpath {
        None => {
            key.push(TAG_REGULAR);
            push_file_id(&mut key, &entry.path, &metadata)?;
            key.extend_from_slice(&metadata.len().to_le_bytes());
            key.extend_from_slice(&mtime.to_le_bytes());
        }
        Some(member) => {
            let archive =
                fs::canonicalize(&entry.path).map_err(|e| HashError::io(&entry.path, e))?;
            key.push(TAG_ARCHIVED);
            push_str(&mut key, &archive.to_string_lossy());
            push_str(&mut key, member);
            key.extend_from_slice(&mtime.to_le_bytes());
            key.extend_from_slice(&entry.size.to_le_bytes());
        }
    }
    Ok(IdentityKey(key))
}

/// Modification time of `metadata` in whole seconds since the Unix epoch.
///
/// Times before the epoch are negative; unavailable times map to 0.
#[must_use]
pub fn mtime_secs(metadata: &Metadata) -> i64 {
    match metadata.modified() {
        Ok(time) => match time.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
            Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
        },
        Err(_) => 0,
    }
}

/// Length-prefixed string so adjacent fields cannot run together.
fn push_str(key: &mut Vec<u8>, s: &str) {
    key.extend_from_slice(&(s.len() as u64).to_le_bytes());
    key.extend_from_slice(s.as_bytes());
}

#[cfg(unix)]
fn push_file_id(key: &mut Vec<u8>, _path: &Path, metadata: &Metadata) -> Result<(), HashError> {
    use std::os::unix::fs::MetadataExt;

    key.extend_from_slice(&metadata.dev().to_le_bytes());
    key.extend_from_slice(&metadata.ino().to_le_bytes());
    Ok(())
}

#[cfg(not(unix))]
fn push_file_id(key: &mut Vec<u8>, path: &Path, _metadata: &Metadata) -> Result<(), HashError> {
    let canonical = fs::canonicalize(path).map_err(|e| HashError::io(path, e))?;
    push_str(key, &canonical.to_string_lossy());
    Ok(())
}
