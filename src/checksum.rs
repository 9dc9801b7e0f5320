//! Archive checksums.
//!
//! The digest algorithm is fixed for the whole process ([`ChecksumKind::PINNED`]);
//! files are hashed in fixed-size chunks so memory use does not depend on
//! archive size.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::error::{fs_err, Error, Result};

/// Read size used while hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Supported content-hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Md5,
    Sha256,
}

impl ChecksumKind {
    /// Algorithm the pinned registry checksums are expressed in.
    pub const PINNED: ChecksumKind = ChecksumKind::Md5;

    /// Length of the lowercase hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            ChecksumKind::Md5 => 32,
            ChecksumKind::Sha256 => 64,
        }
    }

    /// Check that `expected` is a well-formed digest for this algorithm and
    /// return it lowercased.
    pub fn normalize(self, expected: &str) -> Result<String> {
        let trimmed = expected.trim();
        if trimmed.len() != self.hex_len() || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::config(format!(
                "'{expected}' is not a {self} checksum ({} hex digits)",
                self.hex_len()
            )));
        }
        Ok(trimmed.to_ascii_lowercase())
    }

    /// Hex digest of everything `reader` yields.
    pub fn digest_reader(self, reader: impl Read) -> std::io::Result<String> {
        match self {
            ChecksumKind::Md5 => stream_digest::<Md5>(reader),
            ChecksumKind::Sha256 => stream_digest::<Sha256>(reader),
        }
    }

    /// Hex digest of the file at `path`.
    pub fn digest_file(self, path: &Path) -> Result<String> {
        let f = File::open(path).map_err(fs_err("opening", path))?;
        self.digest_reader(BufReader::new(f))
            .map_err(fs_err("reading", path))
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumKind::Md5 => write!(f, "md5"),
            ChecksumKind::Sha256 => write!(f, "sha256"),
        }
    }
}

fn stream_digest<D: Digest>(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
