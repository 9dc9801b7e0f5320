//! Checksum-verified archive cache.
//!
//! [`ArchiveCache::obtain`] maps `(url, checksum)` to a local file under the
//! cache root. A file that is already present and matches is returned without
//! touching the network; anything else is fetched to `<name>.tmp`, verified,
//! and renamed into place. Corrupt downloads are deleted, never kept.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::checksum::ChecksumKind;
use crate::error::{fs_err, Error, Result};
use crate::process::Cmd;

/// The opaque "retrieve bytes from URL" capability.
pub trait Fetcher {
    /// Write the resource at `url` to `dest`, replacing anything there.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Fetches with the host's `curl`, which handles the http, https and ftp
/// URLs found in the registry.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    program: PathBuf,
}

impl CurlFetcher {
    /// Locate `curl` on `PATH`.
    pub fn from_path() -> Result<Self> {
        let program = which::which("curl").map_err(|e| Error::Spawn {
            step: "download".into(),
            program: "curl".into(),
            source: io::Error::new(io::ErrorKind::NotFound, e.to_string()),
        })?;
        Ok(Self { program })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        Cmd::new(&self.program)
            .args(["--fail", "--location", "--silent", "--show-error", "-o"])
            .arg(dest)
            .arg(url)
            .error_msg(format!("download {url}"))
            .run()
            .map_err(|e| Error::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Files modified more recently than this are re-hashed on every lookup;
/// within one timestamp tick a same-length rewrite is otherwise invisible.
const RACY_WINDOW: Duration = Duration::from_secs(2);

/// Metadata of a file at the moment it was last verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    len: u64,
    ino: u64,
    modified: Option<SystemTime>,
    ctime: (i64, i64),
}

impl Stamp {
    fn of(meta: &fs::Metadata) -> Self {
        Self {
            len: meta.len(),
            ino: meta.ino(),
            modified: meta.modified().ok(),
            ctime: (meta.ctime(), meta.ctime_nsec()),
        }
    }

    /// Whether the file is old enough that a later change must show up in
    /// the stamp.
    fn is_settled(&self, now: SystemTime) -> bool {
        self.modified
            .and_then(|m| now.duration_since(m).ok())
            .is_some_and(|age| age >= RACY_WINDOW)
    }
}

pub struct ArchiveCache {
    root: PathBuf,
    algorithm: ChecksumKind,
    fetcher: Box<dyn Fetcher>,
    verified: RefCell<HashMap<PathBuf, Stamp>>,
}

impl ArchiveCache {
    /// Cache rooted at `root` verifying with [`ChecksumKind::PINNED`].
    ///
    /// Nothing is created on disk until the first download.
    pub fn new(root: impl Into<PathBuf>, fetcher: Box<dyn Fetcher>) -> Self {
        Self::with_algorithm(root, ChecksumKind::PINNED, fetcher)
    }

    /// Cache using `algorithm` for every expected checksum. Descriptors must
    /// carry digests of that algorithm's length.
    pub fn with_algorithm(
        root: impl Into<PathBuf>,
        algorithm: ChecksumKind,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        Self {
            root: root.into(),
            algorithm,
            fetcher,
            verified: RefCell::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn algorithm(&self) -> ChecksumKind {
        self.algorithm
    }

    /// Where the archive for `url` lives once cached.
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        Ok(self.root.join(url_file_name(url)?))
    }

    /// Return a verified local copy of `url`, downloading only if needed.
    pub fn obtain(&self, url: &str, expected: &str) -> Result<PathBuf> {
        let expected = self.algorithm.normalize(expected)?;
        let path = self.path_for(url)?;

        if self.is_valid(&path, &expected)? {
            return Ok(path);
        }

        fs::create_dir_all(&self.root).map_err(fs_err("creating cache directory", &self.root))?;

        let tmp = tmp_path(&path);
        info!("download {url}");
        if let Err(e) = self.fetcher.fetch(url, &tmp) {
            remove_file_if_exists(&tmp)?;
            return Err(e);
        }

        let actual = self.algorithm.digest_file(&tmp)?;
        if actual != expected {
            remove_file_if_exists(&tmp)?;
            return Err(Error::Integrity {
                url: url.to_string(),
                expected,
                actual,
            });
        }

        fs::rename(&tmp, &path).map_err(fs_err("moving download into cache", &path))?;
        self.remember(&path);
        Ok(path)
    }

    /// Whether the file at `path` exists and matches `expected`. A mismatching
    /// file is deleted.
    fn is_valid(&self, path: &Path, expected: &str) -> Result<bool> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(fs_err("inspecting cached archive", path)(e)),
        };

        if self.verified.borrow().get(path) == Some(&Stamp::of(&meta)) {
            return Ok(true);
        }

        let actual = self.algorithm.digest_file(path)?;
        if actual == expected {
            self.remember(path);
            return Ok(true);
        }

        warn!(
            "cached archive '{}' has checksum {actual}, expected {expected}; refetching",
            path.display()
        );
        self.verified.borrow_mut().remove(path);
        remove_file_if_exists(path)?;
        Ok(false)
    }

    fn remember(&self, path: &Path) {
        let Ok(meta) = fs::metadata(path) else {
            return;
        };
        let stamp = Stamp::of(&meta);
        if stamp.is_settled(SystemTime::now()) {
            self.verified.borrow_mut().insert(path.to_path_buf(), stamp);
        }
    }
}

/// Final path segment of `url`, ignoring any query or fragment.
pub fn url_file_name(url: &str) -> Result<&str> {
    let without_suffix = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    let name = without_suffix.rsplit('/').next().unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." || !without_suffix.contains("://") {
        return Err(Error::config(format!(
            "URL '{url}' does not end in a file name"
        )));
    }
    Ok(name)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_err("removing", path)(e)),
    }
}
