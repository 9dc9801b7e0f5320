//! Error taxonomy for the priming engine.
//!
//! Every failure is fatal to the run. The variants exist so the final
//! diagnostic can say *what* broke (bad static configuration, corrupt
//! download, a build tool exiting non-zero, the filesystem) and *where*.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed static configuration, caught before any network access.
    Configuration,
    /// Downloaded bytes do not match the pinned checksum.
    Integrity,
    /// A build-system subprocess could not be launched or exited non-zero.
    ExternalTool,
    /// Creating, removing or renaming something on disk failed.
    Filesystem,
    /// The archive could not be retrieved.
    Transport,
    /// The archive could not be unpacked.
    Extraction,
    /// Another process is priming the same tree.
    Locked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Integrity => write!(f, "integrity"),
            ErrorKind::ExternalTool => write!(f, "external-tool"),
            ErrorKind::Filesystem => write!(f, "filesystem"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Extraction => write!(f, "extraction"),
            ErrorKind::Locked => write!(f, "locked"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid library configuration: {0}")]
    Configuration(String),

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("{step} failed: `{program}` exited with {status}")]
    ExternalTool {
        step: String,
        program: String,
        status: String,
    },

    #[error("{step} failed: could not launch `{program}`: {source}")]
    Spawn {
        step: String,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{action} '{}': {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("missing required host tools:\n{0}")]
    MissingTools(String),

    #[error("download of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("extracting '{}' failed: {reason}", path.display())]
    Extract { path: PathBuf, reason: String },

    #[error("'{}' is locked by another run", path.display())]
    Locked { path: PathBuf },

    #[error("{library}: {source}")]
    Library {
        library: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Category of this error, looking through [`Error::Library`] wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Integrity { .. } => ErrorKind::Integrity,
            Error::ExternalTool { .. } | Error::Spawn { .. } | Error::MissingTools(_) => {
                ErrorKind::ExternalTool
            }
            Error::Filesystem { .. } => ErrorKind::Filesystem,
            Error::Fetch { .. } => ErrorKind::Transport,
            Error::Extract { .. } => ErrorKind::Extraction,
            Error::Locked { .. } => ErrorKind::Locked,
            Error::Library { source, .. } => source.kind(),
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub(crate) fn in_library(self, library: impl Into<String>) -> Self {
        Error::Library {
            library: library.into(),
            source: Box::new(self),
        }
    }
}

/// Build a `map_err` adapter that turns an `io::Error` into
/// [`Error::Filesystem`] tagged with `action` and `path`.
pub(crate) fn fs_err<'a>(
    action: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> Error + 'a {
    move |source| Error::Filesystem {
        action,
        path: path.to_path_buf(),
        source,
    }
}
