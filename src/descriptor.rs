//! Static description of one third-party library.
//!
//! Descriptors are built once from the registry and never mutated. All
//! parsing happens at construction, so a malformed URL or version is a
//! configuration error raised before anything touches the network.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::cache::url_file_name;
use crate::error::{Error, Result};
use crate::strategy::BuildStrategy;

static NAME_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-\w]+)-(\d[\d.]*[a-z]?)$").expect("name-version pattern is valid")
});

static UNDERSCORE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(_\d+)*$").expect("underscore version pattern is valid"));

/// Archive container formats recognized by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    TarBz2,
    TarXz,
    TarLzma,
    Zip,
}

impl ArchiveFormat {
    // Longest suffixes first so `.tar.gz` wins over `.tar`.
    const SUFFIXES: &'static [(&'static str, ArchiveFormat)] = &[
        (".tar.lzma", ArchiveFormat::TarLzma),
        (".tar.bz2", ArchiveFormat::TarBz2),
        (".tar.gz", ArchiveFormat::TarGz),
        (".tar.xz", ArchiveFormat::TarXz),
        (".tar", ArchiveFormat::Tar),
        (".zip", ArchiveFormat::Zip),
    ];

    /// Split `libogg-1.3.2.tar.xz` into `("libogg-1.3.2", TarXz)`.
    pub fn split(file_name: &str) -> Option<(&str, ArchiveFormat)> {
        Self::SUFFIXES.iter().find_map(|(suffix, format)| {
            file_name
                .strip_suffix(suffix)
                .filter(|base| !base.is_empty())
                .map(|base| (base, *format))
        })
    }
}

/// Archive base name: the file name minus a recognized archive suffix.
pub fn archive_base_name(file_name: &str) -> Option<&str> {
    ArchiveFormat::split(file_name).map(|(base, _)| base)
}

/// Split `{name}-{version}`; the version starts with a digit, continues with
/// digits and dots, and may end in one lowercase letter.
pub fn split_name_version(base: &str) -> Option<(&str, &str)> {
    let caps = NAME_VERSION.captures(base)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// `boost_1_55_0` with prefix `boost` gives `1.55.0`.
pub fn underscore_version(base: &str, prefix: &str) -> Option<String> {
    let rest = base.strip_prefix(prefix)?.strip_prefix('_')?;
    if !UNDERSCORE_VERSION.is_match(rest) {
        return None;
    }
    Some(rest.replace('_', "."))
}

/// Everything needed to construct a [`LibraryDescriptor`]. `name`, `version`
/// and `base` are derived from the URL when left out.
#[derive(Debug, Clone)]
pub struct LibrarySpec {
    pub url: String,
    pub checksum: String,
    pub sentinel: PathBuf,
    pub strategy: BuildStrategy,
    pub name: Option<String>,
    pub version: Option<String>,
    pub base: Option<String>,
}

impl LibrarySpec {
    pub fn new(
        url: impl Into<String>,
        checksum: impl Into<String>,
        sentinel: impl Into<PathBuf>,
        strategy: BuildStrategy,
    ) -> Self {
        Self {
            url: url.into(),
            checksum: checksum.into(),
            sentinel: sentinel.into(),
            strategy,
            name: None,
            version: None,
            base: None,
        }
    }

    /// Explicit name and version, for archives whose base does not have
    /// the `{name}-{version}` form.
    pub fn named(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.version = Some(version.into());
        self
    }

    /// Top-level directory the archive extracts to, when it differs from the
    /// file name. Name and version are parsed from it unless given.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct LibraryDescriptor {
    name: String,
    version: String,
    url: String,
    checksum: String,
    sentinel: PathBuf,
    base: String,
    format: ArchiveFormat,
    strategy: BuildStrategy,
}

impl LibraryDescriptor {
    /// Descriptor whose name and version come from the archive file name.
    pub fn new(
        url: impl Into<String>,
        checksum: impl Into<String>,
        sentinel: impl Into<PathBuf>,
        strategy: BuildStrategy,
    ) -> Result<Self> {
        Self::from_spec(LibrarySpec::new(url, checksum, sentinel, strategy))
    }

    pub fn from_spec(spec: LibrarySpec) -> Result<Self> {
        let file_name = url_file_name(&spec.url)?;
        let (derived_base, format) = ArchiveFormat::split(file_name).ok_or_else(|| {
            Error::config(format!(
                "'{file_name}' from {} has no recognized archive suffix",
                spec.url
            ))
        })?;
        let base = spec.base.unwrap_or_else(|| derived_base.to_string());

        let (name, version) = match (spec.name, spec.version) {
            (Some(name), Some(version)) => (name, version),
            (name, version) => {
                let (parsed_name, parsed_version) = split_name_version(&base).ok_or_else(|| {
                    Error::config(format!(
                        "archive base '{base}' does not have the form {{name}}-{{version}}"
                    ))
                })?;
                (
                    name.unwrap_or_else(|| parsed_name.to_string()),
                    version.unwrap_or_else(|| parsed_version.to_string()),
                )
            }
        };

        let checksum = spec.checksum.trim().to_ascii_lowercase();
        if checksum.is_empty() || !checksum.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::config(format!(
                "{name}: checksum '{}' is not hexadecimal",
                spec.checksum
            )));
        }

        validate_sentinel(&name, &spec.sentinel)?;
        spec.strategy.validate().map_err(|e| e.in_library(&name))?;

        Ok(Self {
            name,
            version,
            url: spec.url,
            checksum,
            sentinel: spec.sentinel,
            base,
            format,
            strategy: spec.strategy,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Lowercase hex digest of the archive.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Path relative to the install root that exists once installed.
    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    /// Top-level directory the archive extracts to.
    pub fn archive_base(&self) -> &str {
        &self.base
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn strategy(&self) -> &BuildStrategy {
        &self.strategy
    }

    pub fn display_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

impl fmt::Display for LibraryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

fn validate_sentinel(name: &str, sentinel: &Path) -> Result<()> {
    if sentinel.as_os_str().is_empty() {
        return Err(Error::config(format!("{name}: install sentinel is empty")));
    }
    let escapes = sentinel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::config(format!(
            "{name}: install sentinel '{}' must be relative to the install root",
            sentinel.display()
        )));
    }
    Ok(())
}
