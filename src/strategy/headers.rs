//! Header-only libraries: copy headers into the install root, compile nothing.

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{fs_err, Error, Result};

use super::BuildContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOnlyCopy {
    /// Directory under the source root to mirror, e.g. `boost`.
    pub subdir: String,
    /// Only files whose names end with this are copied, e.g. `.hpp`.
    pub suffix: String,
}

impl HeaderOnlyCopy {
    pub fn new(subdir: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            subdir: subdir.into(),
            suffix: suffix.into(),
        }
    }

    pub(super) fn validate(&self) -> Result<()> {
        let subdir = Path::new(&self.subdir);
        if self.subdir.is_empty() || subdir.is_absolute() || self.subdir.contains("..") {
            return Err(Error::config(format!(
                "header directory '{}' must be a relative path inside the sources",
                self.subdir
            )));
        }
        if self.suffix.is_empty() {
            return Err(Error::config("header suffix must not be empty"));
        }
        Ok(())
    }

    pub(super) fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let copied = self.copy_headers(ctx.source_dir, &ctx.layout.include_dir())?;
        debug!("installed {copied} headers from {}", self.subdir);
        Ok(())
    }

    /// Mirror `<src>/<subdir>/**/*<suffix>` to `<include_dir>/<subdir>/...`.
    /// Returns the number of files copied.
    fn copy_headers(&self, src: &Path, include_dir: &Path) -> Result<usize> {
        let root = src.join(&self.subdir);
        let mut copied = 0;

        for entry in WalkDir::new(&root) {
            let entry = entry.map_err(|e| fs_err("walking header tree", &root)(e.into()))?;
            let path = entry.path();
            let rel = path.strip_prefix(src).map_err(|_| {
                Error::config(format!("'{}' escaped the source tree", path.display()))
            })?;
            let dest = include_dir.join(rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(fs_err("creating directory", &dest))?;
                continue;
            }

            let is_header = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(&self.suffix));
            if !is_header {
                continue;
            }

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(fs_err("creating directory", parent))?;
            }
            fs::copy(path, &dest).map_err(fs_err("copying header to", &dest))?;
            copied += 1;
        }

        Ok(copied)
    }
}
