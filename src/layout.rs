//! Directory convention for one target architecture.
//!
//! ```text
//! lib/                              cache root (downloaded archives)
//! lib/src/<archive-base>/           extracted sources
//! lib/<arch>/build/<archive-base>/  per-library build directory
//! lib/<arch>/root/                  shared install prefix
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{fs_err, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemLayout {
    /// Downloaded archives, shared by every target.
    pub cache_root: PathBuf,
    /// Extracted sources, recreated per unpack.
    pub src_root: PathBuf,
    /// Per-library build directories for this target.
    pub build_root: PathBuf,
    /// Install prefix every library of this target accumulates into.
    pub install_root: PathBuf,
}

impl FilesystemLayout {
    /// Layout under `<work_dir>/lib` for target `arch` (a host triple).
    pub fn new(work_dir: &Path, arch: &str) -> Self {
        let cache_root = work_dir.join("lib");
        let arch_root = cache_root.join(arch);
        Self {
            src_root: cache_root.join("src"),
            build_root: arch_root.join("build"),
            install_root: arch_root.join("root"),
            cache_root,
        }
    }

    pub fn source_dir(&self, base: &str) -> PathBuf {
        self.src_root.join(base)
    }

    pub fn build_dir(&self, base: &str) -> PathBuf {
        self.build_root.join(base)
    }

    pub fn include_dir(&self) -> PathBuf {
        self.install_root.join("include")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.install_root.join("lib")
    }

    /// Where installed `.pc` files land; package discovery is pointed here.
    pub fn pkg_config_dir(&self) -> PathBuf {
        self.install_root.join("lib/pkgconfig")
    }

    /// Recreate the build directory for `base` empty and return it.
    pub fn fresh_build_dir(&self, base: &str) -> Result<PathBuf> {
        let path = self.build_dir(base);
        reset_dir(&path)?;
        Ok(path)
    }
}

/// Outcome of a best-effort removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyAbsent,
}

/// Remove a directory tree; a missing directory is not an error.
pub fn remove_dir_if_exists(path: &Path) -> Result<Removal> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(Removal::Removed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Removal::AlreadyAbsent),
        Err(e) => Err(fs_err("removing directory", path)(e)),
    }
}

/// Idempotent directory reset: whatever was at `path` is gone and an empty
/// directory exists there afterwards.
pub fn reset_dir(path: &Path) -> Result<Removal> {
    let removal = remove_dir_if_exists(path)?;
    fs::create_dir_all(path).map_err(fs_err("creating directory", path))?;
    Ok(removal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_paths() {
        let layout = FilesystemLayout::new(Path::new("/work"), "x86_64-w64-mingw32");
        assert_eq!(layout.cache_root, PathBuf::from("/work/lib"));
        assert_eq!(layout.src_root, PathBuf::from("/work/lib/src"));
        assert_eq!(
            layout.build_dir("zlib-1.2.8"),
            PathBuf::from("/work/lib/x86_64-w64-mingw32/build/zlib-1.2.8")
        );
        assert_eq!(
            layout.install_root,
            PathBuf::from("/work/lib/x86_64-w64-mingw32/root")
        );
        assert_eq!(
            layout.pkg_config_dir(),
            PathBuf::from("/work/lib/x86_64-w64-mingw32/root/lib/pkgconfig")
        );
    }

    #[test]
    fn source_root_is_shared_between_architectures() {
        let a = FilesystemLayout::new(Path::new("/w"), "i686-w64-mingw32");
        let b = FilesystemLayout::new(Path::new("/w"), "x86_64-w64-mingw32");
        assert_eq!(a.src_root, b.src_root);
        assert_ne!(a.install_root, b.install_root);
    }

    #[test]
    fn remove_missing_dir_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let outcome = remove_dir_if_exists(&temp.path().join("nope")).unwrap();
        assert_eq!(outcome, Removal::AlreadyAbsent);
    }

    #[test]
    fn reset_dir_discards_previous_contents() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("build/foo");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/stale.o"), b"old").unwrap();

        assert_eq!(reset_dir(&dir).unwrap(), Removal::Removed);
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        fs::remove_dir(&dir).unwrap();
        assert_eq!(reset_dir(&dir).unwrap(), Removal::AlreadyAbsent);
        assert!(dir.is_dir());
    }

    #[test]
    fn fresh_build_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let layout = FilesystemLayout::new(temp.path(), "i686-w64-mingw32");
        let first = layout.fresh_build_dir("libogg-1.3.2").unwrap();
        fs::write(first.join("config.status"), b"x").unwrap();

        let second = layout.fresh_build_dir("libogg-1.3.2").unwrap();
        assert_eq!(first, second);
        assert!(!second.join("config.status").exists());
    }
}
