//! Sequential priming of the library list.
//!
//! Libraries are processed strictly in list order; the order is the
//! dependency order. For each one: fetch/verify the archive, skip it if its
//! install sentinel is at least as new as the archive, otherwise unpack and
//! run its strategy. The first failure ends the run. Libraries installed
//! before the failure stay installed.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{info, warn};

use crate::cache::ArchiveCache;
use crate::descriptor::LibraryDescriptor;
use crate::error::{fs_err, Error, Result};
use crate::layout::FilesystemLayout;
use crate::strategy::{BuildContext, DEFAULT_JOBS};
use crate::toolchain::ToolchainConfig;
use crate::unpack::{unpack, Extractor};

/// Lock file name under the cache root.
pub const LOCK_FILE: &str = ".cross-deps.lock";

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub built: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct Orchestrator {
    layout: FilesystemLayout,
    toolchain: ToolchainConfig,
    cache: ArchiveCache,
    extractor: Box<dyn Extractor>,
    jobs: usize,
}

impl Orchestrator {
    /// Orchestrator installing into `layout` with `toolchain`, fetching
    /// through `cache` and unpacking with `extractor`.
    ///
    /// Builds use [`DEFAULT_JOBS`] parallel jobs; see [`Orchestrator::with_jobs`].
    pub fn new(
        layout: FilesystemLayout,
        toolchain: ToolchainConfig,
        cache: ArchiveCache,
        extractor: Box<dyn Extractor>,
    ) -> Self {
        Self {
            layout,
            toolchain,
            cache,
            extractor,
            jobs: DEFAULT_JOBS,
        }
    }

    /// Parallel jobs handed to `make`. Zero is treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn layout(&self) -> &FilesystemLayout {
        &self.layout
    }

    pub fn toolchain(&self) -> &ToolchainConfig {
        &self.toolchain
    }

    pub fn cache(&self) -> &ArchiveCache {
        &self.cache
    }

    /// Check every descriptor against the cache's checksum algorithm. Runs
    /// before any network access.
    pub fn validate(&self, descriptors: &[LibraryDescriptor]) -> Result<()> {
        let algorithm = self.cache.algorithm();
        for d in descriptors {
            algorithm
                .normalize(d.checksum())
                .map_err(|e| e.in_library(d.display_name()))?;
        }
        Ok(())
    }

    /// Whether `descriptor` is already installed and newer than its archive.
    /// Fetches the archive if it is not cached yet.
    pub fn is_up_to_date(&self, descriptor: &LibraryDescriptor) -> Result<bool> {
        let archive = self.cache.obtain(descriptor.url(), descriptor.checksum())?;
        let sentinel = self.layout.install_root.join(descriptor.sentinel());
        sentinel_is_fresh(&archive, &sentinel)
    }

    /// Fresh extraction of the verified archive.
    pub fn unpack(&self, descriptor: &LibraryDescriptor) -> Result<PathBuf> {
        let archive = self.cache.obtain(descriptor.url(), descriptor.checksum())?;
        unpack(descriptor, &archive, &self.layout, self.extractor.as_ref())
    }

    /// Unpack and build one library regardless of its install state.
    pub fn build(&self, descriptor: &LibraryDescriptor) -> Result<()> {
        let source_dir = self.unpack(descriptor)?;
        let ctx = BuildContext {
            descriptor,
            toolchain: &self.toolchain,
            layout: &self.layout,
            source_dir: &source_dir,
            jobs: self.jobs,
        };
        descriptor.strategy().build(&ctx)?;

        let sentinel = self.layout.install_root.join(descriptor.sentinel());
        if !sentinel.exists() {
            warn!(
                "{} built but '{}' is missing; it will be rebuilt next run",
                descriptor.display_name(),
                sentinel.display()
            );
        }
        Ok(())
    }

    /// Bring every library in `descriptors` up to date, in order.
    pub fn run(&self, descriptors: &[LibraryDescriptor]) -> Result<RunReport> {
        self.validate(descriptors)?;
        let _lock = RunLock::acquire(&self.layout.cache_root)?;

        let mut report = RunReport::default();
        for descriptor in descriptors {
            let name = descriptor.display_name();
            let fresh = self
                .is_up_to_date(descriptor)
                .map_err(|e| e.in_library(&name))?;
            if fresh {
                info!("[SKIP] {name} is up to date");
                report.skipped.push(name);
                continue;
            }

            self.build(descriptor).map_err(|e| e.in_library(&name))?;
            info!("installed {name}");
            report.built.push(name);
        }
        Ok(report)
    }
}

/// True when `sentinel` exists and is not older than `archive`. A missing
/// file on either side means "not fresh".
pub fn sentinel_is_fresh(archive: &Path, sentinel: &Path) -> Result<bool> {
    let Some(archive_time) = modified(archive)? else {
        return Ok(false);
    };
    let Some(sentinel_time) = modified(sentinel)? else {
        return Ok(false);
    };
    Ok(sentinel_time >= archive_time)
}

fn modified(path: &Path) -> Result<Option<std::time::SystemTime>> {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => Ok(Some(t)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(fs_err("reading modification time of", path)(e)),
    }
}

/// Exclusive advisory lock held for the duration of a run.
struct RunLock {
    file: File,
}

impl RunLock {
    fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(fs_err("creating directory", dir))?;
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(fs_err("opening lock file", &path))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(Error::Locked { path })
            }
            Err(e) => Err(fs_err("locking", &path)(e)),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Fetcher;
    use crate::checksum::ChecksumKind;
    use crate::error::ErrorKind;
    use crate::strategy::Autotools;
    use crate::toolchain::TargetTriple;
    use crate::unpack::ArchiveExtractor;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct NoNetwork;

    impl Fetcher for NoNetwork {
        fn fetch(&self, url: &str, _dest: &Path) -> Result<()> {
            panic!("unexpected fetch of {url}");
        }
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    fn orchestrator(root: &Path) -> Orchestrator {
        let layout = FilesystemLayout::new(root, TargetTriple::MINGW32);
        let toolchain =
            ToolchainConfig::new(Path::new("/usr"), TargetTriple::mingw(false), &layout);
        let cache = ArchiveCache::new(layout.cache_root.clone(), Box::new(NoNetwork));
        Orchestrator::new(layout, toolchain, cache, Box::new(ArchiveExtractor))
    }

    #[test]
    fn freshness_compares_timestamps() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("libogg-1.3.2.tar.xz");
        let sentinel = temp.path().join("libogg.a");
        fs::write(&archive, b"a").unwrap();

        assert!(!sentinel_is_fresh(&archive, &sentinel).unwrap());

        fs::write(&sentinel, b"s").unwrap();
        let now = SystemTime::now();
        set_mtime(&archive, now);
        set_mtime(&sentinel, now);
        assert!(sentinel_is_fresh(&archive, &sentinel).unwrap());

        set_mtime(&sentinel, now - Duration::from_secs(60));
        assert!(!sentinel_is_fresh(&archive, &sentinel).unwrap());

        set_mtime(&archive, now - Duration::from_secs(3600));
        assert!(sentinel_is_fresh(&archive, &sentinel).unwrap());
    }

    #[test]
    fn is_up_to_date_uses_cached_archive_and_install_sentinel() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(temp.path());
        let payload = b"pretend tarball";
        let md5 = ChecksumKind::Md5.digest_reader(&payload[..]).unwrap();
        let d = LibraryDescriptor::new(
            "http://downloads.xiph.org/releases/ogg/libogg-1.3.2.tar.xz",
            &md5,
            "lib/libogg.a",
            Autotools::default().into(),
        )
        .unwrap();

        fs::create_dir_all(&orch.layout().cache_root).unwrap();
        let archive = orch.layout().cache_root.join("libogg-1.3.2.tar.xz");
        fs::write(&archive, payload).unwrap();
        assert!(!orch.is_up_to_date(&d).unwrap());

        let sentinel = orch.layout().lib_dir().join("libogg.a");
        fs::create_dir_all(sentinel.parent().unwrap()).unwrap();
        fs::write(&sentinel, b"").unwrap();
        set_mtime(&archive, SystemTime::now() - Duration::from_secs(10));
        assert!(orch.is_up_to_date(&d).unwrap());
    }

    #[test]
    fn checksum_of_wrong_algorithm_fails_validation_before_any_fetch() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(temp.path());
        let d = LibraryDescriptor::new(
            "http://downloads.xiph.org/releases/ogg/libogg-1.3.2.tar.xz",
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            "lib/libogg.a",
            Autotools::default().into(),
        )
        .unwrap();

        let err = orch.run(&[d]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().starts_with("libogg-1.3.2:"));
    }

    #[test]
    fn empty_list_is_a_successful_run() {
        let temp = TempDir::new().unwrap();
        let report = orchestrator(temp.path()).run(&[]).unwrap();
        assert_eq!(report, RunReport::default());
    }

    #[test]
    fn run_is_refused_while_another_holds_the_lock() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(temp.path());
        let held = RunLock::acquire(&orch.layout().cache_root).unwrap();

        let err = orch.run(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Locked);
        assert!(err.to_string().contains(LOCK_FILE), "{err}");

        drop(held);
        orch.run(&[]).unwrap();
    }
}
