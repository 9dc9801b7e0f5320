//! Shared helpers: synthetic source archives and an in-process fetcher.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use cross_deps::{
    ArchiveCache, ArchiveExtractor, ChecksumKind, Error, Fetcher, FilesystemLayout, Orchestrator,
    Result, TargetTriple, ToolchainConfig,
};

/// Serves archives from memory and records every URL it was asked for.
#[derive(Clone, Default)]
pub struct CountingFetcher {
    archives: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    pub log: Rc<RefCell<Vec<String>>>,
}

impl CountingFetcher {
    pub fn serve(&self, url: &str, bytes: Vec<u8>) {
        self.archives.borrow_mut().insert(url.to_string(), bytes);
    }

    pub fn fetches(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn fetched(&self, url: &str) -> bool {
        self.log.borrow().iter().any(|u| u == url)
    }
}

impl Fetcher for CountingFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        self.log.borrow_mut().push(url.to_string());
        let archives = self.archives.borrow();
        let bytes = archives.get(url).ok_or_else(|| Error::Fetch {
            url: url.to_string(),
            reason: "404 Not Found".to_string(),
        })?;
        fs::write(dest, bytes).map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Uncompressed tarball of (path, mode, content) entries.
pub fn tar_bytes(files: &[(&str, u32, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, mode, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn xz(data: &[u8]) -> Vec<u8> {
    let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn bz2(data: &[u8]) -> Vec<u8> {
    let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn md5(data: &[u8]) -> String {
    ChecksumKind::Md5.digest_reader(data).unwrap()
}

/// Orchestrator for a 32-bit target rooted at `work_dir`, fetching through
/// `fetcher`.
pub fn orchestrator(work_dir: &Path, fetcher: &CountingFetcher) -> Orchestrator {
    let layout = FilesystemLayout::new(work_dir, TargetTriple::MINGW32);
    let toolchain = ToolchainConfig::new(Path::new("/usr"), TargetTriple::mingw(false), &layout);
    let cache = ArchiveCache::new(layout.cache_root.clone(), Box::new(fetcher.clone()));
    Orchestrator::new(layout, toolchain, cache, Box::new(ArchiveExtractor)).with_jobs(2)
}

pub fn have_make() -> bool {
    which::which("make").is_ok()
}
