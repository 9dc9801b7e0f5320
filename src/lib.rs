//! Priming of third-party libraries for a cross-compiled project.
//!
//! Before a MinGW build of the primary project can be configured, a fixed,
//! ordered list of static libraries must be present under a per-target
//! install root. This crate fetches each library's source archive into a
//! checksum-verified cache, unpacks it, and builds and installs it with one
//! of four build strategies. Libraries whose install sentinel is newer than
//! their archive are skipped, so a rerun only rebuilds what changed.
//!
//! # Architecture
//!
//! ```text
//! cross-deps (bin)
//!     │
//!     ├── config::Settings        triple, paths, forwarded configure args
//!     ├── preflight               host tools + cross compiler present
//!     ├── registry                ordered LibraryDescriptor list
//!     ├── orchestrator::Orchestrator::run
//!     │       ├── cache::ArchiveCache     fetch + verify (Fetcher seam)
//!     │       ├── unpack                  fresh extraction (Extractor seam)
//!     │       └── strategy::BuildStrategy autotools / makefile / headers / cross
//!     └── primary::configure_and_build
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cross_deps::{ArchiveCache, ArchiveExtractor, CurlFetcher, Orchestrator, Settings};
//!
//! let settings = Settings::from_env(&[])?;
//! let layout = settings.layout();
//! let toolchain = settings.toolchain(&layout);
//! let cache = ArchiveCache::new(layout.cache_root.clone(), Box::new(CurlFetcher::from_path()?));
//! let orchestrator = Orchestrator::new(layout, toolchain, cache, Box::new(ArchiveExtractor));
//! let report = orchestrator.run(&cross_deps::registry::thirdparty_libraries()?)?;
//! ```

pub mod cache;
pub mod checksum;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod preflight;
pub mod primary;
pub mod process;
pub mod registry;
pub mod strategy;
pub mod toolchain;
pub mod unpack;

pub use cache::{ArchiveCache, CurlFetcher, Fetcher};
pub use checksum::ChecksumKind;
pub use config::Settings;
pub use descriptor::{ArchiveFormat, LibraryDescriptor, LibrarySpec};
pub use error::{Error, ErrorKind, Result};
pub use layout::FilesystemLayout;
pub use orchestrator::{Orchestrator, RunReport};
pub use strategy::{
    Autotools, BuildContext, BuildStrategy, CrossCompileConfigure, HeaderOnlyCopy, RawMakefile,
};
pub use toolchain::{TargetTriple, ToolchainConfig};
pub use unpack::{ArchiveExtractor, Extractor};
