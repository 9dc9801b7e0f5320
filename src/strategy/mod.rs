//! Build strategies.
//!
//! Each third-party library names one [`BuildStrategy`]. Every variant
//! carries only its own parameters and is driven through the same
//! [`BuildStrategy::build`] contract: given freshly unpacked sources, get the
//! library's artifacts into the shared install root or fail. Failures are
//! never cleaned up or retried here; the orchestrator aborts the run.
//!
//! | Variant                  | configure                 | build dir        |
//! |--------------------------|---------------------------|------------------|
//! | [`Autotools`]            | autoconf `configure`      | separate, fresh  |
//! | [`RawMakefile`]          | none                      | source tree      |
//! | [`HeaderOnlyCopy`]       | none (file copy only)     | none             |
//! | [`CrossCompileConfigure`]| non-autoconf `configure`  | separate, fresh  |

mod autotools;
mod cross;
mod headers;
mod makefile;

pub use autotools::Autotools;
pub use cross::CrossCompileConfigure;
pub use headers::HeaderOnlyCopy;
pub use makefile::RawMakefile;

use std::fmt;
use std::path::Path;

use tracing::info;

use crate::descriptor::LibraryDescriptor;
use crate::error::Result;
use crate::layout::FilesystemLayout;
use crate::process::Cmd;
use crate::toolchain::ToolchainConfig;

/// Parallel jobs handed to `make` unless overridden.
pub const DEFAULT_JOBS: usize = 12;

/// Program used as the build driver.
pub const MAKE: &str = "make";

/// Everything a strategy needs for one library.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub descriptor: &'a LibraryDescriptor,
    pub toolchain: &'a ToolchainConfig,
    pub layout: &'a FilesystemLayout,
    /// Freshly extracted top-level source directory.
    pub source_dir: &'a Path,
    pub jobs: usize,
}

impl BuildContext<'_> {
    /// `make --quiet` running in `dir` with the toolchain environment.
    pub(crate) fn make(&self, dir: &Path) -> Cmd {
        Cmd::new(MAKE)
            .arg("--quiet")
            .current_dir(dir)
            .envs(self.toolchain.env())
    }

    pub(crate) fn jobs_arg(&self) -> String {
        format!("-j{}", self.jobs.max(1))
    }

    /// The compile and install steps shared by both configure-based variants.
    pub(crate) fn make_and_install(&self, build_dir: &Path) -> Vec<Cmd> {
        vec![
            self.make(build_dir).arg(self.jobs_arg()).error_msg("make"),
            self.make(build_dir).arg("install").error_msg("make install"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStrategy {
    Autotools(Autotools),
    RawMakefile(RawMakefile),
    HeaderOnlyCopy(HeaderOnlyCopy),
    CrossCompileConfigure(CrossCompileConfigure),
}

impl BuildStrategy {
    /// Configure, compile and install the library described by `ctx`.
    pub fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        info!("building {} ({self})", ctx.descriptor.display_name());
        match self {
            BuildStrategy::Autotools(s) => s.build(ctx),
            BuildStrategy::RawMakefile(s) => s.build(ctx),
            BuildStrategy::HeaderOnlyCopy(s) => s.build(ctx),
            BuildStrategy::CrossCompileConfigure(s) => s.build(ctx),
        }
    }

    /// Static sanity checks run when the descriptor is constructed.
    pub fn validate(&self) -> Result<()> {
        match self {
            BuildStrategy::Autotools(_) | BuildStrategy::CrossCompileConfigure(_) => Ok(()),
            BuildStrategy::RawMakefile(s) => s.validate(),
            BuildStrategy::HeaderOnlyCopy(s) => s.validate(),
        }
    }

    /// Whether the autoconf bootstrap tools will be invoked.
    pub fn needs_bootstrap(&self) -> bool {
        matches!(self, BuildStrategy::Autotools(s) if s.autogen)
    }

    /// Whether any subprocess (and therefore `make`) is involved.
    pub fn runs_make(&self) -> bool {
        !matches!(self, BuildStrategy::HeaderOnlyCopy(_))
    }
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStrategy::Autotools(_) => write!(f, "autotools"),
            BuildStrategy::RawMakefile(_) => write!(f, "raw makefile"),
            BuildStrategy::HeaderOnlyCopy(_) => write!(f, "header copy"),
            BuildStrategy::CrossCompileConfigure(_) => write!(f, "cross configure"),
        }
    }
}

impl From<Autotools> for BuildStrategy {
    fn from(s: Autotools) -> Self {
        BuildStrategy::Autotools(s)
    }
}

impl From<RawMakefile> for BuildStrategy {
    fn from(s: RawMakefile) -> Self {
        BuildStrategy::RawMakefile(s)
    }
}

impl From<HeaderOnlyCopy> for BuildStrategy {
    fn from(s: HeaderOnlyCopy) -> Self {
        BuildStrategy::HeaderOnlyCopy(s)
    }
}

impl From<CrossCompileConfigure> for BuildStrategy {
    fn from(s: CrossCompileConfigure) -> Self {
        BuildStrategy::CrossCompileConfigure(s)
    }
}

/// Run `cmds` in order, stopping at the first failure.
pub(crate) fn run_all(cmds: Vec<Cmd>) -> Result<()> {
    for cmd in cmds {
        cmd.run()?;
    }
    Ok(())
}

/// Render a command's arguments as strings, for assertions.
#[cfg(test)]
pub(crate) fn argv(cmd: &Cmd) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::path::{Path, PathBuf};

    use super::BuildStrategy;
    use crate::descriptor::LibraryDescriptor;
    use crate::layout::FilesystemLayout;
    use crate::toolchain::{TargetTriple, ToolchainConfig};

    /// Descriptor, layout and toolchain rooted at `/w`.
    pub(crate) struct Fixture {
        pub descriptor: LibraryDescriptor,
        pub layout: FilesystemLayout,
        pub toolchain: ToolchainConfig,
        pub source_dir: PathBuf,
    }

    impl Fixture {
        pub(crate) fn new(url: &str, strategy: impl Into<BuildStrategy>) -> Self {
            let descriptor = LibraryDescriptor::new(
                url,
                "5c3a34309d8b98640827e5d0991a4015",
                "lib/libx.a",
                strategy.into(),
            )
            .unwrap();
            let layout = FilesystemLayout::new(Path::new("/w"), TargetTriple::MINGW32);
            let toolchain =
                ToolchainConfig::new(Path::new("/usr"), TargetTriple::mingw(false), &layout);
            let source_dir = layout.source_dir(descriptor.archive_base());
            Self {
                descriptor,
                layout,
                toolchain,
                source_dir,
            }
        }

        pub(crate) fn ctx(&self) -> super::BuildContext<'_> {
            super::BuildContext {
                descriptor: &self.descriptor,
                toolchain: &self.toolchain,
                layout: &self.layout,
                source_dir: &self.source_dir,
                jobs: 12,
            }
        }
    }
}
