//! Run settings: target selection from the command line, paths and
//! parallelism from the environment.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::FilesystemLayout;
use crate::strategy::DEFAULT_JOBS;
use crate::toolchain::{TargetTriple, ToolchainConfig};

pub const TOOLCHAIN_VAR: &str = "CROSS_DEPS_TOOLCHAIN";
pub const WORKDIR_VAR: &str = "CROSS_DEPS_WORKDIR";
pub const JOBS_VAR: &str = "CROSS_DEPS_JOBS";
pub const PROJECT_VAR: &str = "CROSS_DEPS_PROJECT";

/// Leading flag selecting the 64-bit triple.
pub const WIDE_FLAG: &str = "--64";

const DEFAULT_TOOLCHAIN: &str = "/usr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: TargetTriple,
    /// Forwarded verbatim to the primary project's configure.
    pub configure_args: Vec<String>,
    pub toolchain_root: PathBuf,
    /// Holds `lib/` (cache, sources, per-triple build and install trees).
    pub work_dir: PathBuf,
    pub project_dir: PathBuf,
    pub jobs: usize,
}

impl Settings {
    /// Settings for this process: `args` without the program name.
    pub fn from_env(args: &[String]) -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::config(format!("cannot determine current directory: {e}")))?;
        Self::from_args(args, &cwd, |key| std::env::var(key).ok())
    }

    /// `env` looks up a variable; empty values count as unset.
    pub fn from_args(
        args: &[String],
        cwd: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let (wide, forwarded) = match args {
            [flag, rest @ ..] if flag == WIDE_FLAG => (true, rest),
            rest => (false, rest),
        };
        let var = |key: &str| env(key).filter(|v| !v.is_empty());

        let toolchain_root = var(TOOLCHAIN_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOLCHAIN));
        let work_dir = var(WORKDIR_VAR)
            .map(|v| cwd.join(v))
            .unwrap_or_else(|| cwd.to_path_buf());
        let project_dir = match var(PROJECT_VAR) {
            Some(v) => cwd.join(v),
            None => cwd
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    Error::config(format!(
                        "'{}' has no parent directory; set {PROJECT_VAR}",
                        cwd.display()
                    ))
                })?,
        };
        let jobs = match var(JOBS_VAR) {
            Some(v) => parse_jobs(&v)?,
            None => DEFAULT_JOBS,
        };

        Ok(Self {
            host: TargetTriple::mingw(wide),
            configure_args: forwarded.to_vec(),
            toolchain_root,
            work_dir,
            project_dir,
            jobs,
        })
    }

    pub fn layout(&self) -> FilesystemLayout {
        FilesystemLayout::new(&self.work_dir, self.host.as_str())
    }

    pub fn toolchain(&self, layout: &FilesystemLayout) -> ToolchainConfig {
        ToolchainConfig::new(&self.toolchain_root, self.host.clone(), layout)
    }
}

fn parse_jobs(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::config(format!(
            "{JOBS_VAR}='{value}' is not a positive number"
        ))),
    }
}
