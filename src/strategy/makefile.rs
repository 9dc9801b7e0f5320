//! Libraries built straight from a platform makefile, without `configure`.

use crate::error::{Error, Result};
use crate::process::Cmd;

use super::BuildContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMakefile {
    /// Makefile relative to the source root, e.g. `win32/Makefile.gcc`.
    pub makefile: String,
    /// Install-layout variables passed as `NAME=value` overrides.
    pub variables: Vec<(String, String)>,
}

impl RawMakefile {
    pub fn new(makefile: impl Into<String>) -> Self {
        Self {
            makefile: makefile.into(),
            variables: Vec::new(),
        }
    }

    /// Add a `NAME=value` override, passed after `DESTDIR` in the order
    /// added.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    pub(super) fn validate(&self) -> Result<()> {
        if self.makefile.trim().is_empty() {
            return Err(Error::config("raw makefile strategy needs a makefile"));
        }
        if let Some((name, _)) = self
            .variables
            .iter()
            .find(|(name, _)| name.is_empty() || name.contains('='))
        {
            return Err(Error::config(format!(
                "invalid make variable name '{name}'"
            )));
        }
        Ok(())
    }

    pub(super) fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        self.command(ctx).run()
    }

    /// Compile and install in one invocation inside the source tree.
    fn command(&self, ctx: &BuildContext<'_>) -> Cmd {
        // DESTDIR keeps its trailing slash; the makefile concatenates it
        // directly with the layout paths.
        let destdir = format!("{}/", ctx.layout.install_root.display());
        ctx.make(ctx.source_dir)
            .args(["-f", self.makefile.as_str()])
            .arg(format!("PREFIX={}", ctx.toolchain.host.tool_prefix()))
            .arg(ctx.jobs_arg())
            .arg(format!("DESTDIR={destdir}"))
            .args(
                self.variables
                    .iter()
                    .map(|(name, value)| format!("{name}={value}")),
            )
            .arg("install")
            .error_msg(format!("make -f {} install", self.makefile))
    }
}
