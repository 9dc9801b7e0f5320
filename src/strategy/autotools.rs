//! Standard `configure && make && make install` builds.

use std::path::Path;

use crate::error::Result;
use crate::process::Cmd;

use super::{run_all, BuildContext};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autotools {
    /// Appended after the toolchain overrides.
    pub configure_args: Vec<String>,
    /// Regenerate the build system first; for sources shipped without a
    /// generated `configure`.
    pub autogen: bool,
    /// Extra preprocessor flags for this library only.
    pub cppflags: String,
}

impl Autotools {
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            configure_args: args.into_iter().map(|a| a.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn autogen(mut self) -> Self {
        self.autogen = true;
        self
    }

    pub fn cppflags(mut self, flags: impl Into<String>) -> Self {
        self.cppflags = flags.into();
        self
    }

    pub(super) fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        if self.autogen {
            run_all(self.bootstrap(ctx))?;
        }

        let build_dir = ctx
            .layout
            .fresh_build_dir(ctx.descriptor.archive_base())?;

        self.configure(ctx, &build_dir).run()?;
        run_all(ctx.make_and_install(&build_dir))
    }

    /// aclocal, automake, autoconf, libtoolize; run inside the source tree.
    fn bootstrap(&self, ctx: &BuildContext<'_>) -> Vec<Cmd> {
        let src = ctx.source_dir;
        let tool = |program: &str| {
            Cmd::new(program)
                .current_dir(src)
                .envs(ctx.toolchain.env())
                .error_msg(program.to_string())
        };
        vec![
            tool("aclocal"),
            tool("automake").args(["--add-missing", "--force-missing", "--foreign"]),
            tool("autoconf"),
            tool("libtoolize").arg("--force"),
        ]
    }

    fn configure(&self, ctx: &BuildContext<'_>, build_dir: &Path) -> Cmd {
        let tc = ctx.toolchain;
        Cmd::new(ctx.source_dir.join("configure"))
            .current_dir(build_dir)
            .envs(tc.env())
            .arg(format!("CC={}", tc.cc.display()))
            .arg(format!("CXX={}", tc.cxx.display()))
            .arg(format!("CFLAGS={}", tc.cflags))
            .arg(format!("CXXFLAGS={}", tc.cxxflags))
            .arg(format!("CPPFLAGS={}", tc.cppflags_with(&self.cppflags)))
            .arg(format!("LDFLAGS={}", tc.ldflags))
            .arg(format!("LIBS={}", tc.libs))
            .arg(format!("AR={}", tc.ar.display()))
            .arg(format!("STRIP={}", tc.strip.display()))
            .arg(format!("--host={}", tc.host))
            .arg(format!("--prefix={}", ctx.layout.install_root.display()))
            .arg("--enable-silent-rules")
            .args(&self.configure_args)
            .error_msg("configure")
    }
}
