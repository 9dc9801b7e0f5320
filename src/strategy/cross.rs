//! Cross builds for the multimedia codec library, whose hand-written
//! `configure` takes `--cc`/`--cross-prefix`/`--target-os` style options
//! instead of autoconf's `CC=`/`--host`.

use std::path::Path;

use crate::error::Result;
use crate::process::Cmd;
use crate::toolchain::join_flags;

use super::{run_all, BuildContext};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossCompileConfigure {
    pub configure_args: Vec<String>,
    /// Extra preprocessor flags folded into `--extra-cflags`/`--extra-cxxflags`.
    pub cppflags: String,
}

impl CrossCompileConfigure {
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

    pub fn cppflags(mut self, flags: impl Into<String>) -> Self {
        self.cppflags = flags.into();
        self
    }

    pub(super) fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let build_dir = ctx
            .layout
            .fresh_build_dir(ctx.descriptor.archive_base())?;
        self.configure(ctx, &build_dir).run()?;
        run_all(ctx.make_and_install(&build_dir))
    }

    fn configure(&self, ctx: &BuildContext<'_>, build_dir: &Path) -> Cmd {
        let tc = ctx.toolchain;
        let extra = self.cppflags.as_str();
        let cflags = join_flags([tc.cflags.as_str(), tc.cppflags.as_str(), extra]);
        let cxxflags = join_flags([tc.cxxflags.as_str(), tc.cppflags.as_str(), extra]);

        Cmd::new(ctx.source_dir.join("configure"))
            .current_dir(build_dir)
            .envs(tc.env())
            .arg(format!("--cc={}", tc.cc.display()))
            .arg(format!("--cxx={}", tc.cxx.display()))
            .arg(format!("--nm={}", tc.nm.display()))
            .arg(format!("--extra-cflags={cflags}"))
            .arg(format!("--extra-cxxflags={cxxflags}"))
            .arg(format!("--extra-ldflags={}", tc.ldflags))
            .arg(format!("--extra-libs={}", tc.libs))
            .arg(format!("--ar={}", tc.ar.display()))
            .arg("--enable-cross-compile")
            .arg(format!("--arch={}", tc.host.ffmpeg_arch()))
            .arg(format!("--target-os={}", tc.host.ffmpeg_target_os()))
            .arg(format!("--cross-prefix={}", tc.host.tool_prefix()))
            .arg(format!("--prefix={}", ctx.layout.install_root.display()))
            .args(&self.configure_args)
            .error_msg("configure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::argv;
    use crate::strategy::fixture::Fixture;

    #[test]
    fn configure_uses_its_own_flag_dialect() {
        let strategy = CrossCompileConfigure::with_args(["--disable-shared", "--enable-small"]);
        let fx = Fixture::new("http://ffmpeg.org/releases/ffmpeg-2.5.tar.bz2", strategy.clone());
        let build_dir = fx.layout.build_dir("ffmpeg-2.5");

        let args = argv(&strategy.configure(&fx.ctx(), &build_dir));

        assert_eq!(
            args,
            [
                "--cc=/usr/bin/i686-w64-mingw32-gcc",
                "--cxx=/usr/bin/i686-w64-mingw32-g++",
                "--nm=/usr/bin/i686-w64-mingw32-nm",
                "--extra-cflags=-O2 -g -I/w/lib/i686-w64-mingw32/root/include",
                "--extra-cxxflags=-O2 -g -I/w/lib/i686-w64-mingw32/root/include",
                "--extra-ldflags=-L/w/lib/i686-w64-mingw32/root/lib",
                "--extra-libs=",
                "--ar=/usr/bin/i686-w64-mingw32-ar",
                "--enable-cross-compile",
                "--arch=x86",
                "--target-os=mingw32",
                "--cross-prefix=i686-w64-mingw32-",
                "--prefix=/w/lib/i686-w64-mingw32/root",
                "--disable-shared",
                "--enable-small",
            ]
        );
        assert!(!args.iter().any(|a| a.starts_with("--host")));
    }

    #[test]
    fn library_cppflags_join_the_extra_flags() {
        let strategy = CrossCompileConfigure::default().cppflags("-DNDEBUG");
        let fx = Fixture::new("http://ffmpeg.org/releases/ffmpeg-2.5.tar.bz2", strategy.clone());

        let args = argv(&strategy.configure(&fx.ctx(), Path::new("/w/b")));

        assert!(args.contains(
            &"--extra-cflags=-O2 -g -I/w/lib/i686-w64-mingw32/root/include -DNDEBUG".to_string()
        ));
    }
}
