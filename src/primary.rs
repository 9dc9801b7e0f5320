//! Final `configure && make` of the primary project against the primed
//! install root. Runs unconditionally; there is nothing to cache here.

use std::path::Path;

use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::layout::FilesystemLayout;
use crate::process::Cmd;
use crate::strategy::MAKE;
use crate::toolchain::{join_flags, ToolchainConfig};

/// Configure the project found at `settings.project_dir` inside
/// `settings.work_dir`, then build it.
pub fn configure_and_build(
    settings: &Settings,
    toolchain: &ToolchainConfig,
    layout: &FilesystemLayout,
) -> Result<()> {
    info!("configuring {}", settings.project_dir.display());
    configure(settings, toolchain, layout).run()?;
    info!("building {}", settings.project_dir.display());
    make(&settings.work_dir, toolchain, settings.jobs).run()
}

fn configure(settings: &Settings, tc: &ToolchainConfig, layout: &FilesystemLayout) -> Cmd {
    Cmd::new(settings.project_dir.join("configure"))
        .current_dir(&settings.work_dir)
        .envs(tc.env())
        .arg(format!("CC={}", tc.cc.display()))
        .arg(format!("CXX={}", tc.cxx.display()))
        .arg(format!("CFLAGS={}", tc.cflags))
        .arg(format!("CXXFLAGS={}", tc.cxxflags))
        .arg(format!("CPPFLAGS={}", tc.cppflags))
        // The final executable links every dependency statically.
        .arg(format!("LDFLAGS={}", join_flags([tc.ldflags.as_str(), "-static"])))
        .arg(format!("LIBS={}", tc.libs))
        .arg(format!("AR={}", tc.ar.display()))
        .arg(format!("STRIP={}", tc.strip.display()))
        .arg(format!("--host={}", tc.host))
        .arg(format!("--prefix={}", layout.install_root.display()))
        .args(["--enable-silent-rules", "--disable-glib", "--disable-icu"])
        .args(&settings.configure_args)
        .error_msg("configure")
}

fn make(dir: &Path, tc: &ToolchainConfig, jobs: usize) -> Cmd {
    Cmd::new(MAKE)
        .arg("--quiet")
        .arg(format!("-j{}", jobs.max(1)))
        .current_dir(dir)
        .envs(tc.env())
        .error_msg("make")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::argv;
    use std::path::PathBuf;

    fn settings() -> Settings {
        let args = vec!["--64".to_string(), "--enable-debug".to_string()];
        Settings::from_args(&args, Path::new("/src/mpd/build"), |_| None).unwrap()
    }

    #[test]
    fn configure_links_statically_and_forwards_args_last() {
        let s = settings();
        let layout = s.layout();
        let tc = s.toolchain(&layout);

        let cmd = configure(&s, &tc, &layout);

        assert_eq!(cmd.get_program(), Path::new("/src/mpd/configure").as_os_str());
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/src/mpd/build")));
        let args = argv(&cmd);
        assert_eq!(
            args[5],
            "LDFLAGS=-L/src/mpd/build/lib/x86_64-w64-mingw32/root/lib -static"
        );
        assert_eq!(args[9], "--host=x86_64-w64-mingw32");
        assert_eq!(
            &args[args.len() - 4..],
            [
                "--enable-silent-rules",
                "--disable-glib",
                "--disable-icu",
                "--enable-debug"
            ]
        );
        assert_eq!(
            cmd.get_env("PKG_CONFIG_LIBDIR").map(PathBuf::from),
            Some(layout.pkg_config_dir())
        );
    }

    #[test]
    fn make_uses_configured_parallelism() {
        let s = settings();
        let layout = s.layout();
        let tc = s.toolchain(&layout);
        let cmd = make(&s.work_dir, &tc, 3);
        assert_eq!(argv(&cmd), ["--quiet", "-j3"]);
    }
}
