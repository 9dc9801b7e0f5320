//! Cross toolchain selection.
//!
//! A [`ToolchainConfig`] is computed once per target and handed by reference
//! to every strategy. Include and library search paths point at the shared
//! install prefix, so anything an earlier library installed is visible to
//! the ones built after it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::layout::FilesystemLayout;

/// Package-discovery variable redirected to the install prefix.
pub const PKG_CONFIG_VAR: &str = "PKG_CONFIG_LIBDIR";

/// A GNU host triple such as `i686-w64-mingw32`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTriple(String);

impl TargetTriple {
    pub const MINGW32: &'static str = "i686-w64-mingw32";
    pub const MINGW64: &'static str = "x86_64-w64-mingw32";

    /// 32-bit or 64-bit MinGW target.
    pub fn mingw(wide: bool) -> Self {
        Self(if wide { Self::MINGW64 } else { Self::MINGW32 }.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CPU component, e.g. `x86_64`.
    pub fn arch(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }

    /// Everything after the vendor, e.g. `mingw32` or `linux-gnu`.
    pub fn os(&self) -> &str {
        self.0.splitn(3, '-').nth(2).unwrap_or_default()
    }

    /// Prefix prepended to tool names, e.g. `i686-w64-mingw32-`.
    pub fn tool_prefix(&self) -> String {
        format!("{}-", self.0)
    }

    /// Architecture name in the multimedia library's configure dialect.
    pub fn ffmpeg_arch(&self) -> &str {
        match self.arch() {
            "i386" | "i486" | "i586" | "i686" | "x86_64" => "x86",
            "aarch64" => "aarch64",
            a if a.starts_with("arm") => "arm",
            other => other,
        }
    }

    /// Target OS name in the multimedia library's configure dialect.
    pub fn ffmpeg_target_os(&self) -> &str {
        let os = self.os();
        if os.starts_with("mingw32") {
            "mingw32"
        } else if os.starts_with("linux") {
            "linux"
        } else if os.starts_with("freebsd") {
            "freebsd"
        } else {
            os
        }
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compiler, binutils and flags for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    pub host: TargetTriple,
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub ar: PathBuf,
    pub nm: PathBuf,
    pub strip: PathBuf,
    pub cflags: String,
    pub cxxflags: String,
    pub cppflags: String,
    pub ldflags: String,
    pub libs: String,
    pub pkg_config_libdir: PathBuf,
}

impl ToolchainConfig {
    /// Tools are expected at `<toolchain_root>/bin/<triple>-<tool>`.
    pub fn new(toolchain_root: &Path, host: TargetTriple, layout: &FilesystemLayout) -> Self {
        let bin = toolchain_root.join("bin");
        let tool = |name: &str| bin.join(format!("{}{name}", host.tool_prefix()));
        Self {
            cc: tool("gcc"),
            cxx: tool("g++"),
            ar: tool("ar"),
            nm: tool("nm"),
            strip: tool("strip"),
            cflags: "-O2 -g".to_string(),
            cxxflags: "-O2 -g".to_string(),
            cppflags: format!("-I{}", layout.include_dir().display()),
            ldflags: format!("-L{}", layout.lib_dir().display()),
            libs: String::new(),
            pkg_config_libdir: layout.pkg_config_dir(),
            host,
        }
    }

    /// Base preprocessor flags plus library-specific extras.
    pub fn cppflags_with(&self, extra: &str) -> String {
        join_flags([self.cppflags.as_str(), extra])
    }

    /// Environment every build subprocess runs with.
    pub fn env(&self) -> Vec<(&'static str, PathBuf)> {
        vec![(PKG_CONFIG_VAR, self.pkg_config_libdir.clone())]
    }
}

/// Space-join the non-empty flag groups.
pub fn join_flags<'a>(groups: impl IntoIterator<Item = &'a str>) -> String {
    groups
        .into_iter()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> FilesystemLayout {
        FilesystemLayout::new(Path::new("/w"), TargetTriple::MINGW32)
    }

    #[test]
    fn tools_follow_triple_convention() {
        let tc = ToolchainConfig::new(Path::new("/usr"), TargetTriple::mingw(false), &layout());
        assert_eq!(tc.cc, PathBuf::from("/usr/bin/i686-w64-mingw32-gcc"));
        assert_eq!(tc.strip, PathBuf::from("/usr/bin/i686-w64-mingw32-strip"));
        assert_eq!(tc.cppflags, "-I/w/lib/i686-w64-mingw32/root/include");
        assert_eq!(tc.ldflags, "-L/w/lib/i686-w64-mingw32/root/lib");
    }

    #[test]
    fn cppflags_extras_are_appended() {
        let tc = ToolchainConfig::new(Path::new("/usr"), TargetTriple::mingw(false), &layout());
        assert_eq!(tc.cppflags_with(""), tc.cppflags);
        assert_eq!(
            tc.cppflags_with("-DFOO"),
            "-I/w/lib/i686-w64-mingw32/root/include -DFOO"
        );
    }

    #[test]
    fn env_points_package_discovery_at_install_root() {
        let tc = ToolchainConfig::new(Path::new("/usr"), TargetTriple::mingw(true), &layout());
        assert_eq!(
            tc.env(),
            vec![(
                PKG_CONFIG_VAR,
                PathBuf::from("/w/lib/i686-w64-mingw32/root/lib/pkgconfig")
            )]
        );
    }

    #[test]
    fn triple_components() {
        let t = TargetTriple::mingw(true);
        assert_eq!(t.arch(), "x86_64");
        assert_eq!(t.os(), "mingw32");
        assert_eq!(t.ffmpeg_arch(), "x86");
        assert_eq!(t.ffmpeg_target_os(), "mingw32");

        let t = TargetTriple("aarch64-unknown-linux-gnu".to_string());
        assert_eq!(t.os(), "linux-gnu");
        assert_eq!(t.ffmpeg_target_os(), "linux");
        assert_eq!(t.ffmpeg_arch(), "aarch64");

    }
}
