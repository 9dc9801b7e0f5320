//! Host checks run before any download or build.
//!
//! A missing tool otherwise shows up as a spawn failure halfway through the
//! run, after several libraries were already rebuilt.

use std::path::Path;

use crate::descriptor::{ArchiveFormat, LibraryDescriptor};
use crate::error::{Error, Result};
use crate::toolchain::ToolchainConfig;

/// Whether `cmd` resolves on `PATH`.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Downloads go through curl, so every run needs it.
pub const FETCH_TOOL: (&str, &str) = ("curl", "curl");

/// Needed as soon as one library compiles anything.
pub const MAKE_TOOL: (&str, &str) = ("make", "make");

/// Needed only when some library regenerates its build system.
pub const BOOTSTRAP_TOOLS: &[(&str, &str)] = &[
    ("aclocal", "automake"),
    ("automake", "automake"),
    ("autoconf", "autoconf"),
    ("libtoolize", "libtool"),
];

/// The host tools `descriptors` will invoke.
///
/// # Arguments
///
/// * `descriptors` - The libraries about to be primed
///
/// # Returns
///
/// (command, package) pairs: curl always, `make` only if some strategy
/// compiles, `unzip` and the autoconf bootstrap tools only when needed.
pub fn required_tools(descriptors: &[LibraryDescriptor]) -> Vec<(&'static str, &'static str)> {
    let mut tools = vec![FETCH_TOOL];
    if descriptors.iter().any(|d| d.strategy().runs_make()) {
        tools.push(MAKE_TOOL);
    }
    if descriptors.iter().any(|d| d.format() == ArchiveFormat::Zip) {
        tools.push(("unzip", "unzip"));
    }
    if descriptors.iter().any(|d| d.strategy().needs_bootstrap()) {
        tools.extend_from_slice(BOOTSTRAP_TOOLS);
    }
    tools
}

/// Check that specific tools are available.
///
/// # Arguments
///
/// * `tools` - Slice of (command, package) tuples
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * [`Error::MissingTools`] listing every missing tool and its package
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {t} (install: {p})"))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(Error::MissingTools(msg));
    }
    Ok(())
}

/// The cross compiler must exist where the toolchain convention puts it.
pub fn check_cross_compiler(toolchain: &ToolchainConfig) -> Result<()> {
    check_file(&toolchain.cc, &format!("{} cross compiler", toolchain.host))
}

fn check_file(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    Err(Error::MissingTools(format!(
        "  {} (expected {what})",
        path.display()
    )))
}

/// Everything the binary checks before starting a run.
pub fn check_host(toolchain: &ToolchainConfig, descriptors: &[LibraryDescriptor]) -> Result<()> {
    check_required_tools(&required_tools(descriptors))?;
    check_cross_compiler(toolchain)
}
