//! Prime the third-party libraries, then configure and build the primary
//! project against them.
//!
//! Usage: `cross-deps [--64] [configure args...]`

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use cross_deps::registry::thirdparty_libraries;
use cross_deps::{
    preflight, primary, ArchiveCache, ArchiveExtractor, CurlFetcher, Orchestrator, Settings,
};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .ok();
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = Settings::from_env(&args).context("reading settings")?;
    let layout = settings.layout();
    let toolchain = settings.toolchain(&layout);
    let libraries = thirdparty_libraries().context("loading library registry")?;

    preflight::check_host(&toolchain, &libraries).context("preflight checks failed")?;

    let fetcher = CurlFetcher::from_path()?;
    let cache = ArchiveCache::new(layout.cache_root.clone(), Box::new(fetcher));
    let orchestrator = Orchestrator::new(
        layout.clone(),
        toolchain.clone(),
        cache,
        Box::new(ArchiveExtractor),
    )
    .with_jobs(settings.jobs);

    let report = orchestrator
        .run(&libraries)
        .with_context(|| format!("priming libraries for {}", settings.host))?;
    info!(
        "{} built, {} up to date",
        report.built.len(),
        report.skipped.len()
    );

    primary::configure_and_build(&settings, &toolchain, &layout).with_context(|| {
        format!("building project in '{}'", settings.project_dir.display())
    })
}
