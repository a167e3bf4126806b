//! ftwin - find duplicate files, including inside tar archives.
//!
//! Candidates are bucketed by exact size, every member of a non-singleton
//! bucket is fingerprinted with 128-bit XXH3, and the hashed records are
//! drained through a min-heap into sets of identical content. Fingerprints
//! persist in a SQLite cache keyed by file identity, guarded by an
//! exclusive lock file, so unchanged files are not read twice.

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cache::HashCache;
use crate::cli::Cli;
use crate::config::{Config, Options};
use crate::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::WalkerConfig;

/// Run one scan as described by `cli` and print the report to stdout.
///
/// # Errors
///
/// Fatal errors only: bad configuration or patterns, a cache that cannot be
/// opened (including one held by another process), cancellation, or a
/// failure writing the report. Unreadable candidates are warnings.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load().context("Failed to load configuration")?;
    let options = cli.options(config.separator);
    if options.json && !cfg!(feature = "json") {
        bail!("JSON output requires the `json` feature");
    }

    let walker_config = walker_config(&cli, &config)?;
    let shutdown = signal::install_handler()?;

    let cache = open_cache(&cli, &config)?;
    let mut finder_config = FinderConfig::default()
        .with_io_threads(cli.io_threads.unwrap_or(config.io_threads))
        .with_paranoid(cli.paranoid)
        .with_options(&options)
        .with_shutdown_flag(shutdown.get_flag());
    if let Some(ref cache) = cache {
        finder_config = finder_config.with_cache(Arc::clone(cache));
    }
    if !cli.quiet && !cli.no_progress && !options.json {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates_in_paths(&cli.paths, &walker_config)?;
    drop(finder);

    for err in &summary.errors {
        log::warn!("{err}");
    }
    log::info!(
        "{} files ({}) scanned in {:.2?}: {} sets, {} reclaimable",
        summary.total_files,
        summary.total_size_display(),
        summary.scan_duration,
        summary.duplicate_groups,
        summary.reclaimable_display()
    );

    write_report(&groups, &options).context("Failed to write report")?;

    if let Some(cache) = cache {
        match Arc::try_unwrap(cache) {
            Ok(cache) => cache.close().context("Failed to close fingerprint cache")?,
            Err(_) => log::debug!("Fingerprint cache still shared, closing on drop"),
        }
    }

    Ok(ExitCode::for_outcome(!groups.is_empty(), summary.has_errors()))
}

/// Build the walker configuration from CLI flags over `config`.
fn walker_config(cli: &Cli, config: &Config) -> Result<WalkerConfig> {
    for root in &cli.priority_paths {
        if !root.exists() {
            log::warn!("Priority path {} does not exist", root.display());
        }
    }
    let mut walker_config = WalkerConfig {
        recursive: cli.recursive,
        follow_symlinks: cli.follow_symlinks,
        include_hidden: cli.include_hidden,
        min_size: cli.min_size.or(config.min_size),
        max_size: cli.max_size,
        whitelist: cli.whitelist_regexes().context("Invalid whitelist pattern")?,
        exclude: cli
            .exclude_regexes(&config.exclude)
            .context("Invalid exclude pattern")?,
        priority_paths: cli.priority_paths.clone(),
        untar: cli.untar,
    };
    walker_config.canonicalize_priority_paths();
    Ok(walker_config)
}

fn open_cache(cli: &Cli, config: &Config) -> Result<Option<Arc<HashCache>>> {
    if cli.no_cache {
        return Ok(None);
    }
    let Some(path) = cli.cache.clone().or_else(|| config.resolved_cache_path()) else {
        log::warn!("No cache directory available, running without a fingerprint cache");
        return Ok(None);
    };

    let cache = HashCache::open(&path)
        .with_context(|| format!("Failed to open fingerprint cache {}", path.display()))?;
    if cli.clear_cache {
        cache.clear().context("Failed to clear fingerprint cache")?;
        log::info!("Cleared fingerprint cache {}", path.display());
    }
    Ok(Some(Arc::new(cache)))
}

fn write_report(groups: &[DuplicateGroup], options: &Options) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    #[cfg(feature = "json")]
    if options.json {
        output::JsonOutput::new(groups).write_to(&mut out, true)?;
        out.flush()?;
        return Ok(());
    }

    output::TextOutput::new(groups, options).write_to(&mut out)?;
    Ok(())
}
