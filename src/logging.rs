//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level comes from, in priority order:
//!
//! 1. `RUST_LOG`, if set
//! 2. `--quiet` (errors only) or `-v`/`-vv`/`-vvv`
//! 3. warnings only
//!
//! The report goes to stdout; logs always go to stderr so they never mix
//! with it.
//!
//! ```rust,no_run
//! use ftwin::logging::init_logging;
//!
//! init_logging(1, false);
//! log::info!("Scanning");
//! ```

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the global logger from CLI verbosity flags.
///
/// Later calls are ignored, so tests may call this freely.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose >= 2 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_millis(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });

    if builder.try_init().is_ok() && !from_env {
        log::debug!("Logging initialized at level {:?}", log::max_level());
    }
}

/// Map CLI flags to a level filter.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
