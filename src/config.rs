//! Application configuration management.
//!
//! Settings are merged from, lowest priority first:
//!
//! 1. built-in defaults
//! 2. `<config_dir>/ftwin/config.toml`
//! 3. `FTWIN_*` environment variables (e.g. `FTWIN_IO_THREADS=8`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! cache_path = "/var/tmp/ftwin.db"
//! io_threads = 8
//! separator = ";"
//! min_size = 4096
//! exclude = ['\.git/', '~$']
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FTWIN_";

/// Persistent application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fingerprint cache location; `None` uses the platform cache directory.
    pub cache_path: Option<PathBuf>,
    /// Number of hashing threads.
    pub io_threads: usize,
    /// Separator between members in the text report.
    pub separator: char,
    /// Minimum candidate size in bytes.
    pub min_size: Option<u64>,
    /// Exclusion regexes applied to every run.
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: None,
            io_threads: 4,
            separator: '\n',
            min_size: None,
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Load from the default file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or a variable holds an invalid value.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::figment(None).extract().map_err(Box::new),
        }
    }

    /// Load from `path` (if it exists) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or a variable holds an invalid value.
    pub fn load_from(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(Some(path)).extract().map_err(Box::new)
    }

    /// The provider stack behind [`load`](Self::load).
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The cache location to use: configured, or the platform default.
    #[must_use]
    pub fn resolved_cache_path(&self) -> Option<PathBuf> {
        self.cache_path.clone().or_else(default_cache_path)
    }
}

/// Default cache location: `<cache_dir>/ftwin/fingerprints.db`.
#[must_use]
pub fn default_cache_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join("fingerprints.db"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "ftwin")
}

/// Per-run option mask.
///
/// Only `untar` changes what the detector does; the rest select and shape
/// the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Prefix each set with its human-readable size.
    pub sized: bool,
    /// Report only; never act on files.
    pub dry_run: bool,
    /// Look inside tar archives.
    pub untar: bool,
    /// Emit JSON instead of text.
    pub json: bool,
    /// Separator between members in the text report.
    pub sep: char,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sized: false,
            dry_run: false,
            untar: false,
            json: false,
            sep: '\n',
        }
    }
}
