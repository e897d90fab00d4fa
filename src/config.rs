//! Application configuration.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed `DUPEHUNTER_` (e.g. `DUPEHUNTER_IO_THREADS=8`)
//! 4. Command-line flags, applied by [`crate::run_app`]

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::duplicates::FinderConfig;
use crate::scanner::WalkerConfig;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPEHUNTER_";

/// Errors from loading or rendering configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No platform configuration directory could be determined.
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    /// A layer failed to parse or had a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The settings could not be rendered as TOML.
    #[error("Cannot render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Scan settings that can come from a file or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of hashing threads.
    pub io_threads: usize,
    /// Compare duplicate sets byte by byte.
    pub verify: bool,
    /// Keep zero-byte files.
    pub include_empty: bool,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Minimum file size in bytes.
    pub min_size: Option<u64>,
    /// Maximum file size in bytes.
    pub max_size: Option<u64>,
    /// Gitignore-style patterns to exclude.
    pub ignore_patterns: Vec<String>,
    /// Report format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            verify: false,
            include_empty: false,
            follow_symlinks: false,
            skip_hidden: false,
            min_size: None,
            max_size: None,
            ignore_patterns: Vec::new(),
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Load from the default file location and the environment.
    ///
    /// Falls back to defaults (logged at debug level) if the file is invalid.
    #[must_use]
    pub fn load() -> Self {
        let result = Self::default_path().and_then(|path| Self::load_from(&path));
        match result {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Load from a specific TOML file and the environment.
    ///
    /// A missing file contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the file or an environment value
    /// does not parse.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::figment(path).extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// The layered figment for `path`, without extraction.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// `config.toml` inside the platform configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if no home directory is known.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs =
            ProjectDirs::from("org", "dupehunter", "dupehunter").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Render the settings as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_hidden(self.skip_hidden)
            .with_include_empty(self.include_empty)
            .with_min_size(self.min_size)
            .with_max_size(self.max_size)
            .with_patterns(self.ignore_patterns.clone())
    }

    /// Finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_verify(self.verify)
            .with_walker_config(self.walker_config())
    }
}
