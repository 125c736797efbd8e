//! TOML-based configuration for PromptVCS.
//!
//! The file is optional: when the default path does not exist every section
//! falls back to its defaults. `PROMPTVCS_DATA_DIR` and `PROMPTVCS_LOG`
//! override the corresponding values after loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::detector::DEFAULT_CONFLICT_PROBABILITY;
use crate::errors::ConfigError;

/// Environment variable overriding `storage.data_dir`.
pub const ENV_DATA_DIR: &str = "PROMPTVCS_DATA_DIR";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG: &str = "PROMPTVCS_LOG";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where application state is persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Randomness and conflict simulation.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Key-value backend selection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A single SQLite file under `data_dir`.
    #[default]
    Sqlite,
    /// Process memory; nothing survives exit.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory holding the database file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file name, relative to `data_dir`.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("promptvcs"))
        .unwrap_or_else(|| PathBuf::from(".promptvcs"))
}
fn default_database_file() -> String {
    "promptvcs.db".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            database_file: default_database_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error, off.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Which [`ConflictOracle`](crate::conflict::ConflictOracle) merges use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Weighted coin flip.
    #[default]
    Random,
    /// Three-way merge of the branch tips.
    Content,
}

impl std::fmt::Display for OracleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Content => write!(f, "content"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub conflict_oracle: OracleKind,

    /// Chance in [0, 1] that the random oracle reports a conflict.
    #[serde(default = "default_conflict_probability")]
    pub conflict_probability: f64,

    /// Seed for a deterministic random source. Unset means thread RNG.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_conflict_probability() -> f64 {
    DEFAULT_CONFLICT_PROBABILITY
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            conflict_oracle: OracleKind::default(),
            conflict_probability: default_conflict_probability(),
            seed: None,
        }
    }
}

/// Written by `promptvcs init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# PromptVCS configuration

[storage]
# "sqlite" keeps state in a file under data_dir; "memory" forgets it on exit.
backend = "sqlite"
# data_dir = "~/.local/share/promptvcs"
database_file = "promptvcs.db"

[logging]
# trace, debug, info, warn, error or off. RUST_LOG and PROMPTVCS_LOG win.
level = "warn"

[simulation]
# "random" flips a weighted coin; "content" runs a three-way merge of the tips.
conflict_oracle = "random"
conflict_probability = 0.3
# seed = 42
"#;

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Default config file location, `<config dir>/promptvcs/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("promptvcs").join("config.toml"))
    }

    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load the effective configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present and defaults otherwise. Environment overrides are applied and
    /// the result validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => {
                    debug!("no configuration file, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `PROMPTVCS_DATA_DIR` and `PROMPTVCS_LOG`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are
    /// ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            debug!(data_dir = %dir, "data_dir overridden from environment");
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            debug!(level = %level, "log level overridden from environment");
            self.logging.level = level;
        }
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.simulation.conflict_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::InvalidValue {
                field: "simulation.conflict_probability".into(),
                detail: format!("must be between 0 and 1, got {p}"),
            });
        }
        if self.storage.database_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.database_file".into(),
                detail: "database file name must not be empty".into(),
            });
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".into(),
                detail: format!(
                    "unknown level '{}', expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Full path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.database_file)
    }

    /// Write [`DEFAULT_CONFIG_TOML`] to `path`, creating parent directories.
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn write_default<P: AsRef<Path>>(path: P, force: bool) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".into(),
                detail: format!("{} already exists", path.display()),
            });
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_CONFIG_TOML)?;
        info!(path = %path.display(), "wrote default configuration");
        Ok(())
    }
}
