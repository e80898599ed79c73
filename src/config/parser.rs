//! Installer configuration loading.
//!
//! Settings come from three layers, later ones winning: the optional
//! `custom-fields.yaml` file, a `.env` file beside it, and the process
//! environment.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, InstallerError, Result};

use super::settings::InstallerConfig;

/// Environment variable overriding the store directory.
pub const STORE_DIR_ENV: &str = "CUSTOM_FIELDS_STORE_DIR";

/// File names searched for when no configuration path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["custom-fields.yaml", "custom-fields.yml"];

/// Configuration together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    /// Parsed settings with environment overrides applied.
    pub config: InstallerConfig,
    /// Configuration file, if one was used.
    pub source: Option<PathBuf>,
    /// Directory relative store paths resolve against.
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    /// Returns the resolved store directory.
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        self.config.store_dir(&self.base_dir)
    }
}

/// Reader for installer configuration files.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Directory searched for `.env` and default configuration files.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a parser rooted at the current directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Roots the parser at `path`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    fn root(&self) -> PathBuf {
        self.base_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolves the configuration for a run.
    ///
    /// Uses `explicit` when given, otherwise searches upward from the
    /// parser root. Running without any file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or if a file or
    /// `.env` cannot be parsed.
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<LoadedConfig> {
        let source = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(self.root()),
        };

        let base_dir = source
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| self.root(), Path::to_path_buf);

        Self::load_dotenv(&base_dir.join(".env"))?;

        let mut config = match &source {
            Some(path) => self.load_file(path)?,
            None => {
                debug!("No configuration file, using defaults");
                InstallerConfig::default()
            }
        };
        Self::apply_env_overrides(&mut config);

        Ok(LoadedConfig {
            config,
            source,
            base_dir,
        })
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] for a missing file and
    /// [`ConfigError::ParseError`] for unreadable or invalid content.
    pub fn load_file(&self, path: &Path) -> Result<InstallerConfig> {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        info!("Reading configuration {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("cannot read {}: {e}", path.display()),
            location: None,
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses YAML settings. Blank input yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for invalid YAML.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<InstallerConfig> {
        if content.trim().is_empty() {
            return Ok(InstallerConfig::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            let location = e
                .location()
                .map(|at| (at.line(), at.column()))
                .map(|(line, column)| match source {
                    Some(path) => format!("{}:{line}:{column}", path.display()),
                    None => format!("{line}:{column}"),
                });

            InstallerError::Config(ConfigError::ParseError {
                message: e.to_string(),
                location,
            })
        })
    }

    /// Overrides file settings with environment variables.
    pub fn apply_env_overrides(config: &mut InstallerConfig) {
        if let Some(dir) = std::env::var_os(STORE_DIR_ENV) {
            debug!("{STORE_DIR_ENV} overrides store.path");
            config.store.path = Some(PathBuf::from(dir));
        }
    }

    /// Exports variables from `env_file` into the process environment.
    /// Variables already set are left alone.
    fn load_dotenv(env_file: &Path) -> Result<()> {
        if !env_file.is_file() {
            return Ok(());
        }

        debug!("Loading {}", env_file.display());
        dotenvy::from_path(env_file).map_err(|e| {
            InstallerError::Config(ConfigError::ParseError {
                message: format!("invalid .env file: {e}"),
                location: Some(env_file.display().to_string()),
            })
        })
    }
}

/// Searches `start_dir` and its ancestors for a default configuration file.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let start = start_dir.as_ref();
    let start = std::fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());

    let found = start.ancestors().find_map(|dir| {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    });

    if let Some(path) = &found {
        debug!("Found configuration file {}", path.display());
    }
    found
}
