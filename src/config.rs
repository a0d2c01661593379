//! Configuration loading.
//!
//! Settings live in a TOML file looked up in this order: an explicit path,
//! `./papervault.toml`, then `<config dir>/papervault/config.toml`. When none
//! exists the built-in defaults are used. Every field is optional.

use crate::error::ConfigError;
use crate::search::{DEFAULT_LIMIT, Vocabulary};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "papervault.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the catalog CSV. `~` is expanded.
    pub catalog: PathBuf,
    /// Result limit when a search does not specify one.
    pub limit: usize,
    /// Seconds between catalog re-reads while serving. `0` disables.
    pub refresh_secs: u64,
    pub fetch: FetchConfig,
    pub vocabulary: Vocabulary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("master_index.csv"),
            limit: DEFAULT_LIMIT,
            refresh_secs: 3600,
            fetch: FetchConfig::default(),
            vocabulary: Vocabulary::default(),
        }
    }
}

/// Settings for the remote file API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub api_base: String,
    /// Environment variable holding the bot token. The token itself is never
    /// read from the file.
    pub token_env: String,
    pub timeout_secs: u64,
    /// Number of fetched files kept in memory.
    pub cache_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            timeout_secs: 10,
            cache_size: 32,
        }
    }
}

impl Config {
    /// Load and validate configuration.
    ///
    /// An explicit path must exist; the implicit locations are skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(PathBuf::from(expand_tilde(&path.to_string_lossy()).as_ref())),
            None => Self::candidate_paths().into_iter().find(|p| p.is_file()),
        };

        let Some(path) = path else {
            tracing::debug!("No config file found, using defaults");
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&text, &path)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document. `path` is only used in errors.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        self.vocabulary.validate()
    }

    /// Implicit config locations, most specific first.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("papervault").join("config.toml"));
        }
        paths
    }

    /// Catalog path with `~` expanded.
    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.catalog.to_string_lossy()).as_ref())
    }
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
