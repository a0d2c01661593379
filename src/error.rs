//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for application-level papervault operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods in configuration loading, the CLI and the server.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when loading the catalog from its data source fails.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// The backing catalog file does not exist.
    #[error("catalog not found at {}", .path.display())]
    NotFound { path: PathBuf },
    /// The catalog exists but could not be read or parsed.
    #[error("failed to parse catalog {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    /// A required column could not be detected from the header row.
    #[error("catalog has no '{column}' column")]
    MissingColumn { column: &'static str },
}

/// Error returned when resolving a file identifier to its content fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The identifier is blank, invalid or expired.
    #[error("file '{id}' not found: {reason}")]
    NotFound { id: String, reason: String },
    /// The remote API did not answer in time.
    #[error("request timed out")]
    Timeout,
    /// Transport-level failure talking to the remote API.
    #[error("network error: {0}")]
    Network(String),
    /// The credential is missing or was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl FetchError {
    /// Whether retrying the same request later could succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }
}

/// Error raised while loading or validating configuration. Fatal at start-up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("vocabulary '{facet}' is empty")]
    EmptyVocabulary { facet: &'static str },
    #[error("vocabulary '{facet}' contains '{token}', which is not a single normalized word")]
    InvalidToken { facet: &'static str, token: String },
    #[error("result limit must be at least 1")]
    ZeroLimit,
}
