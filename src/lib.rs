pub mod catalog;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod search;
pub mod server;
pub mod state;
pub mod tools;
pub mod tracing;

pub use catalog::{Catalog, CatalogEntry, CatalogStats, CsvDataSource, DataSource};
pub use config::{Config, FetchConfig};
pub use display::{prepare_display_name, sanitize};
pub use error::{CatalogError, ConfigError, FetchError, Result};
pub use fetch::{BlobFetcher, TelegramFetcher};
pub use search::{RankedResult, Vocabulary, normalize, rank, search};
pub use server::VaultServer;
pub use state::VaultState;
