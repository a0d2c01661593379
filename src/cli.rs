//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "papervault")]
#[command(about = "Search a past-paper catalog and download files", long_about = None)]
pub struct Cli {
    /// Config file (default: ./papervault.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog CSV, overriding the configured path
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run as an MCP stdio server
    Serve,
    /// Rank catalog entries against a free-text query
    Search {
        /// Query words, e.g. `a/l physics 2021 sinhala`
        #[arg(required = true)]
        query: Vec<String>,
        /// Maximum number of results (default: configured limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch a file by id and save it
    Download {
        id: String,
        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output: PathBuf,
    },
    /// Show catalog statistics
    Stats,
}
