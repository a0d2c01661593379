use anyhow::Context as _;
use clap::Parser;
use papervault::cli::{Cli, Commands};
use papervault::tools::download::save_paper;
use papervault::tools::search::format_search_results;
use papervault::tools::stats::handle_stats;
use papervault::state::spawn_refresh_task;
use papervault::{
    Catalog, Config, CsvDataSource, TelegramFetcher, VaultServer, VaultState, prepare_display_name,
    rank,
};
use rmcp::{ServiceExt, transport::stdio};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// One search result as printed by `search --json`.
#[derive(Debug, Serialize)]
struct JsonResult<'a> {
    name: String,
    id: &'a str,
    relevance: f64,
    score: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    papervault::tracing::init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(catalog) = cli.catalog {
        config.catalog = catalog;
    }

    let source = Arc::new(CsvDataSource::new(config.catalog_path()));
    let catalog = Catalog::load(source.as_ref()).unwrap_or_else(|e| {
        tracing::warn!("{}; starting with an empty catalog", e);
        Catalog::default()
    });

    let fetcher = TelegramFetcher::from_config(&config.fetch)
        .context("Failed to build the file fetcher")?;
    let state = Arc::new(
        VaultState::new(
            catalog,
            config.vocabulary.clone(),
            config.limit,
            Arc::new(fetcher),
            config.fetch.cache_size,
        )
        .with_source(source),
    );

    match cli.command {
        Commands::Serve => {
            tracing::info!("Starting papervault MCP server");

            if config.refresh_secs > 0 {
                spawn_refresh_task(Arc::clone(&state), Duration::from_secs(config.refresh_secs));
            }

            let server = VaultServer::new(state);
            let service = server.serve(stdio()).await.inspect_err(|e| {
                tracing::error!("Error serving MCP server: {:?}", e);
            })?;

            service.waiting().await?;
        }
        Commands::Search { query, limit, json } => {
            let query = query.join(" ");
            let limit = limit.unwrap_or(config.limit);
            let catalog = state.catalog().await;
            let results = rank(&query, catalog.entries(), limit, state.vocabulary());

            if json {
                let rows: Vec<JsonResult<'_>> = results
                    .iter()
                    .map(|r| JsonResult {
                        name: prepare_display_name(&r.entry.name),
                        id: &r.entry.id,
                        relevance: r.display_score,
                        score: r.raw_score,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if results.is_empty() {
                println!("No results found for '{}'.", query);
            } else {
                print!("{}", format_search_results(&results, &query, catalog.len()));
            }
        }
        Commands::Download { id, output } => {
            let path = save_paper(&state, &id, &output).await?;
            println!("{}", path.display());
        }
        Commands::Stats => {
            print!("{}", handle_stats(&state).await);
        }
    }

    Ok(())
}
