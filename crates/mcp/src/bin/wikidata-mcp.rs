// Standalone MCP server binary

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wikidata_core::{WikidataClient, WikidataConfig};
use wikidata_mcp::server::McpServer;
use wikidata_mcp::tools::wikidata_registry;

#[derive(Parser, Debug)]
#[command(name = "wikidata-mcp")]
#[command(about = "MCP server for querying Wikidata", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "WIKIDATA_MCP_CONFIG", default_value = "wikidata-mcp.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wikidata_mcp=info,wikidata_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Wikidata MCP Server starting...");

    let config = WikidataConfig::load(&args.config).context("Failed to load configuration")?;
    tracing::info!(api = %config.api_url, sparql = %config.sparql_url, "Using Wikidata endpoints");

    let client = WikidataClient::from_config(config).context("Failed to create Wikidata client")?;
    let registry = wikidata_registry(client);

    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    server.start().await?;

    Ok(())
}
