use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fontscout_common::observability::{init_logging, LogConfig};
use fontscout_config::{FontscoutConfig, FontscoutConfigLoader};
use fontscout_core::{Discoverer, DiscoverySettings, NullProgress};
use fontscout_http::{HttpFetcher, DEFAULT_USER_AGENT};
use fontscout_store::{SiteStore, SqliteStore};

mod server;

#[derive(Parser)]
#[command(name = "fontscout", about = "Discover the fonts a web site uses")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "fontscout.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one discovery and print the result as JSON.
    Discover { url: String },
    /// Serve the HTTP API: POST /discover, GET /progress.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = FontscoutConfigLoader::new().with_file(&cli.config).load()?;
    init_logging(LogConfig {
        emit_stderr: true,
        ..LogConfig::default()
    })?;

    match cli.command {
        Command::Discover { url } => discover_once(cfg, &url).await,
        Command::Serve => server::serve(cfg).await,
    }
}

/// Wire the reqwest fetcher and configured timeouts into an orchestrator.
fn build_discoverer(cfg: &FontscoutConfig, store: Arc<dyn SiteStore>) -> Result<Discoverer> {
    let user_agent = cfg
        .http
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    let fetcher = HttpFetcher::new(&user_agent, cfg.http.max_redirects)?;

    Ok(
        Discoverer::new(Arc::new(fetcher), store).with_settings(DiscoverySettings {
            page_timeout: Duration::from_secs(cfg.http.page_timeout_secs),
            stylesheet_timeout: Duration::from_secs(cfg.http.stylesheet_timeout_secs),
            verify_tls: cfg.http.verify_tls,
        }),
    )
}

async fn discover_once(cfg: FontscoutConfig, url: &str) -> Result<()> {
    let store = Arc::new(SqliteStore::connect(&cfg.store.database_url).await?);
    let discoverer = build_discoverer(&cfg, store)?;

    let result = discoverer.discover(url, &NullProgress).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
