mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ttime::analytics::SearchQuery;
use ttime::config::TtimeConfig;
use ttime::server;

#[derive(Parser)]
#[command(name = "ttime", version, about = "Customer sentiment retrieval service")]
struct Cli {
    /// Config file (defaults to $TTIME_CONFIG or ~/.ttime/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server
    Serve {
        /// `http` (RPC + MCP at /mcp) or `stdio` (MCP only)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Manage the local embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Embed a JSON array of feedback items and upsert them into the index
    Import {
        file: PathBuf,
    },
    /// Semantic search over feedback
    Search {
        query: String,
        #[arg(long)]
        platform: Option<String>,
        /// `positive` or `negative`
        #[arg(long)]
        sentiment: Option<String>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Aggregated sentiment statistics
    Stats {
        #[arg(long)]
        platform: Option<String>,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Ask a question about customer feedback
    Ask {
        message: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Locations associated with a topic, as JSON
    Markers {
        query: String,
    },
    /// Dashboard metrics, as JSON
    Metrics {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download e5-base-v2 (ONNX) to the embedding cache directory
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TtimeConfig::load_from(path)?,
        None => TtimeConfig::load()?,
    };

    // stderr keeps stdout clean for MCP JSON-RPC over stdio
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            match transport.as_str() {
                "http" => server::serve_http(config).await?,
                "stdio" => server::serve_stdio(config).await?,
                other => anyhow::bail!("unknown transport: {other}. Supported: http, stdio"),
            }
        }
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
        Command::Import { file } => cli::import::import(&config, &file).await?,
        Command::Search {
            query,
            platform,
            sentiment,
            days,
            limit,
        } => {
            let params = SearchQuery {
                query,
                platform,
                sentiment,
                timeframe_days: days,
                limit: Some(limit),
            };
            cli::search::search(&config, params).await?;
        }
        Command::Stats { platform, days } => {
            cli::stats::stats(&config, platform.as_deref(), days).await?;
        }
        Command::Ask {
            message,
            start,
            end,
        } => cli::query::ask(&config, &message, start.as_deref(), end.as_deref()).await?,
        Command::Markers { query } => cli::query::markers(&config, &query).await?,
        Command::Metrics { start, end } => {
            cli::query::metrics(&config, start.as_deref(), end.as_deref()).await?;
        }
    }

    Ok(())
}
