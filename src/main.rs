//! judgeval-mcp - MCP server for the Judgment evaluation platform.

use clap::{Parser, Subcommand};
use judgeval_mcp::client::{JudgmentApi, JudgmentClient};
use judgeval_mcp::config::Config;
use judgeval_mcp::mcp::{get_tools, McpServer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "judgeval-mcp")]
#[command(about = "MCP server exposing Judgment evaluation platform tools to AI assistants")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server over stdio
    Mcp,

    /// Validate credentials and API reachability
    Validate,

    /// Print the exposed tool list as JSON
    Tools,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    // Default locations
    let candidates = [
        Config::default_path(),
        Some(PathBuf::from("/etc/judgeval-mcp/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    Config::default_path().unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr only; stdout belongs to the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = get_config_path(cli.config);
    let config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Mcp => {
            let server = McpServer::new(&config);
            server.run().await?;
        }
        Commands::Validate => {
            cmd_validate(config).await?;
        }
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&get_tools())?);
        }
    }

    Ok(())
}

async fn cmd_validate(config: Config) -> anyhow::Result<()> {
    let api_key = match config.resolve_api_key() {
        Some(key) => key,
        None => {
            eprintln!("FAILED: no API key (set JUDGMENT_API_KEY or add api_key to the config file)");
            std::process::exit(1);
        }
    };

    println!("API key: present");

    let client = JudgmentClient::from_config(&config, api_key);
    print!("API at {}: ", config.base_url);

    match client.health().await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED - {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
