use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use tacs_models::{MarketSnapshot, TacsConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tacs", about = "Trading Agent Coordination System")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/tacs.toml")]
    config: String,

    /// Read MarketSnapshot JSON from a file instead of stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Prefer the synchronous fast path when the snapshot qualifies
    #[arg(long)]
    fast_path: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config
    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: TacsConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse config")?;

    // Read snapshot
    let snapshot_json = if let Some(input_path) = &cli.input {
        std::fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read input: {input_path}"))?
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    };

    let snapshot: MarketSnapshot =
        serde_json::from_str(&snapshot_json).context("Failed to parse MarketSnapshot JSON")?;

    // Spawn the coordinator and decide
    let handle = tacs::build_coordinator(&config)
        .await
        .context("Failed to start coordinator")?;

    let decision = tacs::decide(&handle, snapshot, cli.fast_path)
        .await
        .map_err(|e| anyhow::anyhow!("Decision failed: {e}"))?;

    let _ = handle.shutdown().await;

    // Output decision as JSON to stdout
    let output = if cli.pretty {
        serde_json::to_string_pretty(&decision)?
    } else {
        serde_json::to_string(&decision)?
    };
    println!("{output}");

    Ok(())
}
