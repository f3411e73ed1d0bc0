//! series: polls JSON endpoints into bounded in-memory sample histories.
//!
//! Run with:  `RUST_LOG=info series --config ./series.toml`

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "series", version, about)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/series/series.toml).
    #[arg(short, long, env = "SERIES_CONFIG")]
    config: Option<PathBuf>,

    /// Poll every source once, print the report and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(series_config::default_path);

    tracing::info!(
        "series v{} starting (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    if cli.once {
        for line in series_runtime::run_once(&config_path).await? {
            println!("{line}");
        }
        return Ok(());
    }

    series_runtime::run(&config_path).await.map_err(Into::into)
}
