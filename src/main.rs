use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eod_pipeline::cli::Cli;
use eod_pipeline::data_collector::run_from_config;
use eod_pipeline::models::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("eod_pipeline=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let loaded = match &cli.env_file {
        Some(path) => Config::from_env_file(path),
        None => Config::from_env(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    cli.apply(&mut config);
    info!("📋 Configuration loaded: {} tickers", config.tickers.len());

    let report = run_from_config(&config).await?;
    if report.failed_windows > 0 {
        info!(
            "See {} for {} failed windows",
            config.missing_data_log_path.display(),
            report.failed_windows
        );
    }

    Ok(())
}
