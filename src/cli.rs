use clap::Parser;
use std::path::PathBuf;

use crate::models::{parse_tickers, Config};

#[derive(Parser, Debug)]
#[command(
    name = "eod-pipeline",
    about = "📈 Monthly EOD price and news ingestion into QuestDB",
    long_about = "Fetches daily bars and news for each configured ticker, one calendar month at a time, \
                  writes them to QuestDB and records empty or failed months in a JSON log. \
                  Settings come from the environment or a .env file."
)]
pub struct Cli {
    /// Load settings from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Comma-separated tickers, overriding TICKERS
    #[arg(long, value_name = "LIST")]
    pub tickers: Option<String>,

    /// Where to write the missing-data log, overriding MISSING_DATA_LOG_PATH
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,
}

impl Cli {
    pub fn apply(&self, config: &mut Config) {
        if let Some(tickers) = self.tickers.as_deref().and_then(parse_tickers) {
            config.tickers = tickers;
        }
        if let Some(path) = &self.log_path {
            config.missing_data_log_path = path.clone();
        }
    }
}
