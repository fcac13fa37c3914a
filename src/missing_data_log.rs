use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::Window;

/// One window for which nothing was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingDataEntry {
    pub ticker: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MissingDataEntry {
    pub fn new(ticker: &str, window: &Window, error: Option<String>) -> Self {
        Self {
            ticker: ticker.to_string(),
            start_date: window.start_date.to_string(),
            end_date: window.end_date.to_string(),
            error,
        }
    }
}

/// Write-only record of empty and failed windows, flushed once per run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingDataLog {
    pub missing_stock_data: Vec<MissingDataEntry>,
    pub missing_news_data: Vec<MissingDataEntry>,
}

impl MissingDataLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_missing_stock(&mut self, ticker: &str, window: &Window) {
        self.missing_stock_data
            .push(MissingDataEntry::new(ticker, window, None));
    }

    pub fn record_missing_news(&mut self, ticker: &str, window: &Window) {
        self.missing_news_data
            .push(MissingDataEntry::new(ticker, window, None));
    }

    /// Failed windows always land in `missing_stock_data`, whichever step failed.
    pub fn record_failure(&mut self, ticker: &str, window: &Window, error: impl ToString) {
        self.missing_stock_data
            .push(MissingDataEntry::new(ticker, window, Some(error.to_string())));
    }

    pub fn failure_count(&self) -> usize {
        self.missing_stock_data
            .iter()
            .filter(|entry| entry.error.is_some())
            .count()
    }

    /// JSON with four-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_json(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
