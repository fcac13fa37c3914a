use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub mod payload;

pub const DEFAULT_BASE_URL: &str = "https://eodhistoricaldata.com/api";
pub const DEFAULT_EXCHANGE: &str = "US";
pub const DEFAULT_LOG_PATH: &str = "missing_data_log.json";

/// Configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub eod_api_key: String,
    pub eod_base_url: String,
    pub tickers: Vec<String>,
    pub exchange: String,
    pub questdb_uri: String,
    pub date_range: DateRangeConfig,
    pub missing_data_log_path: PathBuf,
    pub http_timeout: Option<Duration>,
}

/// Boundaries handed to the month iterator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub start_month: u32,
    pub end_month: u32,
    pub start_day: u32,
    pub end_day: u32,
}

impl DateRangeConfig {
    /// Whole years `start_year..=end_year`, months and days defaulting to 1.
    pub fn years(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
            start_month: 1,
            end_month: 1,
            start_day: 1,
            end_day: 1,
        }
    }
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from the process environment and `path`, never
    /// from `./.env`. Process variables win over the file.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let file = read_env_file(path)?;
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Build a configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let tickers = parse_tickers(&required("TICKERS")?)
            .ok_or_else(|| ConfigError::Invalid {
                var: "TICKERS",
                value: lookup("TICKERS").unwrap_or_default(),
                reason: "no ticker symbols listed".to_string(),
            })?;

        let date_range = DateRangeConfig {
            start_year: parse_number("START_YEAR", &required("START_YEAR")?)?,
            end_year: parse_number("END_YEAR", &required("END_YEAR")?)?,
            start_month: optional_number(&lookup, "START_MONTH", 1)?,
            end_month: optional_number(&lookup, "END_MONTH", 1)?,
            start_day: optional_number(&lookup, "START_DAY", 1)?,
            end_day: optional_number(&lookup, "END_DAY", 1)?,
        };

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_number("HTTP_TIMEOUT_SECS", &raw)?)),
            None => None,
        };

        Ok(Config {
            eod_api_key: required("EOD_API_KEY")?,
            eod_base_url: lookup("EOD_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            tickers,
            exchange: lookup("EXCHANGE").unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
            questdb_uri: required("QUESTDB_URI")?,
            date_range,
            missing_data_log_path: lookup("MISSING_DATA_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            http_timeout,
        })
    }
}

/// Parse a dotenv-style file without touching the process environment
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };
    dotenvy::from_path_iter(path)
        .map_err(env_error)?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(env_error)
}

/// Split a comma-separated ticker list, dropping blanks
pub fn parse_tickers(raw: &str) -> Option<Vec<String>> {
    let tickers: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    (!tickers.is_empty()).then_some(tickers)
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn optional_number<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => parse_number(var, &raw),
        None => Ok(default),
    }
}

/// One calendar month (or the partial first month) of fetch granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Window {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self { start_date, end_date }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start_date, self.end_date)
    }
}

/// One daily OHLCV observation, as stored in `stock_prices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBar {
    pub ticker: String,
    /// `None` when the source date could not be parsed
    pub time: Option<NaiveDateTime>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

/// One news article, flattened for `stock_news`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub ticker: String,
    pub time: Option<NaiveDateTime>,
    pub title: String,
    pub content: String,
    pub link: String,
    pub symbols: String,
    pub tags: String,
    pub sentiment_polarity: Option<f64>,
    pub sentiment_neg: Option<f64>,
    pub sentiment_neu: Option<f64>,
    pub sentiment_pos: Option<f64>,
}

/// Destination tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    StockPrices,
    StockNews,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::StockPrices => "stock_prices",
            Table::StockNews => "stock_news",
        }
    }
}

/// A tabular record set; the variant decides which table it lands in
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    Bars(Vec<StockBar>),
    News(Vec<NewsRecord>),
}

impl RecordSet {
    pub fn table(&self) -> Table {
        match self {
            RecordSet::Bars(_) => Table::StockPrices,
            RecordSet::News(_) => Table::StockNews,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::Bars(rows) => rows.len(),
            RecordSet::News(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable sort by time ascending; rows without a timestamp go last.
    pub fn sort_by_time(&mut self) {
        match self {
            RecordSet::Bars(rows) => rows.sort_by_key(|r| time_sort_key(r.time)),
            RecordSet::News(rows) => rows.sort_by_key(|r| time_sort_key(r.time)),
        }
    }
}

fn time_sort_key(time: Option<NaiveDateTime>) -> (bool, Option<NaiveDateTime>) {
    (time.is_none(), time)
}
