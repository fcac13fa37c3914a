use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchError;
use crate::models::{NewsRecord, StockBar};

pub mod eod_client;
pub use eod_client::EodClient;

/// What a single fetch produced, as the pipeline sees it
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Records(Vec<T>),
    /// The API answered with no data for the window
    Empty,
    /// Non-empty payload that could not be normalized
    Malformed(String),
    /// Network error, non-2xx status or unreadable body
    TransportFailure(String),
}

impl<T> From<Result<Vec<T>, FetchError>> for FetchOutcome<T> {
    fn from(result: Result<Vec<T>, FetchError>) -> Self {
        match result {
            Ok(records) if records.is_empty() => FetchOutcome::Empty,
            Ok(records) => FetchOutcome::Records(records),
            Err(e @ FetchError::DataShape { .. }) => FetchOutcome::Malformed(e.to_string()),
            Err(e) => FetchOutcome::TransportFailure(e.to_string()),
        }
    }
}

/// Source of daily bars and news for one ticker over one date range
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource {
    async fn fetch_daily_bars(
        &self,
        ticker: &str,
        exchange: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> FetchOutcome<StockBar>;

    async fn fetch_news(
        &self,
        ticker: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> FetchOutcome<NewsRecord>;
}
