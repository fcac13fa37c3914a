use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{FetchOutcome, MarketDataSource};
use crate::error::{ConfigError, FetchError};
use crate::models::payload::{RawArticle, RawBar, BAR_COLUMNS};
use crate::models::{Config, NewsRecord, StockBar};

/// Client for the EOD Historical Data REST API
pub struct EodClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl EodClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Self::with_base_url(&config.eod_base_url, &config.eod_api_key, config.http_timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::BaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let mut builder = Client::builder().user_agent("eod-pipeline/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value, FetchError> {
        let mut shown = url.clone();
        shown.set_query(None);
        debug!("GET {}", shown);

        let transport = |source: reqwest::Error| FetchError::Transport {
            url: shown.to_string(),
            source: source.without_url(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: shown.to_string(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Daily OHLCV bars for `ticker` on `exchange`, both dates inclusive
    pub async fn daily_bars(
        &self,
        ticker: &str,
        exchange: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<StockBar>, FetchError> {
        let mut url = self.endpoint(&["eod", &format!("{}.{}", ticker, exchange)]);
        url.query_pairs_mut()
            .append_pair("api_token", &self.api_key)
            .append_pair("from", &from_date.to_string())
            .append_pair("to", &to_date.to_string())
            .append_pair("period", "d")
            .append_pair("fmt", "json");

        let payload = self.get_json(url).await?;
        normalize_bars(ticker, from_date, to_date, payload)
    }

    /// News articles mentioning `ticker` published between the two dates
    pub async fn news(
        &self,
        ticker: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<NewsRecord>, FetchError> {
        let mut url = self.endpoint(&["news"]);
        url.query_pairs_mut()
            .append_pair("s", ticker)
            .append_pair("from", &from_date.to_string())
            .append_pair("to", &to_date.to_string())
            .append_pair("api_token", &self.api_key)
            .append_pair("fmt", "json");

        let payload = self.get_json(url).await?;
        normalize_news(ticker, from_date, to_date, payload)
    }
}

#[async_trait]
impl MarketDataSource for EodClient {
    async fn fetch_daily_bars(
        &self,
        ticker: &str,
        exchange: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> FetchOutcome<StockBar> {
        self.daily_bars(ticker, exchange, from_date, to_date).await.into()
    }

    async fn fetch_news(
        &self,
        ticker: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> FetchOutcome<NewsRecord> {
        self.news(ticker, from_date, to_date).await.into()
    }
}

/// Anything other than a non-empty array means "no data for this window".
fn non_empty_entries(payload: Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(entries) if !entries.is_empty() => Some(entries),
        _ => None,
    }
}

pub fn normalize_bars(
    ticker: &str,
    from_date: NaiveDate,
    to_date: NaiveDate,
    payload: Value,
) -> Result<Vec<StockBar>, FetchError> {
    let Some(entries) = non_empty_entries(payload) else {
        return Ok(Vec::new());
    };
    let shape_error = |reason: String| FetchError::DataShape {
        ticker: ticker.to_string(),
        start: from_date,
        end: to_date,
        reason,
    };

    for column in BAR_COLUMNS {
        if !entries.iter().any(|entry| entry.get(column).is_some()) {
            return Err(shape_error(format!("'{}' column missing", column)));
        }
    }

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<RawBar>(entry)
                .map(|raw| raw.into_bar(ticker))
                .map_err(|e| shape_error(format!("unreadable price entry ({})", e)))
        })
        .collect()
}

pub fn normalize_news(
    ticker: &str,
    from_date: NaiveDate,
    to_date: NaiveDate,
    payload: Value,
) -> Result<Vec<NewsRecord>, FetchError> {
    let Some(entries) = non_empty_entries(payload) else {
        return Ok(Vec::new());
    };

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<RawArticle>(entry)
                .map(|raw| raw.into_record(ticker))
                .map_err(|e| FetchError::DataShape {
                    ticker: ticker.to_string(),
                    start: from_date,
                    end: to_date,
                    reason: format!("unreadable news article ({})", e),
                })
        })
        .collect()
}
