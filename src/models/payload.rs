//! Wire shapes of the EOD Historical Data responses.
//!
//! Every field is optional; defaults for absent keys are applied when a raw
//! entry is turned into a [`StockBar`] or [`NewsRecord`].

use serde::Deserialize;

use super::{NewsRecord, StockBar};
use crate::utils::parse_timestamp;

/// Columns a price-history payload must carry in at least one entry
pub const BAR_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// One entry of `/eod/{ticker}.{exchange}`
#[derive(Debug, Default, Deserialize)]
pub struct RawBar {
    pub date: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    pub fn into_bar(self, ticker: &str) -> StockBar {
        StockBar {
            ticker: ticker.to_string(),
            time: self.date.as_deref().and_then(parse_timestamp),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume.map(|v| v.round() as i64),
        }
    }
}

/// One article of `/news`
#[derive(Debug, Default, Deserialize)]
pub struct RawArticle {
    pub date: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub link: Option<String>,
    pub symbols: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub sentiment: Option<RawSentiment>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSentiment {
    pub polarity: Option<f64>,
    pub neg: Option<f64>,
    pub neu: Option<f64>,
    pub pos: Option<f64>,
}

impl RawArticle {
    pub fn into_record(self, ticker: &str) -> NewsRecord {
        let sentiment = self.sentiment.unwrap_or_default();
        NewsRecord {
            ticker: ticker.to_string(),
            time: self.date.as_deref().and_then(parse_timestamp),
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            symbols: join_list(self.symbols),
            tags: join_list(self.tags),
            sentiment_polarity: sentiment.polarity,
            sentiment_neg: sentiment.neg,
            sentiment_neu: sentiment.neu,
            sentiment_pos: sentiment.pos,
        }
    }
}

fn join_list(values: Option<Vec<String>>) -> String {
    values.map(|v| v.join(",")).unwrap_or_default()
}
