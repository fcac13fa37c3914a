use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a usable payload from the EOD API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// `url` has its query stripped so the API key never reaches logs.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} from {url}")]
    Status { status: reqwest::StatusCode, url: String },
    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{reason} in API response for {ticker} from {start} to {end}")]
    DataShape {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },
}

/// Failure while persisting a record set. The whole call was rolled back.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write to {table}: {source}")]
    Database {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Startup-time problems. These are never caught by the pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable required")]
    Missing(&'static str),
    #[error("failed to load {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("date {year:04}-{month:02}-{day:02} does not exist")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("invalid API base URL {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("invalid database URI: {0}")]
    DatabaseUri(#[source] sqlx::Error),
}

/// Anything that abandons a single ticker/window step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Malformed(String),
    #[error("{0}")]
    Transport(String),
    #[error(transparent)]
    Write(#[from] WriteError),
}
