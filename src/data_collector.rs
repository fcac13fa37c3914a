use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::api::{EodClient, FetchOutcome, MarketDataSource};
use crate::database::{QuestDbWriter, RecordSink};
use crate::error::PipelineError;
use crate::missing_data_log::MissingDataLog;
use crate::models::{Config, RecordSet, Window};
use crate::utils::MonthWindows;

/// Totals for one run of the pipeline
#[derive(Debug, Default)]
pub struct RunReport {
    pub windows_processed: usize,
    pub bars_written: usize,
    pub articles_written: usize,
    pub failed_windows: usize,
    pub log: MissingDataLog,
}

/// Sequential tickers × months ingestion loop
pub struct Pipeline<S, W> {
    source: S,
    sink: W,
    tickers: Vec<String>,
    exchange: String,
    windows: MonthWindows,
}

impl<S, W> Pipeline<S, W>
where
    S: MarketDataSource,
    W: RecordSink,
{
    pub fn new(
        source: S,
        sink: W,
        tickers: Vec<String>,
        exchange: impl Into<String>,
        windows: MonthWindows,
    ) -> Self {
        Self {
            source,
            sink,
            tickers,
            exchange: exchange.into(),
            windows,
        }
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Process every ticker over every window. Per-window failures are logged
    /// and recorded, never returned.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        for ticker in &self.tickers {
            info!("📈 Processing ticker: {}", ticker);
            for window in self.windows.clone() {
                report.windows_processed += 1;
                if let Err(e) = self.process_window(ticker, &window, &mut report).await {
                    error!("❌ Error processing {} from {}: {}", ticker, window, e);
                    report.log.record_failure(ticker, &window, &e);
                }
            }
        }

        report.failed_windows = report.log.failure_count();
        report
    }

    /// Stock step then news step. Rows committed by the stock step stay
    /// committed if the news step fails.
    async fn process_window(
        &self,
        ticker: &str,
        window: &Window,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        info!("Fetching stock data for {} from {}...", ticker, window);
        let bars = self
            .source
            .fetch_daily_bars(ticker, &self.exchange, window.start_date, window.end_date)
            .await;
        match into_records(bars)? {
            Some(bars) => {
                report.bars_written += self.sink.write_records(RecordSet::Bars(bars)).await?;
            }
            None => {
                warn!("⚠️ No stock data for {} from {}", ticker, window);
                report.log.record_missing_stock(ticker, window);
            }
        }

        info!("Fetching news data for {} from {}...", ticker, window);
        let news = self
            .source
            .fetch_news(ticker, window.start_date, window.end_date)
            .await;
        match into_records(news)? {
            Some(articles) => {
                report.articles_written += self.sink.write_records(RecordSet::News(articles)).await?;
            }
            None => {
                warn!("⚠️ No news data for {} from {}", ticker, window);
                report.log.record_missing_news(ticker, window);
            }
        }

        Ok(())
    }
}

fn into_records<T>(outcome: FetchOutcome<T>) -> Result<Option<Vec<T>>, PipelineError> {
    match outcome {
        FetchOutcome::Records(records) => Ok(Some(records)),
        FetchOutcome::Empty => Ok(None),
        FetchOutcome::Malformed(reason) => Err(PipelineError::Malformed(reason)),
        FetchOutcome::TransportFailure(reason) => Err(PipelineError::Transport(reason)),
    }
}

/// Build the client, writer and month iterator from `config`, run the
/// pipeline, then flush the missing-data log. Only configuration problems and
/// a failed log write are returned as errors.
pub async fn run_from_config(config: &Config) -> Result<RunReport> {
    let windows = MonthWindows::new(config.date_range)?;
    let client = EodClient::new(config)?;
    let writer = QuestDbWriter::connect_lazy(&config.questdb_uri)?;

    info!(
        "🚀 Ingesting {} tickers on {} from {}-{:02}-{:02}",
        config.tickers.len(),
        config.exchange,
        config.date_range.start_year,
        config.date_range.start_month,
        config.date_range.start_day
    );

    let pipeline = Pipeline::new(
        client,
        writer,
        config.tickers.clone(),
        config.exchange.clone(),
        windows,
    );
    let report = pipeline.run().await;
    pipeline.sink().close().await;

    report.log.write_to(&config.missing_data_log_path)?;
    debug!("Missing-data log written to {}", config.missing_data_log_path.display());

    info!(
        "✅ Data pipeline completed: {} windows, {} bars, {} articles, {} failed",
        report.windows_processed, report.bars_written, report.articles_written, report.failed_windows
    );
    Ok(report)
}
