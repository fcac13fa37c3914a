use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::error::{ConfigError, WriteError};
use crate::models::RecordSet;
use crate::utils::format_timestamp;

const INSERT_STOCK_PRICE: &str = r#"
    INSERT INTO stock_prices (ticker, time, open, high, low, close, volume)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

const INSERT_STOCK_NEWS: &str = r#"
    INSERT INTO stock_news (
        ticker, time, title, content, link, symbols, tags,
        sentiment_polarity, sentiment_neg, sentiment_neu, sentiment_pos
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
"#;

/// Destination for normalized record sets
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSink {
    /// Persist the whole set atomically; returns the number of rows written.
    async fn write_records(&self, records: RecordSet) -> Result<usize, WriteError>;
}

/// QuestDB writer speaking the PostgreSQL wire protocol
#[derive(Clone)]
pub struct QuestDbWriter {
    pool: PgPool,
}

impl QuestDbWriter {
    /// Validate the URI and build the pool; connections open on first write.
    pub fn connect_lazy(database_uri: &str) -> Result<Self, ConfigError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(database_uri)
            .map_err(ConfigError::DatabaseUri)?;
        info!("💾 Database pool configured");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }
}

#[async_trait]
impl RecordSink for QuestDbWriter {
    async fn write_records(&self, records: RecordSet) -> Result<usize, WriteError> {
        let table = records.table().name();
        let db_error = move |source: sqlx::Error| WriteError::Database { table, source };
        let records = insertion_order(records);

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        match &records {
            RecordSet::Bars(rows) => {
                for bar in rows {
                    sqlx::query(INSERT_STOCK_PRICE)
                        .bind(bar.ticker.as_str())
                        .bind(bar.time.as_ref().map(format_timestamp))
                        .bind(bar.open)
                        .bind(bar.high)
                        .bind(bar.low)
                        .bind(bar.close)
                        .bind(bar.volume)
                        .execute(&mut tx)
                        .await
                        .map_err(db_error)?;
                }
            }
            RecordSet::News(rows) => {
                for article in rows {
                    sqlx::query(INSERT_STOCK_NEWS)
                        .bind(article.ticker.as_str())
                        .bind(article.time.as_ref().map(format_timestamp))
                        .bind(article.title.as_str())
                        .bind(article.content.as_str())
                        .bind(article.link.as_str())
                        .bind(article.symbols.as_str())
                        .bind(article.tags.as_str())
                        .bind(article.sentiment_polarity)
                        .bind(article.sentiment_neg)
                        .bind(article.sentiment_neu)
                        .bind(article.sentiment_pos)
                        .execute(&mut tx)
                        .await
                        .map_err(db_error)?;
                }
            }
        }
        tx.commit().await.map_err(db_error)?;

        debug!("Inserted {} rows into {}", records.len(), table);
        Ok(records.len())
    }
}

/// Time ascending, untimed rows last; ties keep their API order.
fn insertion_order(mut records: RecordSet) -> RecordSet {
    records.sort_by_time();
    records
}
