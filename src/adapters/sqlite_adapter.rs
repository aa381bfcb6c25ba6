//! SQLite data adapter.
//!
//! Reads the `prices` and `weights` tables of an analytics database. Dates
//! are stored as `YYYY-MM-DD` text; a trailing time component is ignored.

use crate::adapters::csv_adapter::parse_date;
use crate::domain::config_validation;
use crate::domain::error::AnalyticsError;
use crate::domain::price::PricePoint;
use crate::domain::weights::WeightRule;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn source_err(e: r2d2::Error) -> AnalyticsError {
    AnalyticsError::DataSource {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> AnalyticsError {
    AnalyticsError::DataQuery {
        reason: e.to_string(),
    }
}

/// Convert a date parse failure into a rusqlite row error.
fn row_date(text: String) -> rusqlite::Result<chrono::NaiveDate> {
    parse_date(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            text.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AnalyticsError> {
        let db_path =
            config
                .get_path("sqlite", "path")
                .ok_or_else(|| AnalyticsError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config_validation::pool_size(config)?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(source_err)?;

        debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, AnalyticsError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(source_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, AnalyticsError> {
        self.pool.get().map_err(source_err)
    }

    pub fn initialize_schema(&self) -> Result<(), AnalyticsError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    date TEXT NOT NULL,
                    ticker TEXT NOT NULL,
                    close REAL
                );
                CREATE INDEX IF NOT EXISTS idx_prices_ticker_date ON prices(ticker, date);
                CREATE TABLE IF NOT EXISTS weights (
                    valid_from TEXT NOT NULL,
                    ticker TEXT NOT NULL,
                    weight REAL NOT NULL
                );",
            )
            .map_err(query_err)
    }

    /// Append prices. A NaN close is stored as NULL.
    pub fn insert_prices(&self, prices: &[PricePoint]) -> Result<(), AnalyticsError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        write_prices(&tx, prices)?;
        tx.commit().map_err(query_err)
    }

    pub fn insert_weight_rules(&self, rules: &[WeightRule]) -> Result<(), AnalyticsError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        write_weight_rules(&tx, rules)?;
        tx.commit().map_err(query_err)
    }

    /// Replace the contents of both tables in a single transaction. On any
    /// failure the previous rows are left untouched.
    pub fn replace_all(
        &self,
        prices: &[PricePoint],
        rules: &[WeightRule],
    ) -> Result<(), AnalyticsError> {
        self.initialize_schema()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        tx.execute_batch("DELETE FROM prices; DELETE FROM weights;")
            .map_err(query_err)?;
        write_prices(&tx, prices)?;
        write_weight_rules(&tx, rules)?;
        tx.commit().map_err(query_err)?;

        debug!(
            prices = prices.len(),
            rules = rules.len(),
            "replaced sqlite contents"
        );
        Ok(())
    }
}

fn write_prices(
    tx: &rusqlite::Transaction<'_>,
    prices: &[PricePoint],
) -> Result<(), AnalyticsError> {
    for p in prices {
        let close = if p.close.is_nan() { None } else { Some(p.close) };
        tx.execute(
            "INSERT INTO prices (date, ticker, close) VALUES (?1, ?2, ?3)",
            params![p.date.format("%Y-%m-%d").to_string(), p.ticker, close],
        )
        .map_err(query_err)?;
    }
    Ok(())
}

fn write_weight_rules(
    tx: &rusqlite::Transaction<'_>,
    rules: &[WeightRule],
) -> Result<(), AnalyticsError> {
    for r in rules {
        tx.execute(
            "INSERT INTO weights (valid_from, ticker, weight) VALUES (?1, ?2, ?3)",
            params![r.valid_from.format("%Y-%m-%d").to_string(), r.ticker, r.weight],
        )
        .map_err(query_err)?;
    }
    Ok(())
}

impl DataPort for SqliteAdapter {
    fn fetch_prices(&self) -> Result<Vec<PricePoint>, AnalyticsError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT date, ticker, close FROM prices ORDER BY ticker, date")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                let close: Option<f64> = row.get(2)?;
                Ok(PricePoint {
                    date: row_date(row.get(0)?)?,
                    ticker: row.get(1)?,
                    close: close.unwrap_or(f64::NAN),
                })
            })
            .map_err(query_err)?;

        let prices = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_err)?;
        debug!(rows = prices.len(), "loaded prices from sqlite");
        Ok(prices)
    }

    fn fetch_weight_schedule(&self) -> Result<Vec<WeightRule>, AnalyticsError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT valid_from, ticker, weight FROM weights ORDER BY rowid")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(WeightRule {
                    valid_from: row_date(row.get(0)?)?,
                    ticker: row.get(1)?,
                    weight: row.get(2)?,
                })
            })
            .map_err(query_err)?;

        let rules = rows
            .collect::<rusqlite::Result<Vec<WeightRule>>>()
            .map_err(query_err)?;
        if let Some(bad) = rules.iter().find(|r| !r.weight.is_finite()) {
            return Err(AnalyticsError::InvalidWeight {
                ticker: bad.ticker.clone(),
                valid_from: bad.valid_from,
                weight: bad.weight,
            });
        }
        debug!(rows = rules.len(), "loaded weight schedule from sqlite");
        Ok(rules)
    }

    fn list_tickers(&self) -> Result<Vec<String>, AnalyticsError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM prices ORDER BY ticker")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(query_err)
    }
}
