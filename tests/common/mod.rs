#![allow(dead_code)]

use chrono::NaiveDate;
use equitrace::domain::error::AnalyticsError;
pub use equitrace::domain::price::PricePoint;
pub use equitrace::domain::weights::WeightRule;
use equitrace::ports::data_port::DataPort;

#[derive(Default)]
pub struct MockDataPort {
    pub prices: Vec<PricePoint>,
    pub rules: Vec<WeightRule>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(mut self, prices: Vec<PricePoint>) -> Self {
        self.prices.extend(prices);
        self
    }

    pub fn with_rule(mut self, valid_from: NaiveDate, ticker: &str, weight: f64) -> Self {
        self.rules.push(WeightRule::new(valid_from, ticker, weight));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), AnalyticsError> {
        match &self.error {
            Some(reason) => Err(AnalyticsError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(&self) -> Result<Vec<PricePoint>, AnalyticsError> {
        self.check()?;
        Ok(self.prices.clone())
    }

    fn fetch_weight_schedule(&self) -> Result<Vec<WeightRule>, AnalyticsError> {
        self.check()?;
        Ok(self.rules.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(start: NaiveDate, offset: usize) -> NaiveDate {
    start + chrono::Duration::days(offset as i64)
}

/// `count` prices starting at `start_price`, compounding by `daily` each day.
pub fn generate_prices(
    ticker: &str,
    start: NaiveDate,
    count: usize,
    start_price: f64,
    daily: f64,
) -> Vec<PricePoint> {
    (0..count)
        .map(|i| {
            PricePoint::new(
                day(start, i),
                ticker,
                start_price * (1.0 + daily).powi(i as i32),
            )
        })
        .collect()
}

/// Prices reproducing the given daily returns, starting at 100.
pub fn prices_from_returns(ticker: &str, start: NaiveDate, returns: &[f64]) -> Vec<PricePoint> {
    let mut close = 100.0;
    let mut prices = vec![PricePoint::new(start, ticker, close)];
    for (i, r) in returns.iter().enumerate() {
        close *= 1.0 + r;
        prices.push(PricePoint::new(day(start, i + 1), ticker, close));
    }
    prices
}

/// Three tickers rising 1% a day for `count` days, weighted 0.4/0.35/0.25.
pub fn three_ticker_port(start: NaiveDate, count: usize) -> MockDataPort {
    MockDataPort::new()
        .with_prices(generate_prices("A", start, count, 100.0, 0.01))
        .with_prices(generate_prices("B", start, count, 50.0, 0.01))
        .with_prices(generate_prices("C", start, count, 20.0, 0.01))
        .with_rule(start, "A", 0.4)
        .with_rule(start, "B", 0.35)
        .with_rule(start, "C", 0.25)
}

pub fn prices_csv(prices: &[PricePoint]) -> String {
    let mut out = String::from("date,close,ticker\n");
    for p in prices {
        out.push_str(&format!("{},{},{}\n", p.date, p.close, p.ticker));
    }
    out
}

pub fn weights_csv(rules: &[WeightRule]) -> String {
    let mut out = String::from("valid_from,ticker,weight\n");
    for r in rules {
        out.push_str(&format!("{},{},{}\n", r.valid_from, r.ticker, r.weight));
    }
    out
}
