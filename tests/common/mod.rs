#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
pub use macross::domain::candle::{Candle, Ohlc};
use macross::domain::error::MacrossError;
use macross::domain::instrument::{Instrument, InstrumentCatalog};
use macross::domain::result::ResultSummary;
use macross::domain::sweep::SweepConfig;
use macross::domain::trade::TradeRecord;
use macross::ports::dataset_port::{DatasetPort, DatasetSizes};
use macross::ports::price_port::PricePort;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory price store keyed by `(pair, granularity)`. Every lookup is
/// recorded so tests can check which series a sweep touched.
pub struct MockPricePort {
    pub data: HashMap<(String, String), Vec<Candle>>,
    pub requests: RefCell<Vec<(String, String)>>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, pair: &str, granularity: &str, candles: Vec<Candle>) -> Self {
        self.data
            .insert((pair.to_string(), granularity.to_string()), candles);
        self
    }

    pub fn requested(&self) -> Vec<(String, String)> {
        self.requests.borrow().clone()
    }
}

impl PricePort for MockPricePort {
    fn read_series(&self, pair: &str, granularity: &str) -> Result<Vec<Candle>, MacrossError> {
        let key = (pair.to_string(), granularity.to_string());
        self.requests.borrow_mut().push(key.clone());
        self.data
            .get(&key)
            .cloned()
            .ok_or_else(|| MacrossError::MissingSeries {
                pair: pair.to_string(),
                granularity: granularity.to_string(),
            })
    }
}

/// Dataset port that keeps appended rows in memory.
#[derive(Default)]
pub struct MockDatasetPort {
    pub summaries: RefCell<Vec<ResultSummary>>,
    pub trades: RefCell<Vec<TradeRecord>>,
    pub appends: RefCell<usize>,
}

impl MockDatasetPort {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatasetPort for MockDatasetPort {
    fn append(
        &self,
        summaries: &[ResultSummary],
        trades: &[TradeRecord],
    ) -> Result<DatasetSizes, MacrossError> {
        *self.appends.borrow_mut() += 1;
        let mut stored_summaries = self.summaries.borrow_mut();
        let mut stored_trades = self.trades.borrow_mut();
        stored_summaries.extend_from_slice(summaries);
        stored_trades.extend_from_slice(trades);
        Ok(DatasetSizes {
            summaries: stored_summaries.len(),
            trades: stored_trades.len(),
        })
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
}

/// Hourly candles with the given mid closes, starting at [`start_time`].
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            time: start_time() + Duration::hours(i as i64),
            volume: 100,
            mid: Ohlc::flat(close),
            bid: None,
            ask: None,
        })
        .collect()
}

pub fn instrument(name: &str, pip_location: i32) -> Instrument {
    Instrument {
        name: name.to_string(),
        kind: "CURRENCY".to_string(),
        display_name: name.replace('_', "/"),
        pip_location,
        display_precision: 5,
        trade_units_precision: 0,
        margin_rate: 0.05,
    }
}

pub fn catalog(names: &[(&str, i32)]) -> InstrumentCatalog {
    InstrumentCatalog::new(names.iter().map(|&(name, pip)| instrument(name, pip)))
}

pub fn sweep_config(
    currencies: &[&str],
    granularities: &[&str],
    ma_long: &[usize],
    ma_short: &[usize],
) -> SweepConfig {
    SweepConfig {
        currencies: currencies.iter().map(|s| s.to_string()).collect(),
        granularities: granularities.iter().map(|s| s.to_string()).collect(),
        ma_long: ma_long.to_vec(),
        ma_short: ma_short.to_vec(),
    }
}

/// A zig-zag series that produces crossovers for small windows.
pub fn oscillating_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| if (i / 3) % 2 == 0 { 1.0 + i as f64 * 0.001 } else { 1.05 })
        .collect()
}
