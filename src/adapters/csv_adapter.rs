//! CSV file price store.
//!
//! One file per series: `<base>/<PAIR>_<GRANULARITY>.csv` with columns
//! `time,volume,mid_o,mid_h,mid_l,mid_c,bid_o,...,ask_c`. Bid and ask columns
//! are blank when the side was not fetched.

use crate::domain::candle::{Candle, Ohlc};
use crate::domain::error::MacrossError;
use crate::ports::price_port::PricePort;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CandleRow {
    time: DateTime<Utc>,
    volume: i64,
    mid_o: f64,
    mid_h: f64,
    mid_l: f64,
    mid_c: f64,
    bid_o: Option<f64>,
    bid_h: Option<f64>,
    bid_l: Option<f64>,
    bid_c: Option<f64>,
    ask_o: Option<f64>,
    ask_h: Option<f64>,
    ask_l: Option<f64>,
    ask_c: Option<f64>,
}

fn side(o: Option<f64>, h: Option<f64>, l: Option<f64>, c: Option<f64>) -> Option<Ohlc> {
    Some(Ohlc {
        o: o?,
        h: h?,
        l: l?,
        c: c?,
    })
}

impl From<CandleRow> for Candle {
    fn from(row: CandleRow) -> Self {
        Candle {
            time: row.time,
            volume: row.volume,
            mid: Ohlc {
                o: row.mid_o,
                h: row.mid_h,
                l: row.mid_l,
                c: row.mid_c,
            },
            bid: side(row.bid_o, row.bid_h, row.bid_l, row.bid_c),
            ask: side(row.ask_o, row.ask_h, row.ask_l, row.ask_c),
        }
    }
}

impl From<&Candle> for CandleRow {
    fn from(candle: &Candle) -> Self {
        CandleRow {
            time: candle.time,
            volume: candle.volume,
            mid_o: candle.mid.o,
            mid_h: candle.mid.h,
            mid_l: candle.mid.l,
            mid_c: candle.mid.c,
            bid_o: candle.bid.map(|b| b.o),
            bid_h: candle.bid.map(|b| b.h),
            bid_l: candle.bid.map(|b| b.l),
            bid_c: candle.bid.map(|b| b.c),
            ask_o: candle.ask.map(|a| a.o),
            ask_h: candle.ask.map(|a| a.h),
            ask_l: candle.ask.map(|a| a.l),
            ask_c: candle.ask.map(|a| a.c),
        }
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, pair: &str, granularity: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", pair, granularity))
    }

    /// Replace the stored series for `pair` at `granularity`.
    pub fn write_series(
        &self,
        pair: &str,
        granularity: &str,
        candles: &[Candle],
    ) -> Result<PathBuf, MacrossError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.csv_path(pair, granularity);
        let dataset_err = |e: csv::Error| MacrossError::Dataset {
            file: path.display().to_string(),
            reason: e.to_string(),
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(dataset_err)?;
        for candle in candles {
            wtr.serialize(CandleRow::from(candle)).map_err(dataset_err)?;
        }
        wtr.flush()?;
        Ok(path)
    }
}

impl PricePort for CsvAdapter {
    fn read_series(&self, pair: &str, granularity: &str) -> Result<Vec<Candle>, MacrossError> {
        let path = self.csv_path(pair, granularity);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MacrossError::MissingSeries {
                    pair: pair.to_string(),
                    granularity: granularity.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut rdr = csv::Reader::from_reader(file);
        let mut candles = Vec::new();

        for (i, result) in rdr.deserialize::<CandleRow>().enumerate() {
            let row = result.map_err(|e| MacrossError::Dataset {
                file: path.display().to_string(),
                reason: format!("row {}: {}", i + 1, e),
            })?;
            candles.push(Candle::from(row));
        }

        candles.sort_by_key(|c| c.time);
        Ok(candles)
    }
}
