//! Candle representation for one finalized broker bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open/high/low/close for one price side (mid, bid or ask).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
}

impl Ohlc {
    pub fn flat(price: f64) -> Self {
        Self {
            o: price,
            h: price,
            l: price,
            c: price,
        }
    }
}

/// A complete candle. Incomplete candles never reach this type; they are
/// discarded when the broker response is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub volume: i64,
    pub mid: Ohlc,
    pub bid: Option<Ohlc>,
    pub ask: Option<Ohlc>,
}

impl Candle {
    pub fn mid_close(&self) -> f64 {
        self.mid.c
    }
}
