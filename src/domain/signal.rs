//! Crossover signal engine.
//!
//! Delta = SMA(short) - SMA(long). A row fires when the sign of Delta flips
//! relative to the previous row, with zero counting as "above":
//!
//! ```text
//! Delta >= 0 && Prev <  0  → Buy
//! Delta <  0 && Prev >= 0  → Sell
//! otherwise                → None
//! ```
//!
//! The first row has no previous Delta and satisfies neither branch, so it is
//! always `None`.

use crate::domain::error::MacrossError;
use crate::domain::indicator::PricedSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    Buy,
    Sell,
    None,
}

impl Signal {
    /// +1 / -1 / 0, the factor applied to a forward price move.
    pub fn direction(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::None => 0,
        }
    }

    pub fn classify(delta: f64, prev_delta: Option<f64>) -> Self {
        match prev_delta {
            Some(prev) if delta >= 0.0 && prev < 0.0 => Signal::Buy,
            Some(prev) if delta < 0.0 && prev >= 0.0 => Signal::Sell,
            _ => Signal::None,
        }
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.direction()
    }
}

impl TryFrom<i8> for Signal {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Signal::Buy),
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::None),
            other => Err(format!("invalid signal value {other}")),
        }
    }
}

/// One row of a series after the crossover columns are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub time: DateTime<Utc>,
    pub mid_close: f64,
    pub delta: f64,
    pub prev_delta: Option<f64>,
    pub signal: Signal,
}

/// Attach Delta / previous Delta / Signal to every row of `series`.
///
/// Both windows must be columns of the series. O(n) in the series length;
/// the averages themselves are shared, not recomputed.
pub fn generate_signals(
    series: &PricedSeries,
    short: usize,
    long: usize,
) -> Result<Vec<SignalRow>, MacrossError> {
    let short_ma = series
        .average(short)
        .ok_or(MacrossError::InvalidWindow { window: short })?;
    let long_ma = series
        .average(long)
        .ok_or(MacrossError::InvalidWindow { window: long })?;

    let mut rows = Vec::with_capacity(series.len());
    let mut prev_delta = None;

    for ((candle, &s), &l) in series.candles().iter().zip(short_ma).zip(long_ma) {
        let delta = s - l;
        rows.push(SignalRow {
            time: candle.time,
            mid_close: candle.mid_close(),
            delta,
            prev_delta,
            signal: Signal::classify(delta, prev_delta),
        });
        prev_delta = Some(delta);
    }

    Ok(rows)
}
