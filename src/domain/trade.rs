//! Trade extraction from crossover signals.
//!
//! Every non-`None` signal row becomes a trade. A trade is settled against the
//! mid close of the next trade row; the last trade has nothing to settle
//! against and gets a zero move.
//!
//! gain (pips) = (next mid close - this mid close) / pip_scale * direction

use crate::domain::instrument::Instrument;
use crate::domain::signal::{Signal, SignalRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub time: DateTime<Utc>,
    pub pair: String,
    pub granularity: String,
    pub ma_short: usize,
    pub ma_long: usize,
    pub cross: String,
    pub mid_close: f64,
    pub delta: f64,
    pub prev_delta: Option<f64>,
    pub signal: Signal,
    /// Forward mid-close difference to the next trade row.
    pub diff: f64,
    pub gain: f64,
    pub gain_cumulative: f64,
}

/// `"<short>_<long>"`, the label shared by trades and summaries.
pub fn cross_label(short: usize, long: usize) -> String {
    format!("{}_{}", short, long)
}

pub fn extract_trades(
    rows: &[SignalRow],
    instrument: &Instrument,
    granularity: &str,
    short: usize,
    long: usize,
) -> Vec<TradeRecord> {
    let signalled: Vec<&SignalRow> = rows.iter().filter(|r| r.signal != Signal::None).collect();
    let pip_scale = instrument.pip_scale();
    let cross = cross_label(short, long);

    let mut trades = Vec::with_capacity(signalled.len());
    let mut cumulative = 0.0;

    for (i, row) in signalled.iter().enumerate() {
        let diff = signalled
            .get(i + 1)
            .map(|next| next.mid_close - row.mid_close)
            .unwrap_or(0.0);
        let gain = diff / pip_scale * f64::from(row.signal.direction());
        cumulative += gain;

        trades.push(TradeRecord {
            time: row.time,
            pair: instrument.name.clone(),
            granularity: granularity.to_string(),
            ma_short: short,
            ma_long: long,
            cross: cross.clone(),
            mid_close: row.mid_close,
            delta: row.delta,
            prev_delta: row.prev_delta,
            signal: row.signal,
            diff,
            gain,
            gain_cumulative: cumulative,
        });
    }

    trades
}
