//! Per-combination result of one crossover evaluation.

use crate::domain::trade::{cross_label, TradeRecord};
use serde::{Deserialize, Serialize};

/// Aggregate row for one (pair, granularity, short, long) combination.
///
/// Gains are whole pips, truncated toward zero. With no trades the total is 0
/// and min/mean/max are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub pair: String,
    pub num_trades: usize,
    pub total_gain: i64,
    pub min_gain: Option<i64>,
    pub average_gain: Option<i64>,
    pub max_gain: Option<i64>,
    pub ma_long: usize,
    pub ma_short: usize,
    pub cross: String,
    pub granularity: String,
}

impl ResultSummary {
    pub fn from_trades(
        pair: &str,
        granularity: &str,
        short: usize,
        long: usize,
        trades: &[TradeRecord],
    ) -> Self {
        let gains: Vec<f64> = trades.iter().map(|t| t.gain).collect();
        let total: f64 = gains.iter().sum();

        let (min_gain, average_gain, max_gain) = if gains.is_empty() {
            (None, None, None)
        } else {
            let min = gains.iter().copied().fold(f64::INFINITY, f64::min);
            let max = gains.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = total / gains.len() as f64;
            (Some(truncate(min)), Some(truncate(mean)), Some(truncate(max)))
        };

        Self {
            pair: pair.to_string(),
            num_trades: trades.len(),
            total_gain: truncate(total),
            min_gain,
            average_gain,
            max_gain,
            ma_long: long,
            ma_short: short,
            cross: cross_label(short, long),
            granularity: granularity.to_string(),
        }
    }
}

/// Toward zero: -2.7 → -2, 2.7 → 2.
fn truncate(pips: f64) -> i64 {
    pips.trunc() as i64
}

/// Summary plus the trades it was computed from.
#[derive(Debug, Clone)]
pub struct CrossResult {
    pub summary: ResultSummary,
    pub trades: Vec<TradeRecord>,
}

impl CrossResult {
    pub fn new(
        pair: &str,
        granularity: &str,
        short: usize,
        long: usize,
        trades: Vec<TradeRecord>,
    ) -> Self {
        let summary = ResultSummary::from_trades(pair, granularity, short, long, &trades);
        Self { summary, trades }
    }
}
