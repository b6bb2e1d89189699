//! Moving averages over a price series.
//!
//! - `PricedSeries`: candles for one (pair, granularity) plus one SMA column
//!   per requested window, trimmed so every row has every column
//! - `sma`: the rolling mean itself

pub mod sma;

use crate::domain::candle::Candle;
use crate::domain::error::MacrossError;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct PricedSeries {
    candles: Vec<Candle>,
    averages: BTreeMap<usize, Vec<f64>>,
}

impl PricedSeries {
    /// Compute each window once over the mid closes, then drop the leading
    /// `max(windows) - 1` rows that lack a full window. Output length is
    /// `candles.len() - (max - 1)`, or zero when history is too short.
    pub fn new(candles: Vec<Candle>, windows: &BTreeSet<usize>) -> Result<Self, MacrossError> {
        if let Some(&window) = windows.iter().find(|&&w| w == 0) {
            return Err(MacrossError::InvalidWindow { window });
        }

        let max_window = windows.iter().next_back().copied().unwrap_or(1);
        if candles.len() < max_window {
            return Ok(Self {
                candles: Vec::new(),
                averages: windows.iter().map(|&w| (w, Vec::new())).collect(),
            });
        }

        let closes: Vec<f64> = candles.iter().map(Candle::mid_close).collect();
        let averages = windows
            .iter()
            .map(|&w| {
                let mut sma = sma::calculate_sma(&closes, w);
                sma.drain(..max_window - w);
                (w, sma)
            })
            .collect();

        let mut candles = candles;
        candles.drain(..max_window - 1);

        Ok(Self { candles, averages })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// SMA column for `window`, aligned row-for-row with [`Self::candles`].
    pub fn average(&self, window: usize) -> Option<&[f64]> {
        self.averages.get(&window).map(Vec::as_slice)
    }

    pub fn windows(&self) -> impl Iterator<Item = usize> + '_ {
        self.averages.keys().copied()
    }
}
