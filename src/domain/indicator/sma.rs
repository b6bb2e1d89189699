//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(C[i-n+1..=i]). The first (n-1) closes have no value, so the
//! output is n-1 shorter than the input.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    closes
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}
