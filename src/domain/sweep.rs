//! Parameter sweep over pairs × granularities × moving-average windows.
//!
//! For each granularity, every ordered currency combination that names a
//! cataloged instrument is loaded once, every distinct window is averaged
//! once, and each (short, long) pair with `long > short` is evaluated. The
//! granularity's summaries and trades are appended to the datasets after the
//! last pair.
//!
//! A cataloged pair without a stored series aborts the sweep with
//! [`MacrossError::MissingSeries`]; nothing for that granularity is persisted.

use crate::domain::error::MacrossError;
use crate::domain::indicator::PricedSeries;
use crate::domain::instrument::{Instrument, InstrumentCatalog};
use crate::domain::result::CrossResult;
use crate::domain::signal::generate_signals;
use crate::domain::trade::extract_trades;
use crate::ports::dataset_port::DatasetPort;
use crate::ports::price_port::PricePort;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub currencies: Vec<String>,
    pub granularities: Vec<String>,
    pub ma_long: Vec<usize>,
    pub ma_short: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GranularityReport {
    pub granularity: String,
    pub pairs: Vec<String>,
    pub combinations: usize,
    pub trades: usize,
    /// Dataset sizes after this granularity's append.
    pub summary_rows: usize,
    pub trade_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub granularities: Vec<GranularityReport>,
}

impl SweepReport {
    pub fn total_combinations(&self) -> usize {
        self.granularities.iter().map(|g| g.combinations).sum()
    }
}

/// Every ordered `A_B` over the currency list, self-pairs included. The
/// catalog decides which of them exist.
pub fn candidate_pairs(currencies: &[String]) -> Vec<String> {
    currencies
        .iter()
        .flat_map(|base| {
            currencies
                .iter()
                .map(move |quote| format!("{}_{}", base, quote))
        })
        .collect()
}

/// Distinct window lengths across both lists, ascending.
pub fn window_union(ma_long: &[usize], ma_short: &[usize]) -> BTreeSet<usize> {
    ma_long.iter().chain(ma_short).copied().collect()
}

/// `(short, long)` pairs to evaluate: each long window against every window
/// in the union, keeping only `long > short`.
pub fn window_combinations(ma_long: &[usize], windows: &BTreeSet<usize>) -> Vec<(usize, usize)> {
    ma_long
        .iter()
        .flat_map(|&long| {
            windows
                .iter()
                .filter(move |&&short| long > short)
                .map(move |&short| (short, long))
        })
        .collect()
}

/// Signal engine + trade extractor for one combination.
pub fn assess_pair(
    series: &PricedSeries,
    instrument: &Instrument,
    granularity: &str,
    short: usize,
    long: usize,
) -> Result<CrossResult, MacrossError> {
    let rows = generate_signals(series, short, long)?;
    let trades = extract_trades(&rows, instrument, granularity, short, long);
    Ok(CrossResult::new(
        &instrument.name,
        granularity,
        short,
        long,
        trades,
    ))
}

/// Load one pair's series and evaluate every valid window combination.
pub fn analyse_pair(
    price_port: &dyn PricePort,
    instrument: &Instrument,
    granularity: &str,
    config: &SweepConfig,
) -> Result<Vec<CrossResult>, MacrossError> {
    let windows = window_union(&config.ma_long, &config.ma_short);
    let candles = price_port.read_series(&instrument.name, granularity)?;
    let series = PricedSeries::new(candles, &windows)?;

    log::debug!(
        "{} {}: {} rows after warmup, windows {:?}",
        instrument.name,
        granularity,
        series.len(),
        series.windows().collect::<Vec<_>>()
    );

    let mut results = Vec::new();
    for (short, long) in window_combinations(&config.ma_long, &windows) {
        let result = assess_pair(&series, instrument, granularity, short, long)?;
        log::info!(
            "{} {} {} trades:{} gain:{}",
            instrument.name,
            granularity,
            result.summary.cross,
            result.summary.num_trades,
            result.summary.total_gain
        );
        results.push(result);
    }

    Ok(results)
}

pub fn run_sweep(
    catalog: &InstrumentCatalog,
    price_port: &dyn PricePort,
    dataset_port: &dyn DatasetPort,
    config: &SweepConfig,
) -> Result<SweepReport, MacrossError> {
    let pairs = candidate_pairs(&config.currencies);
    let mut report = SweepReport::default();

    for granularity in &config.granularities {
        let mut results: Vec<CrossResult> = Vec::new();
        let mut analysed = Vec::new();

        for pair in &pairs {
            let Some(instrument) = catalog.get(pair) else {
                log::debug!("{} not in catalog, skipping", pair);
                continue;
            };
            results.extend(analyse_pair(price_port, instrument, granularity, config)?);
            analysed.push(pair.clone());
        }

        let summaries: Vec<_> = results.iter().map(|r| r.summary.clone()).collect();
        let trades: Vec<_> = results.iter().flat_map(|r| r.trades.iter().cloned()).collect();

        let sizes = dataset_port.append(&summaries, &trades)?;

        log::info!(
            "{}: {} pairs, {} combinations, {} trades (datasets now {} / {} rows)",
            granularity,
            analysed.len(),
            summaries.len(),
            trades.len(),
            sizes.summaries,
            sizes.trades
        );

        report.granularities.push(GranularityReport {
            granularity: granularity.clone(),
            pairs: analysed,
            combinations: summaries.len(),
            trades: trades.len(),
            summary_rows: sizes.summaries,
            trade_rows: sizes.trades,
        });
    }

    Ok(report)
}
