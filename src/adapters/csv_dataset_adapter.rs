//! CSV result datasets.
//!
//! `ma_res.csv` holds one row per [`ResultSummary`], `ma_trades.csv` one row
//! per [`TradeRecord`]. Both lead with an `index` column. Appending reads the
//! existing file, concatenates, renumbers `index` from zero and writes the
//! result to a temp file that then replaces the original.

use crate::domain::error::MacrossError;
use crate::domain::result::ResultSummary;
use crate::domain::signal::Signal;
use crate::domain::trade::TradeRecord;
use crate::ports::dataset_port::{DatasetPort, DatasetSizes};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SUMMARY_FILE: &str = "ma_res.csv";
pub const TRADES_FILE: &str = "ma_trades.csv";

trait IndexedRow: Serialize + DeserializeOwned {
    fn set_index(&mut self, index: usize);
}

#[derive(Debug, Serialize, Deserialize)]
struct SummaryRow {
    index: usize,
    pair: String,
    num_trades: usize,
    total_gain: i64,
    min_gain: Option<i64>,
    average_gain: Option<i64>,
    max_gain: Option<i64>,
    ma_long: usize,
    ma_short: usize,
    cross: String,
    granularity: String,
}

impl IndexedRow for SummaryRow {
    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl From<&ResultSummary> for SummaryRow {
    fn from(s: &ResultSummary) -> Self {
        SummaryRow {
            index: 0,
            pair: s.pair.clone(),
            num_trades: s.num_trades,
            total_gain: s.total_gain,
            min_gain: s.min_gain,
            average_gain: s.average_gain,
            max_gain: s.max_gain,
            ma_long: s.ma_long,
            ma_short: s.ma_short,
            cross: s.cross.clone(),
            granularity: s.granularity.clone(),
        }
    }
}

impl From<SummaryRow> for ResultSummary {
    fn from(r: SummaryRow) -> Self {
        ResultSummary {
            pair: r.pair,
            num_trades: r.num_trades,
            total_gain: r.total_gain,
            min_gain: r.min_gain,
            average_gain: r.average_gain,
            max_gain: r.max_gain,
            ma_long: r.ma_long,
            ma_short: r.ma_short,
            cross: r.cross,
            granularity: r.granularity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TradeRow {
    index: usize,
    time: DateTime<Utc>,
    pair: String,
    granularity: String,
    ma_short: usize,
    ma_long: usize,
    cross: String,
    mid_close: f64,
    delta: f64,
    prev_delta: Option<f64>,
    signal: Signal,
    diff: f64,
    gain: f64,
    gain_cumulative: f64,
}

impl IndexedRow for TradeRow {
    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl From<&TradeRecord> for TradeRow {
    fn from(t: &TradeRecord) -> Self {
        TradeRow {
            index: 0,
            time: t.time,
            pair: t.pair.clone(),
            granularity: t.granularity.clone(),
            ma_short: t.ma_short,
            ma_long: t.ma_long,
            cross: t.cross.clone(),
            mid_close: t.mid_close,
            delta: t.delta,
            prev_delta: t.prev_delta,
            signal: t.signal,
            diff: t.diff,
            gain: t.gain,
            gain_cumulative: t.gain_cumulative,
        }
    }
}

impl From<TradeRow> for TradeRecord {
    fn from(r: TradeRow) -> Self {
        TradeRecord {
            time: r.time,
            pair: r.pair,
            granularity: r.granularity,
            ma_short: r.ma_short,
            ma_long: r.ma_long,
            cross: r.cross,
            mid_close: r.mid_close,
            delta: r.delta,
            prev_delta: r.prev_delta,
            signal: r.signal,
            diff: r.diff,
            gain: r.gain,
            gain_cumulative: r.gain_cumulative,
        }
    }
}

fn dataset_error(path: &Path, reason: impl std::fmt::Display) -> MacrossError {
    MacrossError::Dataset {
        file: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn read_rows<R: IndexedRow>(path: &Path) -> Result<Vec<R>, MacrossError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    csv::Reader::from_reader(file)
        .deserialize()
        .collect::<Result<Vec<R>, _>>()
        .map_err(|e| dataset_error(path, e))
}

/// Merged rows written to a temp file beside `target`, not yet in place.
struct Staged {
    file: NamedTempFile,
    target: PathBuf,
    rows: usize,
}

impl Staged {
    fn commit(self) -> Result<usize, MacrossError> {
        self.file.persist(&self.target).map_err(|e| e.error)?;
        Ok(self.rows)
    }
}

fn stage_rows<R: IndexedRow>(
    dir: &Path,
    target: &Path,
    new_rows: Vec<R>,
) -> Result<Staged, MacrossError> {
    let mut rows: Vec<R> = read_rows(target)?;
    rows.extend(new_rows);

    let mut wtr = csv::Writer::from_writer(NamedTempFile::new_in(dir)?);
    for (i, row) in rows.iter_mut().enumerate() {
        row.set_index(i);
        wtr.serialize(&*row).map_err(|e| dataset_error(target, e))?;
    }
    let file = wtr
        .into_inner()
        .map_err(|e| dataset_error(target, e.error()))?;

    Ok(Staged {
        file,
        target: target.to_path_buf(),
        rows: rows.len(),
    })
}

pub struct CsvDatasetAdapter {
    output_path: PathBuf,
}

impl CsvDatasetAdapter {
    /// Creates `output_path` if needed.
    pub fn new(output_path: PathBuf) -> Result<Self, MacrossError> {
        fs::create_dir_all(&output_path)?;
        Ok(Self { output_path })
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_path.join(SUMMARY_FILE)
    }

    pub fn trades_path(&self) -> PathBuf {
        self.output_path.join(TRADES_FILE)
    }

    pub fn read_summaries(&self) -> Result<Vec<ResultSummary>, MacrossError> {
        let rows: Vec<SummaryRow> = read_rows(&self.summary_path())?;
        Ok(rows.into_iter().map(ResultSummary::from).collect())
    }

    pub fn read_trades(&self) -> Result<Vec<TradeRecord>, MacrossError> {
        let rows: Vec<TradeRow> = read_rows(&self.trades_path())?;
        Ok(rows.into_iter().map(TradeRecord::from).collect())
    }
}

impl DatasetPort for CsvDatasetAdapter {
    /// Both files are fully written to temp files before either replaces its
    /// target, so a failed batch leaves the existing datasets untouched.
    fn append(
        &self,
        summaries: &[ResultSummary],
        trades: &[TradeRecord],
    ) -> Result<DatasetSizes, MacrossError> {
        let staged_summaries = stage_rows(
            &self.output_path,
            &self.summary_path(),
            summaries.iter().map(SummaryRow::from).collect(),
        )?;
        let staged_trades = stage_rows(
            &self.output_path,
            &self.trades_path(),
            trades.iter().map(TradeRow::from).collect(),
        )?;

        Ok(DatasetSizes {
            summaries: staged_summaries.commit()?,
            trades: staged_trades.commit()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn summary(pair: &str, num_trades: usize) -> ResultSummary {
        ResultSummary {
            pair: pair.into(),
            num_trades,
            total_gain: 120,
            min_gain: Some(-30),
            average_gain: Some(40),
            max_gain: Some(90),
            ma_long: 40,
            ma_short: 10,
            cross: "10_40".into(),
            granularity: "H1".into(),
        }
    }

    fn trade(gain: f64) -> TradeRecord {
        TradeRecord {
            time: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            pair: "EUR_USD".into(),
            granularity: "H1".into(),
            ma_short: 10,
            ma_long: 40,
            cross: "10_40".into(),
            mid_close: 1.0725,
            delta: 0.0003,
            prev_delta: None,
            signal: Signal::Sell,
            diff: -0.0012,
            gain,
            gain_cumulative: gain,
        }
    }

    fn index_column(path: &Path) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect()
    }

    #[test]
    fn creates_file_on_first_append() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().join("out")).unwrap();

        let sizes = adapter.append(&[summary("EUR_USD", 3)], &[]).unwrap();
        assert_eq!(sizes.summaries, 1);
        assert_eq!(sizes.trades, 0);
        assert_eq!(adapter.read_summaries().unwrap(), vec![summary("EUR_USD", 3)]);
    }

    #[test]
    fn append_concatenates_and_reindexes() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();

        adapter
            .append(&[summary("EUR_USD", 1), summary("GBP_USD", 2)], &[])
            .unwrap();
        let sizes = adapter.append(&[summary("USD_JPY", 3)], &[]).unwrap();

        assert_eq!(sizes.summaries, 3);
        let pairs: Vec<String> = adapter
            .read_summaries()
            .unwrap()
            .into_iter()
            .map(|s| s.pair)
            .collect();
        assert_eq!(pairs, vec!["EUR_USD", "GBP_USD", "USD_JPY"]);
        assert_eq!(index_column(&adapter.summary_path()), vec!["0", "1", "2"]);
    }

    #[test]
    fn identical_rows_are_not_deduplicated() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();

        adapter.append(&[summary("EUR_USD", 1)], &[trade(1.0)]).unwrap();
        let sizes = adapter.append(&[summary("EUR_USD", 1)], &[trade(1.0)]).unwrap();
        assert_eq!(sizes, DatasetSizes { summaries: 2, trades: 2 });
    }

    #[test]
    fn appending_nothing_leaves_rows_unchanged() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();

        adapter
            .append(&[summary("EUR_USD", 1), summary("GBP_USD", 2)], &[trade(4.0)])
            .unwrap();
        let before = fs::read_to_string(adapter.summary_path()).unwrap();
        let trades_before = fs::read_to_string(adapter.trades_path()).unwrap();

        let sizes = adapter.append(&[], &[]).unwrap();
        assert_eq!(sizes, DatasetSizes { summaries: 2, trades: 1 });
        assert_eq!(fs::read_to_string(adapter.summary_path()).unwrap(), before);
        assert_eq!(fs::read_to_string(adapter.trades_path()).unwrap(), trades_before);
    }

    #[test]
    fn absent_aggregates_round_trip_as_blank() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();
        let empty = ResultSummary {
            num_trades: 0,
            total_gain: 0,
            min_gain: None,
            average_gain: None,
            max_gain: None,
            ..summary("EUR_USD", 0)
        };

        adapter.append(&[empty.clone()], &[]).unwrap();
        let content = fs::read_to_string(adapter.summary_path()).unwrap();
        assert!(content.contains("EUR_USD,0,0,,,,40,10,10_40,H1"));
        assert_eq!(adapter.read_summaries().unwrap(), vec![empty]);
    }

    #[test]
    fn trades_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(adapter.append(&[], &[trade(12.0)]).unwrap().trades, 1);
        assert_eq!(
            adapter.append(&[], &[trade(-3.5), trade(0.0)]).unwrap().trades,
            3
        );

        let trades = adapter.read_trades().unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[1], trade(-3.5));
        assert_eq!(trades[0].signal, Signal::Sell);
        assert_eq!(index_column(&adapter.trades_path()), vec!["0", "1", "2"]);
    }

    #[test]
    fn signal_stored_as_direction() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();
        adapter.append(&[], &[trade(1.0)]).unwrap();

        let content = fs::read_to_string(adapter.trades_path()).unwrap();
        let header: Vec<&str> = content.lines().next().unwrap().split(',').collect();
        let row: Vec<&str> = content.lines().nth(1).unwrap().split(',').collect();
        let col = header.iter().position(|h| *h == "signal").unwrap();
        assert_eq!(row[col], "-1");
    }

    #[test]
    fn reading_absent_dataset_is_empty() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();
        assert!(adapter.read_summaries().unwrap().is_empty());
        assert!(adapter.read_trades().unwrap().is_empty());
    }

    #[test]
    fn corrupt_dataset_is_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();
        fs::write(adapter.summary_path(), "index,pair,num_trades\n0,EUR_USD,many\n").unwrap();

        assert!(matches!(
            adapter.append(&[summary("EUR_USD", 1)], &[]).unwrap_err(),
            MacrossError::Dataset { .. }
        ));
    }

    #[test]
    fn failed_trade_stage_leaves_both_datasets_untouched() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();
        adapter.append(&[summary("EUR_USD", 1)], &[]).unwrap();
        fs::write(adapter.trades_path(), "index,time\n0,not-a-time\n").unwrap();
        let summaries_before = fs::read(adapter.summary_path()).unwrap();
        let trades_before = fs::read(adapter.trades_path()).unwrap();

        let err = adapter
            .append(&[summary("GBP_USD", 2)], &[trade(5.0)])
            .unwrap_err();

        assert!(matches!(err, MacrossError::Dataset { .. }));
        assert_eq!(fs::read(adapter.summary_path()).unwrap(), summaries_before);
        assert_eq!(fs::read(adapter.trades_path()).unwrap(), trades_before);
        assert_eq!(adapter.read_summaries().unwrap().len(), 1);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvDatasetAdapter::new(dir.path().to_path_buf()).unwrap();
        adapter.append(&[summary("EUR_USD", 1)], &[trade(2.0)]).unwrap();
        fs::write(adapter.trades_path(), "index,time\n0,not-a-time\n").unwrap();
        adapter.append(&[summary("EUR_USD", 1)], &[]).unwrap_err();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![SUMMARY_FILE, TRADES_FILE]);
    }
}
