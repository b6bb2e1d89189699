//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::candle_response::decode_candles;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_dataset_adapter::CsvDatasetAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::instrument_file;
use crate::domain::config_validation::{
    parse_currencies, parse_granularities, parse_pair, parse_windows, required_list,
    required_string, validate_data_config, validate_sweep_config,
};
use crate::domain::error::MacrossError;
use crate::domain::instrument::InstrumentCatalog;
use crate::domain::sweep::{self, candidate_pairs, SweepConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::dataset_port::DatasetPort;
use crate::ports::price_port::PricePort;

#[derive(Parser, Debug)]
#[command(name = "macross", about = "Moving-average crossover sweep backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the crossover sweep and append results to the datasets
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated currency codes, replaces [sweep] currencies
        #[arg(long)]
        currencies: Option<String>,
        /// Comma-separated granularities, replaces [sweep] granularities
        #[arg(long)]
        granularities: Option<String>,
        /// Dataset directory, replaces [data] output_path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a sweep configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the instrument catalog
    Instruments {
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Create instruments.json from a saved broker instruments response
    ImportInstruments {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Store a saved broker candles response as a price series
    ImportCandles {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        pair: String,
        #[arg(short, long)]
        granularity: String,
        #[arg(short, long)]
        path: PathBuf,
    },
}

/// Directories named in the `[data]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub price_path: PathBuf,
    pub instrument_path: PathBuf,
    pub output_path: PathBuf,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Sweep {
            config,
            currencies,
            granularities,
            output,
        } => run_sweep(
            &config,
            currencies.as_deref(),
            granularities.as_deref(),
            output.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Instruments { path } => run_instruments(&path),
        Command::ImportInstruments { input, path } => run_import_instruments(&input, &path),
        Command::ImportCandles {
            input,
            pair,
            granularity,
            path,
        } => run_import_candles(&input, &pair, &granularity, &path),
    }
}

fn fail(err: MacrossError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MacrossError> {
    FileConfigAdapter::from_file(path).map_err(|e| MacrossError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_sweep_config(config: &dyn ConfigPort) -> Result<SweepConfig, MacrossError> {
    validate_sweep_config(config)?;
    Ok(SweepConfig {
        currencies: parse_currencies(&required_list(config, "sweep", "currencies")?)?,
        granularities: parse_granularities(&required_list(config, "sweep", "granularities")?)?,
        ma_long: parse_windows(&required_list(config, "sweep", "ma_long")?, "ma_long")?,
        ma_short: parse_windows(&required_list(config, "sweep", "ma_short")?, "ma_short")?,
    })
}

pub fn build_data_paths(config: &dyn ConfigPort) -> Result<DataPaths, MacrossError> {
    validate_data_config(config)?;
    Ok(DataPaths {
        price_path: required_string(config, "data", "price_path")?.into(),
        instrument_path: required_string(config, "data", "instrument_path")?.into(),
        output_path: required_string(config, "data", "output_path")?.into(),
    })
}

fn split_flag(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Replace list settings with CLI flag values, validated like the file.
pub fn apply_overrides(
    mut sweep_config: SweepConfig,
    currencies: Option<&str>,
    granularities: Option<&str>,
) -> Result<SweepConfig, MacrossError> {
    if let Some(c) = currencies {
        sweep_config.currencies = parse_currencies(&split_flag(c))?;
    }
    if let Some(g) = granularities {
        sweep_config.granularities = parse_granularities(&split_flag(g))?;
    }
    for (key, empty) in [
        ("currencies", sweep_config.currencies.is_empty()),
        ("granularities", sweep_config.granularities.is_empty()),
    ] {
        if empty {
            return Err(MacrossError::ConfigInvalid {
                section: "sweep".to_string(),
                key: key.to_string(),
                reason: "override left an empty list".to_string(),
            });
        }
    }
    Ok(sweep_config)
}

fn run_sweep(
    config_path: &Path,
    currencies: Option<&str>,
    granularities: Option<&str>,
    output: Option<&Path>,
) -> ExitCode {
    log::info!("loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let sweep_config = match build_sweep_config(&adapter)
        .and_then(|c| apply_overrides(c, currencies, granularities))
    {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let mut paths = match build_data_paths(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    if let Some(out) = output {
        paths.output_path = out.to_path_buf();
    }

    let catalog = match instrument_file::load(&paths.instrument_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let price_port = CsvAdapter::new(paths.price_path.clone());
    let dataset_port = match CsvDatasetAdapter::new(paths.output_path.clone()) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    run_sweep_pipeline(&catalog, &price_port, &dataset_port, &sweep_config)
}

/// Run the sweep against the given ports and print a per-granularity summary.
pub fn run_sweep_pipeline(
    catalog: &InstrumentCatalog,
    price_port: &dyn PricePort,
    dataset_port: &dyn DatasetPort,
    sweep_config: &SweepConfig,
) -> ExitCode {
    log::info!(
        "sweeping {} currencies ({} candidate pairs) over {}",
        sweep_config.currencies.len(),
        candidate_pairs(&sweep_config.currencies).len(),
        sweep_config.granularities.join(",")
    );

    let report = match sweep::run_sweep(catalog, price_port, dataset_port, sweep_config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    for g in &report.granularities {
        println!(
            "{}: {} pairs, {} combinations, {} trades",
            g.granularity,
            g.pairs.len(),
            g.combinations,
            g.trades
        );
        println!(
            "  datasets: {} summary rows, {} trade rows",
            g.summary_rows, g.trade_rows
        );
    }
    println!("{} combinations evaluated", report.total_combinations());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let sweep_config = match build_sweep_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let paths = match build_data_paths(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    println!("currencies:    {}", sweep_config.currencies.join(", "));
    println!("granularities: {}", sweep_config.granularities.join(", "));
    println!("ma_long:       {:?}", sweep_config.ma_long);
    println!("ma_short:      {:?}", sweep_config.ma_short);
    println!("prices:        {}", paths.price_path.display());
    println!("instruments:   {}", paths.instrument_path.display());
    println!("output:        {}", paths.output_path.display());
    println!("configuration is valid");
    ExitCode::SUCCESS
}

fn run_instruments(path: &Path) -> ExitCode {
    let catalog = match instrument_file::load(path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    for i in catalog.iter() {
        println!(
            "{:<12} {:<10} pip {:<8} precision {:<2} margin {}",
            i.name,
            i.kind,
            i.pip_scale(),
            i.display_precision,
            i.margin_rate
        );
    }
    println!("{} instruments", catalog.len());
    ExitCode::SUCCESS
}

fn run_import_instruments(input: &Path, path: &Path) -> ExitCode {
    let result = fs::read_to_string(input)
        .map_err(MacrossError::from)
        .and_then(|body| instrument_file::create(path, &body));

    match result {
        Ok(count) => {
            println!(
                "{} instruments written to {}",
                count,
                instrument_file::catalog_path(path).display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Decode a saved candles response and store it as `<path>/<PAIR>_<G>.csv`.
/// Returns the candle count and the file written.
pub fn import_candles(
    input: &Path,
    pair: &str,
    granularity: &str,
    path: &Path,
) -> Result<(usize, PathBuf), MacrossError> {
    let pair = parse_pair(pair)?;
    let granularity = parse_granularities(&[granularity.to_string()])?
        .into_iter()
        .next()
        .ok_or_else(|| MacrossError::ConfigInvalid {
            section: "import".to_string(),
            key: "granularity".to_string(),
            reason: "no granularity given".to_string(),
        })?;

    let candles = decode_candles(&fs::read_to_string(input)?)?;
    let written = CsvAdapter::new(path.to_path_buf()).write_series(&pair, &granularity, &candles)?;
    Ok((candles.len(), written))
}

fn run_import_candles(input: &Path, pair: &str, granularity: &str, path: &Path) -> ExitCode {
    match import_candles(input, pair, granularity, path) {
        Ok((count, written)) => {
            println!("{} candles written to {}", count, written.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
