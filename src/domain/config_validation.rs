//! Configuration validation.
//!
//! Validates the `[sweep]` and `[data]` sections before a sweep runs. The
//! parsing helpers are shared with the CLI so that flag overrides go through
//! the same checks as the file.

use crate::domain::error::MacrossError;
use crate::ports::config_port::ConfigPort;

/// Candle granularities the broker serves.
pub const GRANULARITIES: &[&str] = &[
    "S5", "S10", "S15", "S30", "M1", "M2", "M4", "M5", "M10", "M15", "M30", "H1", "H2", "H3",
    "H4", "H6", "H8", "H12", "D", "W", "M",
];

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    required_list(config, "sweep", "currencies").and_then(|v| parse_currencies(&v))?;
    required_list(config, "sweep", "granularities").and_then(|v| parse_granularities(&v))?;
    parse_windows(&required_list(config, "sweep", "ma_long")?, "ma_long")?;
    parse_windows(&required_list(config, "sweep", "ma_short")?, "ma_short")?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    for key in ["price_path", "instrument_path", "output_path"] {
        required_string(config, "data", key)?;
    }
    Ok(())
}

pub fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, MacrossError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(MacrossError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

pub fn required_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<String>, MacrossError> {
    match config.get_list(section, key) {
        Some(values) if !values.is_empty() => Ok(values),
        _ => Err(MacrossError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Three-letter alphabetic codes, uppercased.
pub fn parse_currencies(values: &[String]) -> Result<Vec<String>, MacrossError> {
    values
        .iter()
        .map(|v| {
            let code = v.trim().to_uppercase();
            if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(code)
            } else {
                Err(MacrossError::ConfigInvalid {
                    section: "sweep".to_string(),
                    key: "currencies".to_string(),
                    reason: format!("'{}' is not a three-letter currency code", v),
                })
            }
        })
        .collect()
}

pub fn parse_granularities(values: &[String]) -> Result<Vec<String>, MacrossError> {
    values
        .iter()
        .map(|v| {
            let g = v.trim().to_uppercase();
            if GRANULARITIES.contains(&g.as_str()) {
                Ok(g)
            } else {
                Err(MacrossError::ConfigInvalid {
                    section: "sweep".to_string(),
                    key: "granularities".to_string(),
                    reason: format!("unknown granularity '{}'", v),
                })
            }
        })
        .collect()
}

/// `AAA_BBB` instrument name built from two currency codes, uppercased.
pub fn parse_pair(value: &str) -> Result<String, MacrossError> {
    let invalid = || MacrossError::InvalidInstrument {
        name: value.to_string(),
        reason: "expected two currency codes as AAA_BBB".to_string(),
    };
    let (base, quote) = value.trim().split_once('_').ok_or_else(invalid)?;
    let codes =
        parse_currencies(&[base.to_string(), quote.to_string()]).map_err(|_| invalid())?;
    Ok(codes.join("_"))
}

/// Positive integers; order and duplicates are preserved.
pub fn parse_windows(values: &[String], key: &str) -> Result<Vec<usize>, MacrossError> {
    values
        .iter()
        .map(|v| match v.trim().parse::<usize>() {
            Ok(w) if w >= 1 => Ok(w),
            _ => Err(MacrossError::ConfigInvalid {
                section: "sweep".to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a positive window length", v),
            }),
        })
        .collect()
}
