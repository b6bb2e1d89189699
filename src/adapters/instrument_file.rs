//! JSON instrument catalog file (`instruments.json`).
//!
//! The file is an object keyed by instrument name whose values carry the
//! seven catalog keys. It is created from a saved broker `instruments`
//! response and loaded once per run.

use crate::domain::error::MacrossError;
use crate::domain::instrument::{Instrument, InstrumentCatalog, RawInstrument};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CATALOG_FILE: &str = "instruments.json";

pub fn catalog_path(dir: &Path) -> PathBuf {
    dir.join(CATALOG_FILE)
}

/// Load and validate `<dir>/instruments.json`. Any malformed entry fails the
/// whole load.
pub fn load(dir: &Path) -> Result<InstrumentCatalog, MacrossError> {
    let content = fs::read_to_string(catalog_path(dir))?;
    let catalog = InstrumentCatalog::from_json(&content)?;
    log::info!("loaded {} instruments from {}", catalog.len(), dir.display());
    Ok(catalog)
}

/// Write `<dir>/instruments.json` from a broker response, which is either
/// `{"instruments": [...]}` or the bare array. Returns the number of
/// instruments written.
///
/// Entries are validated before anything is written, so a bad response
/// never replaces a good catalog.
pub fn create(dir: &Path, response: &str) -> Result<usize, MacrossError> {
    let value: serde_json::Value = serde_json::from_str(response)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("instruments") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(MacrossError::MalformedCatalogEntry {
                    entry: "<response>".to_string(),
                    field: "instruments".to_string(),
                })
            }
        },
        _ => {
            return Err(MacrossError::MalformedCatalogEntry {
                entry: "<response>".to_string(),
                field: "instruments".to_string(),
            })
        }
    };

    let mut entries: BTreeMap<String, RawInstrument> = BTreeMap::new();
    for (i, item) in items.into_iter().enumerate() {
        let raw: RawInstrument =
            serde_json::from_value(item).map_err(|e| MacrossError::MalformedCatalogEntry {
                entry: format!("#{}", i),
                field: e.to_string(),
            })?;
        let name = raw.name.clone().ok_or_else(|| MacrossError::MalformedCatalogEntry {
            entry: format!("#{}", i),
            field: "name".to_string(),
        })?;
        Instrument::from_raw(&name, raw.clone())?;
        entries.insert(name, raw);
    }

    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(catalog_path(dir), json)?;
    log::info!("wrote {} instruments to {}", entries.len(), dir.display());
    Ok(entries.len())
}
