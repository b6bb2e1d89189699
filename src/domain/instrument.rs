//! Tradable instruments and the catalog they are looked up in.
//!
//! Broker instrument objects are decoded into [`RawInstrument`] first, where
//! every field is optional, then promoted to [`Instrument`] with explicit
//! field-presence checks. A malformed entry therefore fails when the catalog
//! is loaded, never halfway through a sweep.

use crate::domain::error::MacrossError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Broker-side decimal: margin rates arrive as strings, hand-written catalogs
/// tend to use plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecimalField {
    Number(f64),
    Text(String),
}

impl DecimalField {
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            DecimalField::Number(v) => Some(*v),
            DecimalField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// The seven catalog keys as they appear on the wire. Extra keys in a broker
/// response are dropped on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstrument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pip_location: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_units_precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_rate: Option<DecimalField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub kind: String,
    pub display_name: String,
    pub pip_location: i32,
    pub display_precision: u32,
    pub trade_units_precision: u32,
    pub margin_rate: f64,
}

/// Broker pip locations sit well inside this band; anything outside is a typo.
const PIP_LOCATION_RANGE: std::ops::RangeInclusive<i32> = -10..=10;

impl Instrument {
    /// 10^pip_location. Always > 0.
    pub fn pip_scale(&self) -> f64 {
        if self.pip_location < 0 {
            1.0 / 10f64.powi(-self.pip_location)
        } else {
            10f64.powi(self.pip_location)
        }
    }

    /// Promote a wire record, naming the first missing field on failure.
    /// `entry` identifies the record in errors (the catalog key).
    pub fn from_raw(entry: &str, raw: RawInstrument) -> Result<Self, MacrossError> {
        let missing = |field: &str| MacrossError::MalformedCatalogEntry {
            entry: entry.to_string(),
            field: field.to_string(),
        };

        let name = raw.name.ok_or_else(|| missing("name"))?;
        let kind = raw.kind.ok_or_else(|| missing("type"))?;
        let display_name = raw.display_name.ok_or_else(|| missing("displayName"))?;
        let pip_location = raw.pip_location.ok_or_else(|| missing("pipLocation"))?;
        let display_precision = raw
            .display_precision
            .ok_or_else(|| missing("displayPrecision"))?;
        let trade_units_precision = raw
            .trade_units_precision
            .ok_or_else(|| missing("tradeUnitsPrecision"))?;
        let margin_rate = raw
            .margin_rate
            .as_ref()
            .and_then(DecimalField::to_f64)
            .ok_or_else(|| missing("marginRate"))?;

        if !PIP_LOCATION_RANGE.contains(&pip_location) {
            return Err(MacrossError::InvalidInstrument {
                name,
                reason: format!("pipLocation {} out of range", pip_location),
            });
        }
        if !margin_rate.is_finite() || margin_rate < 0.0 {
            return Err(MacrossError::InvalidInstrument {
                name,
                reason: format!("marginRate {} must be a non-negative number", margin_rate),
            });
        }

        Ok(Self {
            name,
            kind,
            display_name,
            pip_location,
            display_precision,
            trade_units_precision,
            margin_rate,
        })
    }
}

/// Read-only lookup of instruments by pair name (e.g. `EUR_USD`).
#[derive(Debug, Clone, Default)]
pub struct InstrumentCatalog {
    instruments: BTreeMap<String, Instrument>,
}

impl InstrumentCatalog {
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        Self {
            instruments: instruments
                .into_iter()
                .map(|i| (i.name.clone(), i))
                .collect(),
        }
    }

    /// Decode a catalog document: a JSON object keyed by instrument name.
    pub fn from_json(content: &str) -> Result<Self, MacrossError> {
        let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut instruments = BTreeMap::new();

        for (key, value) in entries {
            let raw: RawInstrument =
                serde_json::from_value(value).map_err(|e| MacrossError::MalformedCatalogEntry {
                    entry: key.clone(),
                    field: e.to_string(),
                })?;
            let instrument = Instrument::from_raw(&key, raw)?;
            instruments.insert(key, instrument);
        }

        Ok(Self { instruments })
    }

    pub fn get(&self, name: &str) -> Option<&Instrument> {
        self.instruments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instruments.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Instruments in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_eur_usd() -> RawInstrument {
        RawInstrument {
            name: Some("EUR_USD".into()),
            kind: Some("CURRENCY".into()),
            display_name: Some("EUR/USD".into()),
            pip_location: Some(-4),
            display_precision: Some(5),
            trade_units_precision: Some(0),
            margin_rate: Some(DecimalField::Text("0.0333".into())),
        }
    }

    #[test]
    fn pip_scale_is_power_of_ten() {
        let eur = Instrument::from_raw("EUR_USD", raw_eur_usd()).unwrap();
        assert_eq!(eur.pip_scale(), 0.0001);

        let jpy = Instrument::from_raw(
            "USD_JPY",
            RawInstrument {
                name: Some("USD_JPY".into()),
                pip_location: Some(-2),
                ..raw_eur_usd()
            },
        )
        .unwrap();
        assert_eq!(jpy.pip_scale(), 0.01);

        let index = Instrument::from_raw(
            "DE30_EUR",
            RawInstrument {
                pip_location: Some(0),
                ..raw_eur_usd()
            },
        )
        .unwrap();
        assert_eq!(index.pip_scale(), 1.0);
    }

    #[test]
    fn margin_rate_accepts_string_and_number() {
        let from_text = Instrument::from_raw("EUR_USD", raw_eur_usd()).unwrap();
        assert!((from_text.margin_rate - 0.0333).abs() < f64::EPSILON);

        let from_number = Instrument::from_raw(
            "EUR_USD",
            RawInstrument {
                margin_rate: Some(DecimalField::Number(0.05)),
                ..raw_eur_usd()
            },
        )
        .unwrap();
        assert!((from_number.margin_rate - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_field_is_named() {
        let err = Instrument::from_raw(
            "EUR_USD",
            RawInstrument {
                pip_location: None,
                ..raw_eur_usd()
            },
        )
        .unwrap_err();
        match err {
            MacrossError::MalformedCatalogEntry { entry, field } => {
                assert_eq!(entry, "EUR_USD");
                assert_eq!(field, "pipLocation");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparseable_margin_rate_is_malformed() {
        let err = Instrument::from_raw(
            "EUR_USD",
            RawInstrument {
                margin_rate: Some(DecimalField::Text("abc".into())),
                ..raw_eur_usd()
            },
        )
        .unwrap_err();
        assert!(matches!(err, MacrossError::MalformedCatalogEntry { .. }));
    }

    #[test]
    fn out_of_range_pip_location_rejected() {
        let err = Instrument::from_raw(
            "EUR_USD",
            RawInstrument {
                pip_location: Some(-40),
                ..raw_eur_usd()
            },
        )
        .unwrap_err();
        assert!(matches!(err, MacrossError::InvalidInstrument { .. }));
    }

    #[test]
    fn catalog_from_json_keys_by_name() {
        let json = r#"{
            "EUR_USD": {"name": "EUR_USD", "type": "CURRENCY", "displayName": "EUR/USD",
                        "pipLocation": -4, "displayPrecision": 5,
                        "tradeUnitsPrecision": 0, "marginRate": "0.0333"},
            "USD_JPY": {"name": "USD_JPY", "type": "CURRENCY", "displayName": "USD/JPY",
                        "pipLocation": -2, "displayPrecision": 3,
                        "tradeUnitsPrecision": 0, "marginRate": "0.04"}
        }"#;
        let catalog = InstrumentCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("USD_JPY"));
        assert!(!catalog.contains("JPY_USD"));
        assert_eq!(catalog.get("USD_JPY").unwrap().display_precision, 3);

        let names: Vec<_> = catalog.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["EUR_USD", "USD_JPY"]);
    }

    #[test]
    fn catalog_from_json_fails_fast_on_bad_entry() {
        let json = r#"{"EUR_USD": {"name": "EUR_USD", "type": "CURRENCY"}}"#;
        let err = InstrumentCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, MacrossError::MalformedCatalogEntry { .. }));
    }

    #[test]
    fn catalog_from_json_wrong_type_is_malformed() {
        let json = r#"{"EUR_USD": {"name": "EUR_USD", "pipLocation": "minus four"}}"#;
        let err = InstrumentCatalog::from_json(json).unwrap_err();
        match err {
            MacrossError::MalformedCatalogEntry { entry, .. } => assert_eq!(entry, "EUR_USD"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn raw_instrument_drops_unknown_keys() {
        let json = r#"{"name": "EUR_USD", "type": "CURRENCY", "displayName": "EUR/USD",
                       "pipLocation": -4, "displayPrecision": 5, "tradeUnitsPrecision": 0,
                       "marginRate": "0.0333", "minimumTradeSize": "1", "tags": []}"#;
        let raw: RawInstrument = serde_json::from_str(json).unwrap();
        assert_eq!(raw, raw_eur_usd());
    }
}
