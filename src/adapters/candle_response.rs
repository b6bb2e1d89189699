//! Broker candles response decoding.
//!
//! Accepts the JSON body of an `instruments/{pair}/candles` request saved to
//! disk. Each candle is checked field by field at this boundary; incomplete
//! (still forming) candles are dropped.

use crate::domain::candle::{Candle, Ohlc};
use crate::domain::error::MacrossError;
use crate::domain::instrument::DecimalField;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawOhlc {
    o: Option<DecimalField>,
    h: Option<DecimalField>,
    l: Option<DecimalField>,
    c: Option<DecimalField>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    time: Option<String>,
    volume: Option<i64>,
    complete: Option<bool>,
    mid: Option<RawOhlc>,
    bid: Option<RawOhlc>,
    ask: Option<RawOhlc>,
}

fn malformed(index: usize, field: &str) -> MacrossError {
    MacrossError::MalformedCandle {
        index,
        field: field.to_string(),
    }
}

fn decode_ohlc(index: usize, side: &str, raw: RawOhlc) -> Result<Ohlc, MacrossError> {
    let component = |value: Option<DecimalField>, name: &str| {
        value
            .as_ref()
            .and_then(DecimalField::to_f64)
            .ok_or_else(|| malformed(index, &format!("{}.{}", side, name)))
    };

    Ok(Ohlc {
        o: component(raw.o, "o")?,
        h: component(raw.h, "h")?,
        l: component(raw.l, "l")?,
        c: component(raw.c, "c")?,
    })
}

/// `Ok(None)` for an incomplete candle.
fn decode_candle(index: usize, raw: RawCandle) -> Result<Option<Candle>, MacrossError> {
    let complete = raw.complete.ok_or_else(|| malformed(index, "complete"))?;
    if !complete {
        return Ok(None);
    }

    let time = raw
        .time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .ok_or_else(|| malformed(index, "time"))?
        .with_timezone(&Utc);
    let volume = raw.volume.ok_or_else(|| malformed(index, "volume"))?;
    let mid = decode_ohlc(index, "mid", raw.mid.ok_or_else(|| malformed(index, "mid"))?)?;
    let bid = raw.bid.map(|b| decode_ohlc(index, "bid", b)).transpose()?;
    let ask = raw.ask.map(|a| decode_ohlc(index, "ask", a)).transpose()?;

    Ok(Some(Candle {
        time,
        volume,
        mid,
        bid,
        ask,
    }))
}

/// Decode `{"candles": [...]}` into complete candles, time-ascending.
pub fn decode_candles(body: &str) -> Result<Vec<Candle>, MacrossError> {
    let mut value: serde_json::Value = serde_json::from_str(body)?;
    let items = match value.get_mut("candles").map(serde_json::Value::take) {
        Some(serde_json::Value::Array(items)) => items,
        _ => return Err(malformed(0, "candles")),
    };

    let total = items.len();
    let mut candles = Vec::with_capacity(total);

    for (i, item) in items.into_iter().enumerate() {
        let raw: RawCandle = serde_json::from_value(item).map_err(|e| malformed(i, &e.to_string()))?;
        if let Some(candle) = decode_candle(i, raw)? {
            candles.push(candle);
        }
    }

    if candles.len() < total {
        log::debug!("discarded {} incomplete candles", total - candles.len());
    }

    candles.sort_by_key(|c| c.time);
    Ok(candles)
}
