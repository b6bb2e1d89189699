//! Price series access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::MacrossError;

pub trait PricePort {
    /// Time-ascending candles for `pair` at `granularity`.
    ///
    /// Fails with [`MacrossError::MissingSeries`] when nothing is stored for
    /// the combination. An existing but empty series is `Ok(vec![])`.
    fn read_series(&self, pair: &str, granularity: &str) -> Result<Vec<Candle>, MacrossError>;
}
