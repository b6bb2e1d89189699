//! Persisted result datasets port trait.

use crate::domain::error::MacrossError;
use crate::domain::result::ResultSummary;
use crate::domain::trade::TradeRecord;

/// Row counts of both tables after an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSizes {
    pub summaries: usize,
    pub trades: usize,
}

/// Cumulative summary and trade tables. Appends never deduplicate; running
/// the same sweep twice stores every row twice.
pub trait DatasetPort {
    /// Append one batch to both tables. On error neither table changes.
    fn append(
        &self,
        summaries: &[ResultSummary],
        trades: &[TradeRecord],
    ) -> Result<DatasetSizes, MacrossError>;
}
