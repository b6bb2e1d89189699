//! Domain error types.

/// Top-level error type for macross.
#[derive(Debug, thiserror::Error)]
pub enum MacrossError {
    #[error("no price series for {pair} at {granularity}")]
    MissingSeries { pair: String, granularity: String },

    #[error("malformed catalog entry {entry}: missing or invalid {field}")]
    MalformedCatalogEntry { entry: String, field: String },

    #[error("malformed candle #{index}: missing or invalid {field}")]
    MalformedCandle { index: usize, field: String },

    #[error("invalid instrument {name}: {reason}")]
    InvalidInstrument { name: String, reason: String },

    #[error("moving-average window must be at least 1, got {window}")]
    InvalidWindow { window: usize },

    #[error("dataset error in {file}: {reason}")]
    Dataset { file: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MacrossError> for std::process::ExitCode {
    fn from(err: &MacrossError) -> Self {
        let code: u8 = match err {
            MacrossError::Io(_) => 1,
            MacrossError::ConfigParse { .. }
            | MacrossError::ConfigMissing { .. }
            | MacrossError::ConfigInvalid { .. }
            | MacrossError::InvalidWindow { .. } => 2,
            MacrossError::MalformedCatalogEntry { .. }
            | MacrossError::MalformedCandle { .. }
            | MacrossError::InvalidInstrument { .. }
            | MacrossError::Json(_) => 3,
            MacrossError::MissingSeries { .. } => 5,
            MacrossError::Dataset { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
