//! Domain error types.

/// Top-level error type for poscheck.
#[derive(Debug, thiserror::Error)]
pub enum PosCheckError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("price source error: {reason}")]
    PriceSource { reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("storage query error: {reason}")]
    StorageQuery { reason: String },

    #[error("no saved position with id {id}")]
    PositionNotFound { id: u64 },

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
    Io(#[from] std::io::Error),
}

impl PosCheckError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&PosCheckError> for std::process::ExitCode {
    fn from(err: &PosCheckError) -> Self {
        let code: u8 = match err {
            PosCheckError::Io(_) => 1,
            PosCheckError::ConfigParse { .. }
            | PosCheckError::ConfigMissing { .. }
            | PosCheckError::ConfigInvalid { .. } => 2,
            PosCheckError::Storage { .. } | PosCheckError::StorageQuery { .. } => 3,
            PosCheckError::InvalidInput { .. } => 4,
            PosCheckError::NoData { .. }
            | PosCheckError::UnknownSymbol { .. }
            | PosCheckError::PriceSource { .. } => 5,
            PosCheckError::PositionNotFound { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
