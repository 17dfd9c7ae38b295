//! Domain error types.

/// Top-level error type for trendcast.
#[derive(Debug, thiserror::Error)]
pub enum TrendcastError {
    #[error("no data available for {symbol}: {reason}")]
    NoDataAvailable { symbol: String, reason: String },

    #[error("insufficient data: have {available} points, need {required}")]
    InsufficientData { required: usize, available: usize },

    #[error("degenerate series: {reason}")]
    DegenerateSeries { reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

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

impl TrendcastError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        TrendcastError::DegenerateSeries {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TrendcastError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            TrendcastError::Io(_) => 1,
            TrendcastError::ConfigParse { .. }
            | TrendcastError::ConfigMissing { .. }
            | TrendcastError::ConfigInvalid { .. } => 2,
            TrendcastError::DataSource { .. } => 3,
            TrendcastError::DegenerateSeries { .. } => 4,
            TrendcastError::NoDataAvailable { .. } | TrendcastError::InsufficientData { .. } => 5,
        }
    }
}

impl From<&TrendcastError> for std::process::ExitCode {
    fn from(err: &TrendcastError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
