//! Error types.
//!
//! [`AnalysisError`] is the core's failure vocabulary: scorers return it instead
//! of panicking so callers can skip a section of output. [`EtfError`] is the
//! application-level error used by ports, adapters and the CLI.

/// Why an analysis could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("insufficient data: have {have} bars, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("degenerate input: {reason}")]
    Degenerate { reason: String },
}

impl AnalysisError {
    /// Return `InsufficientData` unless `have >= need`.
    pub fn require(have: usize, need: usize) -> Result<(), AnalysisError> {
        if have < need {
            Err(AnalysisError::InsufficientData { have, need })
        } else {
            Ok(())
        }
    }
}

/// Top-level error type for etfscope.
#[derive(Debug, thiserror::Error)]
pub enum EtfError {
    #[error("storage error: {reason}")]
    Storage { reason: String },

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

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&EtfError> for std::process::ExitCode {
    fn from(err: &EtfError) -> Self {
        let code: u8 = match err {
            EtfError::Io(_) | EtfError::Json(_) => 1,
            EtfError::ConfigParse { .. }
            | EtfError::ConfigMissing { .. }
            | EtfError::ConfigInvalid { .. } => 2,
            EtfError::Storage { .. } => 3,
            EtfError::InvalidArgument { .. } => 4,
            EtfError::NoData { .. } | EtfError::Analysis(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_passes_at_threshold() {
        assert!(AnalysisError::require(20, 20).is_ok());
    }

    #[test]
    fn require_fails_below_threshold() {
        let err = AnalysisError::require(19, 20).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { have: 19, need: 20 });
    }

    #[test]
    fn insufficient_data_message() {
        let err = AnalysisError::InsufficientData { have: 3, need: 60 };
        assert_eq!(err.to_string(), "insufficient data: have 3 bars, need 60");
    }

    #[test]
    fn analysis_error_wraps_transparently() {
        let err: EtfError = AnalysisError::InsufficientData { have: 0, need: 30 }.into();
        assert_eq!(err.to_string(), "insufficient data: have 0 bars, need 30");
    }
}
