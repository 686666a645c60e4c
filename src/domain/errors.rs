use thiserror::Error;

/// Errors related to model persistence (save/load I/O and codec failures)
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("model file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("model serialization failed: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors surfaced by the forecasting core.
///
/// Every failure propagates synchronously to the caller; the core never
/// substitutes a fabricated value when a precondition is unmet.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("insufficient history: got {got} samples, need at least {need}")]
    InsufficientData { need: usize, got: usize },

    #[error("degenerate input: {reason}")]
    Domain { reason: String },

    #[error("training failed at epoch {epoch}: {reason}")]
    Training { epoch: usize, reason: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ForecastError {
    pub fn domain(reason: impl Into<String>) -> Self {
        Self::Domain {
            reason: reason.into(),
        }
    }
}
