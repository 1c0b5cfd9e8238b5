//! Engine Error Types
//!
//! Round-level errors the orchestrator surfaces to its caller. Per-bot
//! conditions (duplicate suppression, provider failures, cancellation of an
//! in-flight dispatch) are never raised as errors; they are recorded as
//! [`ErrorKind`](crate::models::ErrorKind) data in the round's outcome set.

use thiserror::Error;

/// Errors that fail a whole orchestration round.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The round had zero bots to dispatch to
    #[error("No eligible recipients for this round")]
    NoEligibleRecipients,

    /// Unsupported ordering policy or malformed chat configuration
    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for round-level operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<EngineError> for String {
    fn from(err: EngineError) -> String {
        err.to_string()
    }
}
