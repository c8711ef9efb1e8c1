//! Viewport observation error types.

use thiserror::Error;

/// Failure to register a viewport observation.
///
/// The pipeline never surfaces this to callers; an instance whose
/// observation cannot be registered starts fetching immediately.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ObserveError {
    #[error("viewport observation is not supported by this runtime")]
    Unsupported,

    #[error("viewport observer rejected the target: {reason}")]
    Rejected { reason: String },
}

impl ObserveError {
    /// Creates rejected error.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
