//! Catalog seeding error types.

use thiserror::Error;

/// Errors that can occur while seeding the catalog.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog store rejected seed data: {message}")]
    Store { message: String },
}

impl SeedError {
    /// Creates store error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}
