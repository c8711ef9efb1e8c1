//! Asset fetch error types.

use thiserror::Error;

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Errors that can occur while fetching and decoding an asset.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("fetch worker unavailable: {0}")]
    Worker(String),
}

impl FetchError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Returns whether the asset itself is missing or unusable, as opposed to
    /// a transport problem.
    #[must_use]
    pub const fn is_asset_error(&self) -> bool {
        matches!(self, Self::Http { status: 400..=499, .. } | Self::Decode(_))
    }
}
