//! Presentation layer with the page host and CLI command handlers.

/// Command handlers.
pub mod commands;
/// Page host driving the pipeline.
pub mod storefront;

pub use commands::run;
pub use storefront::Storefront;
