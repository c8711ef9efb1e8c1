//! Verdant - adaptive image delivery for a plant nursery storefront.
//!
//! Resolves logical image paths to CDN delivery URLs, defers network fetches
//! until an image approaches the viewport, drives each image through its
//! load lifecycle and renders placeholder, asset or fallback accordingly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing pipeline services and use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the page host and CLI commands.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "verdant";
