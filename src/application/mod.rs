//! Application layer with the image pipeline services and use cases.

/// Pipeline services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{ImagePipeline, MountOptions, PipelineEvent, UrlResolver};
pub use use_cases::{SeedCatalogUseCase, SeedReport};
