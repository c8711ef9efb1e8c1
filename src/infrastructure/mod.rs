//! Infrastructure layer with adapters for the pipeline ports.

/// In-memory catalog and seed file loading.
pub mod catalog;
/// Application configuration.
pub mod config;
/// Asset fetching and caching.
pub mod image;
/// Document head preload links.
pub mod preload;
/// Geometric viewport observer.
pub mod viewport;

pub use catalog::{InMemoryCatalog, load_seed_file};
pub use config::{AppConfig, CliArgs, ConfigStore, LogLevel};
pub use image::{AssetFetchedEvent, AssetFetcher, AssetFetcherConfig, CacheStats, MemoryAssetCache};
pub use preload::PreloadHead;
pub use viewport::GeometryViewportObserver;
