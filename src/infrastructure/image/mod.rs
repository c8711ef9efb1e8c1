//! Asset fetching infrastructure.
//!
//! This module provides:
//! - An LRU cache of successfully decoded assets
//! - An async fetch worker with bounded concurrency

pub mod fetcher;
pub mod memory_cache;

pub use fetcher::{AssetFetchedEvent, AssetFetcher, AssetFetcherConfig, AssetInfo, AssetSource};
pub use memory_cache::{CacheStats, MemoryAssetCache};
