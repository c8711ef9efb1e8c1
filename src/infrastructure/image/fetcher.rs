//! Async asset fetcher.
//!
//! The renderer-side network stack: fetch requests from the pipeline are
//! queued on a command channel, downloaded with bounded concurrency, decoded
//! off the async runtime, and reported back as `AssetFetchedEvent`s.
//! Failed fetches are reported, never retried and never cached.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, trace, warn};

use super::memory_cache::MemoryAssetCache;
use crate::application::services::{FetchRequest, PipelineEvent};
use crate::domain::entities::InstanceId;
use crate::domain::errors::{FetchError, FetchResult};

/// Where an asset was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AssetSource {
    MemoryCache,
    Network,
}

impl std::fmt::Display for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// A successfully decoded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// URL the asset was downloaded from.
    pub url: String,
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
    /// Encoded size.
    pub bytes: usize,
    /// Network or cache.
    pub source: AssetSource,
}

/// Sent when a fetch finishes.
#[derive(Debug, Clone)]
pub struct AssetFetchedEvent {
    /// Instance the fetch was issued for.
    pub instance: InstanceId,
    /// URL that was fetched.
    pub url: String,
    /// Decoded asset or the reason it failed.
    pub result: FetchResult<Arc<AssetInfo>>,
}

impl From<AssetFetchedEvent> for PipelineEvent {
    fn from(event: AssetFetchedEvent) -> Self {
        match event.result {
            Ok(_) => Self::AssetLoaded(event.instance),
            Err(e) => Self::AssetFailed {
                instance: event.instance,
                reason: e.to_string(),
            },
        }
    }
}

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct AssetFetcherConfig {
    /// Downloads in flight at once.
    pub max_concurrent_fetches: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Decoded asset entries kept.
    pub cache_size: usize,
}

impl Default for AssetFetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            timeout_secs: 30,
            cache_size: super::memory_cache::DEFAULT_CACHE_SIZE,
        }
    }
}

#[derive(Debug)]
enum FetchCommand {
    Fetch { instance: InstanceId, url: String },
    Cancel { instance: InstanceId },
    CancelAll,
}

/// Queues and runs asset downloads.
pub struct AssetFetcher {
    cache: Arc<MemoryAssetCache>,
    command_tx: mpsc::UnboundedSender<FetchCommand>,
    config: AssetFetcherConfig,
}

impl std::fmt::Debug for AssetFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct Worker {
    cache: Arc<MemoryAssetCache>,
    event_tx: mpsc::UnboundedSender<AssetFetchedEvent>,
    http_client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    command_rx: mpsc::UnboundedReceiver<FetchCommand>,
}

impl AssetFetcher {
    /// Creates a fetcher and spawns its worker on the current runtime.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        config: AssetFetcherConfig,
        event_tx: &mpsc::UnboundedSender<AssetFetchedEvent>,
    ) -> FetchResult<Self> {
        let cache = Arc::new(MemoryAssetCache::new(config.cache_size));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("verdant/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::network(format!("failed to create HTTP client: {e}")))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let worker = Worker {
            cache: cache.clone(),
            event_tx: event_tx.clone(),
            http_client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1))),
            command_rx,
        };
        tokio::spawn(worker.run());

        Ok(Self {
            cache,
            command_tx,
            config,
        })
    }

    /// Queues a fetch of the candidate matching `display_width`. The
    /// outcome arrives on the event channel.
    pub fn fetch(&self, request: &FetchRequest, display_width: Option<u32>) {
        let command = FetchCommand::Fetch {
            instance: request.instance,
            url: request.url_for(display_width).to_string(),
        };
        if let Err(e) = self.command_tx.send(command) {
            error!("Failed to queue fetch: {}", e);
        }
    }

    /// Drops a queued fetch. A download already in flight still completes.
    pub fn cancel(&self, instance: InstanceId) {
        if let Err(e) = self.command_tx.send(FetchCommand::Cancel { instance }) {
            error!("Failed to send cancel: {}", e);
        }
    }

    /// Drops every queued fetch.
    pub fn cancel_all(&self) {
        if let Err(e) = self.command_tx.send(FetchCommand::CancelAll) {
            error!("Failed to send cancel all: {}", e);
        }
    }

    #[must_use]
    /// Cache shared with the worker.
    pub fn cache(&self) -> &MemoryAssetCache {
        &self.cache
    }
}

impl Worker {
    async fn run(mut self) {
        let mut queue: VecDeque<(InstanceId, String)> = VecDeque::new();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(FetchCommand::Fetch { instance, url }) => {
                            if !queue.iter().any(|(queued, _)| *queued == instance) {
                                queue.push_back((instance, url));
                            }
                        }
                        Some(FetchCommand::Cancel { instance }) => {
                            queue.retain(|(queued, _)| *queued != instance);
                        }
                        Some(FetchCommand::CancelAll) => {
                            let dropped = queue.len();
                            queue.clear();
                            debug!(dropped, "Cleared fetch queue");
                        }
                        None => break,
                    }
                }
                Ok(permit) = self.semaphore.clone().acquire_owned(), if !queue.is_empty() => {
                    if let Some((instance, url)) = queue.pop_front() {
                        let cache = self.cache.clone();
                        let client = self.http_client.clone();
                        let event_tx = self.event_tx.clone();

                        tokio::spawn(async move {
                            let result = load_asset(&cache, &client, &url).await;
                            if let Err(e) = &result {
                                warn!(%instance, url = %url, error = %e, "Asset fetch failed");
                            }
                            let _ = event_tx.send(AssetFetchedEvent { instance, url, result });
                            drop(permit);
                        });
                    }
                }
            }
        }
        trace!("Fetch worker stopped");
    }
}

async fn load_asset(
    cache: &MemoryAssetCache,
    client: &reqwest::Client,
    url: &str,
) -> FetchResult<Arc<AssetInfo>> {
    if let Some(info) = cache.get(url).await {
        return Ok(Arc::new(AssetInfo {
            source: AssetSource::MemoryCache,
            ..(*info).clone()
        }));
    }

    debug!(url = %url, "Downloading asset");
    let bytes = download(client, url).await?;
    let (width, height) = decode_dimensions(bytes.clone()).await?;

    let info = Arc::new(AssetInfo {
        url: url.to_string(),
        width,
        height,
        bytes: bytes.len(),
        source: AssetSource::Network,
    });
    cache.put(info.clone()).await;
    debug!(url = %url, width, height, "Asset decoded");
    Ok(info)
}

async fn download(client: &reqwest::Client, url: &str) -> FetchResult<Bytes> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::network(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    response
        .bytes()
        .await
        .map_err(|e| FetchError::network(format!("failed to read body: {e}")))
}

/// Fully decodes the image off the runtime and returns its dimensions.
async fn decode_dimensions(bytes: Bytes) -> FetchResult<(u32, u32)> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|img| (img.width(), img.height()))
            .map_err(|e| FetchError::decode(e.to_string()))
    })
    .await
    .map_err(|e| FetchError::Worker(format!("decode task panicked: {e}")))?
}
