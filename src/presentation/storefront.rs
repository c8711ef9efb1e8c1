//! Storefront page host.
//!
//! Owns a pipeline together with the adapters a rendered page provides: the
//! geometric viewport observer and the document head that collects preload
//! links. Viewport entries produced by layout or scrolling are fed straight
//! back into the pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::application::services::{
    FetchRequest, ImagePipeline, MountOptions, PipelineEvent, UrlResolver,
};
use crate::domain::entities::{ImageRequest, InstanceId, ObserveOptions, Rect};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::image::{AssetFetchedEvent, AssetFetcher, AssetInfo};
use crate::infrastructure::preload::PreloadHead;
use crate::infrastructure::viewport::GeometryViewportObserver;

/// Page with a scrollable viewport and mounted images.
pub struct Storefront {
    pipeline: ImagePipeline,
    observer: Arc<GeometryViewportObserver>,
    head: Arc<PreloadHead>,
    /// Laid-out width of each mounted instance.
    widths: HashMap<InstanceId, u32>,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("pipeline", &self.pipeline)
            .field("viewport", &self.observer.viewport())
            .field("preload_links", &self.head.len())
            .finish()
    }
}

impl Storefront {
    /// Creates a page with the default 1280x800 viewport.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self::with_viewport(
            UrlResolver::new(config.resolver_settings()),
            config.observe_options(),
            GeometryViewportObserver::default().viewport(),
        )
    }

    #[must_use]
    /// Creates a page with an explicit resolver, options and viewport.
    pub fn with_viewport(resolver: UrlResolver, options: ObserveOptions, viewport: Rect) -> Self {
        let observer = Arc::new(GeometryViewportObserver::new(viewport));
        let head = Arc::new(PreloadHead::new());
        let pipeline = ImagePipeline::new(resolver, observer.clone(), head.clone(), options);
        Self {
            pipeline,
            observer,
            head,
            widths: HashMap::new(),
        }
    }

    #[must_use]
    /// Pipeline of this page.
    pub const fn pipeline(&self) -> &ImagePipeline {
        &self.pipeline
    }

    /// Mutable pipeline, for delivering completions directly.
    pub fn pipeline_mut(&mut self) -> &mut ImagePipeline {
        &mut self.pipeline
    }

    #[must_use]
    /// Preload links collected in the head.
    pub fn head(&self) -> &PreloadHead {
        &self.head
    }

    #[must_use]
    /// Current viewport.
    pub fn viewport(&self) -> Rect {
        self.observer.viewport()
    }

    /// Mounts an image and lays it out at `rect`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn mount_at(&mut self, request: ImageRequest, options: MountOptions, rect: Rect) -> InstanceId {
        let pipeline = &self.pipeline;
        self.widths.retain(|id, _| pipeline.is_mounted(*id));

        let id = self.pipeline.mount_with(request, options);
        self.widths.insert(id, rect.width.max(0.0).ceil() as u32);
        let entries = self.observer.place(id, rect);
        self.deliver(entries);
        id
    }

    /// Unmounts one image and forgets its layout.
    pub fn unmount(&mut self, id: InstanceId) -> bool {
        self.widths.remove(&id);
        self.pipeline.unmount(id)
    }

    /// Scrolls vertically and returns how many images came near the viewport.
    pub fn scroll_by(&mut self, dy: f64) -> usize {
        let entries = self.observer.scroll_by(dy);
        self.deliver(entries)
    }

    fn deliver(&mut self, entries: Vec<InstanceId>) -> usize {
        entries
            .into_iter()
            .filter(|id| self.pipeline.handle(PipelineEvent::NearViewport(*id)))
            .count()
    }

    /// Takes fetches queued since the last call.
    pub fn drain_fetch_requests(&mut self) -> Vec<FetchRequest> {
        self.pipeline.drain_fetch_requests()
    }

    /// Completes every queued fetch as successful without touching the
    /// network. Returns the completed requests.
    pub fn complete_all(&mut self) -> Vec<FetchRequest> {
        let requests = self.pipeline.drain_fetch_requests();
        for request in &requests {
            self.pipeline.handle(PipelineEvent::AssetLoaded(request.instance));
        }
        requests
    }

    /// Laid-out width of an instance, rounded up to whole pixels.
    #[must_use]
    pub fn layout_width(&self, id: InstanceId) -> Option<u32> {
        self.widths.get(&id).copied()
    }

    /// Hands queued fetches to the fetcher and feeds completions back into
    /// the pipeline until all of them settle or `timeout` elapses. Each
    /// download targets the candidate matching the image's layout width.
    pub async fn run_fetches(
        &mut self,
        fetcher: &AssetFetcher,
        events: &mut mpsc::UnboundedReceiver<AssetFetchedEvent>,
        timeout: Duration,
    ) -> HashMap<InstanceId, Arc<AssetInfo>> {
        let mut pending: Vec<InstanceId> = Vec::new();
        for request in self.pipeline.drain_fetch_requests() {
            pending.push(request.instance);
            fetcher.fetch(&request, self.layout_width(request.instance));
        }
        debug!(count = pending.len(), "Dispatched fetches");

        let mut assets = HashMap::new();
        let deadline = Instant::now() + timeout;

        while !pending.is_empty() {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        warn!("Fetch event channel closed");
                        break;
                    };
                    pending.retain(|id| *id != event.instance);
                    if let Ok(info) = &event.result {
                        assets.insert(event.instance, info.clone());
                    }
                    self.pipeline.handle(event.into());
                }
                () = sleep_until(deadline) => {
                    warn!(remaining = pending.len(), "Timed out waiting for fetches");
                    for id in &pending {
                        fetcher.cancel(*id);
                    }
                    break;
                }
            }
        }

        let stats = fetcher.cache().stats();
        info!(
            loaded = assets.len(),
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            "Fetches settled"
        );
        assets
    }

    /// Serialized render of one instance.
    #[must_use]
    pub fn render_html(&self, id: InstanceId) -> Option<String> {
        self.pipeline.render(id).map(|view| view.to_html())
    }

    /// Unmounts everything on the page.
    pub fn close(&mut self) {
        self.pipeline.unmount_all();
        self.widths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ImageLoadState;
    use crate::infrastructure::image::AssetSource;

    fn storefront() -> Storefront {
        Storefront::new(&AppConfig::default())
    }

    #[test]
    fn test_mount_at_visible_position_requests_fetch() {
        let mut page = storefront();
        let id = page.mount_at(
            ImageRequest::new("roses/1.jpg"),
            MountOptions::default(),
            Rect::new(0.0, 0.0, 300.0, 300.0),
        );

        assert_eq!(page.pipeline().state(id), Some(ImageLoadState::InViewPending));
        assert_eq!(page.drain_fetch_requests().len(), 1);
    }

    #[test]
    fn test_scrolling_reveals_below_fold_images() {
        let mut page = storefront();
        let ids: Vec<InstanceId> = (0..3)
            .map(|row| {
                page.mount_at(
                    ImageRequest::new(format!("ferns/{row}.jpg")),
                    MountOptions::default(),
                    Rect::new(0.0, f64::from(row) * 1200.0, 300.0, 300.0),
                )
            })
            .collect();

        assert_eq!(page.complete_all().len(), 1);
        assert_eq!(page.scroll_by(1000.0), 1);
        assert_eq!(page.complete_all().len(), 1);
        assert_eq!(page.pipeline().state(ids[2]), Some(ImageLoadState::NotRequested));

        // Scrolling back up produces no second entry.
        assert_eq!(page.scroll_by(-1000.0), 0);
        assert_eq!(page.pipeline().state_counts(), [1, 0, 2, 0]);
    }

    #[test]
    fn test_close_releases_preload_links() {
        let mut page = storefront();
        page.mount_at(
            ImageRequest::new("hero/banner.jpg").with_priority(true),
            MountOptions::default(),
            Rect::new(0.0, 0.0, 1280.0, 400.0),
        );
        assert_eq!(page.head().len(), 1);

        page.close();
        assert!(page.head().is_empty());
        assert!(page.pipeline().is_empty());
    }

    #[test]
    fn test_priority_mounts_leave_no_layout_after_unmount() {
        let mut page = storefront();
        for n in 0..100 {
            let id = page.mount_at(
                ImageRequest::new(format!("hero/{n}.jpg")).with_priority(true),
                MountOptions::default(),
                Rect::new(0.0, 0.0, 1280.0, 400.0),
            );
            assert!(page.unmount(id));
        }

        assert!(page.pipeline().is_empty());
        assert!(page.widths.is_empty());
        assert_eq!(page.observer.placed(), 0);
        assert_eq!(page.observer.observed(), 0);
    }

    #[tokio::test]
    async fn test_run_fetches_downloads_selected_candidate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = AssetFetcher::new(Default::default(), &tx).unwrap();
        let mut page = storefront();
        let id = page.mount_at(
            ImageRequest::new("ferns/boston.jpg")
                .with_priority(true)
                .with_responsive(true)
                .with_widths(vec![320, 1280]),
            MountOptions::default(),
            Rect::new(0.0, 0.0, 300.0, 300.0),
        );
        let selected = page
            .pipeline()
            .render(id)
            .and_then(|view| view.asset.map(|asset| asset.best_candidate(300).to_string()))
            .unwrap();
        assert!(selected.contains("w-320"), "{selected}");
        fetcher
            .cache()
            .put(Arc::new(AssetInfo {
                url: selected.clone(),
                width: 320,
                height: 320,
                bytes: 10,
                source: AssetSource::Network,
            }))
            .await;

        let assets = page
            .run_fetches(&fetcher, &mut rx, Duration::from_secs(10))
            .await;

        assert_eq!(page.layout_width(id), Some(300));
        assert_eq!(assets[&id].url, selected);
        assert_eq!(page.pipeline().state(id), Some(ImageLoadState::Loaded));
    }

    #[tokio::test]
    async fn test_run_fetches_reports_failures() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = AssetFetcher::new(Default::default(), &tx).unwrap();
        let mut page = storefront();
        let id = page.mount_at(
            ImageRequest::new("http://127.0.0.1:9/missing.png").with_priority(true),
            MountOptions::default(),
            Rect::new(0.0, 0.0, 300.0, 300.0),
        );

        let assets = page
            .run_fetches(&fetcher, &mut rx, Duration::from_secs(10))
            .await;

        assert!(assets.is_empty());
        assert_eq!(page.pipeline().state(id), Some(ImageLoadState::Errored));
    }
}
