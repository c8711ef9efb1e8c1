//! Adaptive image delivery pipeline.
//!
//! Owns every mounted image instance and drives its load state:
//!
//! - mount: resolve URLs, then either start fetching (priority, or no
//!   viewport observer available) or wait for the viewport
//! - near-viewport entry: start fetching, exactly once
//! - load / error completion: terminal `Loaded` / `Errored`
//! - unmount: release the observation and preload hint
//!
//! Asynchronous signals reference instances by `InstanceId`. Signals for an
//! id that is no longer mounted are dropped without touching any state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::preload_hints::PreloadHints;
use super::url_resolver::{ResolvedUrls, UrlResolver};
use super::viewport_scheduler::{FetchTiming, ViewportScheduler};
use crate::domain::entities::{
    AssetElement, AssetKey, CROSS_FADE, FallbackView, FetchPriority, ImageLoadState, ImageRequest,
    ImageView, InstanceId, LoadingMode, ObserveOptions, Placeholder, SrcCandidate,
    select_candidate,
};
use crate::domain::ports::{PreloadHint, PreloadHintPort, ViewportObserverPort};

/// Callback invoked when the rendered root element is clicked.
pub type ClickHandler = Arc<dyn Fn(InstanceId) + Send + Sync>;

/// Optional per-instance settings that are not part of the image request.
#[derive(Default, Clone)]
pub struct MountOptions {
    /// Tag for the root element. Defaults to a digest of the logical path.
    pub test_id: Option<String>,
    /// Alternative text. Defaults to the file name of the logical path.
    pub alt: Option<String>,
    /// Invoked with the instance id when the rendered root is clicked.
    pub on_click: Option<ClickHandler>,
}

impl std::fmt::Debug for MountOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountOptions")
            .field("test_id", &self.test_id)
            .field("alt", &self.alt)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

impl MountOptions {
    #[must_use]
    /// Overrides the test id derived from the path.
    pub fn with_test_id(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = Some(test_id.into());
        self
    }

    #[must_use]
    /// Overrides the alt text derived from the path.
    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    #[must_use]
    /// Makes the rendered root clickable.
    pub fn with_on_click(mut self, handler: ClickHandler) -> Self {
        self.on_click = Some(handler);
        self
    }
}

/// Instruction for the renderer to start fetching an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Instance the asset belongs to.
    pub instance: InstanceId,
    /// The asset element's `src`.
    pub url: String,
    /// The asset element's `srcset`, empty when not responsive.
    pub candidates: Vec<SrcCandidate>,
}

impl FetchRequest {
    /// URL to download for an image rendered `display_width` pixels wide.
    /// Without a width, or without candidates, this is `url`.
    #[must_use]
    pub fn url_for(&self, display_width: Option<u32>) -> &str {
        display_width.map_or(self.url.as_str(), |width| {
            select_candidate(&self.candidates, &self.url, width)
        })
    }
}

/// Signals delivered to the pipeline by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PipelineEvent {
    NearViewport(InstanceId),
    AssetLoaded(InstanceId),
    AssetFailed { instance: InstanceId, reason: String },
}

struct ImageInstance {
    request: ImageRequest,
    urls: ResolvedUrls,
    state: ImageLoadState,
    test_id: String,
    alt: String,
    on_click: Option<ClickHandler>,
    error: Option<String>,
}

/// Mounted image instances and their shared collaborators.
pub struct ImagePipeline {
    resolver: UrlResolver,
    scheduler: ViewportScheduler,
    hints: PreloadHints,
    instances: HashMap<InstanceId, ImageInstance>,
    outbox: Vec<FetchRequest>,
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("instances", &self.instances.len())
            .field("scheduler", &self.scheduler)
            .field("hints", &self.hints)
            .field("pending_fetches", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl ImagePipeline {
    #[must_use]
    /// Creates an empty pipeline.
    pub fn new(
        resolver: UrlResolver,
        observer: Arc<dyn ViewportObserverPort>,
        preload: Arc<dyn PreloadHintPort>,
        options: ObserveOptions,
    ) -> Self {
        Self {
            resolver,
            scheduler: ViewportScheduler::new(observer, options),
            hints: PreloadHints::new(preload),
            instances: HashMap::new(),
            outbox: Vec::new(),
        }
    }

    #[must_use]
    /// Resolver used for every mount.
    pub const fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Mounts an image with default options.
    pub fn mount(&mut self, request: ImageRequest) -> InstanceId {
        self.mount_with(request, MountOptions::default())
    }

    /// Mounts an image and returns its id.
    pub fn mount_with(&mut self, request: ImageRequest, options: MountOptions) -> InstanceId {
        let id = InstanceId::new();
        let urls = self.resolver.resolve(&request);
        let test_id = options
            .test_id
            .unwrap_or_else(|| default_test_id(&request.logical_path));
        let alt = options
            .alt
            .unwrap_or_else(|| default_alt(&request.logical_path));

        let priority = request.priority;
        if priority {
            let mut hint = PreloadHint::new(urls.full.clone());
            if !urls.srcset.is_empty() {
                hint = hint.with_candidates(urls.srcset.clone(), request.display_intent.sizes());
            }
            self.hints.register(id, hint);
        }

        self.instances.insert(
            id,
            ImageInstance {
                request,
                urls,
                state: ImageLoadState::NotRequested,
                test_id,
                alt,
                on_click: options.on_click,
                error: None,
            },
        );

        match self.scheduler.schedule(id, priority) {
            FetchTiming::Immediate(reason) => {
                debug!(instance = %id, ?reason, "Mounted, fetching immediately");
                self.start_fetch(id);
            }
            FetchTiming::Deferred(_) => {
                debug!(instance = %id, "Mounted, waiting for viewport");
            }
        }
        id
    }

    /// Applies an event. Returns true if it changed an instance's state.
    pub fn handle(&mut self, event: PipelineEvent) -> bool {
        match event {
            PipelineEvent::NearViewport(id) => self.on_near_viewport(id),
            PipelineEvent::AssetLoaded(id) => self.on_load(id),
            PipelineEvent::AssetFailed { instance, reason } => self.on_error(instance, &reason),
        }
    }

    /// Handles the first near-viewport entry of a lazy instance.
    pub fn on_near_viewport(&mut self, id: InstanceId) -> bool {
        if !self.instances.contains_key(&id) {
            trace!(instance = %id, "Viewport entry for unmounted instance ignored");
            return false;
        }
        if !self.scheduler.on_near_viewport(id) {
            return false;
        }
        self.start_fetch(id)
    }

    /// Handles a successful fetch and decode.
    pub fn on_load(&mut self, id: InstanceId) -> bool {
        self.complete(id, None)
    }

    /// Handles a failed fetch or decode.
    pub fn on_error(&mut self, id: InstanceId, reason: &str) -> bool {
        self.complete(id, Some(reason))
    }

    fn start_fetch(&mut self, id: InstanceId) -> bool {
        let Some(instance) = self.instances.get_mut(&id) else {
            return false;
        };
        let Some(next) = instance.state.request() else {
            return false;
        };
        instance.state = next;
        self.outbox.push(FetchRequest {
            instance: id,
            url: instance.urls.full.clone(),
            candidates: instance.urls.srcset.clone(),
        });
        debug!(instance = %id, url = %instance.urls.full, "Fetch requested");
        true
    }

    fn complete(&mut self, id: InstanceId, failure: Option<&str>) -> bool {
        let Some(instance) = self.instances.get_mut(&id) else {
            trace!(instance = %id, "Completion for unmounted instance ignored");
            return false;
        };
        let Some(next) = instance.state.complete(failure.is_none()) else {
            trace!(instance = %id, state = %instance.state, "Completion ignored");
            return false;
        };
        instance.state = next;

        match failure {
            None => debug!(instance = %id, path = %instance.request.logical_path, "Image loaded"),
            Some(reason) => {
                warn!(instance = %id, path = %instance.request.logical_path, error = %reason, "Image failed to load");
                instance.error = Some(reason.to_string());
            }
        }
        true
    }

    /// Tears down an instance. Unknown ids are ignored.
    pub fn unmount(&mut self, id: InstanceId) -> bool {
        let Some(instance) = self.instances.remove(&id) else {
            return false;
        };
        self.scheduler.cancel(id);
        self.hints.release(id);
        self.outbox.retain(|r| r.instance != id);
        trace!(instance = %id, state = %instance.state, "Unmounted");
        true
    }

    /// Unmounts every instance.
    pub fn unmount_all(&mut self) {
        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        let count = ids.len();
        for id in ids {
            self.unmount(id);
        }
        if count > 0 {
            info!(count, "Unmounted all images");
        }
    }

    /// Invokes the click handler. Returns false when there is none.
    pub fn click(&self, id: InstanceId) -> bool {
        match self.instances.get(&id).and_then(|i| i.on_click.as_ref()) {
            Some(handler) => {
                handler(id);
                true
            }
            None => false,
        }
    }

    /// Takes the fetch instructions produced since the last call.
    pub fn drain_fetch_requests(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.outbox)
    }

    #[must_use]
    /// Current load state, `None` once unmounted.
    pub fn state(&self, id: InstanceId) -> Option<ImageLoadState> {
        self.instances.get(&id).map(|i| i.state)
    }

    /// Failure reason of an errored instance.
    #[must_use]
    pub fn error(&self, id: InstanceId) -> Option<&str> {
        self.instances.get(&id).and_then(|i| i.error.as_deref())
    }

    #[must_use]
    /// URLs resolved at mount time.
    pub fn urls(&self, id: InstanceId) -> Option<&ResolvedUrls> {
        self.instances.get(&id).map(|i| &i.urls)
    }

    #[must_use]
    /// Returns true while the instance is mounted.
    pub fn is_mounted(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    #[must_use]
    /// Number of mounted instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    /// Returns true when nothing is mounted.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Live viewport observations.
    #[must_use]
    pub fn active_observations(&self) -> usize {
        self.scheduler.active()
    }

    /// Live preload hints owned by mounted instances.
    #[must_use]
    pub fn active_hints(&self) -> usize {
        self.hints.len()
    }

    /// Number of instances in each state: not requested, pending, loaded,
    /// errored.
    #[must_use]
    pub fn state_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for instance in self.instances.values() {
            let slot = match instance.state {
                ImageLoadState::NotRequested => 0,
                ImageLoadState::InViewPending => 1,
                ImageLoadState::Loaded => 2,
                ImageLoadState::Errored => 3,
            };
            counts[slot] += 1;
        }
        counts
    }

    /// Renders an instance.
    #[must_use]
    pub fn render(&self, id: InstanceId) -> Option<ImageView> {
        let instance = self.instances.get(&id)?;
        let request = &instance.request;
        let intent = &request.display_intent;

        let placeholder = (!instance.state.is_terminal()).then(|| {
            match (&instance.urls.placeholder, request.blur_placeholder) {
                (Some(url), true) => Placeholder::Blur { url: url.clone() },
                _ => Placeholder::Skeleton,
            }
        });

        let asset = match instance.state {
            ImageLoadState::InViewPending | ImageLoadState::Loaded => Some(AssetElement {
                src: instance.urls.full.clone(),
                srcset: instance.urls.srcset.clone(),
                sizes: (!instance.urls.srcset.is_empty()).then(|| intent.sizes()),
                loading: if request.priority {
                    LoadingMode::Eager
                } else {
                    LoadingMode::Lazy
                },
                fetch_priority: if request.priority {
                    FetchPriority::High
                } else {
                    FetchPriority::Auto
                },
                opacity: if instance.state == ImageLoadState::Loaded {
                    1.0
                } else {
                    0.0
                },
                transition: CROSS_FADE,
                alt: instance.alt.clone(),
            }),
            ImageLoadState::NotRequested | ImageLoadState::Errored => None,
        };

        let fallback =
            (instance.state == ImageLoadState::Errored).then(FallbackView::default);

        Some(ImageView {
            instance: id,
            test_id: instance.test_id.clone(),
            state: instance.state,
            clickable: instance.on_click.is_some(),
            width: intent.width,
            height: intent.effective_height(),
            aspect_ratio: intent.aspect_ratio,
            object_fit: intent.object_fit,
            placeholder,
            asset,
            fallback,
        })
    }
}

fn default_test_id(logical_path: &str) -> String {
    format!("image-{}", AssetKey::from_url(logical_path).short())
}

fn default_alt(logical_path: &str) -> String {
    let name = logical_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.replace(['-', '_'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alt() {
        assert_eq!(default_alt("roses/red-climbing_rose.jpg"), "red climbing rose");
        assert_eq!(default_alt("https://x.test/a/fern.png?v=2"), "fern");
        assert_eq!(default_alt(""), "");
    }

    #[test]
    fn test_default_test_id_is_stable() {
        assert_eq!(default_test_id("roses/1.jpg"), default_test_id("roses/1.jpg"));
        assert!(default_test_id("roses/1.jpg").starts_with("image-"));
        assert_ne!(default_test_id("roses/1.jpg"), default_test_id("roses/2.jpg"));
    }

    #[test]
    fn test_fetch_url_follows_display_width() {
        let request = FetchRequest {
            instance: InstanceId::new(),
            url: "https://cdn.test/a.jpg".to_string(),
            candidates: vec![
                SrcCandidate::new("https://cdn.test/tr:w-320/a.jpg", 320),
                SrcCandidate::new("https://cdn.test/tr:w-640/a.jpg", 640),
            ],
        };

        assert_eq!(request.url_for(None), "https://cdn.test/a.jpg");
        assert_eq!(request.url_for(Some(300)), "https://cdn.test/tr:w-320/a.jpg");
        assert_eq!(request.url_for(Some(500)), "https://cdn.test/tr:w-640/a.jpg");
        assert_eq!(request.url_for(Some(4000)), "https://cdn.test/tr:w-640/a.jpg");

        let plain = FetchRequest {
            candidates: Vec::new(),
            ..request
        };
        assert_eq!(plain.url_for(Some(300)), "https://cdn.test/a.jpg");
    }
}
