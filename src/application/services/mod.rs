pub mod image_pipeline;
pub mod preload_hints;
pub mod url_resolver;
pub mod viewport_scheduler;

pub use image_pipeline::{ClickHandler, FetchRequest, ImagePipeline, MountOptions, PipelineEvent};
pub use preload_hints::PreloadHints;
pub use url_resolver::{ResolvedUrls, ResolverSettings, UrlResolver};
pub use viewport_scheduler::{FetchTiming, ImmediateReason, ViewportScheduler};
