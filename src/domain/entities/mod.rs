//! Domain entity definitions.

mod access;
mod geometry;
mod ids;
mod image_request;
mod load_state;
mod product;
mod transform;
mod view;

pub use access::{AccessPolicy, UserIdentity};
pub use geometry::{DEFAULT_ROOT_MARGIN_PX, DEFAULT_THRESHOLD, ObserveOptions, Rect};
pub use ids::{AssetKey, HintId, InstanceId, ObservationId};
pub use image_request::{AspectRatio, DisplayIntent, ImageRequest, ObjectFit};
pub use load_state::ImageLoadState;
pub use product::{Product, ProductId};
pub use transform::{Transform, TransformFlags};
pub use view::{
    AssetElement, CROSS_FADE, FALLBACK_GLYPH, FALLBACK_LABEL, FallbackView, FetchPriority,
    ImageView, LoadingMode, Placeholder, SrcCandidate, escape, select_candidate, srcset_attr,
};
