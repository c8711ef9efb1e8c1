//! Domain layer with image pipeline entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{ImageLoadState, ImageRequest, ImageView, InstanceId};
pub use errors::{FetchError, ObserveError, SeedError};
pub use ports::{CatalogSeedPort, PreloadHintPort, ViewportObserverPort};
