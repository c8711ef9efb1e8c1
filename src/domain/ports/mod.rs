mod catalog_port;
mod preload_port;
mod viewport_port;

pub use catalog_port::CatalogSeedPort;
pub use preload_port::{PreloadHint, PreloadHintPort};
pub use viewport_port::ViewportObserverPort;
