//! Viewport observation adapters.

pub mod geometry_observer;

pub use geometry_observer::GeometryViewportObserver;
