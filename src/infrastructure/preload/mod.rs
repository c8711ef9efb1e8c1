//! Page preload side channel.

pub mod head;

pub use head::PreloadHead;
