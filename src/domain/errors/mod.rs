//! Domain error types.

mod fetch_error;
mod observe_error;
mod seed_error;

pub use fetch_error::{FetchError, FetchResult};
pub use observe_error::ObserveError;
pub use seed_error::SeedError;
