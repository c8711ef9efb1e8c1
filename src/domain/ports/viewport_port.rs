//! Viewport observation port definition.

use crate::domain::entities::{InstanceId, ObservationId, ObserveOptions};
use crate::domain::errors::ObserveError;

/// Port for watching when an instance's render region nears the viewport.
///
/// Implementations report entries by `InstanceId`; delivery of those entries
/// to the pipeline is the caller's event loop. After `unobserve` an
/// implementation must not report the target again.
#[cfg_attr(test, mockall::automock)]
pub trait ViewportObserverPort: Send + Sync {
    /// Starts observing the render region of `target`.
    ///
    /// # Errors
    /// Returns error if the runtime cannot observe the target.
    fn observe(
        &self,
        target: InstanceId,
        options: ObserveOptions,
    ) -> Result<ObservationId, ObserveError>;

    /// Stops an observation. Unknown ids are ignored.
    fn unobserve(&self, observation: ObservationId);
}
