//! Decides when a non-priority image starts fetching.
//!
//! Each lazy instance gets one viewport observation. The first near-viewport
//! entry releases it; later entries for the same instance are dropped, which
//! gives at-most-once delivery even if the observer misbehaves.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::domain::entities::{InstanceId, ObservationId, ObserveOptions};
use crate::domain::ports::ViewportObserverPort;

/// Outcome of scheduling one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTiming {
    /// Start fetching now.
    Immediate(ImmediateReason),
    /// Wait for the first near-viewport entry.
    Deferred(ObservationId),
}

/// Why an instance skipped the viewport wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ImmediateReason {
    Priority,
    ObserverUnavailable,
}

/// Tracks one observation per waiting instance.
pub struct ViewportScheduler {
    observer: Arc<dyn ViewportObserverPort>,
    options: ObserveOptions,
    observations: HashMap<InstanceId, ObservationId>,
}

impl std::fmt::Debug for ViewportScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportScheduler")
            .field("options", &self.options)
            .field("observations", &self.observations.len())
            .finish_non_exhaustive()
    }
}

impl ViewportScheduler {
    #[must_use]
    /// Creates a scheduler registering observations with `options`.
    pub fn new(observer: Arc<dyn ViewportObserverPort>, options: ObserveOptions) -> Self {
        Self {
            observer,
            options,
            observations: HashMap::new(),
        }
    }

    #[must_use]
    /// Observation options applied to every registration.
    pub const fn options(&self) -> ObserveOptions {
        self.options
    }

    /// Decides fetch timing for a newly mounted instance.
    ///
    /// If the observer cannot be set up the instance is treated as priority
    /// rather than left waiting forever.
    pub fn schedule(&mut self, instance: InstanceId, priority: bool) -> FetchTiming {
        if priority {
            trace!(%instance, "Priority image, skipping viewport wait");
            return FetchTiming::Immediate(ImmediateReason::Priority);
        }

        match self.observer.observe(instance, self.options) {
            Ok(observation) => {
                debug!(%instance, %observation, margin = self.options.root_margin_px, "Deferred until near viewport");
                if let Some(stale) = self.observations.insert(instance, observation) {
                    self.observer.unobserve(stale);
                }
                FetchTiming::Deferred(observation)
            }
            Err(e) => {
                warn!(%instance, error = %e, "Viewport observer unavailable, fetching immediately");
                FetchTiming::Immediate(ImmediateReason::ObserverUnavailable)
            }
        }
    }

    /// Handles a near-viewport entry. Returns true only for the first entry
    /// of an observed instance; the observation is released before returning.
    pub fn on_near_viewport(&mut self, instance: InstanceId) -> bool {
        match self.observations.remove(&instance) {
            Some(observation) => {
                self.observer.unobserve(observation);
                debug!(%instance, %observation, "Near viewport, observation released");
                true
            }
            None => {
                trace!(%instance, "Ignoring viewport entry for unobserved instance");
                false
            }
        }
    }

    /// Releases the observation of an instance, if it still has one.
    pub fn cancel(&mut self, instance: InstanceId) -> bool {
        if let Some(observation) = self.observations.remove(&instance) {
            self.observer.unobserve(observation);
            trace!(%instance, %observation, "Observation cancelled");
            true
        } else {
            false
        }
    }

    #[must_use]
    /// Returns true while an observation is live for `instance`.
    pub fn is_observing(&self, instance: InstanceId) -> bool {
        self.observations.contains_key(&instance)
    }

    /// Number of live observations.
    #[must_use]
    pub fn active(&self) -> usize {
        self.observations.len()
    }
}
