//! Viewport observer over explicit layout geometry.
//!
//! Behaves like a browser intersection observer: targets are placed with a
//! rectangle, the viewport moves with `scroll_to`, and an entry is produced
//! only when a target goes from not-near to near. Entries are returned to the
//! caller, which forwards them to the pipeline.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use tracing::trace;

use crate::domain::entities::{InstanceId, ObservationId, ObserveOptions, Rect};
use crate::domain::errors::ObserveError;
use crate::domain::ports::ViewportObserverPort;

#[derive(Debug)]
struct Target {
    instance: InstanceId,
    options: ObserveOptions,
    near: bool,
}

#[derive(Debug)]
struct ObserverState {
    next_id: u64,
    viewport: Rect,
    targets: BTreeMap<u64, Target>,
    placements: HashMap<InstanceId, Rect>,
}

/// In-process intersection observer.
#[derive(Debug)]
pub struct GeometryViewportObserver {
    state: Mutex<ObserverState>,
}

impl GeometryViewportObserver {
    /// Creates an observer with the given visible area.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            state: Mutex::new(ObserverState {
                next_id: 1,
                viewport,
                targets: BTreeMap::new(),
                placements: HashMap::new(),
            }),
        }
    }

    #[must_use]
    /// Current viewport in page coordinates.
    pub fn viewport(&self) -> Rect {
        self.state.lock().viewport
    }

    /// Sets the render region of an instance and returns new entries.
    /// Regions are only kept for instances with a live observation; an
    /// instance that is never observed leaves no layout behind.
    pub fn place(&self, instance: InstanceId, rect: Rect) -> Vec<InstanceId> {
        let mut state = self.state.lock();
        if !state.targets.values().any(|t| t.instance == instance) {
            trace!(%instance, "Placement without observation ignored");
            return Vec::new();
        }
        state.placements.insert(instance, rect);
        Self::evaluate(&mut state)
    }

    /// Moves the visible area and returns new entries.
    pub fn scroll_to(&self, viewport: Rect) -> Vec<InstanceId> {
        let mut state = self.state.lock();
        state.viewport = viewport;
        trace!(y = viewport.y, height = viewport.height, "Viewport moved");
        Self::evaluate(&mut state)
    }

    /// Scrolls vertically by `dy` pixels.
    pub fn scroll_by(&self, dy: f64) -> Vec<InstanceId> {
        let mut viewport = self.viewport();
        viewport.y += dy;
        self.scroll_to(viewport)
    }

    /// Re-evaluates every target against the current geometry. Needed once
    /// after observing targets that are already placed near the viewport.
    pub fn poll(&self) -> Vec<InstanceId> {
        let mut state = self.state.lock();
        Self::evaluate(&mut state)
    }

    /// Number of live observations.
    #[must_use]
    pub fn observed(&self) -> usize {
        self.state.lock().targets.len()
    }

    /// Number of retained render regions.
    #[must_use]
    pub fn placed(&self) -> usize {
        self.state.lock().placements.len()
    }

    fn evaluate(state: &mut ObserverState) -> Vec<InstanceId> {
        let viewport = state.viewport;
        let placements = &state.placements;
        let mut entries = Vec::new();

        for target in state.targets.values_mut() {
            let near = placements
                .get(&target.instance)
                .is_some_and(|rect| target.options.is_near(rect, &viewport));
            if near && !target.near {
                entries.push(target.instance);
            }
            target.near = near;
        }
        entries
    }
}

impl Default for GeometryViewportObserver {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, 1280.0, 800.0))
    }
}

impl ViewportObserverPort for GeometryViewportObserver {
    fn observe(
        &self,
        target: InstanceId,
        options: ObserveOptions,
    ) -> Result<ObservationId, ObserveError> {
        if !(0.0..=1.0).contains(&options.threshold) {
            return Err(ObserveError::rejected(format!(
                "threshold {} outside 0..=1",
                options.threshold
            )));
        }

        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.targets.insert(
            id,
            Target {
                instance: target,
                options,
                near: false,
            },
        );
        Ok(ObservationId(id))
    }

    fn unobserve(&self, observation: ObservationId) {
        let mut state = self.state.lock();
        if let Some(target) = state.targets.remove(&observation.0) {
            state.placements.remove(&target.instance);
            trace!(%observation, instance = %target.instance, "Unobserved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer() -> GeometryViewportObserver {
        GeometryViewportObserver::new(Rect::new(0.0, 0.0, 1000.0, 800.0))
    }

    #[test]
    fn test_entry_on_crossing_only() {
        let obs = observer();
        let a = InstanceId::new();
        obs.observe(a, ObserveOptions::default()).unwrap();

        assert!(obs.place(a, Rect::new(0.0, 2000.0, 200.0, 200.0)).is_empty());
        assert_eq!(obs.scroll_to(Rect::new(0.0, 1300.0, 1000.0, 800.0)), vec![a]);
        // Still near; no repeated entry.
        assert!(obs.scroll_by(10.0).is_empty());
    }

    #[test]
    fn test_margin_triggers_before_visible() {
        let obs = observer();
        let a = InstanceId::new();
        obs.observe(a, ObserveOptions::default()).unwrap();

        // 150px below the fold.
        assert_eq!(obs.place(a, Rect::new(0.0, 950.0, 200.0, 200.0)), vec![a]);
    }

    #[test]
    fn test_unobserved_target_never_reports() {
        let obs = observer();
        let a = InstanceId::new();
        let id = obs.observe(a, ObserveOptions::default()).unwrap();
        obs.place(a, Rect::new(0.0, 3000.0, 200.0, 200.0));

        obs.unobserve(id);
        assert_eq!(obs.observed(), 0);
        assert!(obs.scroll_to(Rect::new(0.0, 2800.0, 1000.0, 800.0)).is_empty());
        assert!(obs.place(a, Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_unobserved_instance_keeps_no_placement() {
        let obs = observer();
        let a = InstanceId::new();

        assert!(obs.place(a, Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
        assert_eq!(obs.placed(), 0);

        let id = obs.observe(a, ObserveOptions::default()).unwrap();
        obs.place(a, Rect::new(0.0, 3000.0, 10.0, 10.0));
        assert_eq!(obs.placed(), 1);
        obs.unobserve(id);
        assert_eq!(obs.placed(), 0);
    }

    #[test]
    fn test_entries_in_observation_order() {
        let obs = observer();
        let a = InstanceId::new();
        let b = InstanceId::new();
        obs.observe(a, ObserveOptions::default()).unwrap();
        obs.observe(b, ObserveOptions::default()).unwrap();
        obs.place(b, Rect::new(0.0, 1500.0, 100.0, 100.0));
        obs.place(a, Rect::new(0.0, 1600.0, 100.0, 100.0));

        assert_eq!(obs.scroll_by(1000.0), vec![a, b]);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let obs = observer();
        let result = obs.observe(
            InstanceId::new(),
            ObserveOptions {
                root_margin_px: 0,
                threshold: 1.5,
            },
        );
        assert!(matches!(result, Err(ObserveError::Rejected { .. })));
    }
}
