//! Preload hints for priority images.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::domain::entities::{HintId, InstanceId};
use crate::domain::ports::{PreloadHint, PreloadHintPort};

/// Remembers which hint each priority instance registered, so teardown only
/// ever removes the instance's own hint.
pub struct PreloadHints {
    port: Arc<dyn PreloadHintPort>,
    hints: HashMap<InstanceId, HintId>,
}

impl std::fmt::Debug for PreloadHints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadHints")
            .field("hints", &self.hints.len())
            .finish_non_exhaustive()
    }
}

impl PreloadHints {
    #[must_use]
    /// Creates a registry publishing through `port`.
    pub fn new(port: Arc<dyn PreloadHintPort>) -> Self {
        Self {
            port,
            hints: HashMap::new(),
        }
    }

    /// Registers a hint for `instance`, replacing any earlier one it owned.
    pub fn register(&mut self, instance: InstanceId, hint: PreloadHint) -> HintId {
        let href = hint.href.clone();
        let id = self.port.register(hint);
        if let Some(previous) = self.hints.insert(instance, id) {
            self.port.release(previous);
        }
        debug!(%instance, hint = %id, href = %href, "Registered preload hint");
        id
    }

    /// Releases the hint owned by `instance`. Safe to call any number of
    /// times, including for instances that never registered one.
    pub fn release(&mut self, instance: InstanceId) -> bool {
        let Some(id) = self.hints.remove(&instance) else {
            return false;
        };
        let removed = self.port.release(id);
        trace!(%instance, hint = %id, removed, "Released preload hint");
        removed
    }

    #[must_use]
    /// Hint registered for an instance.
    pub fn hint_for(&self, instance: InstanceId) -> Option<HintId> {
        self.hints.get(&instance).copied()
    }

    #[must_use]
    /// Number of live hints.
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    #[must_use]
    /// Returns true when no hint is live.
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::preload::PreloadHead;

    #[test]
    fn test_register_and_release() {
        let head = Arc::new(PreloadHead::new());
        let mut hints = PreloadHints::new(head.clone());
        let instance = InstanceId::new();

        let id = hints.register(instance, PreloadHint::new("https://cdn.test/a.jpg"));
        assert_eq!(hints.hint_for(instance), Some(id));
        assert_eq!(head.len(), 1);

        assert!(hints.release(instance));
        assert!(head.is_empty());
    }

    #[test]
    fn test_release_is_idempotent() {
        let head = Arc::new(PreloadHead::new());
        let mut hints = PreloadHints::new(head.clone());
        let instance = InstanceId::new();

        assert!(!hints.release(instance));
        hints.register(instance, PreloadHint::new("https://cdn.test/a.jpg"));
        assert!(hints.release(instance));
        assert!(!hints.release(instance));
        assert!(head.is_empty());
    }

    #[test]
    fn test_instances_only_touch_their_own_hint() {
        let head = Arc::new(PreloadHead::new());
        let mut hints = PreloadHints::new(head.clone());
        let a = InstanceId::new();
        let b = InstanceId::new();

        hints.register(a, PreloadHint::new("https://cdn.test/a.jpg"));
        hints.register(b, PreloadHint::new("https://cdn.test/b.jpg"));
        hints.release(a);

        let remaining = head.hints();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].href, "https://cdn.test/b.jpg");
    }
}
