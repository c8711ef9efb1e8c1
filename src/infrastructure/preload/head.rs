//! In-memory document head holding preload links.

use parking_lot::Mutex;
use tracing::trace;

use crate::domain::entities::HintId;
use crate::domain::ports::{PreloadHint, PreloadHintPort};

/// Shared list of `<link rel="preload">` hints, in registration order.
#[derive(Debug, Default)]
pub struct PreloadHead {
    links: Mutex<Vec<(HintId, PreloadHint)>>,
}

impl PreloadHead {
    #[must_use]
    /// Creates an empty head.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the registered hints.
    #[must_use]
    pub fn hints(&self) -> Vec<PreloadHint> {
        self.links.lock().iter().map(|(_, h)| h.clone()).collect()
    }

    #[must_use]
    /// Returns true when a link for `href` is present.
    pub fn contains_href(&self, href: &str) -> bool {
        self.links.lock().iter().any(|(_, h)| h.href == href)
    }

    #[must_use]
    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.lock().len()
    }

    #[must_use]
    /// Returns true when there are no links.
    pub fn is_empty(&self) -> bool {
        self.links.lock().is_empty()
    }

    /// Renders all hints, one tag per line.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.links
            .lock()
            .iter()
            .map(|(_, h)| h.to_html())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl PreloadHintPort for PreloadHead {
    fn register(&self, hint: PreloadHint) -> HintId {
        let id = HintId::new();
        trace!(hint = %id, href = %hint.href, "Adding preload link");
        self.links.lock().push((id, hint));
        id
    }

    fn release(&self, id: HintId) -> bool {
        let mut links = self.links.lock();
        let before = links.len();
        links.retain(|(hid, _)| *hid != id);
        before != links.len()
    }
}
