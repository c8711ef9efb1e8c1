//! Per-instance load state machine.

use serde::{Deserialize, Serialize};

/// Status of an image instance in the delivery pipeline.
///
/// Transitions are strictly ordered:
/// `NotRequested -> InViewPending -> Loaded | Errored`.
/// Priority instances start in `InViewPending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageLoadState {
    /// Waiting for viewport proximity; no network activity.
    #[default]
    NotRequested,
    /// Fetch started, no terminal event yet.
    InViewPending,
    /// Asset decoded and shown.
    Loaded,
    /// Fetch or decode failed; fallback shown.
    Errored,
}

impl ImageLoadState {
    /// Returns true once the instance reached `Loaded` or `Errored`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Errored)
    }

    /// Returns true while the fetch is in flight.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::InViewPending)
    }

    /// Returns true while the instance waits for the viewport.
    #[must_use]
    pub const fn is_not_requested(self) -> bool {
        matches!(self, Self::NotRequested)
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotRequested, Self::InViewPending)
                | (Self::InViewPending, Self::Loaded | Self::Errored)
        )
    }

    /// Starts the fetch. Returns the new state, or `None` if already started.
    #[must_use]
    pub const fn request(self) -> Option<Self> {
        if self.can_transition_to(Self::InViewPending) {
            Some(Self::InViewPending)
        } else {
            None
        }
    }

    /// Applies a fetch outcome. Returns `None` unless the fetch is pending.
    #[must_use]
    pub const fn complete(self, success: bool) -> Option<Self> {
        let next = if success { Self::Loaded } else { Self::Errored };
        if self.can_transition_to(next) {
            Some(next)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ImageLoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not_requested"),
            Self::InViewPending => write!(f, "in_view_pending"),
            Self::Loaded => write!(f, "loaded"),
            Self::Errored => write!(f, "errored"),
        }
    }
}
