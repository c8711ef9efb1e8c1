//! Layout geometry for viewport-proximity checks.

use serde::{Deserialize, Serialize};

/// Default distance in pixels from the visible area at which an image counts
/// as near the viewport.
pub const DEFAULT_ROOT_MARGIN_PX: u32 = 200;

/// Default minimal visible fraction of the target inside the expanded root.
pub const DEFAULT_THRESHOLD: f32 = 0.01;

/// Axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge in page pixels.
    pub x: f64,
    /// Top edge in page pixels.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    #[must_use]
    /// Creates a rectangle from its origin and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    /// Width times height; zero for degenerate rectangles.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Overlap with `other`, if any. Touching edges count as a zero-area
    /// overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Self::new(left, top, right - left, bottom - top))
    }
}

/// Parameters for one viewport observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserveOptions {
    /// Pixels added around the visible area.
    pub root_margin_px: u32,
    /// Minimal fraction of the target that must be inside the expanded area.
    pub threshold: f32,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            root_margin_px: DEFAULT_ROOT_MARGIN_PX,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ObserveOptions {
    /// Whether `target` counts as near `viewport` under these options.
    #[must_use]
    pub fn is_near(&self, target: &Rect, viewport: &Rect) -> bool {
        let root = viewport.expand(f64::from(self.root_margin_px));
        let Some(overlap) = target.intersection(&root) else {
            return false;
        };

        let area = target.area();
        if area <= 0.0 {
            return true;
        }
        overlap.area() / area >= f64::from(self.threshold).max(f64::MIN_POSITIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 1280.0, 800.0)
    }

    #[test]
    fn test_visible_target_is_near() {
        let opts = ObserveOptions::default();
        assert!(opts.is_near(&Rect::new(10.0, 10.0, 300.0, 200.0), &viewport()));
    }

    #[test]
    fn test_target_within_margin_is_near() {
        let opts = ObserveOptions::default();
        // Starts 150px below the fold; inside the 200px margin.
        assert!(opts.is_near(&Rect::new(0.0, 950.0, 300.0, 200.0), &viewport()));
    }

    #[test]
    fn test_target_beyond_margin_is_not_near() {
        let opts = ObserveOptions::default();
        assert!(!opts.is_near(&Rect::new(0.0, 1100.0, 300.0, 200.0), &viewport()));
    }

    #[test]
    fn test_threshold_requires_fraction() {
        let opts = ObserveOptions {
            root_margin_px: 0,
            threshold: 0.5,
        };
        // Only 25% of the target is inside the viewport.
        assert!(!opts.is_near(&Rect::new(0.0, 750.0, 100.0, 200.0), &viewport()));
        assert!(opts.is_near(&Rect::new(0.0, 650.0, 100.0, 200.0), &viewport()));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersection(&Rect::new(20.0, 20.0, 1.0, 1.0)), None);
    }
}
