//! CDN transform descriptors.
//!
//! The CDN accepts a comma-separated descriptor embedded in the URL path,
//! e.g. `tr:w-800,h-600,f-auto`. Parameters are always emitted in the same
//! order so equal transforms produce byte-identical URLs.

use serde::{Deserialize, Serialize};

use super::AspectRatio;

bitflags::bitflags! {
    /// Boolean transform switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TransformFlags: u8 {
        /// Let the CDN pick the best format for the client (`f-auto`).
        const AUTO_FORMAT = 1 << 0;
        /// Smart crop around the focal point (`fo-auto`).
        const AUTO_CROP = 1 << 1;
        /// Progressive encoding (`pr-true`).
        const PROGRESSIVE = 1 << 2;
    }
}

/// A set of CDN transform parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Target width, `w-`.
    pub width: Option<u32>,
    /// Target height, `h-`.
    pub height: Option<u32>,
    /// Crop ratio, `ar-`.
    pub aspect_ratio: Option<AspectRatio>,
    /// 1-100.
    pub quality: Option<u8>,
    /// Gaussian blur radius, 1-100.
    pub blur: Option<u8>,
    /// Boolean transforms.
    pub flags: TransformFlags,
}

#[allow(missing_docs)]
impl Transform {
    /// An empty transform; resolves to the untouched original.
    #[must_use]
    pub const fn original() -> Self {
        Self {
            width: None,
            height: None,
            aspect_ratio: None,
            quality: None,
            blur: None,
            flags: TransformFlags::empty(),
        }
    }

    #[must_use]
    pub const fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub const fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    #[must_use]
    pub const fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    #[must_use]
    pub const fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    #[must_use]
    pub const fn with_blur(mut self, blur: u8) -> Self {
        self.blur = Some(blur);
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: TransformFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    /// Returns true when the descriptor would carry no parameter. Zero
    /// dimensions count as unset.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !matches!(self.width, Some(w) if w > 0)
            && !matches!(self.height, Some(h) if h > 0)
            && self.aspect_ratio.is_none()
            && self.quality.is_none()
            && self.blur.is_none()
            && self.flags.is_empty()
    }

    /// Serializes to the descriptor string, without the `tr:` prefix.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let mut params = Vec::with_capacity(8);

        if let Some(w) = self.width.filter(|w| *w > 0) {
            params.push(format!("w-{w}"));
        }
        if let Some(h) = self.height.filter(|h| *h > 0) {
            params.push(format!("h-{h}"));
        }
        if let Some(ratio) = self.aspect_ratio {
            params.push(format!("ar-{}-{}", ratio.width(), ratio.height()));
        }
        if let Some(q) = self.quality {
            params.push(format!("q-{}", q.clamp(1, 100)));
        }
        if let Some(bl) = self.blur {
            params.push(format!("bl-{}", bl.clamp(1, 100)));
        }
        if self.flags.contains(TransformFlags::AUTO_FORMAT) {
            params.push("f-auto".to_string());
        }
        if self.flags.contains(TransformFlags::AUTO_CROP) {
            params.push("fo-auto".to_string());
        }
        if self.flags.contains(TransformFlags::PROGRESSIVE) {
            params.push("pr-true".to_string());
        }

        params.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_order_is_fixed() {
        let t = Transform::original()
            .with_flags(TransformFlags::AUTO_FORMAT | TransformFlags::PROGRESSIVE)
            .with_blur(10)
            .with_quality(20)
            .with_height(600)
            .with_width(800);

        assert_eq!(t.descriptor(), "w-800,h-600,q-20,bl-10,f-auto,pr-true");
    }

    #[test]
    fn test_empty_descriptor() {
        assert!(Transform::original().is_empty());
        assert_eq!(Transform::original().descriptor(), "");
    }

    #[test]
    fn test_zero_dimensions_count_as_empty() {
        let t = Transform::original().with_width(0).with_height(0);
        assert!(t.is_empty());
        assert_eq!(t.descriptor(), "");
        assert!(!Transform::original().with_width(1).is_empty());
    }

    #[test]
    fn test_quality_is_clamped() {
        let t = Transform::original().with_quality(0);
        assert_eq!(t.descriptor(), "q-1");
        let t = Transform::original().with_blur(250);
        assert_eq!(t.descriptor(), "bl-100");
    }

    #[test]
    fn test_aspect_ratio_and_crop() {
        let ratio = AspectRatio::new(16, 9).unwrap();
        let t = Transform::original()
            .with_aspect_ratio(ratio)
            .with_flags(TransformFlags::AUTO_CROP);
        assert_eq!(t.descriptor(), "ar-16-9,fo-auto");
    }
}
