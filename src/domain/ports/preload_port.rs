//! Preload hint port definition.

use serde::Serialize;

use crate::domain::entities::{HintId, SrcCandidate, escape, srcset_attr};

/// A page-level hint asking the loader to fetch an image early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadHint {
    /// Full-size URL, identical to the asset element's `src`.
    pub href: String,
    /// Candidates identical to the asset element's `srcset`.
    pub image_srcset: Vec<SrcCandidate>,
    /// `imagesizes` attribute, set with candidates.
    pub image_sizes: Option<String>,
}

impl PreloadHint {
    #[must_use]
    /// Creates a hint for a single URL.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            image_srcset: Vec::new(),
            image_sizes: None,
        }
    }

    #[must_use]
    /// Adds responsive candidates and their `sizes` hint.
    pub fn with_candidates(mut self, srcset: Vec<SrcCandidate>, sizes: impl Into<String>) -> Self {
        self.image_srcset = srcset;
        self.image_sizes = Some(sizes.into());
        self
    }

    /// Serializes to a `<link rel="preload">` tag.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<link rel=\"preload\" as=\"image\" href=\"{}\" fetchpriority=\"high\"",
            escape(&self.href)
        );
        if !self.image_srcset.is_empty() {
            html.push_str(&format!(
                " imagesrcset=\"{}\"",
                escape(&srcset_attr(&self.image_srcset))
            ));
        }
        if let Some(sizes) = &self.image_sizes {
            html.push_str(&format!(" imagesizes=\"{}\"", escape(sizes)));
        }
        html.push('>');
        html
    }
}

/// Port for the page's shared preload side channel.
///
/// Each registration is owned by the instance that made it; releasing an
/// unknown or already released hint is a no-op.
pub trait PreloadHintPort: Send + Sync {
    /// Registers a hint and returns its handle.
    fn register(&self, hint: PreloadHint) -> HintId;

    /// Removes a hint. Returns true if it was present.
    fn release(&self, id: HintId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_hint_html() {
        let hint = PreloadHint::new("https://cdn.test/tr:w-800/a.jpg");
        assert_eq!(
            hint.to_html(),
            "<link rel=\"preload\" as=\"image\" href=\"https://cdn.test/tr:w-800/a.jpg\" fetchpriority=\"high\">"
        );
    }

    #[test]
    fn test_responsive_hint_html() {
        let hint = PreloadHint::new("https://cdn.test/a.jpg").with_candidates(
            vec![SrcCandidate::new("https://cdn.test/tr:w-320/a.jpg", 320)],
            "100vw",
        );
        let html = hint.to_html();
        assert!(html.contains("imagesrcset=\"https://cdn.test/tr:w-320/a.jpg 320w\""));
        assert!(html.contains("imagesizes=\"100vw\""));
    }
}
