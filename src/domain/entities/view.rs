//! Render tree produced for one image instance.
//!
//! `ImageView` is the DOM-equivalent output of rendering: a root element with
//! at most one background layer, at most one asset element, and at most one
//! fallback. It can be inspected directly or serialized to markup.

use serde::Serialize;

use super::{AspectRatio, ImageLoadState, InstanceId, ObjectFit};

/// Duration of the placeholder-to-asset cross-fade.
pub const CROSS_FADE: &str = "opacity 300ms ease-in-out";

/// Glyph shown when an image failed to load.
pub const FALLBACK_GLYPH: &str = "\u{1F5BC}";

/// Label shown when an image failed to load.
pub const FALLBACK_LABEL: &str = "Image unavailable";

/// One width variant of a responsive image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SrcCandidate {
    /// Delivery URL of this width.
    pub url: String,
    /// Intrinsic width the URL delivers.
    pub width: u32,
}

impl SrcCandidate {
    #[must_use]
    /// Creates a candidate.
    pub fn new(url: impl Into<String>, width: u32) -> Self {
        Self {
            url: url.into(),
            width,
        }
    }
}

/// Formats candidates as a `srcset` attribute value.
#[must_use]
pub fn srcset_attr(candidates: &[SrcCandidate]) -> String {
    candidates
        .iter()
        .map(|c| format!("{} {}w", c.url, c.width))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Picks the URL a browser would fetch for the given rendered width:
/// the smallest candidate covering it, else the largest, else `src`.
#[must_use]
pub fn select_candidate<'a>(candidates: &'a [SrcCandidate], src: &'a str, target_width: u32) -> &'a str {
    candidates
        .iter()
        .filter(|c| c.width >= target_width)
        .min_by_key(|c| c.width)
        .or_else(|| candidates.iter().max_by_key(|c| c.width))
        .map_or(src, |c| c.url.as_str())
}

/// When the browser-equivalent renderer may start the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
#[serde(rename_all = "lowercase")]
pub enum LoadingMode {
    Lazy,
    Eager,
}

impl LoadingMode {
    #[must_use]
    /// Value of the `loading` attribute.
    pub const fn as_attr(self) -> &'static str {
        match self {
            Self::Lazy => "lazy",
            Self::Eager => "eager",
        }
    }
}

/// Network priority hint for the asset fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
#[serde(rename_all = "lowercase")]
pub enum FetchPriority {
    High,
    Auto,
}

impl FetchPriority {
    #[must_use]
    /// Value of the `fetchpriority` attribute.
    pub const fn as_attr(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Auto => "auto",
        }
    }
}

/// Background shown while the asset is not yet loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Placeholder {
    /// Low-resolution blurred preview.
    Blur { url: String },
    /// Neutral shimmering block.
    Skeleton,
}

/// The real image element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetElement {
    /// Primary URL.
    pub src: String,
    /// Responsive candidates.
    pub srcset: Vec<SrcCandidate>,
    /// `sizes` hint, present with candidates.
    pub sizes: Option<String>,
    /// Browser loading mode.
    pub loading: LoadingMode,
    /// Browser fetch priority.
    pub fetch_priority: FetchPriority,
    /// 0.0 while pending, 1.0 once loaded.
    pub opacity: f32,
    /// CSS transition applied to opacity.
    pub transition: &'static str,
    /// Alternative text.
    pub alt: String,
}

impl AssetElement {
    /// Returns true when the element is fully shown.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.opacity >= 1.0
    }

    /// URL fetched at the given rendered width. See [`select_candidate`].
    #[must_use]
    pub fn best_candidate(&self, target_width: u32) -> &str {
        select_candidate(&self.srcset, &self.src, target_width)
    }
}

/// Visual shown instead of the asset after a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct FallbackView {
    pub glyph: &'static str,
    pub label: &'static str,
}

impl Default for FallbackView {
    fn default() -> Self {
        Self {
            glyph: FALLBACK_GLYPH,
            label: FALLBACK_LABEL,
        }
    }
}

/// Rendered output for one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct ImageView {
    #[serde(skip)]
    pub instance: InstanceId,
    pub test_id: String,
    pub state: ImageLoadState,
    pub clickable: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<AspectRatio>,
    pub object_fit: ObjectFit,
    pub placeholder: Option<Placeholder>,
    pub asset: Option<AssetElement>,
    pub fallback: Option<FallbackView>,
}

impl ImageView {
    /// Number of visible non-asset layers (placeholder, skeleton, fallback).
    #[must_use]
    pub fn visible_overlays(&self) -> usize {
        usize::from(self.placeholder.is_some()) + usize::from(self.fallback.is_some())
    }

    #[must_use]
    /// Returns true while a blurred preview is shown.
    pub fn shows_blur(&self) -> bool {
        matches!(self.placeholder, Some(Placeholder::Blur { .. }))
    }

    #[must_use]
    /// Returns true while a skeleton is shown.
    pub fn shows_skeleton(&self) -> bool {
        matches!(self.placeholder, Some(Placeholder::Skeleton))
    }

    /// Serializes the tree as HTML markup.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut style = vec!["position:relative".to_string(), "overflow:hidden".to_string()];
        if let Some(w) = self.width {
            style.push(format!("width:{w}px"));
        }
        if let Some(h) = self.height {
            style.push(format!("height:{h}px"));
        }
        if let Some(ratio) = self.aspect_ratio {
            style.push(format!("aspect-ratio:{ratio}"));
        }
        match &self.placeholder {
            Some(Placeholder::Blur { url }) => {
                style.push(format!("background-image:url(\"{}\")", escape(url)));
                style.push("background-size:cover".to_string());
                style.push("filter:blur(20px)".to_string());
            }
            Some(Placeholder::Skeleton) => {
                style.push("background-color:#e5efe6".to_string());
            }
            None => {}
        }

        let mut html = format!(
            "<div data-testid=\"{}\" data-state=\"{}\"{} style=\"{}\">",
            escape(&self.test_id),
            self.state,
            if self.clickable { " role=\"button\"" } else { "" },
            style.join(";")
        );

        if let Some(asset) = &self.asset {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"{}\" fetchpriority=\"{}\" decoding=\"async\"",
                escape(&asset.src),
                escape(&asset.alt),
                asset.loading.as_attr(),
                asset.fetch_priority.as_attr(),
            ));
            if !asset.srcset.is_empty() {
                html.push_str(&format!(" srcset=\"{}\"", escape(&srcset_attr(&asset.srcset))));
            }
            if let Some(sizes) = &asset.sizes {
                html.push_str(&format!(" sizes=\"{}\"", escape(sizes)));
            }
            html.push_str(&format!(
                " style=\"width:100%;height:100%;object-fit:{};opacity:{};transition:{}\">",
                self.object_fit, asset.opacity, asset.transition
            ));
        }

        if let Some(fallback) = &self.fallback {
            html.push_str(&format!(
                "<div role=\"img\" aria-label=\"{label}\"><span aria-hidden=\"true\">{}</span><p>{label}</p></div>",
                fallback.glyph,
                label = fallback.label,
            ));
        }

        html.push_str("</div>");
        html
    }
}

/// Escapes a value for use inside a double-quoted HTML attribute.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(srcset: Vec<SrcCandidate>) -> AssetElement {
        AssetElement {
            src: "https://cdn.test/tr:w-800/a.jpg".to_string(),
            srcset,
            sizes: Some("100vw".to_string()),
            loading: LoadingMode::Lazy,
            fetch_priority: FetchPriority::Auto,
            opacity: 0.0,
            transition: CROSS_FADE,
            alt: "a".to_string(),
        }
    }

    #[test]
    fn test_srcset_attr() {
        let set = vec![
            SrcCandidate::new("https://cdn.test/tr:w-320/a.jpg", 320),
            SrcCandidate::new("https://cdn.test/tr:w-640/a.jpg", 640),
        ];
        assert_eq!(
            srcset_attr(&set),
            "https://cdn.test/tr:w-320/a.jpg 320w, https://cdn.test/tr:w-640/a.jpg 640w"
        );
    }

    #[test]
    fn test_best_candidate() {
        let element = asset(vec![
            SrcCandidate::new("small", 320),
            SrcCandidate::new("medium", 640),
            SrcCandidate::new("large", 1280),
        ]);
        assert_eq!(element.best_candidate(500), "medium");
        assert_eq!(element.best_candidate(320), "small");
        assert_eq!(element.best_candidate(4000), "large");
    }

    #[test]
    fn test_best_candidate_without_srcset_uses_src() {
        let element = asset(Vec::new());
        assert_eq!(element.best_candidate(500), element.src);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a\"b<c>&"), "a&quot;b&lt;c&gt;&amp;");
    }
}
