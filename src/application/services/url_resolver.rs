//! Maps logical image paths to CDN delivery URLs.
//!
//! Resolution is pure string composition: the same path and transform always
//! produce the same URL, so the CDN and any downstream cache can key on it.
//! Nothing here fails; a bad path yields a URL that fails at fetch time.

use serde::Serialize;
use tracing::trace;

use crate::domain::entities::{
    DisplayIntent, ImageRequest, SrcCandidate, Transform, TransformFlags,
};

/// Default CDN endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ik.imagekit.io/verdant";

/// Default target width for full-size images.
pub const DEFAULT_WIDTH: u32 = 800;

/// Width of the blurred placeholder variant.
pub const PLACEHOLDER_WIDTH: u32 = 20;

/// Quality of the blurred placeholder variant.
pub const PLACEHOLDER_QUALITY: u8 = 20;

/// Blur radius of the placeholder variant.
pub const PLACEHOLDER_BLUR: u8 = 10;

/// Width ladder used when the caller supplies none.
pub const DEFAULT_WIDTHS: [u32; 7] = [320, 640, 768, 1024, 1280, 1536, 1920];

/// Resolver settings, usually built from the `[cdn]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// CDN base URL.
    pub endpoint: String,
    /// Width of full URLs when the request names none.
    pub default_width: u32,
    /// Height of full URLs when the request names none.
    pub default_height: Option<u32>,
    /// Adds `f-auto` to full and responsive URLs.
    pub auto_format: bool,
    /// Placeholder width in pixels.
    pub placeholder_width: u32,
    /// Placeholder quality, 1-100.
    pub placeholder_quality: u8,
    /// Placeholder blur radius.
    pub placeholder_blur: u8,
    /// Responsive width ladder.
    pub widths: Vec<u32>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_width: DEFAULT_WIDTH,
            default_height: None,
            auto_format: true,
            placeholder_width: PLACEHOLDER_WIDTH,
            placeholder_quality: PLACEHOLDER_QUALITY,
            placeholder_blur: PLACEHOLDER_BLUR,
            widths: DEFAULT_WIDTHS.to_vec(),
        }
    }
}

/// The three URLs an image instance needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUrls {
    /// Primary delivery URL.
    pub full: String,
    /// Blurred placeholder, when requested.
    pub placeholder: Option<String>,
    /// Responsive candidates; empty unless responsive.
    pub srcset: Vec<SrcCandidate>,
}

/// Composes CDN URLs.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    endpoint: String,
    settings: ResolverSettings,
    ladder: Vec<u32>,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(ResolverSettings::default())
    }
}

impl UrlResolver {
    #[must_use]
    /// Creates a resolver. An empty width ladder falls back to [`DEFAULT_WIDTHS`].
    pub fn new(settings: ResolverSettings) -> Self {
        let endpoint = settings.endpoint.trim_end_matches('/').to_string();
        let mut ladder = normalize_widths(&settings.widths);
        if ladder.is_empty() {
            ladder = DEFAULT_WIDTHS.to_vec();
        }
        Self {
            endpoint,
            settings,
            ladder,
        }
    }

    /// The normalized CDN endpoint, without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The width ladder used when a request names no widths.
    #[must_use]
    pub fn default_widths(&self) -> &[u32] {
        &self.ladder
    }

    fn base_flags(&self) -> TransformFlags {
        if self.settings.auto_format {
            TransformFlags::AUTO_FORMAT
        } else {
            TransformFlags::empty()
        }
    }

    /// Primary delivery URL with the default dimensions.
    #[must_use]
    pub fn resolve_full_url(&self, logical_path: &str) -> String {
        let mut transform = Transform::original()
            .with_width(self.settings.default_width)
            .with_flags(self.base_flags());
        if let Some(h) = self.settings.default_height {
            transform = transform.with_height(h);
        }
        self.resolve_with(logical_path, &transform)
    }

    /// Primary delivery URL framed for a display intent.
    #[must_use]
    pub fn resolve_full_url_for(&self, logical_path: &str, intent: &DisplayIntent) -> String {
        self.resolve_with(logical_path, &self.full_transform(intent))
    }

    fn full_transform(&self, intent: &DisplayIntent) -> Transform {
        let width = intent.width.unwrap_or(self.settings.default_width);
        let derived = intent
            .height
            .is_none()
            .then(|| intent.aspect_ratio.map(|ratio| ratio.height_for(width)))
            .flatten();
        let height = intent.height.or(derived).or_else(|| {
            if intent.width.is_none() {
                self.settings.default_height
            } else {
                None
            }
        });

        let mut transform = Transform::original()
            .with_width(width)
            .with_flags(self.base_flags());
        if let Some(h) = height {
            transform = transform.with_height(h);
        }
        if derived.is_some() {
            transform = transform.with_flags(TransformFlags::AUTO_CROP);
        }
        transform
    }

    /// Tiny, low-quality, blurred variant for the loading preview.
    #[must_use]
    pub fn resolve_placeholder_url(&self, logical_path: &str) -> String {
        let transform = Transform::original()
            .with_width(self.settings.placeholder_width)
            .with_quality(self.settings.placeholder_quality)
            .with_blur(self.settings.placeholder_blur)
            .with_flags(self.base_flags());
        self.resolve_with(logical_path, &transform)
    }

    /// One candidate per width, ascending. Widths are deduplicated and zero
    /// is dropped; an empty list falls back to the default ladder. Paths
    /// outside the CDN have no variants and yield an empty set.
    #[must_use]
    pub fn resolve_responsive_set(&self, logical_path: &str, widths: &[u32]) -> Vec<SrcCandidate> {
        if self.is_external(logical_path) {
            return Vec::new();
        }

        let mut ladder = normalize_widths(widths);
        if ladder.is_empty() {
            ladder.clone_from(&self.ladder);
        }

        ladder
            .into_iter()
            .map(|w| {
                let transform = Transform::original()
                    .with_width(w)
                    .with_flags(self.base_flags());
                SrcCandidate::new(self.resolve_with(logical_path, &transform), w)
            })
            .collect()
    }

    /// Resolves every URL a request needs.
    #[must_use]
    pub fn resolve(&self, request: &ImageRequest) -> ResolvedUrls {
        let path = &request.logical_path;
        let urls = ResolvedUrls {
            full: self.resolve_full_url_for(path, &request.display_intent),
            placeholder: request
                .blur_placeholder
                .then(|| self.resolve_placeholder_url(path)),
            srcset: if request.responsive {
                self.resolve_responsive_set(path, &request.widths)
            } else {
                Vec::new()
            },
        };
        trace!(path = %path, full = %urls.full, candidates = urls.srcset.len(), "Resolved image URLs");
        urls
    }

    /// Applies a transform to a logical path.
    #[must_use]
    pub fn resolve_with(&self, logical_path: &str, transform: &Transform) -> String {
        if self.is_external(logical_path) {
            return logical_path.to_string();
        }

        let path = self.strip_endpoint(logical_path).trim_start_matches('/');
        if transform.is_empty() {
            format!("{}/{}", self.endpoint, path)
        } else {
            format!("{}/tr:{}/{}", self.endpoint, transform.descriptor(), path)
        }
    }

    /// Absolute URLs on another host are delivered untouched.
    #[must_use]
    pub fn is_external(&self, logical_path: &str) -> bool {
        is_absolute(logical_path) && self.under_endpoint(logical_path).is_none()
    }

    /// The remainder of a URL under the endpoint. A sibling path sharing the
    /// endpoint as a string prefix, e.g. `/verdant-archive` for `/verdant`,
    /// does not count.
    fn under_endpoint<'a>(&self, logical_path: &'a str) -> Option<&'a str> {
        let rest = logical_path.strip_prefix(self.endpoint.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }

    fn strip_endpoint<'a>(&self, logical_path: &'a str) -> &'a str {
        self.under_endpoint(logical_path).unwrap_or(logical_path)
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("https://") || path.starts_with("http://")
}

fn normalize_widths(widths: &[u32]) -> Vec<u32> {
    let mut out: Vec<u32> = widths.iter().copied().filter(|w| *w > 0).collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AspectRatio;
    use test_case::test_case;

    fn resolver() -> UrlResolver {
        UrlResolver::new(ResolverSettings {
            endpoint: "https://cdn.test/verdant/".to_string(),
            ..ResolverSettings::default()
        })
    }

    #[test]
    fn test_full_url_default() {
        assert_eq!(
            resolver().resolve_full_url("roses/1.jpg"),
            "https://cdn.test/verdant/tr:w-800,f-auto/roses/1.jpg"
        );
    }

    #[test_case("roses/1.jpg" ; "relative")]
    #[test_case("/roses/1.jpg" ; "leading_slash")]
    #[test_case("https://cdn.test/verdant/roses/1.jpg" ; "on_endpoint")]
    fn test_paths_normalize_to_same_url(path: &str) {
        assert_eq!(
            resolver().resolve_full_url(path),
            "https://cdn.test/verdant/tr:w-800,f-auto/roses/1.jpg"
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = resolver();
        for path in ["roses/1.jpg", "", "weird path/ü.png", "a//b"] {
            assert_eq!(r.resolve_full_url(path), r.resolve_full_url(path));
            assert_eq!(r.resolve_placeholder_url(path), r.resolve_placeholder_url(path));
            assert_eq!(
                r.resolve_responsive_set(path, &[]),
                r.resolve_responsive_set(path, &[])
            );
        }
    }

    #[test]
    fn test_placeholder_url() {
        assert_eq!(
            resolver().resolve_placeholder_url("roses/1.jpg"),
            "https://cdn.test/verdant/tr:w-20,q-20,bl-10,f-auto/roses/1.jpg"
        );
    }

    #[test]
    fn test_full_url_for_fixed_intent() {
        let url = resolver().resolve_full_url_for("ferns/2.jpg", &DisplayIntent::fixed(400, 300));
        assert_eq!(url, "https://cdn.test/verdant/tr:w-400,h-300,f-auto/ferns/2.jpg");
    }

    #[test]
    fn test_full_url_for_ratio_without_size() {
        let intent = DisplayIntent {
            aspect_ratio: AspectRatio::new(1, 1),
            ..DisplayIntent::default()
        };
        let url = resolver().resolve_full_url_for("ferns/2.jpg", &intent);
        assert_eq!(
            url,
            "https://cdn.test/verdant/tr:w-800,h-800,f-auto,fo-auto/ferns/2.jpg"
        );
    }

    #[test]
    fn test_responsive_set_uses_default_ladder() {
        let set = resolver().resolve_responsive_set("roses/1.jpg", &[]);
        let widths: Vec<u32> = set.iter().map(|c| c.width).collect();
        assert_eq!(widths, DEFAULT_WIDTHS.to_vec());
        assert_eq!(set[0].url, "https://cdn.test/verdant/tr:w-320,f-auto/roses/1.jpg");
    }

    #[test]
    fn test_responsive_set_sorts_and_dedups() {
        let set = resolver().resolve_responsive_set("roses/1.jpg", &[640, 0, 320, 640]);
        let widths: Vec<u32> = set.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![320, 640]);
    }

    #[test]
    fn test_external_url_unchanged() {
        let r = resolver();
        let url = "https://example.com/plant.png";
        assert_eq!(r.resolve_full_url(url), url);
        assert_eq!(r.resolve_placeholder_url(url), url);
        assert!(r.resolve_responsive_set(url, &[320]).is_empty());
    }

    #[test]
    fn test_sibling_path_on_endpoint_host_is_external() {
        let r = resolver();
        let url = "https://cdn.test/verdant-archive/x.jpg";
        assert!(r.is_external(url));
        assert_eq!(r.resolve_full_url(url), url);
        assert!(!r.is_external("https://cdn.test/verdant/x.jpg"));
    }

    #[test]
    fn test_zero_width_without_format_yields_bare_url() {
        let r = UrlResolver::new(ResolverSettings {
            endpoint: "https://cdn.test".to_string(),
            default_width: 0,
            auto_format: false,
            ..ResolverSettings::default()
        });
        assert_eq!(r.resolve_full_url("a.jpg"), "https://cdn.test/a.jpg");
    }

    #[test]
    fn test_zero_ratio_from_serde_cannot_reach_resolution() {
        let parsed = serde_json::from_str::<DisplayIntent>(
            r#"{"width":null,"height":null,"aspect_ratio":{"width":0,"height":1}}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_empty_transform_has_no_descriptor() {
        let url = resolver().resolve_with("roses/1.jpg", &Transform::original());
        assert_eq!(url, "https://cdn.test/verdant/roses/1.jpg");
    }

    #[test]
    fn test_resolve_request() {
        let request = ImageRequest::new("roses/1.jpg")
            .with_responsive(true)
            .with_blur_placeholder(true);
        let urls = resolver().resolve(&request);

        assert!(urls.placeholder.is_some());
        assert_eq!(urls.srcset.len(), DEFAULT_WIDTHS.len());

        let plain = resolver().resolve(&ImageRequest::new("roses/1.jpg"));
        assert!(plain.placeholder.is_none());
        assert!(plain.srcset.is_empty());
    }

    #[test]
    fn test_auto_format_can_be_disabled() {
        let r = UrlResolver::new(ResolverSettings {
            endpoint: "https://cdn.test".to_string(),
            auto_format: false,
            ..ResolverSettings::default()
        });
        assert_eq!(r.resolve_full_url("a.jpg"), "https://cdn.test/tr:w-800/a.jpg");
    }
}
