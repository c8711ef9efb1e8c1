//! Image request entity: what the caller asks the pipeline to render.

use serde::{Deserialize, Serialize};

/// How the resolved image is fitted into its frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFit {
    /// Fill the frame, cropping overflow.
    #[default]
    Cover,
    /// Fit entirely inside the frame, letterboxing as needed.
    Contain,
    /// Stretch to the frame.
    Fill,
    /// Natural size.
    None,
    /// The smaller of `None` and `Contain`.
    ScaleDown,
}

impl ObjectFit {
    /// Returns the CSS keyword for this fit.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
            Self::None => "none",
            Self::ScaleDown => "scale-down",
        }
    }
}

impl std::fmt::Display for ObjectFit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_css())
    }
}

/// Width-to-height ratio, e.g. `4:3`. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RatioSides")]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct RatioSides {
    width: u32,
    height: u32,
}

impl TryFrom<RatioSides> for AspectRatio {
    type Error = &'static str;

    fn try_from(sides: RatioSides) -> Result<Self, Self::Error> {
        Self::new(sides.width, sides.height).ok_or("aspect ratio sides must be non-zero")
    }
}

impl AspectRatio {
    /// Creates a ratio. Returns `None` when either side is zero.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    #[must_use]
    /// Horizontal side.
    pub const fn width(self) -> u32 {
        self.width
    }

    #[must_use]
    /// Vertical side.
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Parses `"16:9"` or `"16/9"`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.split_once([':', '/'])?;
        Self::new(w.trim().parse().ok()?, h.trim().parse().ok()?)
    }

    /// Height for a given width under this ratio, rounded to the nearest pixel.
    #[must_use]
    pub fn height_for(self, width: u32) -> u32 {
        let scaled = u64::from(width) * u64::from(self.height);
        let half = u64::from(self.width) / 2;
        u32::try_from((scaled + half) / u64::from(self.width)).unwrap_or(u32::MAX)
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.width, self.height)
    }
}

/// How the resolved image should be framed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayIntent {
    /// Rendered width in pixels.
    pub width: Option<u32>,
    /// Rendered height in pixels.
    pub height: Option<u32>,
    /// Ratio used to derive the missing dimension.
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    /// How the asset fills its box.
    pub object_fit: ObjectFit,
}

impl DisplayIntent {
    /// Intent for a fixed-size frame.
    #[must_use]
    pub const fn fixed(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            aspect_ratio: None,
            object_fit: ObjectFit::Cover,
        }
    }

    /// Height to request from the CDN: explicit height, else derived from the
    /// aspect ratio when a width is known.
    #[must_use]
    pub fn effective_height(&self) -> Option<u32> {
        self.height.or_else(|| {
            self.width
                .zip(self.aspect_ratio)
                .map(|(w, ratio)| ratio.height_for(w))
        })
    }

    /// The `sizes` attribute for a responsive candidate list.
    #[must_use]
    pub fn sizes(&self) -> String {
        match self.width {
            Some(w) => format!("(max-width: {w}px) 100vw, {w}px"),
            None => "100vw".to_string(),
        }
    }
}

/// A request to render one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Caller-supplied asset identifier, stable across renders.
    pub logical_path: String,
    #[serde(default)]
    /// Rendered size the URLs are resolved for.
    pub display_intent: DisplayIntent,
    /// Fetch immediately and hint the preloader.
    #[serde(default)]
    pub priority: bool,
    /// Generate width-variant candidates.
    #[serde(default)]
    pub responsive: bool,
    /// Show a degraded placeholder while loading.
    #[serde(default)]
    pub blur_placeholder: bool,
    /// Explicit candidate widths; the resolver's ladder is used when empty.
    #[serde(default)]
    pub widths: Vec<u32>,
}

#[allow(missing_docs)]
impl ImageRequest {
    /// Creates a lazy, non-responsive request with no placeholder.
    #[must_use]
    pub fn new(logical_path: impl Into<String>) -> Self {
        Self {
            logical_path: logical_path.into(),
            display_intent: DisplayIntent::default(),
            priority: false,
            responsive: false,
            blur_placeholder: false,
            widths: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn with_responsive(mut self, responsive: bool) -> Self {
        self.responsive = responsive;
        self
    }

    #[must_use]
    pub const fn with_blur_placeholder(mut self, blur: bool) -> Self {
        self.blur_placeholder = blur;
        self
    }

    #[must_use]
    pub const fn with_intent(mut self, intent: DisplayIntent) -> Self {
        self.display_intent = intent;
        self
    }

    #[must_use]
    pub fn with_widths(mut self, widths: Vec<u32>) -> Self {
        self.widths = widths;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_parse() {
        assert_eq!(AspectRatio::parse("16:9"), AspectRatio::new(16, 9));
        assert_eq!(AspectRatio::parse("4/3"), AspectRatio::new(4, 3));
        assert_eq!(AspectRatio::parse("0:3"), None);
        assert_eq!(AspectRatio::parse("wide"), None);
    }

    #[test]
    fn test_zero_ratio_is_rejected_on_deserialize() {
        let zero = serde_json::from_str::<DisplayIntent>(
            r#"{"width":null,"height":null,"aspect_ratio":{"width":0,"height":1}}"#,
        );
        assert!(zero.is_err());

        let intent: DisplayIntent = serde_json::from_str(
            r#"{"width":300,"height":null,"aspect_ratio":{"width":3,"height":2}}"#,
        )
        .unwrap();
        assert_eq!(intent.effective_height(), Some(200));
    }

    #[test]
    fn test_effective_height_from_ratio() {
        let intent = DisplayIntent {
            width: Some(800),
            height: None,
            aspect_ratio: AspectRatio::new(4, 3),
            object_fit: ObjectFit::Cover,
        };
        assert_eq!(intent.effective_height(), Some(600));

        let explicit = DisplayIntent::fixed(800, 500);
        assert_eq!(explicit.effective_height(), Some(500));
    }

    #[test]
    fn test_sizes() {
        assert_eq!(DisplayIntent::default().sizes(), "100vw");
        assert_eq!(
            DisplayIntent::fixed(400, 300).sizes(),
            "(max-width: 400px) 100vw, 400px"
        );
    }

    #[test]
    fn test_request_builder() {
        let request = ImageRequest::new("roses/1.jpg")
            .with_priority(true)
            .with_responsive(true)
            .with_blur_placeholder(true);

        assert_eq!(request.logical_path, "roses/1.jpg");
        assert!(request.priority);
        assert!(request.responsive);
        assert!(request.blur_placeholder);
        assert!(request.widths.is_empty());
    }
}
