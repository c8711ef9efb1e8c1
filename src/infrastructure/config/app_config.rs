//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::args::CliArgs;
use crate::application::services::{
    ResolverSettings, url_resolver::DEFAULT_ENDPOINT, url_resolver::DEFAULT_WIDTHS,
};
use crate::domain::entities::{AccessPolicy, DEFAULT_ROOT_MARGIN_PX, DEFAULT_THRESHOLD, ObserveOptions};
use crate::infrastructure::image::AssetFetcherConfig;

pub(crate) const APP_NAME: &str = "verdant";
pub(crate) const APP_QUALIFIER: &str = "shop";
pub(crate) const APP_ORGANIZATION: &str = "verdant";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    /// CDN and URL settings.
    pub cdn: CdnConfig,

    #[serde(default)]
    /// Lazy loading trigger settings.
    pub viewport: ViewportConfig,

    #[serde(default)]
    /// Network fetch settings.
    pub fetch: FetchConfig,

    #[serde(default)]
    /// Admin access settings.
    pub access: AccessConfig,
}

/// Image CDN configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnConfig {
    /// Base URL that logical paths are appended to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Width requested for full-size images without an explicit width.
    #[serde(default = "default_width")]
    pub default_width: u32,

    #[serde(default)]
    /// Height of full URLs; unset keeps the source ratio.
    pub default_height: Option<u32>,

    /// Let the CDN choose the output format.
    #[serde(default = "default_true")]
    pub auto_format: bool,

    #[serde(default = "default_placeholder_width")]
    /// Placeholder width in pixels.
    pub placeholder_width: u32,

    #[serde(default = "default_placeholder_quality")]
    /// Placeholder quality, 1-100.
    pub placeholder_quality: u8,

    #[serde(default = "default_placeholder_blur")]
    /// Placeholder blur radius.
    pub placeholder_blur: u8,

    /// Width ladder for responsive candidates.
    #[serde(default = "default_responsive_widths")]
    pub responsive_widths: Vec<u32>,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            default_width: default_width(),
            default_height: None,
            auto_format: true,
            placeholder_width: default_placeholder_width(),
            placeholder_quality: default_placeholder_quality(),
            placeholder_blur: default_placeholder_blur(),
            responsive_widths: default_responsive_widths(),
        }
    }
}

impl From<&CdnConfig> for ResolverSettings {
    fn from(cdn: &CdnConfig) -> Self {
        Self {
            endpoint: cdn.endpoint.clone(),
            default_width: cdn.default_width,
            default_height: cdn.default_height,
            auto_format: cdn.auto_format,
            placeholder_width: cdn.placeholder_width,
            placeholder_quality: cdn.placeholder_quality,
            placeholder_blur: cdn.placeholder_blur,
            widths: cdn.responsive_widths.clone(),
        }
    }
}

/// Viewport proximity configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Distance from the visible area that counts as near.
    #[serde(default = "default_root_margin")]
    pub root_margin_px: u32,

    /// Minimal visible fraction, 0.0 to 1.0.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            root_margin_px: DEFAULT_ROOT_MARGIN_PX,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl From<ViewportConfig> for ObserveOptions {
    fn from(config: ViewportConfig) -> Self {
        Self {
            root_margin_px: config.root_margin_px,
            threshold: config.threshold.clamp(0.0, 1.0),
        }
    }
}

/// Asset fetcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_concurrent")]
    /// Downloads in flight at once.
    pub max_concurrent_fetches: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Assets kept in the memory cache.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent(),
            timeout_secs: default_timeout(),
            cache_size: default_cache_size(),
        }
    }
}

impl From<&FetchConfig> for AssetFetcherConfig {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_concurrent_fetches: config.max_concurrent_fetches,
            timeout_secs: config.timeout_secs,
            cache_size: config.cache_size,
        }
    }
}

/// Admin access configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Emails granted admin features.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl AccessConfig {
    #[must_use]
    /// Builds the access policy.
    pub fn policy(&self) -> AccessPolicy {
        AccessPolicy::new(&self.admin_emails)
    }
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_width() -> u32 {
    crate::application::services::url_resolver::DEFAULT_WIDTH
}

fn default_placeholder_width() -> u32 {
    crate::application::services::url_resolver::PLACEHOLDER_WIDTH
}

fn default_placeholder_quality() -> u8 {
    crate::application::services::url_resolver::PLACEHOLDER_QUALITY
}

fn default_placeholder_blur() -> u8 {
    crate::application::services::url_resolver::PLACEHOLDER_BLUR
}

fn default_responsive_widths() -> Vec<u32> {
    DEFAULT_WIDTHS.to_vec()
}

fn default_root_margin() -> u32 {
    DEFAULT_ROOT_MARGIN_PX
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_max_concurrent() -> usize {
    4
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_size() -> usize {
    crate::infrastructure::image::memory_cache::DEFAULT_CACHE_SIZE
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(endpoint) = &args.cdn_endpoint {
            self.cdn.endpoint.clone_from(endpoint);
        }
        if let Some(margin) = args.root_margin {
            self.viewport.root_margin_px = margin;
        }
        if let Some(max) = args.max_concurrent_fetches {
            self.fetch.max_concurrent_fetches = max;
        }
        if !args.admin_emails.is_empty() {
            self.access.admin_emails.clone_from(&args.admin_emails);
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    #[must_use]
    /// Resolver settings from `[cdn]`.
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings::from(&self.cdn)
    }

    #[must_use]
    /// Observation options from `[viewport]`.
    pub fn observe_options(&self) -> ObserveOptions {
        ObserveOptions::from(self.viewport)
    }

    #[must_use]
    /// Access policy from `[access]`.
    pub fn access_policy(&self) -> AccessPolicy {
        self.access.policy()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            cdn: CdnConfig::default(),
            viewport: ViewportConfig::default(),
            fetch: FetchConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"

            [cdn]
            endpoint = "https://cdn.example.com/nursery"
            responsive_widths = [400, 800]

            [viewport]
            root_margin_px = 300

            [access]
            admin_emails = ["owner@verdant.shop"]
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.cdn.endpoint, "https://cdn.example.com/nursery");
        assert_eq!(config.cdn.responsive_widths, vec![400, 800]);
        assert_eq!(config.cdn.default_width, 800);
        assert!(config.cdn.auto_format);
        assert_eq!(config.viewport.root_margin_px, 300);
        assert!((config.viewport.threshold - DEFAULT_THRESHOLD).abs() < f32::EPSILON);
        assert_eq!(config.fetch, FetchConfig::default());
        assert!(config.access_policy().is_admin_email("OWNER@verdant.shop"));
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.cdn.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.observe_options(), ObserveOptions::default());
        assert!(config.access_policy().is_empty());
    }

    #[test]
    fn test_threshold_is_clamped() {
        let options = ObserveOptions::from(ViewportConfig {
            root_margin_px: 0,
            threshold: 4.0,
        });
        assert!((options.threshold - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_merge_with_args() {
        let args = CliArgs::parse_from([
            "verdant",
            "--log-level",
            "warn",
            "--cdn-endpoint",
            "https://cdn.test",
            "--admin-email",
            "a@verdant.shop",
            "resolve",
            "roses/1.jpg",
        ]);
        let mut config = AppConfig::default();
        config.merge_with_args(&args);

        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.cdn.endpoint, "https://cdn.test");
        assert_eq!(config.access.admin_emails, vec!["a@verdant.shop".to_string()]);
        assert_eq!(config.viewport.root_margin_px, DEFAULT_ROOT_MARGIN_PX);
    }
}
