//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{AccessConfig, AppConfig, CdnConfig, FetchConfig, LogLevel, ViewportConfig};
pub use args::{CliArgs, Command, ImageArgs};
pub use storage::{ConfigError, ConfigOrigin, ConfigStore, LoadedConfig};
