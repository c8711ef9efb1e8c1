//! Location and persistence of `config.toml`.

use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, AppConfig};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Failure to locate or persist the config file.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("no platform config directory found")]
    NoConfigDir,
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

impl ConfigError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from an existing file.
    File,
    /// No file existed; defaults were written to it.
    Created,
    /// The file did not parse; defaults are used and the file is untouched.
    Defaulted,
}

/// A configuration together with the file it belongs to.
#[derive(Debug)]
pub struct LoadedConfig {
    /// Effective configuration.
    pub config: AppConfig,
    /// File it was read from or written to.
    pub path: PathBuf,
    /// How it was obtained.
    pub origin: ConfigOrigin,
}

/// Config directory of the storefront tools.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Uses the platform config directory.
    ///
    /// # Errors
    /// Returns `ConfigError::NoConfigDir` when the platform has no home.
    pub fn locate() -> Result<Self, ConfigError> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| Self::at(dirs.config_dir()))
            .ok_or(ConfigError::NoConfigDir)
    }

    #[must_use]
    /// Uses `dir` instead of the platform directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    /// Directory holding the default file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Default file inside the directory.
    #[must_use]
    pub fn file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Loads `file` (or the default file). A missing file is created with
    /// defaults; a malformed one yields defaults.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, or a missing one cannot
    /// be created.
    pub fn load(&self, file: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let path = file.map_or_else(|| self.file(), Path::to_path_buf);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                write_atomic(&path, &config)?;
                info!(path = %path.display(), "Wrote default config");
                return Ok(LoadedConfig {
                    config,
                    path,
                    origin: ConfigOrigin::Created,
                });
            }
            Err(e) => return Err(ConfigError::io(&path)(e)),
        };

        let (config, origin) = match toml::from_str::<AppConfig>(&content) {
            Ok(config) => (config, ConfigOrigin::File),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config does not parse, using defaults");
                (AppConfig::default(), ConfigOrigin::Defaulted)
            }
        };
        debug!(path = %path.display(), ?origin, "Config loaded");
        Ok(LoadedConfig {
            config,
            path,
            origin,
        })
    }

    /// Writes `config` to the default file.
    ///
    /// # Errors
    /// Returns error if the config cannot be encoded or written.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        write_atomic(&self.file(), config)
    }
}

/// Replaces `path` with the TOML form of `config` through a sibling temp
/// file, creating parent directories as needed.
fn write_atomic(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(ConfigError::io(dir))?;

    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(ConfigError::io(dir))?;
    staged
        .write_all(content.as_bytes())
        .map_err(ConfigError::io(staged.path()))?;
    staged
        .persist(path)
        .map_err(|e| ConfigError::io(path)(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("verdant"));

        let loaded = store.load(None).unwrap();

        assert_eq!(loaded.origin, ConfigOrigin::Created);
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.path, store.file());
        assert!(store.file().exists());
        assert_eq!(store.load(None).unwrap().origin, ConfigOrigin::File);
    }

    #[test]
    fn test_malformed_file_yields_defaults_untouched() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path());
        fs::write(store.file(), "cdn = [").unwrap();

        let loaded = store.load(None).unwrap();

        assert_eq!(loaded.origin, ConfigOrigin::Defaulted);
        assert_eq!(loaded.config.cdn, AppConfig::default().cdn);
        assert_eq!(fs::read_to_string(store.file()).unwrap(), "cdn = [");
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path());

        let mut config = AppConfig::default();
        config.cdn.endpoint = "https://cdn.test/nursery".to_string();
        config.access.admin_emails = vec!["owner@verdant.shop".to_string()];
        store.save(&config).unwrap();

        let loaded = store.load(None).unwrap().config;
        assert_eq!(loaded.cdn.endpoint, "https://cdn.test/nursery");
        assert!(loaded.access_policy().is_admin_email("owner@verdant.shop"));
    }

    #[test]
    fn test_explicit_file_outside_store_dir() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("default"));
        let custom = dir.path().join("custom.toml");
        fs::write(&custom, "[viewport]\nroot_margin_px = 50\n").unwrap();

        let loaded = store.load(Some(&custom)).unwrap();

        assert_eq!(loaded.path, custom);
        assert_eq!(loaded.config.viewport.root_margin_px, 50);
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_unreadable_path_reports_it() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path());

        let err = store.load(Some(dir.path())).unwrap_err();

        assert!(matches!(err, ConfigError::Io { ref path, .. } if path == dir.path()));
    }
}
