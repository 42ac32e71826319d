/*!
 * Configuration support for npi-finder
 *
 * One explicit `FinderConfig` describes a run: where the input lives, where
 * the export goes, and how to reach the registry. It can come from a TOML
 * file, `NPI_FINDER_*` environment variables, or the builder.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_VERSION, DEFAULT_EXPORT_PATH, DEFAULT_REGISTRY_URL};
use crate::registry::RegistryConfig;

/// Configuration for one matching run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Input file of doctors to look up
    #[serde(default)]
    pub input_path: PathBuf,

    /// Where the augmented CSV is written
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,

    /// Registry service root
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Value of the registry's `version` query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds (None = wait indefinitely)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Custom user agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: Option<String>,

    /// Whether to show a progress bar while querying
    #[serde(default = "default_enable_progress_bar")]
    pub enable_progress_bar: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            export_path: default_export_path(),
            registry_url: default_registry_url(),
            api_version: default_api_version(),
            timeout_seconds: None,
            user_agent: default_user_agent(),
            enable_progress_bar: default_enable_progress_bar(),
        }
    }
}

// Default value functions for serde
fn default_export_path() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_PATH)
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_user_agent() -> Option<String> {
    Some(format!("npi-finder/{}", env!("CARGO_PKG_VERSION")))
}

fn default_enable_progress_bar() -> bool {
    true
}

impl FinderConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `NPI_FINDER_REGISTRY`: registry base URL
    /// - `NPI_FINDER_EXPORT`: export file path
    /// - `NPI_FINDER_API_VERSION`: registry API version
    /// - `NPI_FINDER_TIMEOUT`: request timeout in seconds, "none" to disable
    /// - `NPI_FINDER_USER_AGENT`: user agent string
    /// - `NPI_FINDER_PROGRESS_BAR`: "true" or "false"
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NPI_FINDER_REGISTRY") {
            config.registry_url = val;
        }

        if let Ok(val) = std::env::var("NPI_FINDER_EXPORT") {
            config.export_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("NPI_FINDER_API_VERSION") {
            config.api_version = val;
        }

        if let Ok(val) = std::env::var("NPI_FINDER_TIMEOUT") {
            config.timeout_seconds = match val.to_lowercase().as_str() {
                "none" | "0" => None,
                secs => secs.parse().ok(),
            };
        }

        if let Ok(val) = std::env::var("NPI_FINDER_USER_AGENT") {
            config.user_agent = Some(val);
        }

        if let Ok(val) = std::env::var("NPI_FINDER_PROGRESS_BAR") {
            config.enable_progress_bar = val.to_lowercase() == "true";
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::NpiFinderError::io_at(path, e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::NpiFinderError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::NpiFinderError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/npi-finder/config.toml` on Linux
    /// or `%APPDATA%\npi-finder\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "npi-finder")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                match Self::from_file(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(
                        path = %config_path.display(),
                        "ignoring unreadable config file: {}",
                        e
                    ),
                }
            }
        }

        Self::from_env()
    }

    /// HTTP settings for the registry transport
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            // A zero duration would time out every request
            timeout_seconds: self.timeout_seconds.filter(|&secs| secs > 0),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Builder for customizing configuration
pub struct ConfigBuilder {
    config: FinderConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: FinderConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Set the input file
    pub fn input_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.input_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the export file
    pub fn export_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.export_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the registry base URL
    pub fn registry_url(mut self, url: &str) -> Self {
        self.config.registry_url = url.to_string();
        self
    }

    /// Set the registry API version
    pub fn api_version(mut self, version: &str) -> Self {
        self.config.api_version = version.to_string();
        self
    }

    /// Set the request timeout; zero means no timeout
    pub fn timeout_seconds(mut self, timeout: Option<u64>) -> Self {
        self.config.timeout_seconds = timeout.filter(|&secs| secs > 0);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Set progress bar enabled
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> FinderConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FinderConfig::default();
        assert_eq!(config.export_path, PathBuf::from("./export.csv"));
        assert_eq!(config.registry_url, "https://npiregistry.cms.hhs.gov");
        assert_eq!(config.api_version, "2.1");
        assert_eq!(config.timeout_seconds, None);
        assert!(config.enable_progress_bar);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .input_path("doctors.csv")
            .export_path("out.csv")
            .registry_url("http://localhost:8080")
            .timeout_seconds(Some(10))
            .progress_bar(false)
            .build();

        assert_eq!(config.input_path, PathBuf::from("doctors.csv"));
        assert_eq!(config.export_path, PathBuf::from("out.csv"));
        assert_eq!(config.registry_url, "http://localhost:8080");
        assert_eq!(config.registry_config().timeout_seconds, Some(10));
        assert!(!config.enable_progress_bar);
    }

    #[test]
    fn test_zero_timeout_means_no_timeout() {
        let config = ConfigBuilder::new().timeout_seconds(Some(0)).build();
        assert_eq!(config.timeout_seconds, None);
        assert_eq!(config.registry_config().timeout_seconds, None);

        let from_file: FinderConfig = toml::from_str("timeout_seconds = 0\n").unwrap();
        assert_eq!(from_file.registry_config().timeout_seconds, None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: FinderConfig = toml::from_str("registry_url = \"http://registry.test\"\n").unwrap();
        assert_eq!(config.registry_url, "http://registry.test");
        assert_eq!(config.export_path, PathBuf::from("./export.csv"));
        assert_eq!(config.api_version, "2.1");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = ConfigBuilder::new()
            .registry_url("http://registry.test")
            .timeout_seconds(Some(5))
            .build();
        config.save(&path).unwrap();

        assert_eq!(FinderConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "registry_url = [").unwrap();

        assert!(matches!(
            FinderConfig::from_file(&path),
            Err(crate::NpiFinderError::Configuration { .. })
        ));
    }
}
