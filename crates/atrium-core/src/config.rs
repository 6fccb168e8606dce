//! Configuration management for the Atrium client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that selects the API base URL
pub const API_URL_ENV: &str = "ATRIUM_API_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// List view configuration
    #[serde(default)]
    pub view: ViewConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every resource path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory for the long-lived session slot (platform data dir when unset)
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// Persist the session across process restarts
    #[serde(default = "default_persist")]
    pub persist: bool,
}

/// List view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Number of records per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("atrium/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_persist() -> bool {
    true
}

const fn default_page_size() -> u32 {
    12
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            persist: default_persist(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl SessionConfig {
    /// Directory backing the long-lived slot, if one can be determined
    #[must_use]
    pub fn resolve_storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir.clone().or_else(|| {
            directories::ProjectDirs::from("io", "atrium", "atrium")
                .map(|dirs| dirs.data_dir().join("session"))
        })
    }
}

impl Config {
    /// Load configuration from the default `atrium` file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, optionally from an explicit file
    ///
    /// Sources, lowest precedence first: the config file, `ATRIUM_*`
    /// variables (`__` separates nesting, e.g. `ATRIUM_API__TIMEOUT_SECS`),
    /// then `ATRIUM_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, a value fails to parse,
    /// or the resulting configuration is invalid.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        Self::load_layered(path, None)
    }

    /// Layer `path` and the environment; `vars` replaces the process
    /// environment when given
    fn load_layered(
        path: Option<&Path>,
        vars: Option<config::Map<String, String>>,
    ) -> crate::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("atrium").required(false),
        };
        let api_url = match &vars {
            Some(vars) => vars.get(API_URL_ENV).cloned(),
            None => std::env::var(API_URL_ENV).ok(),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("ATRIUM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .set_override_option("api.base_url", api_url)?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the rest of the client relies on
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending value.
    pub fn validate(&self) -> crate::Result<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(crate::Error::Configuration {
                message: "api.base_url must not be empty".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(crate::Error::Configuration {
                message: format!("api.base_url must be an http(s) URL, got '{base_url}'"),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(crate::Error::Configuration {
                message: "api.timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.view.page_size == 0 {
            return Err(crate::Error::Configuration {
                message: "view.page_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.user_agent.starts_with("atrium/"));
        assert!(config.session.persist);
        assert_eq!(config.view.page_size, 12);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.view.page_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_load_from_file_fills_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://admin.example.com/api\"\n\n[view]\npage_size = 25"
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        // ATRIUM_API_URL would override the file; only assert it when unset.
        if std::env::var(API_URL_ENV).is_err() {
            assert_eq!(config.api.base_url, "https://admin.example.com/api");
        }
        assert_eq!(config.view.page_size, 25);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_nested_environment_variables_override_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\ntimeout_secs = 10\n\n[view]\npage_size = 25").unwrap();

        let config = Config::load_layered(
            Some(file.path()),
            Some(vars(&[
                ("ATRIUM_API__TIMEOUT_SECS", "7"),
                ("ATRIUM_LOGGING__FORMAT", "json"),
                ("ATRIUM_SESSION__PERSIST", "false"),
            ])),
        )
        .unwrap();

        assert_eq!(config.api.timeout_secs, 7);
        assert_eq!(config.view.page_size, 25);
        assert_eq!(config.logging.format, "json");
        assert!(!config.session.persist);
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_api_url_variable_wins_over_nested_key() {
        let config = Config::load_layered(
            None,
            Some(vars(&[
                ("ATRIUM_API__BASE_URL", "http://nested.example/api"),
                (API_URL_ENV, "https://direct.example/api"),
            ])),
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://direct.example/api");

        let config = Config::load_layered(
            None,
            Some(vars(&[("ATRIUM_API__BASE_URL", "http://nested.example/api")])),
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://nested.example/api");
    }

    #[test]
    fn test_invalid_environment_value_is_rejected() {
        let result = Config::load_layered(None, Some(vars(&[("ATRIUM_VIEW__PAGE_SIZE", "0")])));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_storage_dir_wins() {
        let session = SessionConfig {
            storage_dir: Some(PathBuf::from("/tmp/atrium-test")),
            persist: true,
        };
        assert_eq!(
            session.resolve_storage_dir(),
            Some(PathBuf::from("/tmp/atrium-test"))
        );
    }

    #[test]
    fn test_serde_roundtrip_keeps_values() {
        let mut config = Config::default();
        config.view.page_size = 7;
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.view.page_size, 7);
        assert_eq!(parsed.api.base_url, config.api.base_url);
    }
}
