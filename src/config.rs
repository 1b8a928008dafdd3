//! Configuration management for novelshelf.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "Novelshelf";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend location and HTTP settings.
    pub api: ApiConfig,

    /// Endpoint suffixes relative to the API base.
    pub endpoints: Endpoints,

    /// Year selection settings.
    pub store: StoreConfig,

    /// Cookie file and CSRF settings.
    pub cookies: CookieConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme and host of the backend, e.g. `http://localhost:8000`.
    pub server_url: String,

    /// Path prefix shared by every endpoint.
    pub base_path: String,

    /// Request timeout in seconds. Zero disables the timeout.
    pub timeout_sec: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            base_path: "/api".to_string(),
            timeout_sec: 0.0,
        }
    }
}

impl ApiConfig {
    /// Returns the endpoint path prefixed with the configured base.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.server_url.trim_end_matches('/'),
            self.base_path,
            path
        )
    }

    /// Returns the request timeout, if one is configured and representable.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_sec > 0.0 {
            Duration::try_from_secs_f64(self.timeout_sec).ok()
        } else {
            None
        }
    }

    /// Parsed URL of the API root, used to scope cookie lookups.
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.api_url("/")).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_path".to_string(),
            message: e.to_string(),
        })
    }
}

/// Named endpoint suffixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub novels: String,
    pub cart: String,
    pub cart_add_item: String,
    pub cart_update_item: String,
    pub cart_remove_item: String,
    pub cart_clear: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            novels: "/novels/".to_string(),
            cart: "/cart/".to_string(),
            cart_add_item: "/cart/add_item/".to_string(),
            cart_update_item: "/cart/update_item/".to_string(),
            cart_remove_item: "/cart/remove_item/".to_string(),
            cart_clear: "/cart/clear/".to_string(),
        }
    }
}

impl Endpoints {
    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("endpoints.novels", self.novels.as_str()),
            ("endpoints.cart", self.cart.as_str()),
            ("endpoints.cart_add_item", self.cart_add_item.as_str()),
            ("endpoints.cart_update_item", self.cart_update_item.as_str()),
            ("endpoints.cart_remove_item", self.cart_remove_item.as_str()),
            ("endpoints.cart_clear", self.cart_clear.as_str()),
        ]
    }
}

/// Year selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Selectable years, newest first.
    pub years: Vec<String>,

    /// Year selected when the store is created.
    pub default_year: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            years: ["2025", "2024", "2023", "2022", "2021", "2020"]
                .iter()
                .map(|y| y.to_string())
                .collect(),
            default_year: "2025".to_string(),
        }
    }
}

/// Cookie and CSRF configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Directory searched for a Netscape cookie file.
    /// Defaults to `<config dir>/cookies`.
    pub directory: Option<PathBuf>,

    /// Token the cookie file name must contain.
    pub file_token: String,

    /// Cookie holding the CSRF token.
    pub csrf_cookie: String,

    /// Header the CSRF token is sent in.
    pub csrf_header: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_token: "novelshelf".to_string(),
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.server_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.server_url".to_string(),
            message: e.to_string(),
        })?;

        if !self.api.base_path.is_empty() && !self.api.base_path.starts_with('/') {
            return Err(invalid("api.base_path", "must start with '/'"));
        }

        if Duration::try_from_secs_f64(self.api.timeout_sec).is_err() {
            return Err(invalid(
                "api.timeout_sec",
                "must be zero or a positive number of seconds a Duration can hold",
            ));
        }

        for (key, path) in self.endpoints.entries() {
            if !path.starts_with('/') {
                return Err(invalid(key, "must start with '/'"));
            }
        }

        self.store.validate()
    }

    /// Returns the effective cookie directory, using config or default.
    pub fn cookie_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.cookies.directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("cookies")),
        }
    }
}

impl StoreConfig {
    /// Checks that the default year is one of the selectable years.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() {
            return Err(invalid("store.years", "must not be empty"));
        }

        if !self.years.contains(&self.default_year) {
            return Err(invalid(
                "store.default_year",
                &format!("'{}' is not listed in store.years", self.default_year),
            ));
        }

        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
