//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::providers::{CONNECT_ATTEMPTS, CONNECT_TIMEOUT, REQUEST_TIMEOUT};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Browser settings
    pub browser: BrowserConfig,
    /// Remote listing settings
    pub remote: RemoteConfig,
    /// Path display settings
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// User-Agent sent with remote listing requests
    pub user_agent: String,
    /// Longest single wait while blocking for a listing (milliseconds)
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Connection attempts per remote listing
    pub connect_attempts: u32,
    /// Connect timeout per attempt (seconds)
    pub connect_timeout_secs: u64,
    /// Limit on a whole request, body included (seconds)
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Path prefix shown as `alias_label` (e.g. the app's data root)
    pub alias_prefix: String,
    /// Short label replacing `alias_prefix`
    pub alias_label: String,
    /// Home directory shown as `~` (empty = detect from the environment)
    pub home_dir: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            poll_interval_ms: 50,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            connect_attempts: CONNECT_ATTEMPTS,
            connect_timeout_secs: CONNECT_TIMEOUT.as_secs(),
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
        }
    }
}

fn default_user_agent() -> String {
    format!("pathbrowser/{}", env!("CARGO_PKG_VERSION"))
}

impl BrowserConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl RemoteConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl DisplayConfig {
    /// `(prefix, label)` when an alias is configured
    pub fn alias(&self) -> Option<(String, String)> {
        if self.alias_prefix.is_empty() {
            None
        } else {
            Some((self.alias_prefix.clone(), self.alias_label.clone()))
        }
    }

    /// Configured home directory, falling back to the environment
    pub fn resolved_home_dir(&self) -> Option<String> {
        match &self.home_dir {
            Some(home) if !home.is_empty() => Some(home.clone()),
            _ => home_dir(),
        }
    }
}

/// Home directory from the environment (unix-like platforms only)
pub fn home_dir() -> Option<String> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().filter(|h| !h.is_empty())
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Get the config directory path for the current platform
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // Windows: %APPDATA%\pathbrowser
        std::env::var("APPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("pathbrowser"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        // Everything else: $XDG_CONFIG_HOME/pathbrowser, then ~/.config/pathbrowser
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
            .map(|p| p.join("pathbrowser"))
    }
}

/// Get the config file path
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(config_path) = config_file() else {
            tracing::warn!("Could not determine config directory");
            return Config::default();
        };

        if !config_path.exists() {
            return Config::default();
        }

        match Self::from_path(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Could not load {}: {}; using defaults", config_path.display(), e);
                Config::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Config = toml_edit::de::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.remote.connect_attempts == 0 {
            return Err(AppError::Config("remote.connect_attempts must be at least 1".to_string()));
        }
        if self.remote.request_timeout_secs == 0 {
            return Err(AppError::Config("remote.request_timeout_secs must be at least 1".to_string()));
        }
        if !self.display.alias_prefix.is_empty() && self.display.alias_label.is_empty() {
            return Err(AppError::Config("display.alias_label is required with alias_prefix".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.remote.connect_attempts, 2);
        assert_eq!(config.remote.connect_timeout(), Duration::from_secs(20));
        assert_eq!(config.remote.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.browser.poll_interval(), Duration::from_millis(50));
        assert!(config.browser.user_agent.starts_with("pathbrowser/"));
        assert!(config.display.alias().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [display]
            alias_prefix = "/data/psp"
            alias_label = "ms:"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.display.alias(),
            Some(("/data/psp".to_string(), "ms:".to_string()))
        );
        assert_eq!(config.remote.connect_attempts, 2);
        assert_eq!(config.browser.poll_interval_ms, 50);
    }

    #[test]
    fn test_full_toml() {
        let config = Config::from_toml_str(
            r#"
            [browser]
            user_agent = "Emu/1.15"
            poll_interval_ms = 10

            [remote]
            connect_attempts = 3
            connect_timeout_secs = 5
            request_timeout_secs = 15

            [display]
            home_dir = "/home/player"
            "#,
        )
        .unwrap();
        assert_eq!(config.browser.user_agent, "Emu/1.15");
        assert_eq!(config.remote.connect_attempts, 3);
        assert_eq!(config.remote.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.remote.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.display.resolved_home_dir(), Some("/home/player".to_string()));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_toml_str("[remote]\nconnect_attempts = 0\n"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[remote]\nrequest_timeout_secs = 0\n"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[display]\nalias_prefix = \"/x\"\n"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[remote\n"),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[browser]\nuser_agent = \"x\"\n").unwrap();
        assert_eq!(Config::from_path(&path).unwrap().browser.user_agent, "x");
        assert!(matches!(
            Config::from_path(&dir.path().join("missing.toml")),
            Err(AppError::Io(_))
        ));
    }
}
