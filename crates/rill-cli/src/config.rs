//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Endpoint used when neither flags, environment nor config name one
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/query";

/// Configuration for rill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Query endpoint URL
    pub endpoint: Option<String>,
    /// Knowledge-base namespace sent with every question
    pub namespace: Option<String>,
    /// Number of passages the backend should retrieve
    pub top_k: Option<u32>,
    /// Overall request timeout in seconds, body included
    pub timeout_secs: Option<u64>,
    /// Connection timeout in seconds
    pub connect_timeout_secs: Option<u64>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Color theme (dark, light)
    pub theme: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rill")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("RILL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location, warning on a broken file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if !path.exists() {
            Self::starter().save_to(&path)?;
        }
        Ok(path)
    }

    fn starter() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            timeout_secs: Some(120),
            connect_timeout_secs: Some(10),
            tui: Some(true),
            ..Self::default()
        }
    }

    /// Endpoint from `RILL_ENDPOINT`, then the file, then the default
    pub fn endpoint(&self) -> String {
        std::env::var("RILL_ENDPOINT")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(rill_client::client::DEFAULT_CONNECT_TIMEOUT)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# rill configuration file
# Place at ~/.config/rill/config.toml (Linux), ~/Library/Application Support/rill/config.toml (Mac)
# or %APPDATA%\rill\config.toml (Windows). RILL_CONFIG_PATH overrides the location.

# Query endpoint (RILL_ENDPOINT and --endpoint take precedence)
endpoint = "http://localhost:8000/query"

# Knowledge-base namespace to search (optional)
# namespace = "Blood Donation"

# Number of passages to retrieve (optional, backend default when unset)
# top_k = 5

# Overall request timeout in seconds, including the streamed answer
timeout_secs = 120

# Connection timeout in seconds
connect_timeout_secs = 10

# Whether to use TUI mode by default
# Set to false for a line-oriented prompt
tui = true

# Color theme: dark or light
# theme = "dark"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("rill-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some(DEFAULT_ENDPOINT));
        assert_eq!(config.timeout_secs, Some(120));
        assert_eq!(config.tui, Some(true));
        assert!(config.namespace.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("namespace = \"Pregnancy\"\ntop_k = 3\n").unwrap();
        assert_eq!(config.namespace.as_deref(), Some("Pregnancy"));
        assert_eq!(config.top_k, Some(3));
        assert!(config.timeout().is_none());
        assert_eq!(
            config.connect_timeout(),
            rill_client::client::DEFAULT_CONNECT_TIMEOUT
        );
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = Config {
            timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_path("round-trip/config.toml");
        let config = Config {
            namespace: Some("Blood Donation".into()),
            top_k: Some(5),
            ..Config::starter()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let path = temp_path("broken.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "top_k = \"many\"").unwrap();

        assert!(Config::load_from(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
