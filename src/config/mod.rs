use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base endpoint of the remote API; request paths are joined onto it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Overall timeout for a single request, in seconds (default: 50)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional key sent as the `x-api-key` header
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: default_api_key(),
        }
    }
}

fn default_base_url() -> String {
    "https://reqres.in/api/".to_string()
}

fn default_timeout_secs() -> u64 {
    50
}

fn default_api_key() -> Option<String> {
    Some("reqres-free-v1".to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Where the session token is stored (default: <data dir>/userdesk/session.json)
    pub path: Option<PathBuf>,
    /// Clear the stored token when the server answers 401
    #[serde(default = "default_clear_on_unauthorized")]
    pub clear_on_unauthorized: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: None,
            clear_on_unauthorized: default_clear_on_unauthorized(),
        }
    }
}

impl SessionConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_session_path)
    }
}

fn default_clear_on_unauthorized() -> bool {
    true
}

/// Default session file location
/// - Linux: ~/.local/share/userdesk/session.json
/// - macOS: ~/Library/Application Support/userdesk/session.json
pub fn default_session_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("userdesk")
        .join("session.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api.base_url, "https://reqres.in/api/");
        assert_eq!(config.api.timeout_secs, 50);
        assert_eq!(config.api.api_key.as_deref(), Some("reqres-free-v1"));
        assert!(config.session.clear_on_unauthorized);
        assert!(config.session.path.is_none());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "http://localhost:8080/api/"
            timeout_secs = 5

            [session]
            path = "/tmp/userdesk/session.json"
            clear_on_unauthorized = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8080/api/");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(
            config.session.resolved_path(),
            PathBuf::from("/tmp/userdesk/session.json")
        );
        assert!(!config.session.clear_on_unauthorized);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::parse("[api\nbase_url = ").is_err());
        assert!(Config::parse("[api]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("userdesk.toml")).unwrap();
        assert_eq!(config.api.timeout_secs, 50);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userdesk.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_default_session_path() {
        let path = default_session_path();
        assert!(path.ends_with("userdesk/session.json"));
    }
}
