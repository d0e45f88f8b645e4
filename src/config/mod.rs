//! Configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `BIB_ENRICH__*` environment variables.
//!
//! # Configuration File Format
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! user_agent = "bib-enrich/0.1.0"
//! mailto = "you@example.org"
//!
//! [providers]
//! arxiv_url = "https://export.arxiv.org/api/query"
//! dblp_url = "https://dblp.org/search/publ/api"
//! crossref_url = "https://api.crossref.org/works"
//! failure_policy = "isolate"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::DEFAULT_USER_AGENT;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "BIB_ENRICH";

/// Config file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "bib-enrich.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings shared by every provider
    #[serde(default)]
    pub http: HttpConfig,

    /// Provider endpoints and failure handling
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Upper bound on a whole request, after which it fails as a transport error
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Contact address appended to the User-Agent (CrossRef "polite pool")
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
            mailto: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// What to do when one provider fails with a transport error during a lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and continue with the other providers' candidates
    #[default]
    Isolate,
    /// Abort the lookup with the first error, in query order
    Propagate,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_arxiv_url")]
    pub arxiv_url: String,

    #[serde(default = "default_dblp_url")]
    pub dblp_url: String,

    #[serde(default = "default_crossref_url")]
    pub crossref_url: String,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            arxiv_url: default_arxiv_url(),
            dblp_url: default_dblp_url(),
            crossref_url: default_crossref_url(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

fn default_arxiv_url() -> String {
    "https://export.arxiv.org/api/query".to_string()
}

fn default_dblp_url() -> String {
    "https://dblp.org/search/publ/api".to_string()
}

fn default_crossref_url() -> String {
    "https://api.crossref.org/works".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` for structured output, anything else for plain text
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Write this configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from a file, with environment overrides on top
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()
}

/// Get the configuration from defaults and environment variables only
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("bib-enrich").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.providers.failure_policy, FailurePolicy::Isolate);
        assert_eq!(
            config.providers.crossref_url,
            "https://api.crossref.org/works"
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[http]
timeout_secs = 5
mailto = "me@example.org"

[providers]
dblp_url = "http://localhost:9000/dblp"
failure_policy = "propagate"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.http.mailto.as_deref(), Some("me@example.org"));
        assert_eq!(config.providers.dblp_url, "http://localhost:9000/dblp");
        assert_eq!(
            config.providers.arxiv_url,
            "https://export.arxiv.org/api/query"
        );
        assert_eq!(config.providers.failure_policy, FailurePolicy::Propagate);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.http.timeout_secs = 12;
        config.logging.format = Some("json".to_string());
        config.save(&path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.http.timeout_secs, 12);
        assert_eq!(loaded.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_load_config_nonexistent() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
