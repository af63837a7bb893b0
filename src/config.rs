//! Configuration management for session-gate.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::gate::GateConfig;
use crate::remote::ProviderConfig;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosted provider settings.
    pub provider: ProviderSection,
    /// Gate behavior.
    pub gate: GateSection,
    /// Server configuration.
    pub server: ServerSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Hosted provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    /// Project base URL.
    pub url: Option<String>,
    /// Public API key.
    pub anon_key: Option<String>,
    /// Table holding user profiles.
    pub profile_table: String,
    /// File to persist the signed-in session in.
    pub session_file: Option<PathBuf>,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            profile_table: "profiles".to_string(),
            session_file: None,
        }
    }
}

/// Gate section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSection {
    /// Skip login for development builds.
    pub dev_skip_login: bool,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SESSION_GATE_PROVIDER_URL") {
            self.provider.url = Some(url);
        }

        if let Some(key) = lookup("SESSION_GATE_ANON_KEY") {
            if !key.is_empty() {
                self.provider.anon_key = Some(key);
            }
        }

        if let Some(flag) = lookup("SESSION_GATE_DEV_SKIP_LOGIN") {
            self.gate.dev_skip_login = flag == "true";
        }

        if let Some(host) = lookup("SESSION_GATE_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("SESSION_GATE_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Some(level) = lookup("SESSION_GATE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref url) = args.provider_url {
            self.provider.url = Some(url.clone());
        }

        if let Some(ref key) = args.anon_key {
            self.provider.anon_key = Some(key.clone());
        }

        if args.dev_skip_login {
            self.gate.dev_skip_login = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Gate startup options. The override flag is read here once.
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            dev_skip_login: self.gate.dev_skip_login,
        }
    }

    /// Provider settings, or `None` when URL or key is missing.
    pub fn provider_config(&self) -> Option<ProviderConfig> {
        let url = self.provider.url.as_deref().filter(|u| !u.is_empty())?;
        let key = self.provider.anon_key.as_deref().filter(|k| !k.is_empty())?;

        let mut provider =
            ProviderConfig::new(url, key).with_profile_table(&self.provider.profile_table);
        provider.session_file = self.provider.session_file.clone();
        Some(provider)
    }

    /// Check that the configuration can start a service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_config().is_none() && !self.gate.dev_skip_login {
            return Err(ConfigError::MissingProvider);
        }
        self.to_server_config().map(|_| ())
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: std::net::IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }
        Ok(server_config)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Provider URL or anon key missing.
    MissingProvider,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::MissingProvider => write!(
                f,
                "provider URL and anon key are required unless the development override is on"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(!config.gate.dev_skip_login);
        assert_eq!(config.provider.profile_table, "profiles");
        assert!(config.provider_config().is_none());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "provider": {
                "url": "https://abc.supabase.co",
                "anon_key": "anon",
                "profile_table": "farmers"
            },
            "gate": { "dev_skip_login": true },
            "server": { "port": 8080 }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.gate.dev_skip_login);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");

        let provider = config.provider_config().unwrap();
        assert_eq!(provider.url, "https://abc.supabase.co");
        assert_eq!(provider.profile_table, "farmers");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            ("SESSION_GATE_PROVIDER_URL", "https://env.test"),
            ("SESSION_GATE_ANON_KEY", "env-key"),
            ("SESSION_GATE_DEV_SKIP_LOGIN", "true"),
            ("SESSION_GATE_PORT", "4000"),
            ("RUST_LOG", "debug"),
        ]));

        assert_eq!(config.provider.url.as_deref(), Some("https://env.test"));
        assert_eq!(config.provider.anon_key.as_deref(), Some("env-key"));
        assert!(config.gate.dev_skip_login);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_dev_flag_requires_exact_true() {
        for value in ["1", "TRUE", "yes", ""] {
            let mut config = Config::default();
            config.apply_env_from(env(&[("SESSION_GATE_DEV_SKIP_LOGIN", value)]));
            assert!(!config.gate.dev_skip_login, "{value:?} enabled the override");
        }
    }

    #[test]
    fn test_env_ignores_bad_port_and_empty_key() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            ("SESSION_GATE_PORT", "not-a-port"),
            ("SESSION_GATE_ANON_KEY", ""),
        ]));
        assert_eq!(config.server.port, 3000);
        assert!(config.provider.anon_key.is_none());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            host: Some("192.168.1.1".parse().unwrap()),
            port: Some(5000),
            provider_url: Some("https://cli.test".to_string()),
            anon_key: Some("cli-key".to_string()),
            dev_skip_login: true,
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 5000);
        assert!(config.gate.dev_skip_login);
        assert!(config.gate_config().dev_skip_login);
        assert!(config.provider_config().is_some());
    }

    #[test]
    fn test_validate_requires_provider() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingProvider)));

        let mut dev = Config::default();
        dev.gate.dev_skip_login = true;
        assert!(dev.validate().is_ok());
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();
        assert!(config.to_server_config().is_err());
    }

    #[test]
    fn test_to_server_config() {
        let config = Config::default();
        let server_config = config.to_server_config().unwrap();
        assert_eq!(server_config.bind_address(), "127.0.0.1:3000");
        assert!(server_config.graceful_shutdown);
    }
}
