//! Facade configuration, loaded from YAML.
//!
//! Validation collects every problem before failing so a broken file can be
//! fixed in one pass.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("config validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacadeConfig {
    /// Reported by `eth_chainId`. Must be > 0.
    pub chain_id: u64,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FacadeConfig {
    /// Defaults everywhere except the chain id.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            rpc: RpcConfig::default(),
            filters: FilterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcConfig {
    /// HTTP and WebSocket listen address.
    #[serde(default = "RpcConfig::default_http_addr")]
    pub http_addr: SocketAddr,

    /// Deadline for every call that reaches a collaborator.
    #[serde(default = "RpcConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "RpcConfig::default_max_connections")]
    pub max_connections: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http_addr: Self::default_http_addr(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            max_connections: Self::default_max_connections(),
        }
    }
}

impl RpcConfig {
    fn default_http_addr() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 8545))
    }

    const fn default_request_timeout_ms() -> u64 {
        10_000
    }

    const fn default_max_connections() -> u32 {
        100
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Filters not polled for this long are evicted. Default: 5 minutes.
    #[serde(default = "FilterConfig::default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default = "FilterConfig::default_max_filters")]
    pub max_filters: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: Self::default_idle_timeout_secs(),
            max_filters: Self::default_max_filters(),
        }
    }
}

impl FilterConfig {
    const fn default_idle_timeout_secs() -> u64 {
        300
    }

    const fn default_max_filters() -> usize {
        10_000
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error. Default: info.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FacadeConfig, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    load_config_from_str(&content, &path_str)
}

/// Parse and validate YAML. `source_name` only labels errors.
pub fn load_config_from_str(content: &str, source_name: &str) -> Result<FacadeConfig, ConfigError> {
    let config: FacadeConfig = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
        path: source_name.to_string(),
        source: e,
    })?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &FacadeConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.chain_id == 0 {
        errors.push("chain_id must be greater than 0".to_string());
    }

    if config.rpc.request_timeout_ms == 0 {
        errors.push("rpc.request_timeout_ms must be greater than 0".to_string());
    }
    if config.rpc.max_connections == 0 {
        errors.push("rpc.max_connections must be greater than 0".to_string());
    }

    if config.filters.idle_timeout_secs == 0 {
        errors.push("filters.idle_timeout_secs must be greater than 0".to_string());
    }
    if config.filters.max_filters == 0 {
        errors.push("filters.max_filters must be greater than 0".to_string());
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "logging.level '{}' is invalid. Valid levels: trace, debug, info, warn, error",
            config.logging.level
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
chain_id: 8217

rpc:
  http_addr: "0.0.0.0:8551"
  request_timeout_ms: 2500
  max_connections: 16

filters:
  idle_timeout_secs: 60
  max_filters: 128

logging:
  level: debug
  json: true
"#;

    #[test]
    fn test_load_full_config() {
        let config = load_config_from_str(FULL_CONFIG, "facade.yaml").unwrap();
        assert_eq!(config.chain_id, 8217);
        assert_eq!(config.rpc.http_addr, "0.0.0.0:8551".parse().unwrap());
        assert_eq!(config.rpc.request_timeout(), Duration::from_millis(2500));
        assert_eq!(config.rpc.max_connections, 16);
        assert_eq!(config.filters.idle_timeout(), Duration::from_secs(60));
        assert_eq!(config.filters.max_filters, 128);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_defaults_applied() {
        let config = load_config_from_str("chain_id: 1\n", "facade.yaml").unwrap();
        assert_eq!(config, FacadeConfig::new(1));
        assert_eq!(config.rpc.http_addr, "127.0.0.1:8545".parse().unwrap());
        assert_eq!(config.rpc.request_timeout_ms, 10_000);
        assert_eq!(config.filters.idle_timeout_secs, 300);
        assert_eq!(config.filters.max_filters, 10_000);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = load_config_from_str("chain_id: 1\nrpc:\n  enabled: true\n", "facade.yaml");
        match result.unwrap_err() {
            ConfigError::Parse { path, .. } => assert_eq!(path, "facade.yaml"),
            e => panic!("Expected Parse error, got {:?}", e),
        }
    }

    #[test]
    fn test_bad_address_is_parse_error() {
        let result = load_config_from_str(
            "chain_id: 1\nrpc:\n  http_addr: \"localhost\"\n",
            "facade.yaml",
        );
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let content = r#"
chain_id: 0
rpc:
  request_timeout_ms: 0
filters:
  max_filters: 0
logging:
  level: loud
"#;
        match load_config_from_str(content, "facade.yaml").unwrap_err() {
            ConfigError::ValidationFailed(errors) => {
                assert_eq!(errors.len(), 4, "{errors:?}");
                assert!(errors[0].contains("chain_id"));
                assert!(errors.iter().any(|e| e.contains("logging.level 'loud'")));
            }
            e => panic!("Expected ValidationFailed, got {:?}", e),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/facade.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
        assert!(err.to_string().contains("/nonexistent/facade.yaml"));
    }
}
