//! Bootstrap configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::BootstrapError;

/// Configuration for the bootstrap subsystem.
///
/// Can be loaded from a TOML file via [`BootstrapConfig::from_toml_file`]
/// or built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Port the bootstrap listener binds on (IPv6 any address).
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Seconds to wait for an outbound TCP connect.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Pulled blocks buffered in memory before a staged flush to the store.
    #[serde(default = "default_pull_flush_count")]
    pub pull_flush_count: usize,

    /// Peers to bootstrap from on startup ("ip:port").
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./weave_data")
}

fn default_map_size() -> usize {
    256 * 1024 * 1024
}

fn default_listen_port() -> u16 {
    7086
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_pull_flush_count() -> usize {
    4096
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl BootstrapConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, BootstrapError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BootstrapError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, BootstrapError> {
        toml::from_str(s).map_err(|e| BootstrapError::Config(e.to_string()))
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            listen_port: default_listen_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pull_flush_count: default_pull_flush_count(),
            bootstrap_peers: Vec::new(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = BootstrapConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.listen_port, 7086);
        assert_eq!(config.pull_flush_count, 4096);
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            listen_port = 9999
            pull_flush_count = 16
        "#;
        let config = BootstrapConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.listen_port, 9999);
        assert_eq!(config.pull_flush_count, 16);
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = BootstrapConfig::from_toml_file("/nonexistent/weave.toml");
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }
}
