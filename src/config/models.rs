use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub asset: AssetConfig,
    #[serde(default)]
    pub file: FileConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Names of the per-handler background runners
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    #[serde(default = "default_asset_runner_name")]
    pub asset_runner_name: String,
    #[serde(default = "default_file_runner_name")]
    pub file_runner_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            asset_runner_name: default_asset_runner_name(),
            file_runner_name: default_file_runner_name(),
        }
    }
}

fn default_asset_runner_name() -> String {
    "asset_handler_runner".to_string()
}

fn default_file_runner_name() -> String {
    "file_handler_runner".to_string()
}

/// Packaged asset handler
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
    /// Schemes claimed by the asset handler
    #[serde(default = "default_asset_schemes")]
    pub schemes: Vec<String>,
    /// Directory served as the packaged asset root (local platform)
    pub root: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            schemes: default_asset_schemes(),
            root: None,
        }
    }
}

fn default_asset_schemes() -> Vec<String> {
    vec!["asset".to_string()]
}

/// Local file handler
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    /// Confine `file:` lookups below this directory
    pub root: Option<PathBuf>,
}

/// Network handler
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_schemes")]
    pub schemes: Vec<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            schemes: default_network_schemes(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_network_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

fn default_user_agent() -> String {
    format!("vfsbox/{}", env!("CARGO_PKG_VERSION"))
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.worker.asset_runner_name, "asset_handler_runner");
        assert_eq!(config.asset.schemes, vec!["asset"]);
        assert!(config.asset.root.is_none());
        assert_eq!(config.network.schemes, vec!["http", "https"]);
        assert_eq!(config.network.request_timeout_ms, 60_000);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[asset]
root = "assets"

[network]
request_timeout_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.asset.root, Some(PathBuf::from("assets")));
        assert_eq!(config.asset.schemes, vec!["asset"]);
        assert_eq!(config.network.request_timeout_ms, 500);
        assert_eq!(config.network.connect_timeout_ms, 10_000);
        assert_eq!(config.worker.file_runner_name, "file_handler_runner");
    }
}
