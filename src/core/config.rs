//! Application configuration: compiled-in defaults, overlaid by an optional
//! JSON config file, overlaid by CLI flags / environment variables.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_PORT,
    DEFAULT_RING_BUFFER_SIZE,
};

/// Backpressure policy applied when a subscriber's outbound queue is full
/// (spec.md §4.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackpressurePolicy {
    #[default]
    DropOldest,
    Disconnect,
}

impl fmt::Display for BackpressurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackpressurePolicy::DropOldest => write!(f, "DROP_OLDEST"),
            BackpressurePolicy::Disconnect => write!(f, "DISCONNECT"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub max_queue_size: usize,
    pub ring_buffer_size: usize,
    pub backpressure_policy: BackpressurePolicy,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub kernel: KernelConfig,
    /// Expose internal error detail in 500 responses (development only).
    pub dev: bool,
}

/// Overlay shape loaded from a JSON config file; every field optional so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    max_queue_size: Option<usize>,
    ring_buffer_size: Option<usize>,
    backpressure_policy: Option<BackpressurePolicy>,
    dev: Option<bool>,
}

impl FileConfig {
    fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(self, other: Self) -> Self {
        Self {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            max_queue_size: other.max_queue_size.or(self.max_queue_size),
            ring_buffer_size: other.ring_buffer_size.or(self.ring_buffer_size),
            backpressure_policy: other.backpressure_policy.or(self.backpressure_policy),
            dev: other.dev.or(self.dev),
        }
    }
}

impl AppConfig {
    /// Layer configuration: defaults -> optional file -> CLI flags/env.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!(cli = ?cli, "Loading application configuration");

        let mut file_config = FileConfig::default();

        let overlay_path = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.exists() { Some(local) } else { None }
            }
        };

        if let Some(path) = overlay_path {
            let overlay = FileConfig::load_from_file(&path)?;
            file_config = file_config.merge(overlay);
            tracing::debug!(path = %path.display(), "Config file loaded");
        }

        let host = cli
            .host
            .clone()
            .or(file_config.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_config.port).unwrap_or(DEFAULT_PORT);

        let max_queue_size = cli
            .max_queue_size
            .or(file_config.max_queue_size)
            .unwrap_or(DEFAULT_MAX_QUEUE_SIZE);
        let ring_buffer_size = cli
            .ring_buffer_size
            .or(file_config.ring_buffer_size)
            .unwrap_or(DEFAULT_RING_BUFFER_SIZE);
        let backpressure_policy = cli
            .backpressure_policy
            .or(file_config.backpressure_policy)
            .unwrap_or_default();

        let dev = cli.dev || file_config.dev.unwrap_or(false);

        Ok(Self {
            server: ServerConfig { host, port },
            kernel: KernelConfig {
                max_queue_size,
                ring_buffer_size,
                backpressure_policy,
            },
            dev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_overrides() {
        let cli = CliConfig::default();
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.kernel.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
        assert_eq!(config.kernel.ring_buffer_size, DEFAULT_RING_BUFFER_SIZE);
        assert_eq!(config.kernel.backpressure_policy, BackpressurePolicy::DropOldest);
        assert!(!config.dev);
    }

    #[test]
    fn cli_overrides_defaults() {
        let cli = CliConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            max_queue_size: Some(10),
            ring_buffer_size: Some(0),
            backpressure_policy: Some(BackpressurePolicy::Disconnect),
            dev: true,
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.kernel.max_queue_size, 10);
        assert_eq!(config.kernel.ring_buffer_size, 0);
        assert_eq!(config.kernel.backpressure_policy, BackpressurePolicy::Disconnect);
        assert!(config.dev);
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/no/such/fanout.json")),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn file_config_parses_backpressure_policy() {
        let json = r#"{"backpressure_policy": "DISCONNECT", "ring_buffer_size": 50}"#;
        let parsed: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.backpressure_policy, Some(BackpressurePolicy::Disconnect));
        assert_eq!(parsed.ring_buffer_size, Some(50));
    }

    #[test]
    fn explicit_config_file_overlays_defaults() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 8123, "max_queue_size": 25}}"#).unwrap();

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.kernel.max_queue_size, 25);
        // Unset by the file, so defaults still apply.
        assert_eq!(config.server.host, DEFAULT_HOST);
    }

    #[test]
    fn cli_overrides_take_precedence_over_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 8123}}"#).unwrap();

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            port: Some(9999),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 9999);
    }
}
