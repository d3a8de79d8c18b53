//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (binary only)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Legacy service ports the gateway listens on by default: the
/// general-purpose port plus the login, lobby, and diagnostic ports the
/// original client suite expects.
pub const DEFAULT_PORTS: &[u16] = &[3000, 8226, 8228, 7003, 43300];

/// Default loopback port of the backend HTTP application.
pub const DEFAULT_BACKEND_PORT: u16 = 8080;

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind listeners to.
    pub host: String,

    /// TCP ports to listen on.
    pub ports: Vec<u16>,

    /// Loopback port of the backend HTTP application.
    pub backend_port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            ports: DEFAULT_PORTS.to_vec(),
            backend_port: DEFAULT_BACKEND_PORT,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| GatewayError::Config(format!("failed to read config file: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("failed to parse config: {e}")))
    }

    /// Load configuration from environment variables, starting from
    /// defaults. `GATEWAY_PORTS` is a comma-separated list; entries that
    /// do not parse are skipped.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("GATEWAY_HOST") {
            config.host = host;
        }
        if let Ok(ports) = std::env::var("GATEWAY_PORTS") {
            let parsed: Vec<u16> = ports
                .split(',')
                .filter_map(|p| p.trim().parse().ok())
                .collect();
            if !parsed.is_empty() {
                config.ports = parsed;
            }
        }
        if let Ok(port) = std::env::var("GATEWAY_BACKEND_PORT") {
            if let Ok(port) = port.parse() {
                config.backend_port = port;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.ports, vec![3000, 8226, 8228, 7003, 43300]);
        assert_eq!(config.backend_port, 8080);
    }

    #[test]
    fn test_parse_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            host = "127.0.0.1"
            ports = [4000, 4001]
            backend_port = 9090
            "#,
        )
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.ports, vec![4000, 4001]);
        assert_eq!(config.backend_port, 9090);
    }
}
