//! Configuration loading and config file resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MIRROR_CONFIG";

/// Bridge configuration loaded from TOML
///
/// Every section and field is optional in the file; missing values fall back
/// to the compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub pip: PipConfig,
    pub logging: LoggingConfig,
}

/// HTTP/SSE surface for remote UIs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 5760,
        }
    }
}

/// Outbound call transport
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Envelopes buffered per remote subscriber before the oldest are dropped
    pub bus_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { bus_capacity: 1000 }
    }
}

/// Picture-in-picture behaviour
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    pub enabled: bool,
    /// Enter PiP automatically when the host signals the user is leaving
    pub auto_enter_on_user_leave: bool,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_enter_on_user_leave: true,
        }
    }
}

/// Logging defaults (RUST_LOG still takes precedence)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.transport.bus_capacity == 0 {
            return Err(Error::Config(
                "transport.bus_capacity must be greater than zero".to_string(),
            ));
        }
        if self.server.bind_addr.trim().is_empty() {
            return Err(Error::Config("server.bind_addr must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Config file resolution following the priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`MIRROR_CONFIG`)
/// 3. Platform config file (`<config dir>/mirror-bridge/config.toml`)
/// 4. Compiled defaults (fallback, no file)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config file, only if it exists
    default_config_path().filter(|path| path.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mirror-bridge").join("config.toml"))
}

/// Load configuration with graceful degradation
///
/// A missing file yields the compiled defaults with a warning; a file that
/// exists but does not parse is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<BridgeConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using compiled defaults");
        return Ok(BridgeConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using compiled defaults", path.display());
        return Ok(BridgeConfig::default());
    }

    info!("Loading config from {}", path.display());
    BridgeConfig::from_file(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.server.port, 5760);
        assert_eq!(config.transport.bus_capacity, 1000);
        assert!(config.pip.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = BridgeConfig::from_toml_str("[pip]\nauto_enter_on_user_leave = false\n").unwrap();
        assert!(config.pip.enabled);
        assert!(!config.pip.auto_enter_on_user_leave);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BridgeConfig::from_toml_str("[transport]\nbus_capacity = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = BridgeConfig::from_toml_str("[server\nport = 1");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }
}
