//! Configuration for the bridge
//!
//! Stored as TOML; every field has a default so a partial file (or none at
//! all) is valid. Command-line flags override what the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use capkeys_transport::SerialSettings;

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Port tried first at startup, before prompting
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Key for each sensor bit, bit 0 first
    #[serde(default = "default_keys")]
    pub keys: String,
    /// Delay between polls of the serial link
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on a single blocking read
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Name for the virtual keyboard device
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

fn default_baud_rate() -> u32 {
    9600
}
fn default_keys() -> String {
    "DFJK".to_string()
}
fn default_poll_interval_ms() -> u64 {
    1
}
fn default_read_timeout_ms() -> u64 {
    10
}
fn default_device_name() -> String {
    "capkeys Virtual Keyboard".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            keys: default_keys(),
            poll_interval_ms: default_poll_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            device_name: default_device_name(),
        }
    }
}

impl BridgeConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("capkeys")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: BridgeConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
