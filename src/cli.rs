// CLI definitions using clap

use clap::Parser;
use std::path::PathBuf;

use crate::config::BridgeConfig;

#[derive(Parser, Debug)]
#[command(name = "capkeys")]
#[command(author, version, about = "Turn capacitive-touch sensor boards into keyboard keys")]
pub struct Cli {
    /// Config file path (default: ~/.config/capkeys/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Serial port to try first (e.g. /dev/ttyACM0, COM3)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Key for each sensor bit, bit 0 first (e.g. DFJK)
    #[arg(short, long)]
    pub keys: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Delay between polls in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval: Option<u64>,

    /// Log key events instead of creating a virtual keyboard
    #[arg(long)]
    pub dry_run: bool,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Apply command-line overrides on top of the file config
    pub fn apply(&self, config: &mut BridgeConfig) {
        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }
        if let Some(keys) = &self.keys {
            config.keys = keys.clone();
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(ms) = self.poll_interval {
            config.poll_interval_ms = ms;
        }
    }
}
