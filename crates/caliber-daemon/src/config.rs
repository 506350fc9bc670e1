//! Configuration loading and validation

use anyhow::Result;
use caliber_core::DisplaySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Frames per second of the animation loop
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Part catalog overriding the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            frame_rate: default_frame_rate(),
            catalog: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_frame_rate() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// IANA timezone shown on the dial
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

impl DaemonConfig {
    /// Interval between frames; a zero rate falls back to the default
    pub fn frame_interval(&self) -> std::time::Duration {
        let rate = if self.frame_rate == 0 {
            default_frame_rate()
        } else {
            self.frame_rate
        };
        std::time::Duration::from_secs_f64(1.0 / rate as f64)
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
