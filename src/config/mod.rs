//! Configuration module for motion-telemetry
//!
//! All settings are fixed at startup: which device to connect to, which
//! channels to subscribe, the window size, the retry backoff and the render
//! cadence. Configuration is read from a TOML file; any section may be
//! omitted and falls back to its defaults.
//!
//! # Config Location
//!
//! When no path is given, the file is looked up in the platform config dir:
//! - **Linux**: `~/.config/dev.motion-telemetry/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.motion-telemetry/config.toml`
//! - **Windows**: `%APPDATA%\dev.motion-telemetry\config.toml`
//!
//! # Example
//!
//! ```toml
//! clock_channel = "ax"
//!
//! [device]
//! address = "E6:1B:97:99:AF:26"
//! scan_timeout_ms = 10000
//!
//! [[channels]]
//! id = "ax"
//! characteristic = "19B10002-E8F2-537E-4F6C-D104768A1214"
//!
//! [buffer]
//! window_size = 300
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, ResultExt, TelemetryError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Application identifier for config and data directories
pub const APP_ID: &str = "dev.motion-telemetry";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Get the directory holding the config file
pub fn app_config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the directory for log files
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Complete startup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Channel whose samples advance the time axis (defaults to the first channel)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_channel: Option<String>,

    #[serde(default)]
    pub device: DeviceConfig,

    /// Channels in display order
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,

    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clock_channel: None,
            device: DeviceConfig::default(),
            channels: default_channels(),
            buffer: BufferConfig::default(),
            session: SessionConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TelemetryError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, returning defaults when the file is
    /// missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TelemetryError::Serialization(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| {
            TelemetryError::Config(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Channel that drives the timestamp sequence
    pub fn clock_channel(&self) -> Option<&str> {
        self.clock_channel
            .as_deref()
            .or_else(|| self.channels.first().map(|c| c.id.as_str()))
    }

    /// Channel ids in configuration order
    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    /// Check the invariants the backend relies on
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(TelemetryError::Config(
                "At least one channel must be configured".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        let mut characteristics = HashSet::new();
        for channel in &self.channels {
            if channel.id.is_empty() {
                return Err(TelemetryError::Config("Channel id must not be empty".to_string()));
            }
            if !ids.insert(channel.id.as_str()) {
                return Err(TelemetryError::Config(format!(
                    "Duplicate channel id '{}'",
                    channel.id
                )));
            }
            if !characteristics.insert(channel.characteristic.to_ascii_uppercase()) {
                return Err(TelemetryError::Config(format!(
                    "Characteristic {} is used by more than one channel",
                    channel.characteristic
                )));
            }
        }

        let clock = self.clock_channel().unwrap_or_default();
        if !ids.contains(clock) {
            return Err(TelemetryError::Config(format!(
                "Clock channel '{}' is not a configured channel",
                clock
            )));
        }

        if self.device.address.trim().is_empty() {
            return Err(TelemetryError::Config("Device address must not be empty".to_string()));
        }
        if self.buffer.window_size == 0 {
            return Err(TelemetryError::Config("Window size must be at least 1".to_string()));
        }
        if self.buffer.queue_capacity == 0 {
            return Err(TelemetryError::Config("Queue capacity must be at least 1".to_string()));
        }
        if self.render.interval_ms == 0 {
            return Err(TelemetryError::Config("Render interval must be at least 1 ms".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clock_channel(), Some("ax"));
        assert_eq!(config.channel_ids(), vec!["ax", "ay", "az"]);
    }

    #[test]
    fn test_rejects_empty_channels() {
        let config = AppConfig {
            channels: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TelemetryError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_clock_channel() {
        let config = AppConfig {
            clock_channel: Some("gx".into()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gx"));
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut config = AppConfig::default();
        config.channels.push(ChannelConfig::new("ax", "FFFF"));
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        let dup = config.channels[0].characteristic.to_lowercase();
        config.channels.push(ChannelConfig::new("gx", dup));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let mut config = AppConfig::default();
        config.buffer.window_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.buffer.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.clock_channel = Some("az".into());
        config.buffer.window_size = 42;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[session]\nbackoff_ms = 100\n").unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.session.backoff_ms, 100);
        assert_eq!(loaded.session.notification_poll_ms, DEFAULT_NOTIFICATION_POLL_MS);
        assert_eq!(loaded.channels, default_channels());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[buffer]\nwindow_size = 0\n").unwrap();
        assert!(AppConfig::load(&path).is_err());

        std::fs::write(&path, "not = [toml").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
