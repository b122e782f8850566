//! Configuration sections
//!
//! Each section is `#[serde(default)]` so a config file only needs to name
//! the values it changes. Durations are stored as integer milliseconds and
//! exposed through `Duration` accessors.
//!
//! # Main Types
//!
//! - [`DeviceConfig`] - Which sensor to look for and how long to scan
//! - [`ChannelConfig`] - One channel and the characteristic it is subscribed on
//! - [`BufferConfig`] - Window capacity and ingestion queue depth
//! - [`SessionConfig`] - Retry backoff and idle poll interval
//! - [`RenderConfig`] - Consumer polling cadence

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default device address (Nano 33 BLE)
pub const DEFAULT_DEVICE_ADDRESS: &str = "E6:1B:97:99:AF:26";

/// Default scan timeout in milliseconds
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 10_000;

/// Default number of samples retained per channel (30 s at 10 Hz)
pub const DEFAULT_WINDOW_SIZE: usize = 300;

/// Default depth of the notification queue between supervisor and writer
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default delay between failed sessions in milliseconds
pub const DEFAULT_BACKOFF_MS: u64 = 5_000;

/// Default idle wait for a notification before re-checking cancellation
pub const DEFAULT_NOTIFICATION_POLL_MS: u64 = 250;

/// Default render tick in milliseconds (~20 Hz)
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 50;

/// Target device settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Transport address of the sensor
    pub address: String,
    /// How long a single scan may take before the attempt is abandoned
    pub scan_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_DEVICE_ADDRESS.to_string(),
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
        }
    }
}

impl DeviceConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }
}

/// One telemetry channel and its subscription key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel identifier used in snapshots
    pub id: String,
    /// Characteristic UUID the channel's notifications arrive on
    pub characteristic: String,
}

impl ChannelConfig {
    pub fn new(id: impl Into<String>, characteristic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            characteristic: characteristic.into(),
        }
    }
}

/// The accelerometer channels the sensor firmware exposes
pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new("ax", "19B10002-E8F2-537E-4F6C-D104768A1214"),
        ChannelConfig::new("ay", "19B20001-E8F2-537E-4F6C-D104768A1214"),
        ChannelConfig::new("az", "19B20002-E8F2-537E-4F6C-D104768A1214"),
    ]
}

/// Sliding window settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Samples kept per channel (and in the timestamp sequence)
    pub window_size: usize,
    /// Notifications that may wait for the writer before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Session supervisor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed wait between a failed or ended session and the next scan
    pub backoff_ms: u64,
    /// How long to wait for a notification before checking for cancellation
    pub notification_poll_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backoff_ms: DEFAULT_BACKOFF_MS,
            notification_poll_ms: DEFAULT_NOTIFICATION_POLL_MS,
        }
    }
}

impl SessionConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn notification_poll(&self) -> Duration {
        Duration::from_millis(self.notification_poll_ms.max(1))
    }
}

/// Consumer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Interval between snapshot reads
    pub interval_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_RENDER_INTERVAL_MS,
        }
    }
}

impl RenderConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
