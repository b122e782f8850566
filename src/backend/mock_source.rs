//! Simulated sensor for running without hardware
//!
//! This module provides a [`NotificationSource`] that behaves like the
//! motion sensor firmware: it advertises at one address, and once
//! subscribed it emits one text notification per characteristic every
//! update interval (100 ms by default, like the device).
//!
//! # Features
//!
//! - **Pattern-based data generation**: each characteristic gets a signal
//!   pattern; unconfigured ones fall back to a default
//! - **Noise simulation**: optional uniform noise on every value
//! - **Fault injection**: fail the first K scans, drop the link after M
//!   notifications per session, or send a malformed payload every k-th
//!   notification
//!
//! # Example
//!
//! ```ignore
//! use motion_telemetry::backend::mock_source::{SignalPattern, SimulatedSensor};
//!
//! let sensor = SimulatedSensor::new("E6:1B:97:99:AF:26")
//!     .with_pattern("19B10002-E8F2-537E-4F6C-D104768A1214", SignalPattern::Sine {
//!         frequency: 0.5,
//!         amplitude: 1.0,
//!         offset: 0.0,
//!     })
//!     .failing_scans(2)
//!     .malformed_every(50);
//! ```
//!
//! # Enabling
//!
//! The simulated sensor is behind the `mock-source` feature, which is on by
//! default.

use crate::config::AppConfig;
use crate::error::{Result, TelemetryError};
use crate::types::{DeviceInfo, Notification};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use super::source::NotificationSource;

/// Default advertised name
pub const SIMULATED_DEVICE_NAME: &str = "Nano33 (simulated)";

/// How often the firmware pushes a fresh set of values
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Simulated scan latency before the device is reported
pub const DEFAULT_SCAN_DELAY: Duration = Duration::from_millis(200);

/// Signal shape for one characteristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalPattern {
    /// Constant value
    Constant(f64),
    /// Sine wave with frequency and amplitude
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
    /// Counter that increments and wraps
    Counter { step: f64, min: f64, max: f64 },
    /// Square wave
    Square { period: f64, amplitude: f64 },
}

impl Default for SignalPattern {
    fn default() -> Self {
        SignalPattern::Sine {
            frequency: 0.5,
            amplitude: 1.0,
            offset: 0.0,
        }
    }
}

/// Generator state for one characteristic
#[derive(Debug, Clone)]
pub struct ChannelSignal {
    pub pattern: SignalPattern,
    /// Current counter value (for Counter pattern)
    counter_value: f64,
}

impl ChannelSignal {
    pub fn new(pattern: SignalPattern) -> Self {
        let counter_value = match pattern {
            SignalPattern::Counter { min, step, .. } => min - step,
            _ => 0.0,
        };
        Self {
            pattern,
            counter_value,
        }
    }

    /// Generate a value based on the pattern and elapsed time
    pub fn generate_value(&mut self, elapsed_secs: f64) -> f64 {
        match self.pattern {
            SignalPattern::Constant(v) => v,
            SignalPattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * elapsed_secs).sin(),
            SignalPattern::Counter { step, min, max } => {
                self.counter_value += step;
                if self.counter_value > max {
                    self.counter_value = min;
                } else if self.counter_value < min {
                    self.counter_value = max;
                }
                self.counter_value
            }
            SignalPattern::Square { period, amplitude } => {
                if period <= 0.0 || elapsed_secs % period < period / 2.0 {
                    amplitude
                } else {
                    -amplitude
                }
            }
        }
    }
}

/// Simulated motion sensor
pub struct SimulatedSensor {
    address: String,
    name: String,
    signals: HashMap<String, ChannelSignal>,
    default_pattern: SignalPattern,
    noise_amplitude: f64,
    noise_seed: u64,
    update_interval: Duration,
    scan_delay: Duration,
    failed_scans_remaining: u32,
    disconnect_after: Option<u64>,
    malformed_every: Option<u64>,

    connected: bool,
    subscribed: Vec<String>,
    pending: VecDeque<Notification>,
    next_update: Instant,
    start_time: Instant,
    sent_this_session: u64,
    total_sent: u64,
}

impl SimulatedSensor {
    /// Create a sensor advertising at `address`
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: SIMULATED_DEVICE_NAME.to_string(),
            signals: HashMap::new(),
            default_pattern: SignalPattern::default(),
            noise_amplitude: 0.0,
            noise_seed: 12345,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            scan_delay: DEFAULT_SCAN_DELAY,
            failed_scans_remaining: 0,
            disconnect_after: None,
            malformed_every: None,
            connected: false,
            subscribed: Vec::new(),
            pending: VecDeque::new(),
            next_update: Instant::now(),
            start_time: Instant::now(),
            sent_this_session: 0,
            total_sent: 0,
        }
    }

    /// A sensor matching `config`: three-axis accelerometer at rest, tilted
    /// slightly and swaying on the first axis
    pub fn from_config(config: &AppConfig) -> Self {
        let mut sensor = Self::new(config.device.address.clone()).with_noise(0.01);
        for (i, channel) in config.channels.iter().enumerate() {
            let pattern = match i {
                0 => SignalPattern::Sine {
                    frequency: 0.5,
                    amplitude: 0.3,
                    offset: 0.0,
                },
                1 => SignalPattern::Constant(0.05),
                2 => SignalPattern::Constant(0.98),
                _ => SignalPattern::default(),
            };
            sensor = sensor.with_pattern(channel.characteristic.clone(), pattern);
        }
        sensor
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Configure the pattern for one characteristic
    pub fn with_pattern(mut self, characteristic: impl Into<String>, pattern: SignalPattern) -> Self {
        self.signals
            .insert(characteristic.into().to_ascii_uppercase(), ChannelSignal::new(pattern));
        self
    }

    /// Set the pattern for characteristics without their own
    pub fn with_default_pattern(mut self, pattern: SignalPattern) -> Self {
        self.default_pattern = pattern;
        self
    }

    /// Add uniform noise in `[-amplitude, amplitude]`
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }

    /// Report "not found" for the next `count` scans
    pub fn failing_scans(mut self, count: u32) -> Self {
        self.failed_scans_remaining = count;
        self
    }

    /// Drop the link after `count` notifications in each session
    pub fn disconnect_after(mut self, count: u64) -> Self {
        self.disconnect_after = Some(count.max(1));
        self
    }

    /// Replace every `k`-th notification's payload with non-numeric text
    pub fn malformed_every(mut self, k: u64) -> Self {
        self.malformed_every = Some(k.max(1));
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Notifications emitted over all sessions
    pub fn total_sent(&self) -> u64 {
        self.total_sent
    }

    /// Queue one notification per subscribed characteristic
    fn generate_update(&mut self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        for characteristic in self.subscribed.clone() {
            let default_pattern = self.default_pattern;
            let value = self
                .signals
                .entry(characteristic.clone())
                .or_insert_with(|| ChannelSignal::new(default_pattern))
                .generate_value(elapsed);
            let value = value + self.noise();
            self.pending
                .push_back(Notification::new(characteristic, format!("{:.3}", value)));
        }
    }

    fn noise(&mut self) -> f64 {
        if self.noise_amplitude <= 0.0 {
            return 0.0;
        }
        // xorshift64
        let mut s = self.noise_seed;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.noise_seed = s;
        let unit = (s as f64) / (u64::MAX as f64);
        (unit - 0.5) * 2.0 * self.noise_amplitude
    }
}

impl NotificationSource for SimulatedSensor {
    fn discover(&mut self, address: &str, timeout: Duration) -> Result<DeviceInfo> {
        if self.failed_scans_remaining > 0 || !address.eq_ignore_ascii_case(&self.address) {
            self.failed_scans_remaining = self.failed_scans_remaining.saturating_sub(1);
            std::thread::sleep(timeout.min(self.scan_delay));
            return Err(TelemetryError::DeviceNotFound {
                address: address.to_string(),
                timeout,
            });
        }

        std::thread::sleep(timeout.min(self.scan_delay));
        Ok(DeviceInfo {
            address: self.address.clone(),
            name: Some(self.name.clone()),
        })
    }

    fn connect(&mut self, device: &DeviceInfo) -> Result<()> {
        if !device.address.eq_ignore_ascii_case(&self.address) {
            return Err(TelemetryError::Connection(format!(
                "No simulated device at {}",
                device.address
            )));
        }
        self.connected = true;
        self.subscribed.clear();
        self.pending.clear();
        self.sent_this_session = 0;
        self.next_update = Instant::now();
        tracing::info!("Simulated sensor connected ({})", self.address);
        Ok(())
    }

    fn subscribe(&mut self, characteristic: &str) -> Result<()> {
        if !self.connected {
            return Err(TelemetryError::Subscription {
                characteristic: characteristic.to_string(),
                message: "not connected".to_string(),
            });
        }
        let key = characteristic.to_ascii_uppercase();
        if !self.subscribed.contains(&key) {
            self.subscribed.push(key);
        }
        Ok(())
    }

    fn next_notification(&mut self, timeout: Duration) -> Result<Option<Notification>> {
        if !self.connected {
            return Err(TelemetryError::Disconnected);
        }
        if let Some(limit) = self.disconnect_after {
            if self.sent_this_session >= limit {
                self.connected = false;
                tracing::info!("Simulated sensor dropped the link after {} notifications", limit);
                return Err(TelemetryError::Disconnected);
            }
        }

        if self.pending.is_empty() {
            if self.subscribed.is_empty() {
                std::thread::sleep(timeout);
                return Ok(None);
            }

            let now = Instant::now();
            if self.next_update > now {
                let wait = self.next_update - now;
                if wait > timeout {
                    std::thread::sleep(timeout);
                    return Ok(None);
                }
                std::thread::sleep(wait);
            }
            self.generate_update();
            self.next_update += self.update_interval;
        }

        let Some(mut notification) = self.pending.pop_front() else {
            return Ok(None);
        };
        self.sent_this_session += 1;
        self.total_sent += 1;
        if let Some(k) = self.malformed_every {
            if self.total_sent % k == 0 {
                notification.payload = b"oops".to_vec();
            }
        }
        Ok(Some(notification))
    }

    fn disconnect(&mut self) {
        if self.connected {
            tracing::info!("Simulated sensor disconnected");
        }
        self.connected = false;
        self.subscribed.clear();
        self.pending.clear();
    }
}
