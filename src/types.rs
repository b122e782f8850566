//! Core data types for motion-telemetry
//!
//! # Main Types
//!
//! - [`Sample`] - One decoded value for a channel
//! - [`Notification`] - One raw payload delivered by the transport
//! - [`SessionState`] - Lifecycle state of the radio link
//! - [`SessionStats`] / [`WriterStats`] - Counters returned when threads stop

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Identifier of one telemetry channel (e.g. "ax")
pub type ChannelId = String;

/// A decoded value for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Channel the value belongs to
    pub channel: ChannelId,
    /// Decoded value
    pub value: f64,
}

impl Sample {
    pub fn new(channel: impl Into<ChannelId>, value: f64) -> Self {
        Self {
            channel: channel.into(),
            value,
        }
    }
}

/// A raw notification as delivered by a [`NotificationSource`]
///
/// [`NotificationSource`]: crate::backend::NotificationSource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Subscription key the payload arrived on (characteristic UUID)
    pub characteristic: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl Notification {
    pub fn new(characteristic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            characteristic: characteristic.into(),
            payload: payload.into(),
        }
    }
}

/// A notification resolved to its channel and stamped on receipt, queued for the writer
#[derive(Debug, Clone)]
pub struct IngestItem {
    pub channel: ChannelId,
    pub payload: Vec<u8>,
    pub received_at: Instant,
}

/// Device discovered during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Transport address (e.g. BLE MAC)
    pub address: String,
    /// Advertised local name, if any
    pub name: Option<String>,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.address, name),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Lifecycle state of the radio session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No link, either before the first attempt or while backing off
    #[default]
    Disconnected,
    /// Looking for the configured device
    Scanning,
    /// Transport session open, not yet subscribed
    Connected,
    /// All channels subscribed, notifications flowing
    Subscribed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Scanning => write!(f, "Scanning..."),
            SessionState::Connected => write!(f, "Connected"),
            SessionState::Subscribed => write!(f, "Subscribed"),
        }
    }
}

/// Counters kept by the session supervisor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of scan attempts started
    pub attempts: u64,
    /// Number of times every channel was successfully subscribed
    pub sessions_established: u64,
    /// Notifications received from the transport
    pub notifications_received: u64,
    /// Notifications handed to the writer queue
    pub notifications_forwarded: u64,
    /// Notifications dropped because the writer queue was full
    pub dropped_notifications: u64,
    /// Notifications on a characteristic that maps to no channel
    pub unrecognized_notifications: u64,
}

/// Counters kept by the sample writer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Samples decoded and appended
    pub accepted: u64,
    /// Payloads the decoder rejected
    pub rejected: u64,
    /// Samples the buffer refused because the channel is not configured
    pub unknown_channel: u64,
}

impl WriterStats {
    /// Fraction of payloads that decoded, as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.accepted + self.rejected + self.unknown_channel;
        if total == 0 {
            100.0
        } else {
            (self.accepted as f64 / total as f64) * 100.0
        }
    }
}

impl std::fmt::Display for WriterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} accepted, {} rejected, {} unknown channel ({:.1}% accepted)",
            self.accepted,
            self.rejected,
            self.unknown_channel,
            self.acceptance_rate()
        )
    }
}
