//! Error handling for motion-telemetry
//!
//! This module defines the crate error type and a Result alias. Transport
//! failures are all recoverable by the session supervisor; nothing here is
//! fatal once the backend is running.

use std::time::Duration;
use thiserror::Error;

/// Main error type for motion-telemetry operations
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The configured device did not show up within the scan window
    #[error("Device {address} not found within {timeout:?}")]
    DeviceNotFound { address: String, timeout: Duration },

    /// Opening the transport session failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Subscribing to a characteristic failed
    #[error("Subscription to {characteristic} failed: {message}")]
    Subscription {
        characteristic: String,
        message: String,
    },

    /// The transport reported that the link went away
    #[error("Device disconnected")]
    Disconnected,

    /// A sample was addressed to a channel the buffer does not hold
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Errors related to configuration loading/saving/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TelemetryError>,
    },
}

impl TelemetryError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TelemetryError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the supervisor should treat this as a lost link rather than a
    /// failed attempt. Both lead to the same backoff; only the log differs.
    pub fn is_disconnect(&self) -> bool {
        match self {
            TelemetryError::Disconnected => true,
            TelemetryError::WithContext { source, .. } => source.is_disconnect(),
            _ => false,
        }
    }
}

/// Result type alias for motion-telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, toml::de::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| TelemetryError::Serialization(e.to_string()).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| TelemetryError::Serialization(e.to_string()).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::UnknownChannel("gx".to_string());
        assert_eq!(err.to_string(), "Unknown channel: gx");
    }

    #[test]
    fn test_error_with_context() {
        let err = TelemetryError::Connection("refused".to_string());
        let with_ctx = err.with_context("Failed to open session");
        assert!(with_ctx.to_string().contains("Failed to open session"));
        assert!(with_ctx.to_string().contains("refused"));
    }

    #[test]
    fn test_device_not_found_message() {
        let err = TelemetryError::DeviceNotFound {
            address: "E6:1B:97:99:AF:26".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("E6:1B:97:99:AF:26"));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_is_disconnect_sees_through_context() {
        assert!(TelemetryError::Disconnected.is_disconnect());
        assert!(TelemetryError::Disconnected
            .with_context("stream")
            .is_disconnect());
        assert!(!TelemetryError::Connection("x".into()).is_disconnect());
    }
}
