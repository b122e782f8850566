//! Test data builders for creating test objects

use motion_telemetry::config::{AppConfig, ChannelConfig};

pub const AX_CHAR: &str = "19B10002-E8F2-537E-4F6C-D104768A1214";
pub const AY_CHAR: &str = "19B20001-E8F2-537E-4F6C-D104768A1214";
pub const AZ_CHAR: &str = "19B20002-E8F2-537E-4F6C-D104768A1214";

/// Builder for configs with short timings suitable for tests
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.device.scan_timeout_ms = 20;
        config.session.backoff_ms = 20;
        config.session.notification_poll_ms = 5;
        config.render.interval_ms = 5;
        Self { config }
    }

    pub fn window_size(mut self, size: usize) -> Self {
        self.config.buffer.window_size = size;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer.queue_capacity = capacity;
        self
    }

    pub fn backoff_ms(mut self, ms: u64) -> Self {
        self.config.session.backoff_ms = ms;
        self
    }

    pub fn scan_timeout_ms(mut self, ms: u64) -> Self {
        self.config.device.scan_timeout_ms = ms;
        self
    }

    pub fn channels(mut self, channels: &[(&str, &str)]) -> Self {
        self.config.channels = channels
            .iter()
            .map(|(id, characteristic)| ChannelConfig::new(*id, *characteristic))
            .collect();
        self
    }

    pub fn clock_channel(mut self, id: &str) -> Self {
        self.config.clock_channel = Some(id.to_string());
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .window_size(5)
            .backoff_ms(1)
            .channels(&[("ax", AX_CHAR)])
            .build();

        assert_eq!(config.buffer.window_size, 5);
        assert_eq!(config.session.backoff_ms, 1);
        assert_eq!(config.channel_ids(), vec!["ax".to_string()]);
        assert!(config.validate().is_ok());
    }
}
