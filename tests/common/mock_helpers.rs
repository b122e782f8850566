//! Mock construction helpers

use crossbeam_channel::{bounded, Receiver, Sender};
use mockall::mock;
use motion_telemetry::backend::NotificationSource;
use motion_telemetry::types::{DeviceInfo, IngestItem, Notification};
use motion_telemetry::{Result, TelemetryError};
use std::time::Duration;

#[cfg(feature = "mock-source")]
use motion_telemetry::backend::SimulatedSensor;

pub const DEVICE_ADDRESS: &str = "E6:1B:97:99:AF:26";

mock! {
    pub Source {}

    impl NotificationSource for Source {
        fn discover(&mut self, address: &str, timeout: Duration) -> Result<DeviceInfo>;
        fn connect(&mut self, device: &DeviceInfo) -> Result<()>;
        fn subscribe(&mut self, characteristic: &str) -> Result<()>;
        fn next_notification(&mut self, timeout: Duration) -> Result<Option<Notification>>;
        fn disconnect(&mut self);
    }
}

/// Create a writer queue with default size
pub fn create_test_queue() -> (Sender<IngestItem>, Receiver<IngestItem>) {
    bounded(16)
}

pub fn test_device() -> DeviceInfo {
    DeviceInfo {
        address: DEVICE_ADDRESS.to_string(),
        name: Some("Nano33".to_string()),
    }
}

pub fn not_found(address: &str, timeout: Duration) -> TelemetryError {
    TelemetryError::DeviceNotFound {
        address: address.to_string(),
        timeout,
    }
}

/// Source that connects and subscribes fine but stays silent
pub fn create_quiet_source() -> MockSource {
    let mut source = MockSource::new();
    source.expect_discover().returning(|_, _| Ok(test_device()));
    source.expect_connect().returning(|_| Ok(()));
    source.expect_subscribe().returning(|_| Ok(()));
    source.expect_next_notification().returning(|timeout| {
        std::thread::sleep(timeout);
        Ok(None)
    });
    source.expect_disconnect().return_const(());
    source
}

#[cfg(feature = "mock-source")]
pub fn create_fast_sensor() -> SimulatedSensor {
    SimulatedSensor::new(DEVICE_ADDRESS)
        .with_scan_delay(Duration::ZERO)
        .with_update_interval(Duration::from_millis(2))
}
