//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{ConfigBuilder, AX_CHAR, AY_CHAR};
use common::mock_helpers::{create_quiet_source, test_device, DEVICE_ADDRESS};
use motion_telemetry::backend::NotificationSource;
use std::time::Duration;

#[test]
fn test_infrastructure_setup() {
    // Test that builders work
    let config = ConfigBuilder::new()
        .window_size(5)
        .queue_capacity(8)
        .channels(&[("ax", AX_CHAR), ("ay", AY_CHAR)])
        .clock_channel("ay")
        .build();

    assert_eq!(config.buffer.window_size, 5);
    assert_eq!(config.buffer.queue_capacity, 8);
    assert_eq!(config.clock_channel(), Some("ay"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_quiet_source_behaves() {
    let mut source = create_quiet_source();
    let device = source.discover(DEVICE_ADDRESS, Duration::from_millis(1)).unwrap();
    assert_eq!(device, test_device());
    assert!(source.connect(&device).is_ok());
    assert!(source.subscribe(AX_CHAR).is_ok());
    assert!(source.next_notification(Duration::from_millis(1)).unwrap().is_none());
    source.disconnect();
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
