//! NotificationSource trait for the radio transport
//!
//! This module provides the seam between the session supervisor and a
//! concrete wireless stack. The supervisor only needs to find the device,
//! open a session, subscribe characteristics and pull notifications; how a
//! particular stack does that (and whether it is real hardware or the
//! simulated sensor) stays behind this trait.

use crate::error::Result;
use crate::types::{DeviceInfo, Notification};
use std::time::Duration;

/// Unified interface for notification transports
///
/// Implementations must be `Send` so the supervisor can own them on its own
/// thread. All calls may block, but none should block for longer than the
/// timeout it is given.
///
/// # Example
///
/// ```ignore
/// fn first_payload(source: &mut dyn NotificationSource) -> Result<Option<Vec<u8>>> {
///     let device = source.discover("E6:1B:97:99:AF:26", Duration::from_secs(10))?;
///     source.connect(&device)?;
///     source.subscribe("19B10002-E8F2-537E-4F6C-D104768A1214")?;
///     Ok(source.next_notification(Duration::from_secs(1))?.map(|n| n.payload))
/// }
/// ```
pub trait NotificationSource: Send {
    /// Scan for the device with `address`
    ///
    /// Returns [`TelemetryError::DeviceNotFound`] when the scan window
    /// elapses without a match.
    ///
    /// [`TelemetryError::DeviceNotFound`]: crate::error::TelemetryError::DeviceNotFound
    fn discover(&mut self, address: &str, timeout: Duration) -> Result<DeviceInfo>;

    /// Open a transport session to a discovered device
    fn connect(&mut self, device: &DeviceInfo) -> Result<()>;

    /// Enable notifications for one characteristic
    fn subscribe(&mut self, characteristic: &str) -> Result<()>;

    /// Wait up to `timeout` for the next notification
    ///
    /// `Ok(None)` means nothing arrived in time. A lost link is reported as
    /// [`TelemetryError::Disconnected`].
    ///
    /// [`TelemetryError::Disconnected`]: crate::error::TelemetryError::Disconnected
    fn next_notification(&mut self, timeout: Duration) -> Result<Option<Notification>>;

    /// Tear down the session. Must be safe to call when not connected.
    fn disconnect(&mut self);
}
