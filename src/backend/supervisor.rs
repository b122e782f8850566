//! Session supervisor
//!
//! Owns the radio link for the lifetime of the process. Each attempt walks
//! the session state machine:
//!
//! ```text
//! Disconnected -> Scanning -> Connected -> Subscribed -> Disconnected
//! ```
//!
//! Any failure along the way (device not found, connect or subscribe error,
//! link lost mid-stream) ends the attempt. The supervisor then disconnects,
//! waits the configured backoff and starts scanning again. There is no
//! attempt limit; only the [`CancellationToken`] stops the loop.
//!
//! While subscribed, notifications are resolved to their channel, stamped
//! with their arrival time and pushed onto the writer queue without
//! blocking. If the writer falls behind and the queue fills up, the newest
//! notifications are dropped and counted.

use crate::backend::source::NotificationSource;
use crate::cancel::CancellationToken;
use crate::config::{AppConfig, DeviceConfig, SessionConfig};
use crate::error::{Result, ResultExt, TelemetryError};
use crate::types::{ChannelId, DeviceInfo, IngestItem, Notification, SessionState, SessionStats};
use crossbeam_channel::{Sender, TrySendError};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Progress reports published to an optional observer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session moved to a new state
    StateChanged(SessionState),
    /// The scan found the configured device
    DeviceFound(DeviceInfo),
    /// An attempt failed; the supervisor will retry
    Error(String),
    /// Next attempt starts after `delay`
    RetryScheduled { attempt: u64, delay: Duration },
}

/// Keeps the radio session alive and feeds notifications to the writer
pub struct SessionSupervisor {
    device: DeviceConfig,
    session: SessionConfig,
    /// (channel id, characteristic) in subscription order
    subscriptions: Vec<(ChannelId, String)>,
    /// Upper-cased characteristic -> channel id
    routes: HashMap<String, ChannelId>,
    source: Box<dyn NotificationSource>,
    queue: Sender<IngestItem>,
    events: Option<Sender<SessionEvent>>,
    cancel: CancellationToken,
    state: SessionState,
    stats: SessionStats,
}

impl SessionSupervisor {
    pub fn new(
        config: &AppConfig,
        source: Box<dyn NotificationSource>,
        queue: Sender<IngestItem>,
        cancel: CancellationToken,
    ) -> Self {
        let subscriptions: Vec<(ChannelId, String)> = config
            .channels
            .iter()
            .map(|c| (c.id.clone(), c.characteristic.clone()))
            .collect();
        let routes = subscriptions
            .iter()
            .map(|(id, characteristic)| (characteristic.to_ascii_uppercase(), id.clone()))
            .collect();

        Self {
            device: config.device.clone(),
            session: config.session.clone(),
            subscriptions,
            routes,
            source,
            queue,
            events: None,
            cancel,
            state: SessionState::Disconnected,
            stats: SessionStats::default(),
        }
    }

    /// Publish state changes and errors on `events`
    pub fn with_events(mut self, events: Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Run the retry loop until cancelled
    pub fn run(mut self) -> SessionStats {
        tracing::info!("Session supervisor started for {}", self.device.address);
        let backoff = self.session.backoff();

        while !self.cancel.is_cancelled() {
            self.stats.attempts += 1;
            let attempt = self.stats.attempts;

            match self.run_session() {
                Ok(()) => tracing::info!("Session ended (attempt {})", attempt),
                Err(e) if e.is_disconnect() => {
                    tracing::warn!("Device disconnected (attempt {}): {}", attempt, e);
                    self.emit(SessionEvent::Error(e.to_string()));
                }
                Err(e) => {
                    tracing::warn!("BLE error (attempt {}): {}", attempt, e);
                    self.emit(SessionEvent::Error(e.to_string()));
                }
            }

            self.source.disconnect();
            self.set_state(SessionState::Disconnected);

            if self.cancel.is_cancelled() {
                break;
            }

            tracing::info!("Retrying in {:?}...", backoff);
            self.emit(SessionEvent::RetryScheduled {
                attempt,
                delay: backoff,
            });
            if self.cancel.wait_timeout(backoff) {
                break;
            }
        }

        tracing::info!(
            "Session supervisor stopped after {} attempts ({} notifications forwarded, {} dropped)",
            self.stats.attempts,
            self.stats.notifications_forwarded,
            self.stats.dropped_notifications
        );
        self.stats
    }

    /// One pass through Scanning -> Connected -> Subscribed.
    /// Returns `Ok` only when cancelled while streaming.
    fn run_session(&mut self) -> Result<()> {
        self.set_state(SessionState::Scanning);
        let timeout = self.device.scan_timeout();
        tracing::info!("Scanning for {} for {:?}...", self.device.address, timeout);

        let device = self.source.discover(&self.device.address, timeout)?;
        tracing::info!("Found: {}", device);
        self.emit(SessionEvent::DeviceFound(device.clone()));

        self.source
            .connect(&device)
            .with_context(|| format!("Failed to connect to {}", device.address))?;
        self.set_state(SessionState::Connected);

        for (id, characteristic) in &self.subscriptions {
            self.source
                .subscribe(characteristic)
                .with_context(|| format!("Failed to subscribe channel '{}'", id))?;
            tracing::debug!("Subscribed '{}' on {}", id, characteristic);
        }
        self.stats.sessions_established += 1;
        self.set_state(SessionState::Subscribed);
        tracing::info!(
            "Notifications active ({}). Receiving data...",
            self.subscriptions
                .iter()
                .map(|(id, _)| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let poll = self.session.notification_poll();
        while !self.cancel.is_cancelled() {
            if let Some(notification) = self.source.next_notification(poll)? {
                self.forward(notification)?;
            }
        }
        Ok(())
    }

    /// Route one notification to the writer queue
    fn forward(&mut self, notification: Notification) -> Result<()> {
        let received_at = Instant::now();
        self.stats.notifications_received += 1;

        let Some(channel) = self
            .routes
            .get(&notification.characteristic.to_ascii_uppercase())
        else {
            self.stats.unrecognized_notifications += 1;
            tracing::trace!(
                "Ignoring notification on unknown characteristic {}",
                notification.characteristic
            );
            return Ok(());
        };

        let item = IngestItem {
            channel: channel.clone(),
            payload: notification.payload,
            received_at,
        };

        match self.queue.try_send(item) {
            Ok(()) => {
                self.stats.notifications_forwarded += 1;
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped_notifications += 1;
                tracing::debug!(
                    "Writer queue full, dropped notification ({} total)",
                    self.stats.dropped_notifications
                );
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(TelemetryError::Channel(
                "Sample writer queue closed".to_string(),
            )),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!("Session state: {} -> {}", self.state, state);
            self.state = state;
            self.emit(SessionEvent::StateChanged(state));
        }
    }

    /// Observers that fall behind miss events rather than stall the link
    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            let _ = events.try_send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, Receiver};
    use std::collections::VecDeque;

    /// Source that plays back a fixed script of notifications, then idles
    struct ScriptedSource {
        notifications: VecDeque<Notification>,
        connected: bool,
    }

    impl NotificationSource for ScriptedSource {
        fn discover(&mut self, address: &str, _timeout: Duration) -> Result<DeviceInfo> {
            Ok(DeviceInfo {
                address: address.to_string(),
                name: None,
            })
        }

        fn connect(&mut self, _device: &DeviceInfo) -> Result<()> {
            self.connected = true;
            Ok(())
        }

        fn subscribe(&mut self, _characteristic: &str) -> Result<()> {
            Ok(())
        }

        fn next_notification(&mut self, timeout: Duration) -> Result<Option<Notification>> {
            match self.notifications.pop_front() {
                Some(n) => Ok(Some(n)),
                None => {
                    std::thread::sleep(timeout);
                    Ok(None)
                }
            }
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }
    }

    fn create_test_supervisor(
        notifications: Vec<Notification>,
        queue_capacity: usize,
    ) -> (SessionSupervisor, Receiver<IngestItem>, CancellationToken) {
        let mut config = AppConfig::default();
        config.session.notification_poll_ms = 5;
        let (tx, rx) = bounded(queue_capacity);
        let cancel = CancellationToken::new();
        let source = ScriptedSource {
            notifications: notifications.into(),
            connected: false,
        };
        let supervisor = SessionSupervisor::new(&config, Box::new(source), tx, cancel.clone());
        (supervisor, rx, cancel)
    }

    fn characteristic(config: &AppConfig, id: &str) -> String {
        config
            .channels
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.characteristic.clone())
            .unwrap()
    }

    #[test]
    fn test_supervisor_creation() {
        let (supervisor, _rx, _cancel) = create_test_supervisor(Vec::new(), 4);
        assert_eq!(supervisor.state(), SessionState::Disconnected);
        assert_eq!(supervisor.stats(), &SessionStats::default());
    }

    #[test]
    fn test_forward_routes_by_characteristic() {
        let config = AppConfig::default();
        let (mut supervisor, rx, _cancel) = create_test_supervisor(Vec::new(), 4);

        let ay = characteristic(&config, "ay").to_lowercase();
        supervisor
            .forward(Notification::new(ay, b"0.5".to_vec()))
            .unwrap();
        supervisor
            .forward(Notification::new("0000FFFF", b"1".to_vec()))
            .unwrap();

        let item = rx.try_recv().unwrap();
        assert_eq!(item.channel, "ay");
        assert_eq!(item.payload, b"0.5");
        assert!(rx.try_recv().is_err());
        assert_eq!(supervisor.stats().notifications_forwarded, 1);
        assert_eq!(supervisor.stats().unrecognized_notifications, 1);
    }

    #[test]
    fn test_forward_drops_when_queue_full() {
        let config = AppConfig::default();
        let (mut supervisor, _rx, _cancel) = create_test_supervisor(Vec::new(), 1);
        let ax = characteristic(&config, "ax");

        supervisor.forward(Notification::new(ax.clone(), b"1".to_vec())).unwrap();
        supervisor.forward(Notification::new(ax, b"2".to_vec())).unwrap();

        assert_eq!(supervisor.stats().notifications_forwarded, 1);
        assert_eq!(supervisor.stats().dropped_notifications, 1);
    }

    #[test]
    fn test_forward_fails_when_writer_gone() {
        let config = AppConfig::default();
        let (mut supervisor, rx, _cancel) = create_test_supervisor(Vec::new(), 1);
        drop(rx);
        let result = supervisor.forward(Notification::new(characteristic(&config, "ax"), b"1".to_vec()));
        assert!(matches!(result, Err(TelemetryError::Channel(_))));
    }

    #[test]
    fn test_run_streams_until_cancelled() {
        let config = AppConfig::default();
        let notifications = vec![
            Notification::new(characteristic(&config, "ax"), b"1.0".to_vec()),
            Notification::new(characteristic(&config, "ay"), b"2.0".to_vec()),
        ];
        let (supervisor, rx, cancel) = create_test_supervisor(notifications, 16);
        let (events_tx, events_rx) = bounded(64);
        let supervisor = supervisor.with_events(events_tx);

        let handle = std::thread::spawn(move || supervisor.run());

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.channel, "ax");
        assert_eq!(second.channel, "ay");

        cancel.cancel();
        let stats = handle.join().unwrap();
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.sessions_established, 1);
        assert_eq!(stats.notifications_forwarded, 2);

        let states: Vec<_> = events_rx
            .try_iter()
            .filter_map(|e| match e {
                SessionEvent::StateChanged(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                SessionState::Scanning,
                SessionState::Connected,
                SessionState::Subscribed,
                SessionState::Disconnected,
            ]
        );
    }
}
