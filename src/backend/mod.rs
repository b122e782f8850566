//! Backend module for BLE ingestion
//!
//! This module owns everything between the radio and the window buffer. It
//! runs on two background threads so the render loop never blocks on the
//! radio:
//!
//! - [`SessionSupervisor`] - keeps the device session alive (scan, connect,
//!   subscribe, retry) and pushes raw notifications onto a bounded queue
//! - [`SampleWriter`] - the single writer that decodes queued payloads and
//!   appends them to the [`WindowBuffer`]
//!
//! # Components
//!
//! - [`NotificationSource`] - seam to a concrete radio stack
//! - [`SimulatedSensor`] - simulated sensor for running without hardware (feature-gated)
//! - [`ChannelDecoder`] - text payload to sample
//! - [`TelemetryBackend`] / [`TelemetryHandle`] - wiring and lifecycle
//!
//! # Example
//!
//! ```ignore
//! use motion_telemetry::backend::{SimulatedSensor, TelemetryBackend};
//! use motion_telemetry::config::AppConfig;
//!
//! let config = AppConfig::default();
//! let sensor = SimulatedSensor::from_config(&config);
//! let handle = TelemetryBackend::new(config)?.start(Box::new(sensor))?;
//!
//! let snapshot = handle.reader().read();
//! println!("{} aligned samples", snapshot.len());
//!
//! let (session, writer) = handle.shutdown()?;
//! ```

pub mod decoder;
#[cfg(feature = "mock-source")]
pub mod mock_source;
pub mod source;
pub mod supervisor;
pub mod writer;

pub use decoder::{ChannelDecoder, Rejected};
#[cfg(feature = "mock-source")]
pub use mock_source::{ChannelSignal, SignalPattern, SimulatedSensor};
pub use source::NotificationSource;
pub use supervisor::{SessionEvent, SessionSupervisor};
pub use writer::SampleWriter;

use crate::cancel::CancellationToken;
use crate::config::AppConfig;
use crate::error::{Result, TelemetryError};
use crate::snapshot::SnapshotReader;
use crate::types::{SessionStats, WriterStats};
use crate::window::WindowBuffer;
use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Capacity of the session event channel; events past this are dropped
const EVENT_CAPACITY: usize = 256;

/// Shared state for one telemetry run, before the threads are started
pub struct TelemetryBackend {
    config: AppConfig,
    buffer: Arc<WindowBuffer>,
    cancel: CancellationToken,
}

impl TelemetryBackend {
    /// Validate `config` and allocate the window buffer
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let buffer = Arc::new(WindowBuffer::from_config(&config)?);
        Ok(Self {
            config,
            buffer,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Read handle onto the buffer. Valid before and after `start`.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader::new(Arc::clone(&self.buffer))
    }

    pub fn buffer(&self) -> &Arc<WindowBuffer> {
        &self.buffer
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn the writer and supervisor threads
    pub fn start(self, source: Box<dyn NotificationSource>) -> Result<TelemetryHandle> {
        let clock_channel = self
            .config
            .clock_channel()
            .map(str::to_string)
            .ok_or_else(|| TelemetryError::Config("No clock channel configured".to_string()))?;

        // Bounded queue so a stalled writer cannot grow memory without limit
        let (queue_tx, queue_rx) = bounded(self.config.buffer.queue_capacity);
        let (event_tx, event_rx) = bounded(EVENT_CAPACITY);

        let writer = SampleWriter::new(
            Arc::clone(&self.buffer),
            queue_rx,
            clock_channel,
            self.cancel.clone(),
        );
        let writer = thread::Builder::new()
            .name("sample-writer".to_string())
            .spawn(move || writer.run())?;

        let supervisor = SessionSupervisor::new(&self.config, source, queue_tx, self.cancel.clone())
            .with_events(event_tx);
        let supervisor = match thread::Builder::new()
            .name("ble-session".to_string())
            .spawn(move || supervisor.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                self.cancel.cancel();
                let _ = writer.join();
                return Err(e.into());
            }
        };

        tracing::info!(
            "Telemetry started: {} channels, window {} samples",
            self.config.channels.len(),
            self.buffer.capacity()
        );

        Ok(TelemetryHandle {
            reader: SnapshotReader::new(self.buffer),
            cancel: self.cancel,
            events: event_rx,
            supervisor,
            writer,
        })
    }
}

/// Running telemetry threads
pub struct TelemetryHandle {
    reader: SnapshotReader,
    cancel: CancellationToken,
    events: Receiver<SessionEvent>,
    supervisor: JoinHandle<SessionStats>,
    writer: JoinHandle<WriterStats>,
}

impl TelemetryHandle {
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// Session events, in the order the supervisor published them
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Receive all pending events
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.events.try_iter().collect()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel both threads and wait for them to finish
    pub fn shutdown(self) -> Result<(SessionStats, WriterStats)> {
        self.cancel.cancel();
        let session = self
            .supervisor
            .join()
            .map_err(|_| TelemetryError::Channel("Session thread panicked".to_string()))?;
        let writer = self
            .writer
            .join()
            .map_err(|_| TelemetryError::Channel("Writer thread panicked".to_string()))?;
        tracing::info!("Telemetry stopped");
        Ok((session, writer))
    }
}
