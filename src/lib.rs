//! # Motion Telemetry: live BLE sensor windows
//!
//! Streams three-axis motion readings from a BLE sensor and keeps a rolling,
//! time-aligned window of the most recent samples for live display. The
//! architecture separates the radio session from rendering:
//!
//! ## Architecture
//!
//! - **Backend**: a session supervisor thread keeps the BLE link alive and
//!   queues raw notifications; a writer thread decodes them into the window
//! - **Window**: a bounded per-channel buffer with timestamps driven by the
//!   clock channel
//! - **Frontend**: a render loop that reads consistent snapshots on an interval
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! Settings are read from `config.toml` in the platform config directory
//! under `dev.motion-telemetry`:
//!
//! - **Linux**: `~/.config/dev.motion-telemetry/`
//! - **macOS**: `~/Library/Application Support/dev.motion-telemetry/`
//! - **Windows**: `%APPDATA%\dev.motion-telemetry\`
//!
//! ## Example
//!
//! ```ignore
//! use motion_telemetry::{
//!     backend::{SimulatedSensor, TelemetryBackend},
//!     config::AppConfig,
//!     frontend::{JsonLinesSink, RenderLoop},
//! };
//!
//! let config = AppConfig::load_or_default();
//! let sensor = SimulatedSensor::from_config(&config);
//! let handle = TelemetryBackend::new(config.clone())?.start(Box::new(sensor))?;
//!
//! let mut render = RenderLoop::from_config(handle.reader(), &config.render, handle.cancel_token());
//! render.run(&mut JsonLinesSink::new(std::io::stdout().lock()))?;
//! handle.shutdown()?;
//! ```

pub mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod frontend;
pub mod snapshot;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use backend::{NotificationSource, SessionEvent, TelemetryBackend, TelemetryHandle};
pub use cancel::CancellationToken;
pub use config::AppConfig;
pub use error::{Result, TelemetryError};
pub use snapshot::{Snapshot, SnapshotReader};
pub use types::{Sample, SessionState};
pub use window::WindowBuffer;
