//! Periodic snapshot rendering

use super::sink::SnapshotSink;
use crate::cancel::CancellationToken;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::snapshot::SnapshotReader;
use crossbeam_channel::{select, tick};
use std::time::Duration;

/// Reads a snapshot every interval and hands it to a sink
///
/// Empty snapshots are not presented, and neither is a snapshot whose
/// buffer generation has not moved since the last frame.
pub struct RenderLoop {
    reader: SnapshotReader,
    interval: Duration,
    cancel: CancellationToken,
    last_generation: Option<u64>,
    frames: u64,
}

impl RenderLoop {
    pub fn new(reader: SnapshotReader, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            reader,
            interval: interval.max(Duration::from_millis(1)),
            cancel,
            last_generation: None,
            frames: 0,
        }
    }

    pub fn from_config(reader: SnapshotReader, config: &RenderConfig, cancel: CancellationToken) -> Self {
        Self::new(reader, config.interval(), cancel)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render one frame if there is something new. Returns whether the sink
    /// was called.
    pub fn tick(&mut self, sink: &mut dyn SnapshotSink) -> Result<bool> {
        let (generation, snapshot) = self.reader.read_with_generation();
        if self.last_generation == Some(generation) {
            return Ok(false);
        }
        self.last_generation = Some(generation);

        if snapshot.is_empty() {
            return Ok(false);
        }

        sink.present(&snapshot)?;
        self.frames += 1;
        Ok(true)
    }

    /// Tick every interval until cancelled or the sink fails.
    /// Returns the number of frames presented.
    pub fn run(&mut self, sink: &mut dyn SnapshotSink) -> Result<u64> {
        tracing::debug!("Render loop started ({:?} interval)", self.interval);

        let ticker = tick(self.interval);
        let cancelled = self.cancel.receiver().clone();
        while !self.cancel.is_cancelled() {
            select! {
                recv(ticker) -> _ => {
                    if let Err(e) = self.tick(sink) {
                        tracing::error!("Render sink failed: {}", e);
                        return Err(e);
                    }
                }
                recv(cancelled) -> _ => break,
            }
        }

        tracing::debug!("Render loop stopped after {} frames", self.frames);
        Ok(self.frames)
    }
}
