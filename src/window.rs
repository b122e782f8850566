//! Bounded multi-channel sliding window
//!
//! [`WindowBuffer`] is the only shared mutable state in the crate. The sample
//! writer appends to it; any number of [`SnapshotReader`]s copy aligned views
//! out of it. Every access goes through one `Mutex`, so a reader never sees a
//! channel mid-mutation.
//!
//! # Time axis
//!
//! Only the clock channel records timestamps (seconds since the buffer's
//! epoch). Other channels are paired with those timestamps by position: the
//! i-th newest value of every channel is assumed to belong to the i-th newest
//! timestamp. If channels arrive at persistently different rates this pairing
//! drifts, and nothing here detects it.
//!
//! [`SnapshotReader`]: crate::snapshot::SnapshotReader

use crate::config::AppConfig;
use crate::error::{Result, TelemetryError};
use crate::types::ChannelId;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Per-channel sample history
#[derive(Debug)]
pub(crate) struct ChannelWindow {
    pub(crate) id: ChannelId,
    pub(crate) values: VecDeque<f64>,
}

/// Everything guarded by the buffer lock
#[derive(Debug)]
pub(crate) struct WindowState {
    pub(crate) timestamps: VecDeque<f64>,
    pub(crate) channels: Vec<ChannelWindow>,
    /// Bumped on every successful append or clear
    pub(crate) generation: u64,
}

/// Thread-safe bounded window of samples for a fixed set of channels
#[derive(Debug)]
pub struct WindowBuffer {
    capacity: usize,
    epoch: Instant,
    state: Mutex<WindowState>,
    changed: Condvar,
}

impl WindowBuffer {
    /// Create a buffer holding `capacity` samples for each channel
    pub fn new<I, S>(channels: I, capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<ChannelId>,
    {
        if capacity == 0 {
            return Err(TelemetryError::Config(
                "Window capacity must be at least 1".to_string(),
            ));
        }

        let mut windows: Vec<ChannelWindow> = Vec::new();
        for id in channels {
            let id = id.into();
            if windows.iter().any(|w| w.id == id) {
                return Err(TelemetryError::Config(format!("Duplicate channel '{}'", id)));
            }
            windows.push(ChannelWindow {
                id,
                values: VecDeque::with_capacity(capacity + 1),
            });
        }
        if windows.is_empty() {
            return Err(TelemetryError::Config(
                "Window buffer needs at least one channel".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            epoch: Instant::now(),
            state: Mutex::new(WindowState {
                timestamps: VecDeque::with_capacity(capacity + 1),
                channels: windows,
                generation: 0,
            }),
            changed: Condvar::new(),
        })
    }

    /// Create a buffer for the channels and window size in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.channel_ids(), config.buffer.window_size)
    }

    /// Maximum samples kept per channel
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instant that timestamp 0.0 refers to
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Channel ids in construction order
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.lock().channels.iter().map(|c| c.id.clone()).collect()
    }

    /// Append a value received now
    pub fn append(&self, channel: &str, value: f64, is_clock_channel: bool) -> Result<()> {
        self.append_at(channel, value, is_clock_channel, Instant::now())
    }

    /// Append a value received at `received_at`
    ///
    /// For the clock channel this also records `received_at` on the time
    /// axis, clamped so the sequence never goes backwards.
    pub fn append_at(
        &self,
        channel: &str,
        value: f64,
        is_clock_channel: bool,
        received_at: Instant,
    ) -> Result<()> {
        {
            let mut state = self.lock();
            let window = state
                .channels
                .iter_mut()
                .find(|c| c.id == channel)
                .ok_or_else(|| TelemetryError::UnknownChannel(channel.to_string()))?;

            push_bounded(&mut window.values, value, self.capacity);

            if is_clock_channel {
                let relative = received_at.saturating_duration_since(self.epoch).as_secs_f64();
                let timestamp = state
                    .timestamps
                    .back()
                    .map_or(relative, |&last| relative.max(last));
                push_bounded(&mut state.timestamps, timestamp, self.capacity);
            }

            state.generation = state.generation.wrapping_add(1);
        }
        self.changed.notify_all();
        Ok(())
    }

    /// Drop every sample and timestamp
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            state.timestamps.clear();
            for window in &mut state.channels {
                window.values.clear();
            }
            state.generation = state.generation.wrapping_add(1);
        }
        self.changed.notify_all();
    }

    /// Number of samples currently held for `channel`
    pub fn len(&self, channel: &str) -> Option<usize> {
        self.lock()
            .channels
            .iter()
            .find(|c| c.id == channel)
            .map(|c| c.values.len())
    }

    /// Number of timestamps currently held
    pub fn timestamp_len(&self) -> usize {
        self.lock().timestamps.len()
    }

    /// Copy of the full (unaligned) history for `channel`, oldest first
    pub fn values(&self, channel: &str) -> Option<Vec<f64>> {
        self.lock()
            .channels
            .iter()
            .find(|c| c.id == channel)
            .map(|c| c.values.iter().copied().collect())
    }

    /// Copy of the full timestamp sequence, oldest first
    pub fn timestamps(&self) -> Vec<f64> {
        self.lock().timestamps.iter().copied().collect()
    }

    /// Current mutation counter
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Block until the generation differs from `seen` or `timeout` elapses.
    /// Returns the generation observed on wake-up.
    pub fn wait_for_change(&self, seen: u64, timeout: Duration) -> u64 {
        let guard = self.lock();
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |state| state.generation == seen)
            .unwrap_or_else(PoisonError::into_inner);
        guard.generation
    }

    /// Lock the shared state. A panic in another holder cannot leave the
    /// deques half-updated, so a poisoned lock is still usable.
    pub(crate) fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[inline]
fn push_bounded(seq: &mut VecDeque<f64>, value: f64, capacity: usize) {
    seq.push_back(value);
    while seq.len() > capacity {
        seq.pop_front();
    }
}
