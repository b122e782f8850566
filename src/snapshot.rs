//! Consistent, length-aligned reads of the window buffer

use crate::types::ChannelId;
use crate::window::WindowBuffer;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// One channel's values inside a [`Snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSeries {
    pub id: ChannelId,
    pub values: Vec<f64>,
}

/// Immutable copy of all channel windows taken under a single lock
///
/// Every sequence has the same length. An empty snapshot means the buffer is
/// not ready yet (no clock samples, or some channel still has none).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Seconds since session start, oldest first
    pub timestamps: Vec<f64>,
    /// Channel series in configuration order
    pub channels: Vec<ChannelSeries>,
}

/// Newest aligned point of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSample {
    pub timestamp: f64,
    pub len: usize,
    pub values: BTreeMap<ChannelId, f64>,
}

impl Snapshot {
    /// Number of aligned points
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Values for one channel
    pub fn channel(&self, id: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.values.as_slice())
    }

    /// Newest point across all channels
    pub fn latest(&self) -> Option<LatestSample> {
        let timestamp = *self.timestamps.last()?;
        let values = self
            .channels
            .iter()
            .filter_map(|c| c.values.last().map(|&v| (c.id.clone(), v)))
            .collect();
        Some(LatestSample {
            timestamp,
            len: self.len(),
            values,
        })
    }

    /// (timestamp, value) pairs for one channel, e.g. for a line plot
    pub fn plot_points(&self, id: &str) -> Option<Vec<[f64; 2]>> {
        let values = self.channel(id)?;
        Some(
            self.timestamps
                .iter()
                .zip(values)
                .map(|(&t, &v)| [t, v])
                .collect(),
        )
    }
}

/// Read handle onto a shared [`WindowBuffer`]
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    buffer: Arc<WindowBuffer>,
}

impl SnapshotReader {
    pub fn new(buffer: Arc<WindowBuffer>) -> Self {
        Self { buffer }
    }

    /// Copy the newest `n` entries of every sequence, where `n` is the
    /// shortest length among the timestamps and all channels.
    pub fn read(&self) -> Snapshot {
        self.read_with_generation().1
    }

    /// Like [`read`](Self::read), also returning the generation the copy
    /// was taken at
    pub fn read_with_generation(&self) -> (u64, Snapshot) {
        let state = self.buffer.lock();

        let n = state
            .channels
            .iter()
            .map(|c| c.values.len())
            .chain(std::iter::once(state.timestamps.len()))
            .min()
            .unwrap_or(0);

        let snapshot = Snapshot {
            timestamps: tail(&state.timestamps, n),
            channels: state
                .channels
                .iter()
                .map(|c| ChannelSeries {
                    id: c.id.clone(),
                    values: tail(&c.values, n),
                })
                .collect(),
        };
        (state.generation, snapshot)
    }

    /// Current buffer generation; changes whenever a sample lands
    pub fn generation(&self) -> u64 {
        self.buffer.generation()
    }

    /// Block until the buffer changes past `seen` or `timeout` elapses
    pub fn wait_for_change(&self, seen: u64, timeout: Duration) -> u64 {
        self.buffer.wait_for_change(seen, timeout)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

fn tail(seq: &VecDeque<f64>, n: usize) -> Vec<f64> {
    seq.iter().skip(seq.len() - n).copied().collect()
}
