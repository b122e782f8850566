//! Sample writer thread
//!
//! The writer is the only code that mutates the [`WindowBuffer`]. It drains
//! the ingestion queue fed by the session supervisor, decodes each payload
//! and appends accepted samples in arrival order. Rejected payloads are
//! counted and otherwise ignored.

use crate::backend::decoder::ChannelDecoder;
use crate::cancel::CancellationToken;
use crate::types::{ChannelId, IngestItem, WriterStats};
use crate::window::WindowBuffer;
use crossbeam_channel::{select, Receiver};
use std::sync::Arc;

/// Drains the ingestion queue into the window buffer
pub struct SampleWriter {
    buffer: Arc<WindowBuffer>,
    queue: Receiver<IngestItem>,
    clock_channel: ChannelId,
    cancel: CancellationToken,
    stats: WriterStats,
}

impl SampleWriter {
    pub fn new(
        buffer: Arc<WindowBuffer>,
        queue: Receiver<IngestItem>,
        clock_channel: impl Into<ChannelId>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            buffer,
            queue,
            clock_channel: clock_channel.into(),
            cancel,
            stats: WriterStats::default(),
        }
    }

    /// Run until the queue closes or cancellation is requested.
    /// Items already queued at cancellation are still applied.
    pub fn run(mut self) -> WriterStats {
        tracing::debug!("Sample writer started (clock channel: {})", self.clock_channel);

        let queue = self.queue.clone();
        let cancelled = self.cancel.receiver().clone();
        loop {
            select! {
                recv(queue) -> item => match item {
                    Ok(item) => self.apply(item),
                    Err(_) => break,
                },
                recv(cancelled) -> _ => {
                    let pending: Vec<_> = queue.try_iter().collect();
                    for item in pending {
                        self.apply(item);
                    }
                    break;
                }
            }
        }

        tracing::debug!("Sample writer stopped: {}", self.stats);
        self.stats
    }

    /// Decode one queued notification and append it
    pub fn apply(&mut self, item: IngestItem) {
        let sample = match ChannelDecoder::decode(&item.channel, &item.payload) {
            Ok(sample) => sample,
            Err(reason) => {
                self.stats.rejected += 1;
                tracing::trace!("Dropped payload for '{}': {}", item.channel, reason);
                return;
            }
        };

        let is_clock = sample.channel == self.clock_channel;
        match self
            .buffer
            .append_at(&sample.channel, sample.value, is_clock, item.received_at)
        {
            Ok(()) => self.stats.accepted += 1,
            Err(e) => {
                self.stats.unknown_channel += 1;
                tracing::warn!("Sample not stored: {}", e);
            }
        }
    }

    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }
}
