//! Snapshot sinks
//!
//! A sink is whatever displays a snapshot: a plotting UI, a terminal, a
//! file. The render loop hands every fresh snapshot to one sink.

use crate::error::{Result, TelemetryError};
use crate::snapshot::Snapshot;
use crossbeam_channel::{Sender, TrySendError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Consumer of rendered snapshots
pub trait SnapshotSink {
    /// Present one non-empty snapshot. An error stops the render loop.
    fn present(&mut self, snapshot: &Snapshot) -> Result<()>;
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for Box<S> {
    fn present(&mut self, snapshot: &Snapshot) -> Result<()> {
        (**self).present(snapshot)
    }
}

#[derive(Serialize)]
struct LatestLine<'a> {
    t: f64,
    window: usize,
    values: &'a BTreeMap<String, f64>,
}

/// Writes the newest aligned sample of each snapshot as one JSON line
pub struct JsonLinesSink<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SnapshotSink for JsonLinesSink<W> {
    fn present(&mut self, snapshot: &Snapshot) -> Result<()> {
        let Some(latest) = snapshot.latest() else {
            return Ok(());
        };
        let line = LatestLine {
            t: latest.timestamp,
            window: latest.len,
            values: &latest.values,
        };
        serde_json::to_writer(&mut self.out, &line)
            .map_err(|e| TelemetryError::Serialization(e.to_string()))?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.lines += 1;
        Ok(())
    }
}

/// Forwards snapshots to another thread
///
/// Frames are skipped while the receiver is behind; a dropped receiver is
/// an error so the render loop stops.
pub struct ChannelSink {
    tx: Sender<Snapshot>,
    skipped: u64,
}

impl ChannelSink {
    pub fn new(tx: Sender<Snapshot>) -> Self {
        Self { tx, skipped: 0 }
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl SnapshotSink for ChannelSink {
    fn present(&mut self, snapshot: &Snapshot) -> Result<()> {
        match self.tx.try_send(snapshot.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.skipped += 1;
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(TelemetryError::Channel("Snapshot receiver dropped".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ChannelSeries;
    use crossbeam_channel::bounded;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            timestamps: vec![0.1, 0.2],
            channels: vec![
                ChannelSeries {
                    id: "ax".to_string(),
                    values: vec![1.0, 1.5],
                },
                ChannelSeries {
                    id: "ay".to_string(),
                    values: vec![-0.5, 0.25],
                },
            ],
        }
    }

    #[test]
    fn test_json_lines_writes_latest_sample() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.present(&sample_snapshot()).unwrap();
        assert_eq!(sink.lines_written(), 1);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["t"], 0.2);
        assert_eq!(value["window"], 2);
        assert_eq!(value["values"]["ax"], 1.5);
        assert_eq!(value["values"]["ay"], 0.25);
    }

    #[test]
    fn test_json_lines_ignores_empty_snapshot() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.present(&Snapshot::default()).unwrap();
        assert_eq!(sink.lines_written(), 0);
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_channel_sink_skips_when_full() {
        let (tx, rx) = bounded(1);
        let mut sink = ChannelSink::new(tx);
        sink.present(&sample_snapshot()).unwrap();
        sink.present(&sample_snapshot()).unwrap();
        assert_eq!(sink.skipped(), 1);
        assert_eq!(rx.try_recv().unwrap().len(), 2);
    }

    #[test]
    fn test_channel_sink_errors_when_receiver_gone() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        assert!(matches!(
            sink.present(&sample_snapshot()),
            Err(TelemetryError::Channel(_))
        ));
    }
}
