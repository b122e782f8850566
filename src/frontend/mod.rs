//! Frontend module for snapshot rendering
//!
//! The frontend never touches the radio or the writer. It polls a
//! [`SnapshotReader`](crate::snapshot::SnapshotReader) on a fixed interval
//! and hands each fresh, non-empty snapshot to a [`SnapshotSink`].
//!
//! # Main Types
//!
//! - [`RenderLoop`] - interval-driven read loop
//! - [`SnapshotSink`] - anything that displays a snapshot
//! - [`JsonLinesSink`] - newest sample as one JSON object per line
//! - [`ChannelSink`] - hands snapshots to another thread (e.g. a plotting UI)

mod render_loop;
mod sink;

pub use render_loop::RenderLoop;
pub use sink::{ChannelSink, JsonLinesSink, SnapshotSink};
