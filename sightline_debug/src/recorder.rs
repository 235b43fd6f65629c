// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Floats are stored as their IEEE 754 bit patterns, so offsets and ratios
//! read back exactly.

use sightline_core::host::WatchId;
use sightline_core::time::HostTime;
use sightline_core::trace::{
    FrameSampledEvent, IntersectionEvent, MetricPublishedEvent, ScrollNotifiedEvent, StopReason,
    TraceSink, VisibilityChangedEvent, WatchStartedEvent, WatchStoppedEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_WATCH_STARTED: u8 = 1;
const TAG_INTERSECTION: u8 = 2;
const TAG_VISIBILITY_CHANGED: u8 = 3;
const TAG_WATCH_STOPPED: u8 = 4;
const TAG_SCROLL_NOTIFIED: u8 = 5;
const TAG_FRAME_SAMPLED: u8 = 6;
const TAG_METRIC_PUBLISHED: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_reason(&mut self, r: StopReason) {
        self.write_u8(match r {
            StopReason::Triggered => 0,
            StopReason::Unbound => 1,
            StopReason::Rebound => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_watch_started(&mut self, e: &WatchStartedEvent) {
        self.write_u8(TAG_WATCH_STARTED);
        self.write_u32(e.watch.0);
        self.write_f64(e.threshold);
        self.write_bool(e.trigger_once);
    }

    fn on_intersection(&mut self, e: &IntersectionEvent) {
        self.write_u8(TAG_INTERSECTION);
        self.write_u32(e.watch.0);
        self.write_f64(e.ratio);
        self.write_bool(e.is_intersecting);
        self.write_bool(e.qualified);
        self.write_u64(e.time.ticks());
    }

    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        self.write_u8(TAG_VISIBILITY_CHANGED);
        self.write_u32(e.watch.0);
        self.write_bool(e.visible);
        self.write_u64(e.time.ticks());
    }

    fn on_watch_stopped(&mut self, e: &WatchStoppedEvent) {
        self.write_u8(TAG_WATCH_STOPPED);
        self.write_u32(e.watch.0);
        self.write_reason(e.reason);
    }

    fn on_scroll_notified(&mut self, e: &ScrollNotifiedEvent) {
        self.write_u8(TAG_SCROLL_NOTIFIED);
        self.write_u64(e.notification);
        self.write_bool(e.coalesced);
    }

    fn on_frame_sampled(&mut self, e: &FrameSampledEvent) {
        self.write_u8(TAG_FRAME_SAMPLED);
        self.write_u64(e.frame);
        self.write_f64(e.offset);
        self.write_bool(e.accepted);
        self.write_u64(e.time.ticks());
    }

    fn on_metric_published(&mut self, e: &MetricPublishedEvent) {
        self.write_u8(TAG_METRIC_PUBLISHED);
        self.write_u64(e.revision);
        self.write_f64(e.scroll_offset);
        self.write_f64(e.intensity);
        self.write_u64(e.time.ticks());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`WatchStartedEvent`].
    WatchStarted(WatchStartedEvent),
    /// An [`IntersectionEvent`].
    Intersection(IntersectionEvent),
    /// A [`VisibilityChangedEvent`].
    VisibilityChanged(VisibilityChangedEvent),
    /// A [`WatchStoppedEvent`].
    WatchStopped(WatchStoppedEvent),
    /// A [`ScrollNotifiedEvent`].
    ScrollNotified(ScrollNotifiedEvent),
    /// A [`FrameSampledEvent`].
    FrameSampled(FrameSampledEvent),
    /// A [`MetricPublishedEvent`].
    MetricPublished(MetricPublishedEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_reason(&mut self) -> Option<StopReason> {
        Some(match self.read_u8()? {
            0 => StopReason::Triggered,
            1 => StopReason::Unbound,
            _ => StopReason::Rebound,
        })
    }

    fn decode_watch_started(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WatchStarted(WatchStartedEvent {
            watch: WatchId(self.read_u32()?),
            threshold: self.read_f64()?,
            trigger_once: self.read_bool()?,
        }))
    }

    fn decode_intersection(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Intersection(IntersectionEvent {
            watch: WatchId(self.read_u32()?),
            ratio: self.read_f64()?,
            is_intersecting: self.read_bool()?,
            qualified: self.read_bool()?,
            time: HostTime(self.read_u64()?),
        }))
    }

    fn decode_visibility_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::VisibilityChanged(VisibilityChangedEvent {
            watch: WatchId(self.read_u32()?),
            visible: self.read_bool()?,
            time: HostTime(self.read_u64()?),
        }))
    }

    fn decode_watch_stopped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WatchStopped(WatchStoppedEvent {
            watch: WatchId(self.read_u32()?),
            reason: self.read_reason()?,
        }))
    }

    fn decode_scroll_notified(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ScrollNotified(ScrollNotifiedEvent {
            notification: self.read_u64()?,
            coalesced: self.read_bool()?,
        }))
    }

    fn decode_frame_sampled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSampled(FrameSampledEvent {
            frame: self.read_u64()?,
            offset: self.read_f64()?,
            accepted: self.read_bool()?,
            time: HostTime(self.read_u64()?),
        }))
    }

    fn decode_metric_published(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::MetricPublished(MetricPublishedEvent {
            revision: self.read_u64()?,
            scroll_offset: self.read_f64()?,
            intensity: self.read_f64()?,
            time: HostTime(self.read_u64()?),
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_WATCH_STARTED => self.decode_watch_started(),
            TAG_INTERSECTION => self.decode_intersection(),
            TAG_VISIBILITY_CHANGED => self.decode_visibility_changed(),
            TAG_WATCH_STOPPED => self.decode_watch_stopped(),
            TAG_SCROLL_NOTIFIED => self.decode_scroll_notified(),
            TAG_FRAME_SAMPLED => self.decode_frame_sampled(),
            TAG_METRIC_PUBLISHED => self.decode_metric_published(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
