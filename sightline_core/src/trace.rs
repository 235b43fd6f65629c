// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for observation and sampling.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! components call as they observe, sample and publish. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] is a cloneable handle to an optional shared sink. Components
//! keep one and hand clones to the callbacks they register with the host.
//! When the `trace` feature is **off**, every `Tracer` method compiles to
//! nothing (zero overhead). When **on**, each method performs a single
//! `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::host::WatchId;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why an intersection watch ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// A one-shot watch saw its first qualifying entry.
    Triggered,
    /// The owner called `unbind` or dropped the trigger.
    Unbound,
    /// The owner bound again, replacing the watch.
    Rebound,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a visibility watch is registered with the host.
#[derive(Clone, Copy, Debug)]
pub struct WatchStartedEvent {
    /// Host id of the watch.
    pub watch: WatchId,
    /// Effective (clamped) threshold.
    pub threshold: f64,
    /// Whether the watch stops after the first qualifying entry.
    pub trigger_once: bool,
}

/// Emitted for the entry a watch acts on (the newest of each batch).
#[derive(Clone, Copy, Debug)]
pub struct IntersectionEvent {
    /// Host id of the watch.
    pub watch: WatchId,
    /// Visible fraction reported by the host.
    pub ratio: f64,
    /// Whether the host reported the element as intersecting.
    pub is_intersecting: bool,
    /// Whether the entry met the threshold.
    pub qualified: bool,
    /// Host time of the entry.
    pub time: HostTime,
}

/// Emitted when a visibility flag flips.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityChangedEvent {
    /// Host id of the watch.
    pub watch: WatchId,
    /// The new value.
    pub visible: bool,
    /// Host time of the entry that caused the change.
    pub time: HostTime,
}

/// Emitted when a watch is released.
#[derive(Clone, Copy, Debug)]
pub struct WatchStoppedEvent {
    /// Host id of the watch.
    pub watch: WatchId,
    /// Why it ended.
    pub reason: StopReason,
}

/// Emitted for every raw scroll notification.
#[derive(Clone, Copy, Debug)]
pub struct ScrollNotifiedEvent {
    /// Running count of notifications since the sampler started.
    pub notification: u64,
    /// `true` if a frame was already pending and this one was folded into it.
    pub coalesced: bool,
}

/// Emitted when a scheduled frame callback reads the scroll offset.
#[derive(Clone, Copy, Debug)]
pub struct FrameSampledEvent {
    /// Running count of sampling frames since the sampler started.
    pub frame: u64,
    /// Offset read from the host.
    pub offset: f64,
    /// Whether the sample cleared the noise threshold.
    pub accepted: bool,
    /// Frame timestamp.
    pub time: HostTime,
}

/// Emitted when a new metric is published.
#[derive(Clone, Copy, Debug)]
pub struct MetricPublishedEvent {
    /// Publish counter (0 is the initial value published on start).
    pub revision: u64,
    /// Published offset.
    pub scroll_offset: f64,
    /// Published intensity.
    pub intensity: f64,
    /// Frame timestamp, or zero for the initial publish.
    pub time: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the components.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a watch is registered.
    fn on_watch_started(&mut self, e: &WatchStartedEvent) {
        _ = e;
    }

    /// Called for the entry a watch acts on.
    fn on_intersection(&mut self, e: &IntersectionEvent) {
        _ = e;
    }

    /// Called when a visibility flag flips.
    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        _ = e;
    }

    /// Called when a watch is released.
    fn on_watch_stopped(&mut self, e: &WatchStoppedEvent) {
        _ = e;
    }

    /// Called for every raw scroll notification.
    fn on_scroll_notified(&mut self, e: &ScrollNotifiedEvent) {
        _ = e;
    }

    /// Called when a frame callback samples the offset.
    fn on_frame_sampled(&mut self, e: &FrameSampledEvent) {
        _ = e;
    }

    /// Called when a metric is published.
    fn on_metric_published(&mut self, e: &MetricPublishedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer handle
// ---------------------------------------------------------------------------

/// A sink shared between a component and its host callbacks.
pub type SharedSink = Rc<RefCell<dyn TraceSink>>;

/// Cloneable handle to an optional [`SharedSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching. A sink that is already borrowed (an event emitted from inside
/// another sink call) drops the nested event.
#[derive(Clone, Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<SharedSink>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: SharedSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[cfg(feature = "trace")]
    #[inline]
    fn emit(&self, f: impl FnOnce(&mut dyn TraceSink)) {
        if let Some(sink) = &self.sink
            && let Ok(mut sink) = sink.try_borrow_mut()
        {
            f(&mut *sink);
        }
    }

    /// Emits a [`WatchStartedEvent`].
    #[inline]
    pub fn watch_started(&self, e: &WatchStartedEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_watch_started(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`IntersectionEvent`].
    #[inline]
    pub fn intersection(&self, e: &IntersectionEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_intersection(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VisibilityChangedEvent`].
    #[inline]
    pub fn visibility_changed(&self, e: &VisibilityChangedEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_visibility_changed(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`WatchStoppedEvent`].
    #[inline]
    pub fn watch_stopped(&self, e: &WatchStoppedEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_watch_stopped(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ScrollNotifiedEvent`].
    #[inline]
    pub fn scroll_notified(&self, e: &ScrollNotifiedEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_scroll_notified(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSampledEvent`].
    #[inline]
    pub fn frame_sampled(&self, e: &FrameSampledEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_frame_sampled(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`MetricPublishedEvent`].
    #[inline]
    pub fn metric_published(&self, e: &MetricPublishedEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_metric_published(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}
