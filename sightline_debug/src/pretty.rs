// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in milliseconds.

use std::io::Write;

use sightline_core::time::HostTime;
use sightline_core::trace::{
    FrameSampledEvent, IntersectionEvent, MetricPublishedEvent, ScrollNotifiedEvent, StopReason,
    TraceSink, VisibilityChangedEvent, WatchStartedEvent, WatchStoppedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.as_millis_f64()
}

fn reason_name(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Triggered => "triggered",
        StopReason::Unbound => "unbound",
        StopReason::Rebound => "rebound",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_watch_started(&mut self, e: &WatchStartedEvent) {
        let mode = if e.trigger_once { "once" } else { "continuous" };
        let _ = writeln!(
            self.writer,
            "[watch:start] watch={} threshold={:.2} mode={mode}",
            e.watch.0, e.threshold,
        );
    }

    fn on_intersection(&mut self, e: &IntersectionEvent) {
        let verdict = if e.qualified { "qualifies" } else { "below" };
        let _ = writeln!(
            self.writer,
            "[intersect] watch={} ratio={:.3} intersecting={} {verdict} at {:.3}ms",
            e.watch.0,
            e.ratio,
            e.is_intersecting,
            ms(e.time),
        );
    }

    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        let _ = writeln!(
            self.writer,
            "[visible] watch={} visible={} at {:.3}ms",
            e.watch.0,
            e.visible,
            ms(e.time),
        );
    }

    fn on_watch_stopped(&mut self, e: &WatchStoppedEvent) {
        let _ = writeln!(
            self.writer,
            "[watch:stop] watch={} reason={}",
            e.watch.0,
            reason_name(e.reason),
        );
    }

    fn on_scroll_notified(&mut self, e: &ScrollNotifiedEvent) {
        let _ = writeln!(
            self.writer,
            "[scroll] n={}{}",
            e.notification,
            if e.coalesced { " coalesced" } else { "" },
        );
    }

    fn on_frame_sampled(&mut self, e: &FrameSampledEvent) {
        let verdict = if e.accepted { "accepted" } else { "noise" };
        let _ = writeln!(
            self.writer,
            "[sample] frame={} offset={:.1} {verdict} at {:.3}ms",
            e.frame,
            e.offset,
            ms(e.time),
        );
    }

    fn on_metric_published(&mut self, e: &MetricPublishedEvent) {
        let _ = writeln!(
            self.writer,
            "[metric] rev={} offset={:.1} intensity={:.3} at {:.3}ms",
            e.revision,
            e.scroll_offset,
            e.intensity,
            ms(e.time),
        );
    }
}
