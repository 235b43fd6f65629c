// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Watch events land on thread 1 and sampler events on thread 2. Published
//! metrics also become `"C"` counter samples, so intensity and offset show up
//! as line graphs over time.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use sightline_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

const TID_VISIBILITY: u32 = 1;
const TID_SCROLL: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Events without a timestamp of their own (watch start and stop, raw scroll
/// notifications) reuse the most recent timestamp seen before them.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last = HostTime(0);

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::WatchStarted(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "WatchStarted",
                    "cat": "Visibility",
                    "ts": us(last),
                    "pid": 0,
                    "tid": TID_VISIBILITY,
                    "s": "t",
                    "args": {
                        "watch": e.watch.0,
                        "threshold": e.threshold,
                        "trigger_once": e.trigger_once,
                    }
                }));
            }
            RecordedEvent::Intersection(e) => {
                last = e.time;
                events.push(json!({
                    "ph": "i",
                    "name": "Intersection",
                    "cat": "Visibility",
                    "ts": us(e.time),
                    "pid": 0,
                    "tid": TID_VISIBILITY,
                    "s": "t",
                    "args": {
                        "watch": e.watch.0,
                        "ratio": e.ratio,
                        "is_intersecting": e.is_intersecting,
                        "qualified": e.qualified,
                    }
                }));
            }
            RecordedEvent::VisibilityChanged(e) => {
                last = e.time;
                events.push(json!({
                    "ph": "i",
                    "name": if e.visible { "Visible" } else { "Hidden" },
                    "cat": "Visibility",
                    "ts": us(e.time),
                    "pid": 0,
                    "tid": TID_VISIBILITY,
                    "s": "p",
                    "args": {
                        "watch": e.watch.0,
                    }
                }));
            }
            RecordedEvent::WatchStopped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "WatchStopped",
                    "cat": "Visibility",
                    "ts": us(last),
                    "pid": 0,
                    "tid": TID_VISIBILITY,
                    "s": "t",
                    "args": {
                        "watch": e.watch.0,
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::ScrollNotified(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Scroll",
                    "cat": "Sampler",
                    "ts": us(last),
                    "pid": 0,
                    "tid": TID_SCROLL,
                    "s": "t",
                    "args": {
                        "notification": e.notification,
                        "coalesced": e.coalesced,
                    }
                }));
            }
            RecordedEvent::FrameSampled(e) => {
                last = e.time;
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSampled",
                    "cat": "Sampler",
                    "ts": us(e.time),
                    "pid": 0,
                    "tid": TID_SCROLL,
                    "s": "t",
                    "args": {
                        "frame": e.frame,
                        "offset": e.offset,
                        "accepted": e.accepted,
                    }
                }));
            }
            RecordedEvent::MetricPublished(e) => {
                last = last.max(e.time);
                events.push(json!({
                    "ph": "C",
                    "name": "DerivedMetric",
                    "cat": "Sampler",
                    "ts": us(e.time),
                    "pid": 0,
                    "tid": TID_SCROLL,
                    "args": {
                        "intensity": e.intensity,
                        "scroll_offset": e.scroll_offset,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn us(t: HostTime) -> u64 {
    t.ticks()
}
