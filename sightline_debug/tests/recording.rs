// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records real component activity and checks what the sinks see.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Rect;
use serde_json::Value;
use sightline_core::config::{ObserveConfig, SamplerPolicy};
use sightline_core::scroll::ScrollMetricSampler;
use sightline_core::time::HostTime;
use sightline_core::trace::{StopReason, Tracer};
use sightline_core::visibility::VisibilityTrigger;
use sightline_debug::chrome::export;
use sightline_debug::pretty::PrettyPrintSink;
use sightline_debug::recorder::{RecordedEvent, RecorderSink, decode};
use sightline_harness::{ManualFrames, ManualScroll, SimulatedViewport};

#[test]
fn sampler_run_is_recorded_in_order() {
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let scroll = Rc::new(ManualScroll::new());
    let frames = Rc::new(ManualFrames::new());
    let mut sampler = ScrollMetricSampler::new(
        Rc::clone(&scroll),
        Rc::clone(&frames),
        SamplerPolicy::depth_blur(),
    )
    .with_tracer(Tracer::new(recorder.clone()));

    sampler.start();
    scroll.scroll_to(2.0);
    scroll.scroll_to(210.0);
    frames.tick(HostTime(16_667));
    scroll.scroll_to(212.0);
    frames.tick(HostTime(33_333));
    sampler.stop();

    let events: Vec<_> = decode(recorder.borrow().as_bytes()).collect();
    let names: Vec<&str> = events
        .iter()
        .map(|e| match e {
            RecordedEvent::ScrollNotified(e) if e.coalesced => "coalesced",
            RecordedEvent::ScrollNotified(_) => "scroll",
            RecordedEvent::FrameSampled(e) if e.accepted => "accepted",
            RecordedEvent::FrameSampled(_) => "noise",
            RecordedEvent::MetricPublished(_) => "metric",
            _ => "other",
        })
        .collect();
    assert_eq!(
        names,
        [
            "metric", "scroll", "coalesced", "accepted", "metric", "scroll", "noise"
        ]
    );

    match events[4] {
        RecordedEvent::MetricPublished(e) => {
            assert_eq!(e.revision, 1);
            assert_eq!(e.scroll_offset, 210.0);
            assert_eq!(e.intensity, 3.0);
            assert_eq!(e.time, HostTime(16_667));
        }
        other => panic!("expected MetricPublished, got {other:?}"),
    }
}

#[test]
fn one_shot_watch_is_recorded_and_exported() {
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let viewport = Rc::new(SimulatedViewport::new(800.0, 600.0));
    let card = viewport.add_element(Rect::new(0.0, 1000.0, 100.0, 1100.0));
    let mut trigger =
        VisibilityTrigger::new(Rc::clone(&viewport)).with_tracer(Tracer::new(recorder.clone()));

    trigger.bind(Some(&card), ObserveConfig::entrance());
    viewport.flush(HostTime(1_000));
    viewport.scroll_to(700.0);
    viewport.flush(HostTime(2_000));
    trigger.unbind();

    let events: Vec<_> = decode(recorder.borrow().as_bytes()).collect();
    assert!(matches!(events[0], RecordedEvent::WatchStarted(_)));
    let stops: Vec<StopReason> = events
        .iter()
        .filter_map(|e| match e {
            RecordedEvent::WatchStopped(e) => Some(e.reason),
            _ => None,
        })
        .collect();
    // The one-shot release is the only stop; the later unbind has nothing
    // left to release.
    assert_eq!(stops, [StopReason::Triggered]);
    let visible: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            RecordedEvent::VisibilityChanged(e) => Some(e.visible),
            _ => None,
        })
        .collect();
    assert_eq!(visible, [true]);

    let mut out = Vec::new();
    export(recorder.borrow().as_bytes(), &mut out).unwrap();
    let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed.len(), events.len());
    assert!(parsed.iter().any(|e| e["name"] == "Visible" && e["ts"] == 2_000));
}

#[test]
fn pretty_sink_prints_live_events() {
    let sink = Rc::new(RefCell::new(PrettyPrintSink::with_writer(Vec::<u8>::new())));
    let scroll = Rc::new(ManualScroll::new());
    let frames = Rc::new(ManualFrames::new());
    let mut sampler = ScrollMetricSampler::new(
        Rc::clone(&scroll),
        Rc::clone(&frames),
        SamplerPolicy::depth_blur(),
    )
    .with_tracer(Tracer::new(sink.clone()));

    sampler.start();
    scroll.scroll_to(100.0);
    frames.tick(HostTime(16_000));
    drop(sampler);

    let sink = Rc::try_unwrap(sink).ok().unwrap().into_inner();
    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert!(output.contains("[metric] rev=0"), "got: {output}");
    assert!(output.contains("[sample] frame=1 offset=100.0 accepted"), "got: {output}");
    assert!(output.contains("[metric] rev=1 offset=100.0 intensity=1.500"), "got: {output}");
}
