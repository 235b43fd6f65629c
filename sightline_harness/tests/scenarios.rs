// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios driving the core components through the harness
//! hosts.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Rect;
use sightline_core::config::{IntensityCurve, ObserveConfig, RootMargin, SamplerPolicy};
use sightline_core::scroll::{DerivedMetric, Pending, ScrollMetricSampler};
use sightline_core::time::{Duration, HostTime};
use sightline_core::visibility::{VisibilityState, VisibilityTrigger, WatchState};
use sightline_harness::{ManualFrames, ManualScroll, SimulatedViewport};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;

/// Element 100px tall sitting at y = 1000 on the page.
const CARD: Rect = Rect::new(0.0, 1000.0, 100.0, 1100.0);

fn record_changes(state: &VisibilityState) -> Rc<RefCell<Vec<bool>>> {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    state.on_change(move |visible| sink.borrow_mut().push(visible));
    changes
}

/// Scrolls through `offsets`, flushing the viewport after each step.
fn sweep(viewport: &SimulatedViewport, clock: &mut HostTime, offsets: impl IntoIterator<Item = f64>) {
    for offset in offsets {
        viewport.scroll_to(offset);
        *clock = *clock + Duration::FRAME_60HZ;
        viewport.flush(*clock);
    }
}

fn down_up_down() -> impl Iterator<Item = f64> {
    let down = (0..=120).map(|i| f64::from(i) * 10.0);
    let up = (0..=120).rev().map(|i| f64::from(i) * 10.0);
    down.clone().chain(up).chain(down)
}

#[test]
fn one_shot_fires_exactly_once_for_every_threshold() {
    for threshold in [0.0, 0.1, 0.25, 0.5, 0.75, 1.0] {
        let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
        let card = viewport.add_element(CARD);
        let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));
        let state = trigger.bind(
            Some(&card),
            ObserveConfig::entrance()
                .with_threshold(threshold)
                .with_margin(RootMargin::ZERO),
        );
        let changes = record_changes(&state);
        let mut clock = HostTime(0);
        sweep(&viewport, &mut clock, down_up_down());

        assert_eq!(*changes.borrow(), [true], "threshold {threshold}");
        assert!(trigger.is_visible());
        assert_eq!(trigger.state(), WatchState::Triggered);
        assert_eq!(viewport.watch_count(), 0, "threshold {threshold}");
    }
}

#[test]
fn continuous_mode_follows_the_latest_entry() {
    let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
    let card = viewport.add_element(CARD);
    let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));
    let state = trigger.bind(
        Some(&card),
        ObserveConfig::entrance()
            .with_threshold(0.5)
            .with_trigger_once(false),
    );
    let changes = record_changes(&state);
    let mut clock = HostTime(0);

    sweep(&viewport, &mut clock, [0.0]);
    assert!(!trigger.is_visible());

    // 1000..1100 against a root of 700..1290: fully inside.
    sweep(&viewport, &mut clock, [700.0]);
    assert!(trigger.is_visible());

    // Back to the top: out again.
    sweep(&viewport, &mut clock, [0.0]);
    assert!(!trigger.is_visible());

    sweep(&viewport, &mut clock, [700.0]);
    assert!(trigger.is_visible());

    assert_eq!(*changes.borrow(), [true, false, true]);
    assert!(matches!(trigger.state(), WatchState::Watching(_)));
    assert_eq!(viewport.watch_count(), 1);
}

#[test]
fn partially_visible_below_threshold_does_not_count() {
    let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
    let card = viewport.add_element(CARD);
    let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));
    let state = trigger.bind(
        Some(&card),
        ObserveConfig::entrance()
            .with_threshold(0.5)
            .with_margin(RootMargin::ZERO),
    );

    // Root 420..1020 shows 20px of the card.
    viewport.scroll_to(420.0);
    viewport.flush(HostTime(1));
    assert!(!state.is_visible());

    // Root 460..1060 shows 60px.
    viewport.scroll_to(460.0);
    viewport.flush(HostTime(2));
    assert!(state.is_visible());
}

#[test]
fn teardown_is_idempotent() {
    let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
    let card = viewport.add_element(CARD);

    // Unbind twice while watching.
    let mut watching = VisibilityTrigger::new(Rc::clone(&viewport));
    watching.bind(Some(&card), ObserveConfig::entrance());
    assert_eq!(viewport.watch_count(), 1);
    watching.unbind();
    watching.unbind();
    assert_eq!(watching.state(), WatchState::Stopped);
    assert_eq!(viewport.watch_count(), 0);

    // Unbind after the one-shot watch released itself.
    let mut fired = VisibilityTrigger::new(Rc::clone(&viewport));
    fired.bind(Some(&card), ObserveConfig::entrance());
    viewport.scroll_to(700.0);
    viewport.flush(HostTime(1));
    assert_eq!(fired.state(), WatchState::Triggered);
    fired.unbind();
    fired.unbind();
    assert!(fired.is_visible(), "teardown keeps the flag");
    assert_eq!(viewport.watch_count(), 0);
}

#[test]
fn dropping_the_trigger_releases_the_watch() {
    let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
    let card = viewport.add_element(CARD);
    let state = {
        let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));
        trigger.bind(Some(&card), ObserveConfig::entrance())
    };
    assert_eq!(viewport.watch_count(), 0);

    viewport.scroll_to(700.0);
    viewport.flush(HostTime(1));
    assert!(!state.is_visible());
}

#[test]
fn null_element_never_becomes_visible() {
    let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
    viewport.add_element(CARD);
    let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));

    let state = trigger.bind(None, ObserveConfig::entrance());
    assert_eq!(trigger.state(), WatchState::Inert);
    assert_eq!(viewport.watch_count(), 0);

    let mut clock = HostTime(0);
    sweep(&viewport, &mut clock, down_up_down());
    assert!(!state.is_visible());

    trigger.unbind();
    trigger.unbind();
}

#[test]
fn rebinding_to_no_element_after_firing_reads_false() {
    let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
    let card = viewport.add_element(CARD);
    let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));

    trigger.bind(Some(&card), ObserveConfig::entrance());
    viewport.scroll_to(700.0);
    viewport.flush(HostTime(1));
    assert!(trigger.is_visible());

    let state = trigger.bind(None, ObserveConfig::entrance());
    assert!(!state.is_visible());
    let mut clock = HostTime(1);
    sweep(&viewport, &mut clock, down_up_down());
    assert!(!state.is_visible());
    assert!(!trigger.is_visible());
}

#[test]
fn rebinding_to_an_offscreen_element_starts_hidden() {
    let viewport = Rc::new(SimulatedViewport::new(WIDTH, HEIGHT));
    let card = viewport.add_element(CARD);
    let far = viewport.add_element(Rect::new(0.0, 5000.0, 100.0, 5100.0));
    let continuous = ObserveConfig::entrance().with_trigger_once(false);
    let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));

    trigger.bind(Some(&card), continuous);
    viewport.scroll_to(700.0);
    viewport.flush(HostTime(1));
    assert!(trigger.is_visible());

    let state = trigger.bind(Some(&far), continuous);
    let changes = record_changes(&state);
    assert!(!state.is_visible(), "before the first entry");
    viewport.flush(HostTime(2));
    assert!(!state.is_visible());
    assert!(changes.borrow().is_empty());
}

#[test]
fn missing_intersection_capability_is_inert() {
    let viewport = Rc::new(SimulatedViewport::refusing(WIDTH, HEIGHT));
    let card = viewport.add_element(CARD);
    let mut trigger = VisibilityTrigger::new(Rc::clone(&viewport));

    let state = trigger.bind(Some(&card), ObserveConfig::entrance());
    assert_eq!(trigger.state(), WatchState::Inert);
    viewport.scroll_to(700.0);
    viewport.flush(HostTime(1));
    assert!(!state.is_visible());
}

// ---------------------------------------------------------------------------
// Scroll sampling
// ---------------------------------------------------------------------------

struct Page {
    scroll: Rc<ManualScroll>,
    frames: Rc<ManualFrames>,
    sampler: ScrollMetricSampler<ManualScroll, ManualFrames>,
    published: Rc<RefCell<Vec<DerivedMetric>>>,
    clock: HostTime,
}

impl Page {
    fn start(policy: SamplerPolicy) -> Self {
        let scroll = Rc::new(ManualScroll::new());
        let frames = Rc::new(ManualFrames::new());
        let mut sampler = ScrollMetricSampler::new(Rc::clone(&scroll), Rc::clone(&frames), policy);
        let stream = sampler.start();
        let published = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&published);
        stream.on_update(move |m| sink.borrow_mut().push(m));
        Self {
            scroll,
            frames,
            sampler,
            published,
            clock: HostTime(0),
        }
    }

    fn frame(&mut self) {
        self.clock = self.clock + Duration::FRAME_60HZ;
        self.frames.tick(self.clock);
    }

    /// One scroll notification per offset, each followed by a frame.
    fn scroll_each(&mut self, offsets: &[f64]) {
        for &offset in offsets {
            self.scroll.scroll_to(offset);
            self.frame();
        }
    }
}

#[test]
fn burst_within_one_frame_publishes_the_final_offset() {
    let mut page = Page::start(SamplerPolicy::depth_blur());
    for offset in [0.0, 2.0, 3.0, 10.0, 210.0] {
        page.scroll.scroll_to(offset);
    }
    assert_eq!(page.frames.queued(), 1, "one frame for the whole burst");
    page.frame();

    assert_eq!(
        *page.published.borrow(),
        [DerivedMetric {
            scroll_offset: 210.0,
            intensity: 3.0,
        }]
    );
    let stats = page.sampler.stats();
    assert_eq!(stats.notifications, 5);
    assert_eq!(stats.coalesced, 4);
    assert_eq!(stats.frames, 1);
}

#[test]
fn intensity_is_monotonic_and_clamped() {
    let mut page = Page::start(SamplerPolicy::depth_blur());
    page.scroll_each(&[
        0.0, 3.0, 7.0, 12.0, 50.0, 51.0, 120.0, 199.0, 200.0, 204.0, 250.0, 1000.0, 5000.0,
    ]);

    let published = page.published.borrow();
    assert!(published.len() >= 8, "published {}", published.len());
    for pair in published.windows(2) {
        assert!(pair[0].scroll_offset <= pair[1].scroll_offset);
        assert!(pair[0].intensity <= pair[1].intensity, "{pair:?}");
    }
    for metric in published.iter() {
        assert!((0.0..=3.0).contains(&metric.intensity));
        if metric.scroll_offset >= 200.0 {
            assert_eq!(metric.intensity, 3.0);
        }
    }
}

#[test]
fn small_deltas_never_publish() {
    let mut page = Page::start(SamplerPolicy::depth_blur());
    page.scroll_each(&[100.0]);
    assert_eq!(page.published.borrow().len(), 1);

    page.scroll_each(&[104.9, 96.0, 101.0, 95.5, 100.0, 104.0]);
    assert_eq!(page.published.borrow().len(), 1);
    assert_eq!(page.sampler.stats().discarded, 6);

    // The reference stays at the last accepted sample, not the last read.
    page.scroll_each(&[105.0]);
    assert_eq!(page.published.borrow().len(), 2);
}

#[test]
fn stop_cancels_pending_frame_and_unsubscribes() {
    let mut page = Page::start(SamplerPolicy::depth_blur());
    page.scroll.scroll_to(80.0);
    assert!(matches!(page.sampler.pending(), Pending::Scheduled(_)));

    page.sampler.stop();
    page.sampler.stop();
    assert_eq!(page.frames.queued(), 0);
    assert_eq!(page.frames.cancels(), 1);
    assert_eq!(page.scroll.subscriber_count(), 0);

    page.scroll.scroll_to(300.0);
    page.frame();
    assert!(page.published.borrow().is_empty());
    assert_eq!(page.sampler.stream().map(|s| s.latest()), Some(DerivedMetric::ZERO));
}

#[test]
fn restart_begins_a_fresh_run() {
    let mut page = Page::start(SamplerPolicy::depth_blur());
    page.scroll_each(&[150.0]);
    page.sampler.stop();

    page.scroll.set_offset(152.0);
    let stream = page.sampler.start();
    assert_eq!(stream.latest(), DerivedMetric::ZERO);
    assert_eq!(stream.revision(), 0);

    // Measured from zero again, so a 2px move from the old run still counts.
    page.scroll.notify();
    page.frame();
    assert_eq!(stream.latest().scroll_offset, 152.0);
    assert_eq!(stream.revision(), 1);
}

#[test]
fn missing_frame_capability_keeps_initial_metric() {
    let scroll = Rc::new(ManualScroll::new());
    let frames = Rc::new(ManualFrames::refusing());
    let mut sampler = ScrollMetricSampler::new(
        Rc::clone(&scroll),
        Rc::clone(&frames),
        SamplerPolicy::depth_blur(),
    );
    let stream = sampler.start();
    scroll.scroll_to(500.0);
    frames.tick(HostTime(16_667));

    assert_eq!(stream.latest(), DerivedMetric::ZERO);
    assert_eq!(sampler.pending(), Pending::Idle);
    assert_eq!(sampler.stats().notifications, 1);
}

#[test]
fn tuned_policy_changes_gate_and_curve() {
    let curve = IntensityCurve::new(1000.0, 1.0).unwrap();
    let policy = SamplerPolicy::new(20.0, curve).unwrap();
    let mut page = Page::start(policy);

    page.scroll_each(&[15.0, 500.0, 510.0, 2000.0]);
    assert_eq!(
        *page.published.borrow(),
        [
            DerivedMetric {
                scroll_offset: 500.0,
                intensity: 0.5,
            },
            DerivedMetric {
                scroll_offset: 2000.0,
                intensity: 1.0,
            },
        ]
    );
}
