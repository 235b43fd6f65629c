// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-coalesced scroll sampling.
//!
//! [`ScrollMetricSampler`] listens to a [`ScrollHost`] and publishes a
//! [`DerivedMetric`] (offset plus clamped intensity) at most once per frame:
//!
//! ```text
//!   scroll notification ──► Pending::Idle?  ── no ──► coalesce (drop)
//!                                │ yes
//!                                ▼
//!                  FrameHost::request_frame ──► Pending::Scheduled(id)
//!                                                    │  next frame
//!                                                    ▼
//!   read offset ──► |offset − last| < noise? ── yes ──► discard
//!                                │ no
//!                                ▼
//!                  publish { offset, curve.intensity(offset) }
//! ```
//!
//! Each `start` creates a run record shared with the callbacks it registers.
//! `stop` marks the record dead, unsubscribes and cancels the pending frame;
//! callbacks that were already queued see the dead record and do nothing.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::config::SamplerPolicy;
use crate::host::{FrameHost, FrameRequestId, ScrollHost, ScrollSubscriptionId};
use crate::time::HostTime;
use crate::trace::{FrameSampledEvent, MetricPublishedEvent, ScrollNotifiedEvent, Tracer};

/// Published sampler state.
///
/// Both fields are always replaced together.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DerivedMetric {
    /// Offset of the last accepted sample.
    pub scroll_offset: f64,
    /// Intensity derived from `scroll_offset`.
    pub intensity: f64,
}

impl DerivedMetric {
    /// The value published on start.
    pub const ZERO: Self = Self {
        scroll_offset: 0.0,
        intensity: 0.0,
    };
}

/// One reading of the scroll offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSample {
    offset: f64,
}

impl ScrollSample {
    /// Wraps a raw offset. Negative (overscroll) and non-finite readings
    /// become zero.
    #[must_use]
    pub fn new(offset: f64) -> Self {
        let offset = if offset.is_finite() && offset > 0.0 {
            offset
        } else {
            0.0
        };
        Self { offset }
    }

    /// The sanitized offset.
    #[must_use]
    pub const fn offset(self) -> f64 {
        self.offset
    }
}

/// Counters for one sampler run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplerStats {
    /// Raw scroll notifications received.
    pub notifications: u64,
    /// Notifications folded into an already-pending frame.
    pub coalesced: u64,
    /// Frame callbacks that sampled the offset.
    pub frames: u64,
    /// Samples rejected by the noise threshold.
    pub discarded: u64,
    /// Metrics published, excluding the initial one.
    pub published: u64,
}

/// Whether a frame callback is outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pending {
    /// No frame requested; the next notification schedules one.
    Idle,
    /// A frame callback is queued with the host.
    Scheduled(FrameRequestId),
}

type MetricListener = Box<dyn FnMut(DerivedMetric)>;

struct StreamInner {
    metric: Cell<DerivedMetric>,
    revision: Cell<u64>,
    listeners: RefCell<Vec<MetricListener>>,
}

impl StreamInner {
    fn publish(&self, metric: DerivedMetric) -> u64 {
        self.metric.set(metric);
        let revision = self.revision.get() + 1;
        self.revision.set(revision);
        let mut running = core::mem::take(&mut *self.listeners.borrow_mut());
        for listener in &mut running {
            listener(metric);
        }
        let mut listeners = self.listeners.borrow_mut();
        running.append(&mut listeners);
        *listeners = running;
        revision
    }
}

/// Read handle for a sampler's published metric.
///
/// Cheap to clone; stays readable (with the last published value) after the
/// sampler stops.
#[derive(Clone)]
pub struct MetricStream {
    inner: Rc<StreamInner>,
}

impl MetricStream {
    /// The most recently published metric.
    #[must_use]
    pub fn latest(&self) -> DerivedMetric {
        self.inner.metric.get()
    }

    /// Number of publishes since start; the initial value is revision 0.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Registers `listener` to receive every subsequent publish.
    pub fn on_update(&self, listener: impl FnMut(DerivedMetric) + 'static) {
        self.inner.listeners.borrow_mut().push(Box::new(listener));
    }
}

impl fmt::Debug for MetricStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricStream")
            .field("latest", &self.latest())
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

/// State of one `start`..`stop` run, shared with host callbacks.
struct Run<S, F> {
    scroll: Weak<S>,
    frames: Weak<F>,
    policy: SamplerPolicy,
    tracer: Tracer,
    live: Cell<bool>,
    pending: Cell<Pending>,
    last_accepted: Cell<f64>,
    subscription: Cell<Option<ScrollSubscriptionId>>,
    stats: Cell<SamplerStats>,
    stream: Rc<StreamInner>,
}

impl<S: ScrollHost + 'static, F: FrameHost + 'static> Run<S, F> {
    fn bump(&self, f: impl FnOnce(&mut SamplerStats)) -> SamplerStats {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
        stats
    }

    fn on_scroll(self: &Rc<Self>) {
        if !self.live.get() {
            return;
        }
        let stats = self.bump(|s| s.notifications += 1);

        if let Pending::Scheduled(_) = self.pending.get() {
            self.bump(|s| s.coalesced += 1);
            self.tracer.scroll_notified(&ScrollNotifiedEvent {
                notification: stats.notifications,
                coalesced: true,
            });
            return;
        }
        self.tracer.scroll_notified(&ScrollNotifiedEvent {
            notification: stats.notifications,
            coalesced: false,
        });

        let Some(frames) = self.frames.upgrade() else {
            return;
        };
        let run = Rc::clone(self);
        let request = frames.request_frame(Box::new(move |time| run.on_frame(time)));
        // A refused request leaves the sampler idle; the next notification
        // tries again.
        if let Some(id) = request {
            self.pending.set(Pending::Scheduled(id));
        }
    }

    fn on_frame(&self, time: HostTime) {
        if !self.live.get() {
            return;
        }
        // Cleared before publishing so a notification raised by a listener
        // schedules a fresh frame instead of folding into this one.
        self.pending.set(Pending::Idle);
        let frame = self.bump(|s| s.frames += 1).frames;

        let Some(scroll) = self.scroll.upgrade() else {
            return;
        };
        let sample = ScrollSample::new(scroll.scroll_offset());
        let offset = sample.offset();
        let accepted = (offset - self.last_accepted.get()).abs() >= self.policy.noise_threshold();
        self.tracer.frame_sampled(&FrameSampledEvent {
            frame,
            offset,
            accepted,
            time,
        });
        if !accepted {
            self.bump(|s| s.discarded += 1);
            return;
        }

        self.last_accepted.set(offset);
        let metric = DerivedMetric {
            scroll_offset: offset,
            intensity: self.policy.curve().intensity(offset),
        };
        self.bump(|s| s.published += 1);
        let revision = self.stream.publish(metric);
        self.tracer.metric_published(&MetricPublishedEvent {
            revision,
            scroll_offset: metric.scroll_offset,
            intensity: metric.intensity,
            time,
        });
    }
}

/// Publishes a rate-limited scroll offset and derived intensity.
///
/// # Usage
///
/// ```rust,ignore
/// let mut sampler = ScrollMetricSampler::new(scroll_host, frame_host, SamplerPolicy::depth_blur());
/// let stream = sampler.start();
/// stream.on_update(|m| set_backdrop_blur(m.intensity));
/// // ...
/// sampler.stop(); // also done on drop
/// ```
pub struct ScrollMetricSampler<S: ScrollHost + 'static, F: FrameHost + 'static> {
    scroll: Rc<S>,
    frames: Rc<F>,
    policy: SamplerPolicy,
    tracer: Tracer,
    run: Option<Rc<Run<S, F>>>,
}

impl<S: ScrollHost + 'static, F: FrameHost + 'static> ScrollMetricSampler<S, F> {
    /// Creates a stopped sampler.
    #[must_use]
    pub fn new(scroll: Rc<S>, frames: Rc<F>, policy: SamplerPolicy) -> Self {
        Self {
            scroll,
            frames,
            policy,
            tracer: Tracer::none(),
            run: None,
        }
    }

    /// Sends this sampler's events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Starts listening and publishes the initial `{0, 0}` metric.
    ///
    /// If already running, returns the current stream. If the host has no
    /// scroll events the stream stays at its initial value.
    pub fn start(&mut self) -> MetricStream {
        if let Some(run) = &self.run
            && run.live.get()
        {
            return MetricStream {
                inner: Rc::clone(&run.stream),
            };
        }

        let stream = Rc::new(StreamInner {
            metric: Cell::new(DerivedMetric::ZERO),
            revision: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        });
        let run = Rc::new(Run {
            scroll: Rc::downgrade(&self.scroll),
            frames: Rc::downgrade(&self.frames),
            policy: self.policy,
            tracer: self.tracer.clone(),
            live: Cell::new(true),
            pending: Cell::new(Pending::Idle),
            last_accepted: Cell::new(0.0),
            subscription: Cell::new(None),
            stats: Cell::new(SamplerStats::default()),
            stream: Rc::clone(&stream),
        });
        self.tracer.metric_published(&MetricPublishedEvent {
            revision: 0,
            scroll_offset: 0.0,
            intensity: 0.0,
            time: HostTime(0),
        });

        let callback = {
            let run = Rc::clone(&run);
            Box::new(move || run.on_scroll())
        };
        run.subscription.set(self.scroll.subscribe(callback));
        self.run = Some(run);
        MetricStream { inner: stream }
    }

    /// Stops listening and cancels any pending frame. Idempotent.
    pub fn stop(&mut self) {
        let Some(run) = &self.run else {
            return;
        };
        if !run.live.replace(false) {
            return;
        }
        if let Some(subscription) = run.subscription.take() {
            self.scroll.unsubscribe(subscription);
        }
        if let Pending::Scheduled(id) = run.pending.replace(Pending::Idle) {
            self.frames.cancel_frame(id);
        }
    }

    /// Whether the sampler is listening.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.live.get())
    }

    /// The stream of the current (or last) run.
    #[must_use]
    pub fn stream(&self) -> Option<MetricStream> {
        self.run.as_ref().map(|run| MetricStream {
            inner: Rc::clone(&run.stream),
        })
    }

    /// Frame-request state of the current run.
    #[must_use]
    pub fn pending(&self) -> Pending {
        self.run
            .as_ref()
            .map_or(Pending::Idle, |run| run.pending.get())
    }

    /// Counters of the current (or last) run.
    #[must_use]
    pub fn stats(&self) -> SamplerStats {
        self.run
            .as_ref()
            .map_or_else(SamplerStats::default, |run| run.stats.get())
    }

    /// The tuning values in use.
    #[must_use]
    pub const fn policy(&self) -> SamplerPolicy {
        self.policy
    }
}

impl<S: ScrollHost + 'static, F: FrameHost + 'static> Drop for ScrollMetricSampler<S, F> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<S: ScrollHost + 'static, F: FrameHost + 'static> fmt::Debug for ScrollMetricSampler<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollMetricSampler")
            .field("running", &self.is_running())
            .field("pending", &self.pending())
            .field("stats", &self.stats())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
