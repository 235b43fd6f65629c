// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot (or continuous) viewport-entry detection.
//!
//! A [`VisibilityTrigger`] binds to one element through an
//! [`IntersectionHost`] and flips a visible flag when the element's visible
//! fraction reaches the configured threshold. In one-shot mode (the default)
//! the watch is released on that first qualifying entry and the flag never
//! goes back to `false`.
//!
//! # State machine
//!
//! ```text
//!               bind(Some(el))               qualifying entry (one-shot)
//!   Unbound ──────────────────► Watching ───────────────────────────► Triggered
//!      │                           │                                      │
//!      │ bind(None) / no host      │ unbind / drop                        │ unbind / drop
//!      ▼                           ▼                                      ▼
//!    Inert ─────── unbind ─────► Stopped ◄────────────────────────────────┘
//! ```
//!
//! Only `Watching` owns a host subscription, so releasing it is a single
//! match arm and every other state makes teardown a no-op. Each `bind`
//! creates a fresh binding record, visible flag included; callbacks hold
//! their own record and ignore entries once it leaves `Watching`, which
//! covers notifications already in flight when the owner unbinds or rebinds.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::config::ObserveConfig;
use crate::host::{IntersectionEntry, IntersectionHost, WatchId};
use crate::trace::{
    IntersectionEvent, StopReason, Tracer, VisibilityChangedEvent, WatchStartedEvent,
    WatchStoppedEvent,
};

/// Lifecycle of a [`VisibilityTrigger`]'s current binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WatchState {
    /// Never bound.
    Unbound,
    /// Bound without a target or without an intersection capability; never
    /// becomes visible.
    Inert,
    /// Observing through the host.
    Watching(WatchId),
    /// One-shot watch fired and released its subscription.
    Triggered,
    /// Torn down by the owner.
    Stopped,
}

type ChangeListener = Box<dyn FnMut(bool)>;

/// Configuration snapshot, state and visible flag for one `bind` call.
struct Binding {
    state: Cell<WatchState>,
    threshold: f64,
    trigger_once: bool,
    visible: Cell<bool>,
    listeners: RefCell<Vec<ChangeListener>>,
}

impl Binding {
    fn new(state: WatchState, config: &ObserveConfig) -> Self {
        Self {
            state: Cell::new(state),
            threshold: config.effective_threshold(),
            trigger_once: config.trigger_once,
            visible: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn qualifies(&self, entry: &IntersectionEntry) -> bool {
        entry.is_intersecting && entry.ratio >= self.threshold
    }

    fn set_visible(&self, visible: bool) -> bool {
        if self.visible.replace(visible) == visible {
            return false;
        }
        // Listeners may register more listeners; run them from a detached list.
        let mut running = core::mem::take(&mut *self.listeners.borrow_mut());
        for listener in &mut running {
            listener(visible);
        }
        let mut listeners = self.listeners.borrow_mut();
        running.append(&mut listeners);
        *listeners = running;
        true
    }
}

/// Read handle for one binding's visible flag.
///
/// Cheap to clone; all clones observe the same flag. A later `bind` on the
/// trigger starts a new flag and leaves this one at its last value.
#[derive(Clone)]
pub struct VisibilityState {
    binding: Rc<Binding>,
}

impl VisibilityState {
    /// Whether the element has (sufficiently) entered the viewport.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.binding.visible.get()
    }

    /// Registers `listener` to run whenever the flag changes.
    pub fn on_change(&self, listener: impl FnMut(bool) + 'static) {
        self.binding.listeners.borrow_mut().push(Box::new(listener));
    }
}

impl fmt::Debug for VisibilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityState")
            .field("visible", &self.is_visible())
            .finish_non_exhaustive()
    }
}

/// Detects when one element enters the viewport.
///
/// # Usage
///
/// ```rust,ignore
/// let mut trigger = VisibilityTrigger::new(host);
/// let state = trigger.bind(Some(&element), ObserveConfig::entrance());
/// state.on_change(|visible| start_enter_animation(visible));
/// // ...
/// trigger.unbind(); // also done on drop
/// ```
pub struct VisibilityTrigger<H: IntersectionHost + 'static> {
    host: Rc<H>,
    binding: Rc<Binding>,
    tracer: Tracer,
}

impl<H: IntersectionHost + 'static> VisibilityTrigger<H> {
    /// Creates an unbound trigger that observes through `host`.
    #[must_use]
    pub fn new(host: Rc<H>) -> Self {
        Self {
            host,
            binding: Rc::new(Binding::new(WatchState::Unbound, &ObserveConfig::entrance())),
            tracer: Tracer::none(),
        }
    }

    /// Sends this trigger's events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Starts observing `element` with a snapshot of `config`.
    ///
    /// Any previous binding is torn down first and the returned state starts
    /// out not visible. A missing element, or a host that cannot observe,
    /// leaves the trigger [`Inert`](WatchState::Inert): the returned state
    /// then never becomes visible.
    pub fn bind(&mut self, element: Option<&H::Element>, config: ObserveConfig) -> VisibilityState {
        self.release(StopReason::Rebound);

        let Some(element) = element else {
            self.binding = Rc::new(Binding::new(WatchState::Inert, &config));
            return self.visibility();
        };

        let binding = Rc::new(Binding::new(WatchState::Inert, &config));
        let callback = {
            let binding = Rc::clone(&binding);
            let host = Rc::downgrade(&self.host);
            let tracer = self.tracer.clone();
            Box::new(move |entries: &[IntersectionEntry]| {
                handle_entries(&binding, &host, &tracer, entries);
            })
        };

        let options = config.observe_options();
        if let Some(watch) = self.host.observe(element, &options, callback) {
            binding.state.set(WatchState::Watching(watch));
            self.tracer.watch_started(&WatchStartedEvent {
                watch,
                threshold: binding.threshold,
                trigger_once: binding.trigger_once,
            });
        }
        self.binding = binding;
        self.visibility()
    }

    /// Stops observing. Idempotent; safe after a one-shot watch already
    /// released itself.
    pub fn unbind(&mut self) {
        self.release(StopReason::Unbound);
    }

    /// Returns a read handle for the current binding's visible flag.
    #[must_use]
    pub fn visibility(&self) -> VisibilityState {
        VisibilityState {
            binding: Rc::clone(&self.binding),
        }
    }

    /// Whether the currently bound element has entered the viewport.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.binding.visible.get()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WatchState {
        self.binding.state.get()
    }

    fn release(&mut self, reason: StopReason) {
        match self.binding.state.get() {
            WatchState::Unbound | WatchState::Stopped => {}
            WatchState::Inert | WatchState::Triggered => {
                self.binding.state.set(WatchState::Stopped);
            }
            WatchState::Watching(watch) => {
                // Flip the record first so an entry delivered during
                // `unobserve` is already ignored.
                self.binding.state.set(WatchState::Stopped);
                self.host.unobserve(watch);
                self.tracer.watch_stopped(&WatchStoppedEvent { watch, reason });
            }
        }
    }
}

fn handle_entries<H: IntersectionHost>(
    binding: &Binding,
    host: &Weak<H>,
    tracer: &Tracer,
    entries: &[IntersectionEntry],
) {
    // Only the newest entry matters; visibility depends on current state.
    let Some(entry) = entries.last() else {
        return;
    };
    let WatchState::Watching(watch) = binding.state.get() else {
        return;
    };

    let qualified = binding.qualifies(entry);
    tracer.intersection(&IntersectionEvent {
        watch,
        ratio: entry.ratio,
        is_intersecting: entry.is_intersecting,
        qualified,
        time: entry.time,
    });

    if binding.trigger_once {
        if !qualified {
            return;
        }
        binding.state.set(WatchState::Triggered);
        if let Some(host) = host.upgrade() {
            host.unobserve(watch);
        }
        tracer.watch_stopped(&WatchStoppedEvent {
            watch,
            reason: StopReason::Triggered,
        });
    }

    if binding.set_visible(qualified) {
        tracer.visibility_changed(&VisibilityChangedEvent {
            watch,
            visible: qualified,
            time: entry.time,
        });
    }
}

impl<H: IntersectionHost + 'static> Drop for VisibilityTrigger<H> {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl<H: IntersectionHost + 'static> fmt::Debug for VisibilityTrigger<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityTrigger")
            .field("state", &self.state())
            .field("visible", &self.is_visible())
            .field("threshold", &self.binding.threshold)
            .field("trigger_once", &self.binding.trigger_once)
            .finish_non_exhaustive()
    }
}
