// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use sightline_core::host::{ScrollCallback, ScrollHost, ScrollSubscriptionId};

/// A [`ScrollHost`] whose offset is set by the test.
#[derive(Default)]
pub struct ManualScroll {
    offset: Cell<f64>,
    subscribers: RefCell<Vec<(ScrollSubscriptionId, ScrollCallback)>>,
    /// Ids unsubscribed while their callbacks were detached for dispatch.
    removed_during_dispatch: RefCell<Vec<ScrollSubscriptionId>>,
    dispatching: Cell<bool>,
    next_id: Cell<u32>,
    refuse: bool,
}

impl ManualScroll {
    /// Creates a host at offset zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host that refuses subscriptions.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Moves to `offset` and sends one notification to every subscriber.
    pub fn scroll_to(&self, offset: f64) {
        self.offset.set(offset);
        self.notify();
    }

    /// Moves to `offset` without notifying anyone.
    pub fn set_offset(&self, offset: f64) {
        self.offset.set(offset);
    }

    /// Sends one notification to every subscriber.
    pub fn notify(&self) {
        let mut running = core::mem::take(&mut *self.subscribers.borrow_mut());
        self.dispatching.set(true);
        for (_, callback) in &mut running {
            callback();
        }
        self.dispatching.set(false);

        let removed = core::mem::take(&mut *self.removed_during_dispatch.borrow_mut());
        running.retain(|(id, _)| !removed.contains(id));
        let mut subscribers = self.subscribers.borrow_mut();
        running.append(&mut subscribers);
        *subscribers = running;
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl ScrollHost for ManualScroll {
    fn scroll_offset(&self) -> f64 {
        self.offset.get()
    }

    fn subscribe(&self, on_scroll: ScrollCallback) -> Option<ScrollSubscriptionId> {
        if self.refuse {
            return None;
        }
        let id = ScrollSubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, on_scroll));
        Some(id)
    }

    fn unsubscribe(&self, subscription: ScrollSubscriptionId) {
        self.subscribers
            .borrow_mut()
            .retain(|(id, _)| *id != subscription);
        if self.dispatching.get() {
            self.removed_during_dispatch.borrow_mut().push(subscription);
        }
    }
}

impl fmt::Debug for ManualScroll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScroll")
            .field("offset", &self.offset.get())
            .field("subscribers", &self.subscriber_count())
            .field("refuse", &self.refuse)
            .finish_non_exhaustive()
    }
}
