// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window scroll position and passive scroll listeners.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Window};

use sightline_core::host::{ScrollCallback, ScrollHost, ScrollSubscriptionId};

const SCROLL_EVENT: &str = "scroll";

/// A [`ScrollHost`] reading the window's vertical scroll offset.
///
/// Every subscription is a passive `scroll` listener on the window. Without a
/// window (workers, detached contexts) the offset reads as zero and
/// subscriptions are refused.
pub struct WindowScroll {
    window: Option<Window>,
    listeners: RefCell<Vec<(ScrollSubscriptionId, Closure<dyn FnMut()>)>>,
    next_id: Cell<u32>,
}

impl WindowScroll {
    /// Binds to the global `window`, if there is one.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(web_sys::window())
    }

    /// Binds to a specific window, or to none.
    #[must_use]
    pub fn with_window(window: Option<Window>) -> Self {
        Self {
            window,
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Number of installed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Default for WindowScroll {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollHost for WindowScroll {
    fn scroll_offset(&self) -> f64 {
        self.window
            .as_ref()
            .and_then(|w| w.scroll_y().ok())
            .unwrap_or(0.0)
    }

    fn subscribe(&self, mut on_scroll: ScrollCallback) -> Option<ScrollSubscriptionId> {
        let window = self.window.as_ref()?;
        let closure = Closure::wrap(Box::new(move || on_scroll()) as Box<dyn FnMut()>);

        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        window
            .add_event_listener_with_callback_and_add_event_listener_options(
                SCROLL_EVENT,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .ok()?;

        let id = ScrollSubscriptionId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.listeners.borrow_mut().push((id, closure));
        Some(id)
    }

    fn unsubscribe(&self, subscription: ScrollSubscriptionId) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|(id, _)| *id == subscription)
                .map(|index| listeners.swap_remove(index))
        };
        if let (Some(window), Some((_, closure))) = (self.window.as_ref(), removed) {
            // Removal only fails for a foreign `this`; the closure is dropped
            // either way.
            _ = window.remove_event_listener_with_callback(
                SCROLL_EVENT,
                closure.as_ref().unchecked_ref(),
            );
        }
    }
}

impl Drop for WindowScroll {
    fn drop(&mut self) {
        let listeners = core::mem::take(&mut *self.listeners.borrow_mut());
        if let Some(window) = self.window.as_ref() {
            for (_, closure) in &listeners {
                _ = window.remove_event_listener_with_callback(
                    SCROLL_EVENT,
                    closure.as_ref().unchecked_ref(),
                );
            }
        }
    }
}

impl core::fmt::Debug for WindowScroll {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowScroll")
            .field("has_window", &self.window.is_some())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}
