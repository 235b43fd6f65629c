// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame scheduling.
//!
//! [`RafScheduler`] implements [`FrameHost`] on top of the browser's
//! `requestAnimationFrame`. All requests made before a frame share a single
//! browser callback: one persistent JS closure is registered at most once per
//! frame and drains the queue of Rust callbacks when it fires. Each callback
//! receives the frame's [`DOMHighResTimeStamp`][mdn] converted to
//! [`HostTime`].
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`HostTime`]: sightline_core::time::HostTime

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use sightline_core::host::{FrameCallback, FrameHost, FrameRequestId};
use sightline_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods, so no
// Window/Performance object is fetched (and unwrapped) on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type RafClosure = Closure<dyn FnMut(f64)>;

/// A [`FrameHost`] backed by `requestAnimationFrame`.
///
/// The [`FrameRequestId`]s it hands out are its own queue ids, not browser
/// handles; cancelling the last queued callback also cancels the browser
/// request.
pub struct RafScheduler {
    inner: Rc<RafInner>,
}

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Stored in its own `RefCell` so it can be set once after construction
    /// and borrowed while the queue is being mutated.
    closure: RefCell<Option<RafClosure>>,

    /// Callbacks waiting for the next frame, in request order.
    queue: RefCell<Vec<(FrameRequestId, FrameCallback)>>,

    /// Ids of the batch being run that have neither run nor been cancelled.
    in_flight: RefCell<Vec<FrameRequestId>>,

    /// Next queue id.
    next_id: Cell<i32>,

    /// The ID returned by the outstanding `requestAnimationFrame` call, if
    /// any, used by [`cancel_animation_frame`].
    raf_id: Cell<Option<i32>>,
}

impl RafInner {
    fn on_frame(&self, timestamp_ms: f64) {
        self.raf_id.set(None);
        let now = HostTime::from_millis_f64(timestamp_ms);
        // Detach the batch first: callbacks may request the following frame.
        let due = core::mem::take(&mut *self.queue.borrow_mut());
        *self.in_flight.borrow_mut() = due.iter().map(|(id, _)| *id).collect();
        for (id, callback) in due {
            // An earlier callback in this batch may have cancelled this one.
            if self.take_in_flight(id) {
                callback(now);
            }
        }
        self.in_flight.borrow_mut().clear();
    }

    fn take_in_flight(&self, id: FrameRequestId) -> bool {
        let mut in_flight = self.in_flight.borrow_mut();
        match in_flight.iter().position(|x| *x == id) {
            Some(index) => {
                in_flight.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn ensure_requested(&self) {
        if self.raf_id.get().is_some() {
            return;
        }
        if let Some(ref closure) = *self.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.raf_id.set(Some(id));
        }
    }
}

impl RafScheduler {
    /// Creates a scheduler with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let inner = Rc::new(RafInner {
            closure: RefCell::new(None),
            queue: RefCell::new(Vec::new()),
            in_flight: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            raf_id: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.on_frame(timestamp_ms);
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Number of callbacks waiting for the next frame.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.queue.borrow().len()
    }
}

impl Default for RafScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHost for RafScheduler {
    fn request_frame(&self, callback: FrameCallback) -> Option<FrameRequestId> {
        let id = FrameRequestId(self.inner.next_id.get());
        self.inner.next_id.set(id.0.wrapping_add(1));
        self.inner.queue.borrow_mut().push((id, callback));
        self.inner.ensure_requested();
        Some(id)
    }

    fn cancel_frame(&self, request: FrameRequestId) {
        if self.inner.take_in_flight(request) {
            return;
        }
        let now_empty = {
            let mut queue = self.inner.queue.borrow_mut();
            queue.retain(|(id, _)| *id != request);
            queue.is_empty()
        };
        if now_empty && let Some(raf_id) = self.inner.raf_id.take() {
            cancel_animation_frame(raf_id);
        }
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        if let Some(raf_id) = self.inner.raf_id.take() {
            cancel_animation_frame(raf_id);
        }
        self.inner.queue.borrow_mut().clear();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafScheduler")
            .field("queued", &self.queued())
            .field("raf_id", &self.inner.raf_id.get())
            .finish_non_exhaustive()
    }
}
