// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `IntersectionObserver` watches.
//!
//! Every watch owns its own observer, because threshold and root margin are
//! per-observer options in the DOM API. The observer's entry batches are
//! converted to [`IntersectionEntry`] values (oldest first, as the browser
//! delivers them) and handed to the watch's callback.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use sightline_core::config::ObserveOptions;
use sightline_core::host::{EntriesCallback, IntersectionEntry, IntersectionHost, WatchId};
use sightline_core::time::HostTime;

type ObserverClosure = Closure<dyn FnMut(js_sys::Array)>;

struct Watch {
    id: WatchId,
    observer: IntersectionObserver,
    closure: ObserverClosure,
}

/// An [`IntersectionHost`] backed by the DOM `IntersectionObserver`.
///
/// Constructing or observing with an observer the browser rejects (no
/// `IntersectionObserver` global, a malformed margin) refuses the watch.
#[derive(Default)]
pub struct DomIntersection {
    watches: RefCell<Vec<Watch>>,
    /// Closures of released watches. A one-shot watch is released from inside
    /// its own callback, so its closure cannot be freed until the callback
    /// returns; these are dropped on the next `observe` or on drop.
    retired: RefCell<Vec<ObserverClosure>>,
    next_id: Cell<u32>,
}

impl DomIntersection {
    /// Creates a host with no watches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live watches.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }
}

fn convert(entries: &js_sys::Array) -> Vec<IntersectionEntry> {
    entries
        .iter()
        .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
        .map(|entry| IntersectionEntry {
            ratio: entry.intersection_ratio(),
            is_intersecting: entry.is_intersecting(),
            time: HostTime::from_millis_f64(entry.time()),
        })
        .collect()
}

impl IntersectionHost for DomIntersection {
    type Element = Element;

    fn observe(
        &self,
        target: &Element,
        options: &ObserveOptions,
        mut on_entries: EntriesCallback,
    ) -> Option<WatchId> {
        self.retired.borrow_mut().clear();

        let closure = Closure::wrap(Box::new(move |entries: js_sys::Array| {
            let batch = convert(&entries);
            if !batch.is_empty() {
                on_entries(&batch);
            }
        }) as Box<dyn FnMut(js_sys::Array)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.margin.to_css());

        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init).ok()?;
        observer.observe(target);

        let id = WatchId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.watches.borrow_mut().push(Watch {
            id,
            observer,
            closure,
        });
        Some(id)
    }

    fn unobserve(&self, watch: WatchId) {
        let removed = {
            let mut watches = self.watches.borrow_mut();
            watches
                .iter()
                .position(|w| w.id == watch)
                .map(|index| watches.swap_remove(index))
        };
        if let Some(removed) = removed {
            removed.observer.disconnect();
            self.retired.borrow_mut().push(removed.closure);
        }
    }
}

impl Drop for DomIntersection {
    fn drop(&mut self) {
        for watch in self.watches.borrow_mut().drain(..) {
            watch.observer.disconnect();
        }
    }
}

impl core::fmt::Debug for DomIntersection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomIntersection")
            .field("watches", &self.watch_count())
            .field("retired", &self.retired.borrow().len())
            .finish_non_exhaustive()
    }
}
