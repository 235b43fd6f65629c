// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::{Rect, Vec2};

use sightline_core::config::ObserveOptions;
use sightline_core::geometry::{Intersection, intersect};
use sightline_core::host::{EntriesCallback, IntersectionEntry, IntersectionHost, WatchId};
use sightline_core::time::HostTime;

/// Handle for an element placed in a [`SimulatedViewport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

/// Crossing state a browser notifies on: intersecting, and at or past the
/// threshold.
type Crossing = (bool, bool);

struct Watch {
    id: WatchId,
    element: ElementId,
    options: ObserveOptions,
    last: Option<Crossing>,
    /// `None` while the callback is running.
    callback: Option<EntriesCallback>,
}

/// An [`IntersectionHost`] over rectangles in page coordinates.
///
/// The viewport is a rectangle that moves with [`scroll_to`](Self::scroll_to);
/// elements stay put unless moved. Nothing is delivered until
/// [`flush`](Self::flush), which sends each watch its initial entry and then
/// an entry whenever the element crosses the watch's threshold or starts or
/// stops intersecting, like a browser observer does.
pub struct SimulatedViewport {
    size: Vec2,
    scroll: Cell<f64>,
    elements: RefCell<Vec<Rect>>,
    watches: RefCell<Vec<Watch>>,
    next_id: Cell<u32>,
    refuse: bool,
}

impl SimulatedViewport {
    /// Creates a viewport of `width` × `height` scrolled to the top.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Vec2::new(width, height),
            scroll: Cell::new(0.0),
            elements: RefCell::new(Vec::new()),
            watches: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            refuse: false,
        }
    }

    /// Creates a viewport whose `observe` always refuses.
    #[must_use]
    pub fn refusing(width: f64, height: f64) -> Self {
        Self {
            refuse: true,
            ..Self::new(width, height)
        }
    }

    /// Places an element at `rect` (page coordinates).
    pub fn add_element(&self, rect: Rect) -> ElementId {
        let mut elements = self.elements.borrow_mut();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "test scenes hold far fewer than u32::MAX elements"
        )]
        let id = ElementId(elements.len() as u32);
        elements.push(rect);
        id
    }

    /// Moves an element. Unknown ids are ignored.
    pub fn move_element(&self, element: ElementId, rect: Rect) {
        if let Some(slot) = self.elements.borrow_mut().get_mut(element.0 as usize) {
            *slot = rect;
        }
    }

    /// Scrolls the viewport so its top edge is at `offset`.
    pub fn scroll_to(&self, offset: f64) {
        self.scroll.set(offset);
    }

    /// The visible page region.
    #[must_use]
    pub fn root(&self) -> Rect {
        Rect::from_origin_size((0.0, self.scroll.get()), self.size.to_size())
    }

    /// Number of live watches.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }

    /// Whether `watch` is still registered.
    #[must_use]
    pub fn is_watching(&self, watch: WatchId) -> bool {
        self.watches.borrow().iter().any(|w| w.id == watch)
    }

    /// Computes the current intersection of `element` with the viewport.
    #[must_use]
    pub fn intersection(&self, element: ElementId, options: &ObserveOptions) -> Intersection {
        self.elements
            .borrow()
            .get(element.0 as usize)
            .map_or(Intersection::NONE, |rect| {
                intersect(*rect, self.root(), &options.margin)
            })
    }

    /// Delivers pending entries at `time`. Returns how many batches were
    /// delivered.
    pub fn flush(&self, time: HostTime) -> usize {
        let due: Vec<(WatchId, IntersectionEntry)> = {
            let mut watches = self.watches.borrow_mut();
            watches
                .iter_mut()
                .filter_map(|watch| {
                    let hit = self.intersection(watch.element, &watch.options);
                    let crossing = (
                        hit.is_intersecting,
                        hit.is_intersecting && hit.ratio >= watch.options.threshold,
                    );
                    if watch.last == Some(crossing) {
                        return None;
                    }
                    watch.last = Some(crossing);
                    Some((
                        watch.id,
                        IntersectionEntry {
                            ratio: hit.ratio,
                            is_intersecting: hit.is_intersecting,
                            time,
                        },
                    ))
                })
                .collect()
        };

        let mut delivered = 0;
        for (watch, entry) in due {
            if self.deliver(watch, &[entry]) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Hands `entries` to a watch's callback directly, bypassing geometry.
    ///
    /// Returns `false` if the watch is gone (or is already running).
    pub fn deliver(&self, watch: WatchId, entries: &[IntersectionEntry]) -> bool {
        let callback = self
            .watches
            .borrow_mut()
            .iter_mut()
            .find(|w| w.id == watch)
            .and_then(|w| w.callback.take());
        let Some(mut callback) = callback else {
            return false;
        };

        callback(entries);

        // The callback may have unobserved its own watch; then it is dropped
        // here.
        if let Some(w) = self.watches.borrow_mut().iter_mut().find(|w| w.id == watch) {
            w.callback = Some(callback);
        }
        true
    }
}

impl IntersectionHost for SimulatedViewport {
    type Element = ElementId;

    fn observe(
        &self,
        target: &ElementId,
        options: &ObserveOptions,
        on_entries: EntriesCallback,
    ) -> Option<WatchId> {
        if self.refuse || target.0 as usize >= self.elements.borrow().len() {
            return None;
        }
        let id = WatchId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.watches.borrow_mut().push(Watch {
            id,
            element: *target,
            options: *options,
            last: None,
            callback: Some(on_entries),
        });
        Some(id)
    }

    fn unobserve(&self, watch: WatchId) {
        // Drop the removed callbacks after the borrow ends; they may own
        // handles that reach back into this host.
        let removed: Vec<Watch> = {
            let mut watches = self.watches.borrow_mut();
            let (gone, kept) = core::mem::take(&mut *watches)
                .into_iter()
                .partition(|w| w.id == watch);
            *watches = kept;
            gone
        };
        drop(removed);
    }
}

impl fmt::Debug for SimulatedViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedViewport")
            .field("root", &self.root())
            .field("elements", &self.elements.borrow().len())
            .field("watches", &self.watch_count())
            .field("refuse", &self.refuse)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use sightline_core::config::ObserveConfig;

    fn recorder() -> (Rc<RefCell<Vec<IntersectionEntry>>>, EntriesCallback) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let callback = Box::new(move |entries: &[IntersectionEntry]| {
            sink.borrow_mut().extend_from_slice(entries);
        });
        (seen, callback)
    }

    #[test]
    fn initial_entry_then_only_crossings() {
        let viewport = SimulatedViewport::new(800.0, 600.0);
        let el = viewport.add_element(Rect::new(0.0, 1000.0, 100.0, 1100.0));
        let (seen, callback) = recorder();
        let options = ObserveConfig::entrance().observe_options();
        viewport.observe(&el, &options, callback).unwrap();

        assert!(seen.borrow().is_empty(), "nothing before the first flush");
        assert_eq!(viewport.flush(HostTime(1)), 1);
        assert!(!seen.borrow()[0].is_intersecting);

        // Still far away: no crossing, no entry.
        viewport.scroll_to(100.0);
        assert_eq!(viewport.flush(HostTime(2)), 0);

        // Root is 500..1090 once the default 10px bottom trim applies.
        viewport.scroll_to(500.0);
        assert_eq!(viewport.flush(HostTime(3)), 1);
        let last = *seen.borrow().last().unwrap();
        assert!(last.is_intersecting);
        assert!(last.ratio >= 0.1, "ratio {}", last.ratio);
    }

    #[test]
    fn unknown_element_is_refused() {
        let viewport = SimulatedViewport::new(800.0, 600.0);
        let (_, callback) = recorder();
        let options = ObserveConfig::entrance().observe_options();
        assert!(viewport.observe(&ElementId(3), &options, callback).is_none());
    }

    #[test]
    fn unobserve_from_inside_callback() {
        let viewport = Rc::new(SimulatedViewport::new(800.0, 600.0));
        let el = viewport.add_element(Rect::new(0.0, 0.0, 100.0, 100.0));
        let options = ObserveConfig::entrance().observe_options();

        let own_id = Rc::new(Cell::new(None));
        let host = Rc::downgrade(&viewport);
        let id_slot = Rc::clone(&own_id);
        let id = viewport
            .observe(
                &el,
                &options,
                Box::new(move |_: &[IntersectionEntry]| {
                    if let (Some(host), Some(id)) = (host.upgrade(), id_slot.get()) {
                        host.unobserve(id);
                    }
                }),
            )
            .unwrap();
        own_id.set(Some(id));

        assert_eq!(viewport.flush(HostTime(1)), 1);
        assert!(!viewport.is_watching(id));
        assert!(!viewport.deliver(id, &[]));
    }
}
