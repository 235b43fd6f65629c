// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use sightline_core::host::{FrameCallback, FrameHost, FrameRequestId};
use sightline_core::time::HostTime;

/// A [`FrameHost`] whose frames happen only when [`tick`](Self::tick) is
/// called.
#[derive(Default)]
pub struct ManualFrames {
    queue: RefCell<Vec<(FrameRequestId, FrameCallback)>>,
    /// Ids of the batch being run by `tick` that have neither run nor been
    /// cancelled.
    in_flight: RefCell<Vec<FrameRequestId>>,
    next_id: Cell<i32>,
    requests: Cell<u32>,
    cancels: Cell<u32>,
    refuse: bool,
}

impl ManualFrames {
    /// Creates a scheduler with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler that refuses every request.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Runs every callback queued before this call with `time`.
    ///
    /// Callbacks requested while the frame runs wait for the next tick; a
    /// callback cancelled by an earlier one in the same frame does not run.
    /// Returns how many callbacks ran.
    pub fn tick(&self, time: HostTime) -> usize {
        let due = core::mem::take(&mut *self.queue.borrow_mut());
        *self.in_flight.borrow_mut() = due.iter().map(|(id, _)| *id).collect();
        let mut ran = 0;
        for (id, callback) in due {
            if take_id(&self.in_flight, id) {
                callback(time);
                ran += 1;
            }
        }
        self.in_flight.borrow_mut().clear();
        ran
    }

    /// Number of callbacks waiting for the next tick.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Total successful `request_frame` calls.
    #[must_use]
    pub fn requests(&self) -> u32 {
        self.requests.get()
    }

    /// Total `cancel_frame` calls that stopped a callback from running.
    #[must_use]
    pub fn cancels(&self) -> u32 {
        self.cancels.get()
    }
}

impl FrameHost for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) -> Option<FrameRequestId> {
        if self.refuse {
            return None;
        }
        let id = FrameRequestId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.requests.set(self.requests.get() + 1);
        self.queue.borrow_mut().push((id, callback));
        Some(id)
    }

    fn cancel_frame(&self, request: FrameRequestId) {
        let removed = {
            let mut queue = self.queue.borrow_mut();
            queue
                .iter()
                .position(|(id, _)| *id == request)
                .map(|index| queue.remove(index))
        };
        if removed.is_some() || take_id(&self.in_flight, request) {
            self.cancels.set(self.cancels.get() + 1);
        }
    }
}

/// Removes `id` from `ids`, returning whether it was there.
fn take_id(ids: &RefCell<Vec<FrameRequestId>>, id: FrameRequestId) -> bool {
    let mut ids = ids.borrow_mut();
    match ids.iter().position(|x| *x == id) {
        Some(index) => {
            ids.swap_remove(index);
            true
        }
        None => false,
    }
}

impl fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrames")
            .field("queued", &self.queued())
            .field("requests", &self.requests())
            .field("cancels", &self.cancels())
            .field("refuse", &self.refuse)
            .finish_non_exhaustive()
    }
}
