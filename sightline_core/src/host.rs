// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capability contract.
//!
//! Sightline never talks to a platform directly. The host environment supplies
//! three capabilities through the traits in this module:
//!
//! - **Intersection observation** ([`IntersectionHost`]): reports how much of
//!   an element lies within the (margin-adjusted) viewport.
//! - **Frame scheduling** ([`FrameHost`]): runs a callback once before the
//!   next render pass, with cancellation.
//! - **Scroll position** ([`ScrollHost`]): reads the current offset and
//!   notifies when it changes.
//!
//! Hosts are shared between a component and the callbacks it registers, so
//! every method takes `&self`; implementations use interior mutability where
//! they keep state. All methods are single-threaded and may be called from
//! inside a callback the same host is delivering.
//!
//! # Absent capabilities
//!
//! Registration methods return `Option`. `None` means the capability is not
//! available (unsupported browser, detached document, …). Components treat
//! that as "never visible" / "no effect" rather than an error. Releasing an
//! id that is unknown or already released must be a no-op.
//!
//! # Crate boundaries
//!
//! `sightline_core` owns these traits and the components built on them.
//! `sightline_backend_web` implements them over browser APIs, and
//! `sightline_harness` implements them as deterministic fakes.

use alloc::boxed::Box;
use core::fmt;

use crate::config::ObserveOptions;
use crate::time::HostTime;

/// Identifies an active intersection watch.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

impl fmt::Debug for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WatchId({})", self.0)
    }
}

/// Identifies a scheduled frame callback.
///
/// Same width as the handle `requestAnimationFrame` returns.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub i32);

impl fmt::Debug for FrameRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameRequestId({})", self.0)
    }
}

/// Identifies a scroll-change subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScrollSubscriptionId(pub u32);

impl fmt::Debug for ScrollSubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScrollSubscriptionId({})", self.0)
    }
}

/// One intersection notification for a watched element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    /// Fraction of the element inside the adjusted viewport, in `[0, 1]`.
    pub ratio: f64,
    /// Whether the element overlaps or touches the adjusted viewport.
    pub is_intersecting: bool,
    /// When the host computed the intersection.
    pub time: HostTime,
}

/// Receives a batch of entries for one watch, oldest first.
pub type EntriesCallback = Box<dyn FnMut(&[IntersectionEntry])>;

/// Runs once before the next render pass with the frame timestamp.
pub type FrameCallback = Box<dyn FnOnce(HostTime)>;

/// Runs on every raw scroll notification.
pub type ScrollCallback = Box<dyn FnMut()>;

/// Intersection-observation capability.
pub trait IntersectionHost {
    /// The host's handle for a UI element. The caller owns the element; the
    /// host keeps at most a reference for the lifetime of the watch.
    type Element;

    /// Starts watching `target`, delivering entries to `on_entries`.
    ///
    /// Entries (including the initial one) arrive asynchronously, never from
    /// inside this call.
    ///
    /// Returns `None` when observation is unavailable; the callback is then
    /// dropped without ever running.
    fn observe(
        &self,
        target: &Self::Element,
        options: &ObserveOptions,
        on_entries: EntriesCallback,
    ) -> Option<WatchId>;

    /// Stops a watch and drops its callback. Unknown ids are ignored.
    fn unobserve(&self, watch: WatchId);
}

/// Frame-scheduling capability.
pub trait FrameHost {
    /// Schedules `callback` to run once before the next render pass, never
    /// from inside this call.
    ///
    /// Returns `None` when scheduling is unavailable.
    fn request_frame(&self, callback: FrameCallback) -> Option<FrameRequestId>;

    /// Cancels a callback that has not run yet. Unknown or already-run ids
    /// are ignored.
    fn cancel_frame(&self, request: FrameRequestId);
}

/// Scroll-position capability.
pub trait ScrollHost {
    /// The current scroll offset along the page's scrollable axis.
    fn scroll_offset(&self) -> f64;

    /// Subscribes to offset changes. The subscription must be passive: it can
    /// never block or cancel scrolling.
    ///
    /// Returns `None` when scroll events are unavailable.
    fn subscribe(&self, on_scroll: ScrollCallback) -> Option<ScrollSubscriptionId>;

    /// Removes a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, subscription: ScrollSubscriptionId);
}
