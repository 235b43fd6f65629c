// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic hosts for driving sightline components without a browser.
//!
//! Each type implements one capability trait from [`sightline_core::host`]
//! and advances only when the test tells it to:
//!
//! - [`ManualFrames`]: queued frame callbacks run on [`ManualFrames::tick`].
//! - [`ManualScroll`]: the offset changes (and subscribers are notified) on
//!   [`ManualScroll::scroll_to`].
//! - [`SimulatedViewport`]: elements are rectangles; entries are computed
//!   with [`sightline_core::geometry::intersect`] and delivered on
//!   [`SimulatedViewport::flush`].
//!
//! Every host can be built in a refusing mode that models an environment
//! without the capability.

#![no_std]

extern crate alloc;

mod frames;
mod scroll;
mod viewport;

pub use frames::ManualFrames;
pub use scroll::ManualScroll;
pub use viewport::{ElementId, SimulatedViewport};
