// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for sightline.
//!
//! This crate implements the host capabilities of [`sightline_core::host`]
//! over browser APIs:
//!
//! - [`DomIntersection`]: `IntersectionObserver`, one observer per watch
//! - [`RafScheduler`]: `requestAnimationFrame` frame callbacks
//! - [`WindowScroll`]: `window.scrollY` and passive `scroll` listeners
//!
//! ```ignore
//! use std::rc::Rc;
//! use sightline_backend_web::{DomIntersection, RafScheduler, WindowScroll};
//! use sightline_core::config::{ObserveConfig, SamplerPolicy};
//! use sightline_core::scroll::ScrollMetricSampler;
//! use sightline_core::visibility::VisibilityTrigger;
//!
//! let mut trigger = VisibilityTrigger::new(Rc::new(DomIntersection::new()));
//! let state = trigger.bind(Some(&element), ObserveConfig::entrance());
//! state.on_change(|visible| { /* start the reveal animation */ });
//!
//! let mut sampler = ScrollMetricSampler::new(
//!     Rc::new(WindowScroll::new()),
//!     Rc::new(RafScheduler::new()),
//!     SamplerPolicy::depth_blur(),
//! );
//! let metrics = sampler.start();
//! metrics.on_update(|m| { /* feed m.intensity to the blur filter */ });
//! ```

#![no_std]

extern crate alloc;

mod intersection;
mod raf;
mod scroll;

pub use intersection::DomIntersection;
pub use raf::RafScheduler;
pub use scroll::WindowScroll;

use alloc::rc::Rc;

use sightline_core::config::SamplerPolicy;
use sightline_core::scroll::ScrollMetricSampler;
use sightline_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}

/// Creates a sampler over the window scroll offset, sampled once per
/// animation frame.
#[must_use]
pub fn window_sampler(policy: SamplerPolicy) -> ScrollMetricSampler<WindowScroll, RafScheduler> {
    ScrollMetricSampler::new(
        Rc::new(WindowScroll::new()),
        Rc::new(RafScheduler::new()),
        policy,
    )
}
