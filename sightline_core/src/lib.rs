// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll-driven observation primitives.
//!
//! `sightline_core` provides two small components that presentation code uses
//! to react to scrolling without polling. It is `no_std` compatible (with
//! `alloc`) and reaches the platform only through the capability traits in
//! [`host`], so every behavior can be driven by fake clocks and viewports.
//!
//! # Architecture
//!
//! ```text
//!   IntersectionHost ──entries──► VisibilityTrigger ──► VisibilityState
//!                                                       (is_visible, on_change)
//!
//!   ScrollHost ──notify──► ScrollMetricSampler ──request──► FrameHost
//!                               ▲                               │
//!                               └──────── next frame ───────────┘
//!                               │
//!                               ▼
//!                          MetricStream (scroll_offset, intensity)
//! ```
//!
//! **[`visibility`]**: [`VisibilityTrigger`](visibility::VisibilityTrigger)
//! flips a flag when an element first crosses the visibility threshold and,
//! in one-shot mode, releases its watch immediately.
//!
//! **[`scroll`]**: [`ScrollMetricSampler`](scroll::ScrollMetricSampler)
//! coalesces scroll notifications to one sample per frame, ignores jitter
//! below a noise threshold and publishes a clamped intensity.
//!
//! **[`config`]**: Binding configuration (threshold, CSS-style root margin,
//! one-shot mode) and sampler tuning values.
//!
//! **[`geometry`]**: The intersection-ratio computation over `kurbo`
//! rectangles, for hosts without native intersection observation.
//!
//! **[`host`]**: The capability traits platform backends implement.
//!
//! **[`time`]**: Microsecond host timestamps.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with a zero-overhead [`Tracer`](trace::Tracer) handle.
//!
//! # Failure model
//!
//! Nothing here fails at runtime. A missing element or capability leaves the
//! component at its static default (`is_visible() == false`, intensity `0`);
//! teardown is idempotent. Only configuration parsing and validation return
//! errors.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod geometry;
pub mod host;
pub mod scroll;
pub mod time;
pub mod trace;
pub mod visibility;
