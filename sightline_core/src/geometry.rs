// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersection geometry.
//!
//! Browsers compute intersection ratios natively. Hosts without that
//! capability (and the test harness) use [`intersect`], which follows the same
//! rules: the root is adjusted by the margin, touching edges count as
//! intersecting, and a zero-area target is either fully visible or not at all.

use kurbo::Rect;

use crate::config::RootMargin;

/// Result of intersecting a target with an (adjusted) root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Whether the target overlaps or touches the adjusted root.
    pub is_intersecting: bool,
    /// Fraction of the target's area inside the adjusted root, in `[0, 1]`.
    pub ratio: f64,
    /// The overlapping region, or a zero-area rectangle when disjoint.
    pub rect: Rect,
}

impl Intersection {
    /// A target entirely outside the root.
    pub const NONE: Self = Self {
        is_intersecting: false,
        ratio: 0.0,
        rect: Rect::ZERO,
    };
}

/// Intersects `target` with `root` after applying `margin` to the root.
#[must_use]
pub fn intersect(target: Rect, root: Rect, margin: &RootMargin) -> Intersection {
    let target = target.abs();
    let root = margin.apply(root);

    let x0 = target.x0.max(root.x0);
    let y0 = target.y0.max(root.y0);
    let x1 = target.x1.min(root.x1);
    let y1 = target.y1.min(root.y1);

    // A margin can shrink the root past zero size; nothing intersects then.
    if root.x1 < root.x0 || root.y1 < root.y0 || x1 < x0 || y1 < y0 {
        return Intersection::NONE;
    }

    let rect = Rect::new(x0, y0, x1, y1);
    let target_area = target.area();
    let ratio = if target_area > 0.0 {
        (rect.area() / target_area).clamp(0.0, 1.0)
    } else {
        1.0
    };
    Intersection {
        is_intersecting: true,
        ratio,
        rect,
    }
}
