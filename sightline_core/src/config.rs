// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observation and sampling configuration.
//!
//! [`ObserveConfig`] is the per-binding input to
//! [`VisibilityTrigger::bind`](crate::visibility::VisibilityTrigger::bind).
//! Its [`RootMargin`] follows the CSS `rootMargin` shorthand and can be parsed
//! from the same string form (`"0px 0px -10px 0px"`).
//!
//! [`SamplerPolicy`] holds the tuning values of the
//! [`ScrollMetricSampler`](crate::scroll::ScrollMetricSampler): the noise
//! threshold below which a scroll delta is ignored, and the
//! [`IntensityCurve`] that maps an offset to a clamped intensity.

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use kurbo::{Insets, Rect};

// ---------------------------------------------------------------------------
// RootMargin
// ---------------------------------------------------------------------------

/// One side of a [`RootMargin`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Absolute length in CSS pixels.
    Px(f64),
    /// Percentage of the root's extent along the same axis.
    Percent(f64),
}

impl Length {
    /// Resolves this length against the root extent along its axis.
    #[must_use]
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Offsets applied to the viewport before the intersection test.
///
/// Positive values grow the effective viewport, negative values shrink it.
/// The default shrinks the bottom edge by 10px so an element has to be
/// slightly inside the fold before it counts as entered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    /// Top edge.
    pub top: Length,
    /// Right edge.
    pub right: Length,
    /// Bottom edge.
    pub bottom: Length,
    /// Left edge.
    pub left: Length,
}

impl RootMargin {
    /// No adjustment on any side.
    pub const ZERO: Self = Self::uniform(Length::Px(0.0));

    /// Shrinks the bottom edge by 10px.
    pub const SHRINK_BOTTOM_10: Self = Self {
        top: Length::Px(0.0),
        right: Length::Px(0.0),
        bottom: Length::Px(-10.0),
        left: Length::Px(0.0),
    };

    /// The same length on all four sides.
    #[must_use]
    pub const fn uniform(len: Length) -> Self {
        Self {
            top: len,
            right: len,
            bottom: len,
            left: len,
        }
    }

    /// Resolves the margin against `root` into insets.
    ///
    /// Percentages on the left and right edges refer to the root width, on the
    /// top and bottom edges to the root height. Positive insets push each edge
    /// outward; see [`apply`](Self::apply).
    #[must_use]
    pub fn resolve(&self, root: Rect) -> Insets {
        let (w, h) = (root.width(), root.height());
        Insets::new(
            self.left.resolve(w),
            self.top.resolve(h),
            self.right.resolve(w),
            self.bottom.resolve(h),
        )
    }

    /// Returns `root` adjusted by this margin.
    #[must_use]
    pub fn apply(&self, root: Rect) -> Rect {
        let i = self.resolve(root);
        Rect::new(root.x0 - i.x0, root.y0 - i.y0, root.x1 + i.x1, root.y1 + i.y1)
    }

    /// The canonical `"<top> <right> <bottom> <left>"` form a browser's
    /// `rootMargin` option accepts.
    #[must_use]
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::SHRINK_BOTTOM_10
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Error returned when parsing a [`RootMargin`] from its CSS form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMarginError {
    /// The input contained no components.
    Empty,
    /// More than four components were given.
    TooManyValues,
    /// A component is not a finite number.
    InvalidLength,
    /// A non-zero component lacks a `px` or `%` unit.
    InvalidUnit,
}

impl fmt::Display for ParseMarginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "root margin is empty",
            Self::TooManyValues => "root margin takes at most four values",
            Self::InvalidLength => "root margin value is not a finite number",
            Self::InvalidUnit => "root margin value must be in pixels or percent",
        })
    }
}

impl core::error::Error for ParseMarginError {}

fn parse_length(token: &str) -> Result<Length, ParseMarginError> {
    let (number, make): (&str, fn(f64) -> Length) = if let Some(n) = token.strip_suffix("px") {
        (n, Length::Px)
    } else if let Some(n) = token.strip_suffix('%') {
        (n, Length::Percent)
    } else {
        // Only a bare zero may omit the unit.
        return match token.parse::<f64>() {
            Ok(v) if v == 0.0 => Ok(Length::Px(0.0)),
            Ok(_) => Err(ParseMarginError::InvalidUnit),
            Err(_) => Err(ParseMarginError::InvalidLength),
        };
    };
    match number.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(make(v)),
        _ => Err(ParseMarginError::InvalidLength),
    }
}

impl FromStr for RootMargin {
    type Err = ParseMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut values = [Length::Px(0.0); 4];
        let mut count = 0;
        for token in s.split_ascii_whitespace() {
            if count == 4 {
                return Err(ParseMarginError::TooManyValues);
            }
            values[count] = parse_length(token)?;
            count += 1;
        }
        let [a, b, c, d] = values;
        match count {
            0 => Err(ParseMarginError::Empty),
            1 => Ok(Self::uniform(a)),
            2 => Ok(Self {
                top: a,
                right: b,
                bottom: a,
                left: b,
            }),
            3 => Ok(Self {
                top: a,
                right: b,
                bottom: c,
                left: b,
            }),
            _ => Ok(Self {
                top: a,
                right: b,
                bottom: c,
                left: d,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ObserveConfig
// ---------------------------------------------------------------------------

/// Configuration for a single visibility binding.
///
/// The trigger snapshots this at bind time; later changes have no effect
/// until the caller binds again.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserveConfig {
    /// Minimum visible fraction of the element (0..=1) to count as entered.
    pub threshold: f64,
    /// Adjustment applied to the viewport for the intersection test.
    pub margin: RootMargin,
    /// Fire at most once and stop observing (`true`), or keep tracking.
    pub trigger_once: bool,
}

impl ObserveConfig {
    /// Threshold used when none (or NaN) is given.
    pub const DEFAULT_THRESHOLD: f64 = 0.1;

    /// Entrance-animation preset: 10% visible, bottom edge shrunk by 10px,
    /// one-shot.
    #[must_use]
    pub const fn entrance() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            margin: RootMargin::SHRINK_BOTTOM_10,
            trigger_once: true,
        }
    }

    /// Returns a copy with the given threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Returns a copy with the given margin.
    #[must_use]
    pub const fn with_margin(mut self, margin: RootMargin) -> Self {
        self.margin = margin;
        self
    }

    /// Returns a copy with the given one-shot mode.
    #[must_use]
    pub const fn with_trigger_once(mut self, trigger_once: bool) -> Self {
        self.trigger_once = trigger_once;
        self
    }

    /// The threshold clamped into `[0, 1]`, with NaN replaced by
    /// [`DEFAULT_THRESHOLD`](Self::DEFAULT_THRESHOLD).
    #[must_use]
    pub fn effective_threshold(&self) -> f64 {
        if self.threshold.is_nan() {
            Self::DEFAULT_THRESHOLD
        } else {
            self.threshold.clamp(0.0, 1.0)
        }
    }

    /// The options handed to the intersection host.
    #[must_use]
    pub fn observe_options(&self) -> ObserveOptions {
        ObserveOptions {
            threshold: self.effective_threshold(),
            margin: self.margin,
        }
    }
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self::entrance()
    }
}

/// What an [`IntersectionHost`](crate::host::IntersectionHost) needs to set
/// up a watch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserveOptions {
    /// Visible fraction at which the host should notify, already clamped.
    pub threshold: f64,
    /// Viewport adjustment.
    pub margin: RootMargin,
}

// ---------------------------------------------------------------------------
// SamplerPolicy
// ---------------------------------------------------------------------------

/// Error returned when a sampler tuning value is out of range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyError {
    /// The noise threshold is negative or not finite.
    InvalidNoiseThreshold,
    /// The saturation offset is not a finite positive number.
    InvalidMaxScroll,
    /// The maximum intensity is negative or not finite.
    InvalidMaxIntensity,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidNoiseThreshold => "noise threshold must be finite and non-negative",
            Self::InvalidMaxScroll => "max scroll must be finite and positive",
            Self::InvalidMaxIntensity => "max intensity must be finite and non-negative",
        })
    }
}

impl core::error::Error for PolicyError {}

/// Linear-then-clamped mapping from scroll offset to intensity.
///
/// `intensity = min(offset / max_scroll * max_intensity, max_intensity)`,
/// floored at zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntensityCurve {
    max_scroll: f64,
    max_intensity: f64,
}

impl IntensityCurve {
    /// Saturates at 3 once the offset reaches 200.
    pub const DEPTH_BLUR: Self = Self {
        max_scroll: 200.0,
        max_intensity: 3.0,
    };

    /// Creates a curve reaching `max_intensity` at `max_scroll`.
    pub fn new(max_scroll: f64, max_intensity: f64) -> Result<Self, PolicyError> {
        if !max_scroll.is_finite() || max_scroll <= 0.0 {
            return Err(PolicyError::InvalidMaxScroll);
        }
        if !max_intensity.is_finite() || max_intensity < 0.0 {
            return Err(PolicyError::InvalidMaxIntensity);
        }
        Ok(Self {
            max_scroll,
            max_intensity,
        })
    }

    /// Offset at which the curve saturates.
    #[must_use]
    pub const fn max_scroll(&self) -> f64 {
        self.max_scroll
    }

    /// Upper bound of the intensity range.
    #[must_use]
    pub const fn max_intensity(&self) -> f64 {
        self.max_intensity
    }

    /// Maps an offset to an intensity in `[0, max_intensity]`.
    #[must_use]
    pub fn intensity(&self, offset: f64) -> f64 {
        if offset.is_nan() || offset <= 0.0 {
            return 0.0;
        }
        (offset / self.max_scroll * self.max_intensity).min(self.max_intensity)
    }
}

impl Default for IntensityCurve {
    fn default() -> Self {
        Self::DEPTH_BLUR
    }
}

/// Tuning values for the scroll sampler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerPolicy {
    noise_threshold: f64,
    curve: IntensityCurve,
}

impl SamplerPolicy {
    /// Noise threshold of the depth-blur preset.
    pub const DEFAULT_NOISE_THRESHOLD: f64 = 5.0;

    /// Depth-of-field preset: ignore deltas under 5, saturate at 3 by 200.
    #[must_use]
    pub const fn depth_blur() -> Self {
        Self {
            noise_threshold: Self::DEFAULT_NOISE_THRESHOLD,
            curve: IntensityCurve::DEPTH_BLUR,
        }
    }

    /// Creates a policy from a noise threshold and curve.
    pub fn new(noise_threshold: f64, curve: IntensityCurve) -> Result<Self, PolicyError> {
        if !noise_threshold.is_finite() || noise_threshold < 0.0 {
            return Err(PolicyError::InvalidNoiseThreshold);
        }
        Ok(Self {
            noise_threshold,
            curve,
        })
    }

    /// Minimum delta from the last accepted offset for a sample to count.
    #[must_use]
    pub const fn noise_threshold(&self) -> f64 {
        self.noise_threshold
    }

    /// The offset-to-intensity mapping.
    #[must_use]
    pub const fn curve(&self) -> IntensityCurve {
        self.curve
    }
}

impl Default for SamplerPolicy {
    fn default() -> Self {
        Self::depth_blur()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn parses_four_value_margin() {
        let m: RootMargin = "0px 0px -10px 0px".parse().unwrap();
        assert_eq!(m, RootMargin::SHRINK_BOTTOM_10);
        assert_eq!(m, RootMargin::default());
    }

    #[test]
    fn parses_shorthand_forms() {
        let one: RootMargin = "5px".parse().unwrap();
        assert_eq!(one, RootMargin::uniform(Length::Px(5.0)));

        let two: RootMargin = "10% 0".parse().unwrap();
        assert_eq!(two.top, Length::Percent(10.0));
        assert_eq!(two.bottom, Length::Percent(10.0));
        assert_eq!(two.left, Length::Px(0.0));

        let three: RootMargin = "1px 2px 3px".parse().unwrap();
        assert_eq!(three.left, Length::Px(2.0));
        assert_eq!(three.bottom, Length::Px(3.0));
    }

    #[test]
    fn rejects_bad_margins() {
        assert_eq!("".parse::<RootMargin>(), Err(ParseMarginError::Empty));
        assert_eq!(
            "1px 1px 1px 1px 1px".parse::<RootMargin>(),
            Err(ParseMarginError::TooManyValues)
        );
        assert_eq!("10em".parse::<RootMargin>(), Err(ParseMarginError::InvalidLength));
        assert_eq!("10".parse::<RootMargin>(), Err(ParseMarginError::InvalidUnit));
        assert_eq!("NaNpx".parse::<RootMargin>(), Err(ParseMarginError::InvalidLength));
    }

    #[test]
    fn margin_display_round_trips() {
        let m = RootMargin::SHRINK_BOTTOM_10;
        assert_eq!(m.to_css(), "0px 0px -10px 0px");
        assert_eq!(m.to_string().parse::<RootMargin>(), Ok(m));
    }

    #[test]
    fn margin_resolves_percent_per_axis() {
        let root = Rect::new(0.0, 0.0, 400.0, 200.0);
        let m: RootMargin = "10% 0px -50% 25%".parse().unwrap();
        let insets = m.resolve(root);
        assert_eq!(insets.y0, 20.0);
        assert_eq!(insets.y1, -100.0);
        assert_eq!(insets.x0, 100.0);
        assert_eq!(m.apply(root), Rect::new(-100.0, -20.0, 400.0, 100.0));
    }

    #[test]
    fn default_margin_shrinks_bottom() {
        let root = Rect::new(0.0, 0.0, 800.0, 600.0);
        assert_eq!(
            RootMargin::default().apply(root),
            Rect::new(0.0, 0.0, 800.0, 590.0)
        );
    }

    #[test]
    fn threshold_is_clamped() {
        let c = ObserveConfig::default();
        assert_eq!(c.effective_threshold(), 0.1);
        assert_eq!(c.with_threshold(1.5).effective_threshold(), 1.0);
        assert_eq!(c.with_threshold(-0.5).effective_threshold(), 0.0);
        assert_eq!(c.with_threshold(f64::NAN).effective_threshold(), 0.1);
    }

    #[test]
    fn curve_is_linear_then_clamped() {
        let curve = IntensityCurve::DEPTH_BLUR;
        assert_eq!(curve.intensity(0.0), 0.0);
        assert_eq!(curve.intensity(100.0), 1.5);
        assert_eq!(curve.intensity(200.0), 3.0);
        assert_eq!(curve.intensity(5_000.0), 3.0);
        assert_eq!(curve.intensity(-40.0), 0.0);
        assert_eq!(curve.intensity(f64::NAN), 0.0);
    }

    #[test]
    fn policy_validation() {
        assert_eq!(IntensityCurve::new(0.0, 3.0), Err(PolicyError::InvalidMaxScroll));
        assert_eq!(
            IntensityCurve::new(200.0, f64::INFINITY),
            Err(PolicyError::InvalidMaxIntensity)
        );
        assert_eq!(
            SamplerPolicy::new(-1.0, IntensityCurve::DEPTH_BLUR),
            Err(PolicyError::InvalidNoiseThreshold)
        );
        let custom = SamplerPolicy::new(2.0, IntensityCurve::new(100.0, 1.0).unwrap()).unwrap();
        assert_eq!(custom.noise_threshold(), 2.0);
        assert_eq!(custom.curve().intensity(50.0), 0.5);
    }
}
