//! Closed numeric ranges carrying 95% confidence bounds
//!
//! Every estimated quantity in the pipeline is an [`Interval`]. A degenerate
//! interval (`min == max`) represents a deterministic value. Operations never
//! mutate; they return a new interval.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// z-score of a two-sided 95% interval under a normal approximation
pub const Z_95: f64 = 1.96;

/// A `[min, max]` range of f64 values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Create an interval from explicit bounds
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Degenerate interval `[value, value]`
    pub const fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// The empty/zero interval produced for absent catalog fields
    pub const fn zero() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    /// Per-unit mean and standard deviation scaled to `unit_count` units.
    ///
    /// Returns `[max(0, n*(m - 1.96*s)), n*(m + 1.96*s)]`. The lower bound is
    /// floored at zero since no energy or latency may be negative.
    pub fn confidence_interval(per_unit_mean: f64, per_unit_stdev: f64, unit_count: f64) -> Self {
        let min = unit_count * (per_unit_mean - Z_95 * per_unit_stdev);
        let max = unit_count * (per_unit_mean + Z_95 * per_unit_stdev);
        Self {
            min: min.max(0.0),
            max,
        }
    }

    /// Pointwise sum
    pub fn add(self, other: Self) -> Self {
        Self {
            min: self.min + other.min,
            max: self.max + other.max,
        }
    }

    /// Pointwise multiplication by a scalar
    pub fn scale(self, k: f64) -> Self {
        Self {
            min: self.min * k,
            max: self.max * k,
        }
    }

    /// Apply `f` to each bound independently
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            min: f(self.min),
            max: f(self.max),
        }
    }

    /// Clip both bounds at zero
    pub fn clip_at_zero(self) -> Self {
        self.map(|v| v.max(0.0))
    }

    /// True when both bounds are zero
    pub fn is_zero(&self) -> bool {
        self.min == 0.0 && self.max == 0.0
    }

    /// True when `min == max`
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// True when `min <= max`
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn mean(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Self) -> Self::Output {
        Interval::add(self, rhs)
    }
}

impl Mul<f64> for Interval {
    type Output = Interval;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl From<f64> for Interval {
    fn from(value: f64) -> Self {
        Self::point(value)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_degenerate() {
            write!(f, "{:.4e}", self.min)
        } else {
            write!(f, "[{:.4e}, {:.4e}]", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_point_and_zero() {
        let p = Interval::point(15.0);
        assert_eq!(p, Interval::new(15.0, 15.0));
        assert!(p.is_degenerate());
        assert!(Interval::zero().is_zero());
        assert_eq!(Interval::default(), Interval::zero());
    }

    #[test]
    fn test_pointwise_arithmetic() {
        let a = Interval::new(1.0, 2.0);
        let b = Interval::new(0.5, 4.0);
        assert_eq!(a + b, Interval::new(1.5, 6.0));
        assert_eq!(a * 3.0, Interval::new(3.0, 6.0));
        assert_eq!(a.scale(0.0), Interval::zero());
    }

    #[test]
    fn test_confidence_interval_floors_at_zero() {
        // mean smaller than 1.96 * stdev drives the raw lower bound negative
        let ci = Interval::confidence_interval(1.0e-6, 1.0e-6, 100.0);
        assert_eq!(ci.min, 0.0);
        assert_abs_diff_eq!(ci.max, 100.0 * (1.0e-6 + 1.96e-6), epsilon = 1e-15);
    }

    #[test]
    fn test_confidence_interval_latency_regression() {
        let mean = 8.02e-4 * 10.0 + 2.23e-2;
        let ci = Interval::confidence_interval(mean, 7.00e-6, 100.0);
        assert_abs_diff_eq!(ci.min, 3.030628, epsilon = 1e-9);
        assert_abs_diff_eq!(ci.max, 3.033372, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_and_map() {
        let raw = Interval::new(-1.0, 2.0);
        assert_eq!(raw.clip_at_zero(), Interval::new(0.0, 2.0));
        assert_eq!(raw.map(|v| v * 2.0), Interval::new(-2.0, 4.0));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Interval::new(1.5, 2.5)).unwrap();
        assert_eq!(json, r#"{"min":1.5,"max":2.5}"#);
        let back: Interval = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Interval::new(1.5, 2.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::point(1.0).to_string(), "1.0000e0");
        assert!(Interval::new(1.0, 2.0).to_string().starts_with('['));
    }

    proptest! {
        #[test]
        fn prop_confidence_interval_formula(
            m in 0.0f64..1.0e3,
            s in 0.0f64..1.0e2,
            n in 0.0f64..1.0e5,
        ) {
            let ci = Interval::confidence_interval(m, s, n);
            prop_assert_eq!(ci.min, (n * (m - 1.96 * s)).max(0.0));
            prop_assert_eq!(ci.max, n * (m + 1.96 * s));
        }

        #[test]
        fn prop_confidence_interval_is_ordered_and_non_negative(
            m in 0.0f64..1.0e3,
            s in 0.0f64..1.0e2,
            n in 0.0f64..1.0e5,
        ) {
            let ci = Interval::confidence_interval(m, s, n);
            prop_assert!(ci.min >= 0.0);
            prop_assert!(ci.is_ordered());
        }

        #[test]
        fn prop_scale_preserves_order_for_non_negative_factor(
            lo in 0.0f64..1.0e6,
            width in 0.0f64..1.0e6,
            k in 0.0f64..1.0e3,
        ) {
            let scaled = Interval::new(lo, lo + width).scale(k);
            prop_assert!(scaled.is_ordered());
        }
    }
}
