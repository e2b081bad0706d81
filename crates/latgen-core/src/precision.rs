//! Numeric tolerance and formatting policy.
//!
//! All geometric decisions in lattice construction compare distances against a
//! single tolerance. The same threshold is used both to detect negative slice
//! lengths and to decide that a slice is short enough to be dropped, so the
//! value is carried around as an explicit, immutable [`Precision`] instead of
//! living in shared state.

use serde::Deserialize;

/// Default tolerance below which distances are treated as zero.
pub const DEFAULT_EPSILON: f64 = 1.0e-5;

/// Default number of fraction digits used when formatting distances.
pub const DEFAULT_FRACTION_DIGITS: usize = 6;

/// Tolerance and number-format settings for lattice construction.
///
/// # Examples
///
/// ```
/// use latgen_core::precision::Precision;
///
/// let precision = Precision::default();
/// assert!(precision.is_negligible(4.0e-6));
/// assert_eq!(precision.snap(-4.0e-6), 0.0);
/// assert!(precision.is_negative(-1.0e-3));
/// assert_eq!(precision.format(1.5), "1.500000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Precision {
    epsilon: f64,
    fraction_digits: usize,
}

impl Precision {
    /// Creates a precision policy with the given tolerance and fraction digits.
    pub fn new(epsilon: f64, fraction_digits: usize) -> Self {
        Self {
            epsilon: epsilon.abs(),
            fraction_digits,
        }
    }

    /// Returns the tolerance.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns the number of fraction digits used by [`Precision::format`].
    pub fn fraction_digits(&self) -> usize {
        self.fraction_digits
    }

    /// Returns `true` if `value` is strictly inside the tolerance band around zero.
    pub fn is_negligible(&self, value: f64) -> bool {
        value.abs() < self.epsilon
    }

    /// Returns `true` if `value` is negative beyond the tolerance.
    pub fn is_negative(&self, value: f64) -> bool {
        value < -self.epsilon
    }

    /// Returns `true` if `value` is positive beyond the tolerance.
    pub fn is_positive(&self, value: f64) -> bool {
        value > self.epsilon
    }

    /// Collapses negligible values to exactly zero.
    pub fn snap(&self, value: f64) -> f64 {
        if self.is_negligible(value) { 0.0 } else { value }
    }

    /// Formats a distance with the configured number of fraction digits.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.fraction_digits, self.snap(value))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON, DEFAULT_FRACTION_DIGITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_epsilon() {
        let precision = Precision::default();
        assert_eq!(precision.epsilon(), 1.0e-5);
        assert_eq!(precision.fraction_digits(), 6);
    }

    #[test]
    fn test_threshold_is_strict() {
        let precision = Precision::default();
        assert!(!precision.is_negligible(1.0e-5));
        assert!(!precision.is_negative(-1.0e-5));
        assert!(precision.is_negative(-1.1e-5));
        assert!(precision.is_positive(2.0e-5));
        assert!(!precision.is_positive(5.0e-6));
    }

    #[test]
    fn test_snap() {
        let precision = Precision::default();
        assert_eq!(precision.snap(9.0e-6), 0.0);
        assert_eq!(precision.snap(0.25), 0.25);
    }

    #[test]
    fn test_negative_epsilon_is_normalized() {
        let precision = Precision::new(-1.0e-3, 3);
        assert_eq!(precision.epsilon(), 1.0e-3);
        assert_eq!(precision.format(-0.0004), "0.000");
    }

    #[test]
    fn test_deserialize_partial() {
        let precision: Precision = toml::from_str("fraction_digits = 3").expect("valid toml");
        assert_eq!(precision.epsilon(), DEFAULT_EPSILON);
        assert_eq!(precision.format(2.0), "2.000");
    }
}
