//! # Clamped Numeric Value Types
//!
//! Continuous values in the compliance model (fulfillment percentages,
//! mapping strengths, similarity signals, confidences) are advisory rather
//! than integrity-critical. Out-of-range input is therefore corrected, never
//! rejected: every constructor here clamps into the valid range and logs the
//! correction at `debug` level.
//!
//! Deserialization routes through the same clamping constructors, so a
//! dataset containing `fulfillment_percentage: 140` loads as `100`.

use serde::{Deserialize, Deserializer, Serialize};

/// Round `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Percentage (0–100)
// ---------------------------------------------------------------------------

/// An integer percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    /// 0%.
    pub const ZERO: Self = Self(0);
    /// 100%.
    pub const FULL: Self = Self(100);

    /// Construct from any integer, clamping into `[0, 100]`.
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(0, 100);
        if clamped != value {
            tracing::debug!(input = value, stored = clamped, "percentage clamped");
        }
        Self(clamped as u8)
    }

    /// Construct from a float, rounding to the nearest integer first.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self::clamped(value.round() as i64)
    }

    /// The stored value.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this is exactly 100%.
    pub fn is_full(self) -> bool {
        self.0 == 100
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<u8> for Percentage {
    fn from(value: u8) -> Self {
        Self::clamped(i64::from(value))
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::clamped(raw))
    }
}

// ---------------------------------------------------------------------------
// MappingStrength (0–150)
// ---------------------------------------------------------------------------

/// How much of a target requirement a source requirement satisfies.
///
/// Ranges over `[0, 150]`: values above 100 model a source that is stricter
/// than the target (over-satisfaction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct MappingStrength(u8);

impl MappingStrength {
    /// Upper bound of the range.
    pub const MAX: u8 = 150;

    /// Construct from any integer, clamping into `[0, 150]`.
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(0, i64::from(Self::MAX));
        if clamped != value {
            tracing::debug!(input = value, stored = clamped, "mapping strength clamped");
        }
        Self(clamped as u8)
    }

    /// The stored value.
    pub fn value(self) -> u8 {
        self.0
    }

    /// The strength as a multiplier (`100` → `1.0`).
    pub fn as_ratio(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl std::fmt::Display for MappingStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl<'de> Deserialize<'de> for MappingStrength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::clamped(raw))
    }
}

// ---------------------------------------------------------------------------
// UnitScore (0.0–1.0)
// ---------------------------------------------------------------------------

/// A similarity signal or fraction in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct UnitScore(f64);

impl UnitScore {
    /// 0.0.
    pub const ZERO: Self = Self(0.0);
    /// 1.0.
    pub const ONE: Self = Self(1.0);

    /// Construct from any float, clamping into `[0, 1]`. NaN becomes 0.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// The stored value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for UnitScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Ok(Self::clamped(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percentage_clamps_both_ends() {
        assert_eq!(Percentage::clamped(-10).value(), 0);
        assert_eq!(Percentage::clamped(150).value(), 100);
        assert_eq!(Percentage::clamped(42).value(), 42);
    }

    #[test]
    fn percentage_from_f64_rounds_half_away_from_zero() {
        assert_eq!(Percentage::from_f64(49.5).value(), 50);
        assert_eq!(Percentage::from_f64(49.4).value(), 49);
        assert_eq!(Percentage::from_f64(f64::NAN).value(), 0);
    }

    #[test]
    fn percentage_deserialize_clamps() {
        let p: Percentage = serde_json::from_str("140").unwrap();
        assert_eq!(p, Percentage::FULL);
        let p: Percentage = serde_json::from_str("-3").unwrap();
        assert_eq!(p, Percentage::ZERO);
    }

    #[test]
    fn mapping_strength_clamps_to_150() {
        assert_eq!(MappingStrength::clamped(200).value(), 150);
        assert_eq!(MappingStrength::clamped(-1).value(), 0);
        assert!((MappingStrength::clamped(50).as_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unit_score_clamps_and_rejects_nan() {
        assert_eq!(UnitScore::clamped(1.7).value(), 1.0);
        assert_eq!(UnitScore::clamped(-0.2).value(), 0.0);
        assert_eq!(UnitScore::clamped(f64::NAN).value(), 0.0);
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(40.0, 2), 40.0);
        assert_eq!(round_to(33.333_33, 2), 33.33);
        assert_eq!(round_to(66.666_66, 2), 66.67);
    }

    proptest! {
        #[test]
        fn percentage_always_in_range(v in -10i64..=150) {
            let p = Percentage::clamped(v);
            prop_assert!(p.value() <= 100);
            if (0..=100).contains(&v) {
                prop_assert_eq!(i64::from(p.value()), v);
            }
        }

        #[test]
        fn mapping_strength_always_in_range(v in -50i64..=200) {
            let s = MappingStrength::clamped(v);
            prop_assert!(s.value() <= MappingStrength::MAX);
            prop_assert_eq!(i64::from(s.value()), v.clamp(0, 150));
        }
    }
}
