//! Fixed-point math utilities for deterministic resolution.
//!
//! Every probability, modifier and readiness value in the engine is a
//! fixed-point number so that two runs with the same seed produce
//! bit-identical results on any platform. Reference data is authored as
//! integer percentages and converted here.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Convert an integer percentage into a fraction (`150` becomes `1.5`).
#[must_use]
pub fn pct(percent: i64) -> Fixed {
    Fixed::from_num(percent) / Fixed::from_num(100)
}

/// Convert an unsigned count into fixed-point.
#[must_use]
pub fn fx(value: u32) -> Fixed {
    Fixed::from_num(value)
}

/// Build a fraction `numerator / denominator` without dividing by zero.
///
/// A zero denominator yields zero.
#[must_use]
pub fn ratio(numerator: Fixed, denominator: Fixed) -> Fixed {
    if denominator == Fixed::ZERO {
        Fixed::ZERO
    } else {
        numerator / denominator
    }
}

/// Clamp a value into the unit interval.
#[must_use]
pub fn unit_clamp(value: Fixed) -> Fixed {
    value.clamp(Fixed::ZERO, Fixed::ONE)
}

/// Clamp a hit or kill probability into the engine's playable band (5%-95%).
#[must_use]
pub fn clamp_hit_chance(value: Fixed) -> Fixed {
    value.clamp(pct(5), pct(95))
}

/// Raise `base` to a small non-negative integer power.
#[must_use]
pub fn powi(base: Fixed, exponent: u32) -> Fixed {
    let mut result = Fixed::ONE;
    for _ in 0..exponent {
        result = result.saturating_mul(base);
    }
    result
}

/// Round a non-negative fixed-point value to the nearest whole count.
///
/// Negative values become zero.
#[must_use]
pub fn to_count(value: Fixed) -> u32 {
    value.saturating_round().saturating_to_num::<u32>()
}

/// Scale a count of any size by a fraction, rounding to nearest.
///
/// Counts above `i32::MAX` do not fit a [`Fixed`], so the product is taken
/// on the raw bits. Negative fractions give zero.
#[must_use]
pub fn scale_count(count: u32, fraction: Fixed) -> u32 {
    let Ok(bits) = u128::try_from(fraction.to_bits()) else {
        return 0;
    };
    let scaled = (u128::from(count) * bits + (1 << (Fixed::FRAC_NBITS - 1))) >> Fixed::FRAC_NBITS;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// `value * percent / 100` without intermediate overflow.
#[must_use]
pub fn percent_of(value: u32, percent: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Express a fraction as a rounded integer percentage for reports.
#[must_use]
pub fn as_percent(value: Fixed) -> i64 {
    (value * Fixed::from_num(100)).round().saturating_to_num::<i64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_count_handles_large_counts() {
        assert_eq!(scale_count(100, pct(50)), 50);
        assert_eq!(scale_count(u32::MAX, Fixed::ONE), u32::MAX);
        assert_eq!(scale_count(4_000_000_000, pct(25)), 1_000_000_000);
        assert_eq!(scale_count(10, pct(-50)), 0);
        assert_eq!(percent_of(u32::MAX, 100), u32::MAX);
        assert_eq!(percent_of(50_000_000, 50), 25_000_000);
    }

    #[test]
    fn test_pct_conversion() {
        assert_eq!(pct(150), Fixed::from_num(1.5));
        assert_eq!(pct(0), Fixed::ZERO);
        assert_eq!(pct(100), Fixed::ONE);
    }

    #[test]
    fn test_fixed_determinism() {
        // Same operations must produce identical results
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);

        let result1 = a * Fixed::from_num(7);
        let result2 = b * Fixed::from_num(7);
        assert_eq!(result1, result2);
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(Fixed::from_num(5), Fixed::ZERO), Fixed::ZERO);
        assert_eq!(ratio(Fixed::from_num(6), Fixed::from_num(3)), Fixed::from_num(2));
    }

    #[test]
    fn test_hit_chance_band() {
        assert_eq!(clamp_hit_chance(Fixed::ZERO), pct(5));
        assert_eq!(clamp_hit_chance(Fixed::from_num(2)), pct(95));
        assert_eq!(clamp_hit_chance(pct(50)), pct(50));
    }

    #[test]
    fn test_powi_compounds() {
        let growth = pct(150);
        assert_eq!(powi(growth, 0), Fixed::ONE);
        assert_eq!(powi(growth, 1), pct(150));
        assert_eq!(powi(growth, 2), pct(225));
    }

    #[test]
    fn test_to_count_rounds() {
        assert_eq!(to_count(Fixed::from_num(3.9)), 4);
        assert_eq!(to_count(Fixed::from_num(3.4)), 3);
        assert_eq!(to_count(Fixed::from_num(100) * pct(5)), 5);
        assert_eq!(to_count(Fixed::from_num(-2)), 0);
    }

    #[test]
    fn test_as_percent() {
        assert_eq!(as_percent(pct(37)), 37);
    }
}
