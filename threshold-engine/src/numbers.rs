//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count to f64, allowing precision loss in a single location.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a trial count to f64.
#[must_use]
pub fn trials_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Clamp a probability into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Probability rendered as a whole percent, e.g. `0.891 -> 89`.
#[must_use]
pub fn probability_percent(probability: f64) -> i32 {
    round_f64_to_i32(clamp_probability(probability) * 100.0)
}

/// Convert a u32 to usize, saturating on narrow targets.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(probability_percent(0.891), 89);
        assert_eq!(probability_percent(0.896), 90);
        assert_eq!(probability_percent(1.2), 100);
        assert_eq!(probability_percent(f64::NAN), 0);
    }

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i32(1.6), 2);
        assert_eq!(round_f64_to_i32(f64::NAN), 0);
        assert_eq!(round_f64_to_i32(f64::from(i32::MAX) * 2.0), i32::MAX);
    }

    #[test]
    fn clamp_handles_drift() {
        assert!((clamp_probability(1.000_000_000_1) - 1.0).abs() < f64::EPSILON);
        assert!(clamp_probability(-1e-12).abs() < f64::EPSILON);
        assert!((count_to_f64(30) - 30.0).abs() < f64::EPSILON);
        assert_eq!(u32_to_usize(7), 7);
    }
}
