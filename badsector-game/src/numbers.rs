//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).floor();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Rounded percentage of `part` over `whole`, clamped to `0..=100`.
///
/// An empty `whole` reads as 0%.
#[must_use]
pub fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let ratio = usize_to_f64(part) / usize_to_f64(whole);
    let pct = (ratio * 100.0).round().clamp(0.0, 100.0);
    cast::<f64, u8>(pct).unwrap_or(0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a u32 amount (damage, item value) into gauge units.
#[must_use]
pub fn u32_to_f32(value: u32) -> f32 {
    cast::<u32, f32>(value).unwrap_or(f32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_clamps_and_handles_nan() {
        assert_eq!(floor_f64_to_u32(9.99), 9);
        assert_eq!(floor_f64_to_u32(-3.0), 0);
        assert_eq!(floor_f64_to_u32(f64::NAN), 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(rounded_percent(2, 4), 50);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(4, 4), 100);
        assert_eq!(rounded_percent(1, 0), 0);
    }

    #[test]
    fn gauge_amounts_convert_exactly() {
        assert!((u32_to_f32(45) - 45.0).abs() < f32::EPSILON);
        assert!(u32_to_f32(0).abs() < f32::EPSILON);
    }
}
