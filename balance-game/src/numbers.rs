//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round half toward positive infinity (`2.5 → 3`, `-2.5 → -2`) and clamp
/// into the i64 range. Returns `None` for non-finite values.
#[must_use]
pub fn round_half_up(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let rounded = (value + 0.5).floor().clamp(min, max);
    cast::<f64, i64>(rounded)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Integer percentage `part / whole`, rounded half up and clamped to `0..=100`.
#[must_use]
pub fn percent_of(part: i64, whole: i64) -> u8 {
    if whole <= 0 {
        return 0;
    }
    let ratio = i64_to_f64(part) / i64_to_f64(whole) * 100.0;
    let pct = round_half_up(ratio).unwrap_or(0).clamp(0, 100);
    u8::try_from(pct).unwrap_or(100)
}
