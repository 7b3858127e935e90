//! Small numeric policies shared by both engines.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::Rate;

/// Amounts at or below this are treated as zero when testing shortfalls.
pub const TOLERANCE: Decimal = dec!(0.00000001);

/// Decimal places kept for reported rates and multiples.
pub const RATE_DP: u32 = 8;

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

/// `numerator / denominator`, falling back to `default` on a zero denominator.
pub fn div_or(numerator: Decimal, denominator: Decimal, default: Decimal) -> Decimal {
    safe_div(numerator, denominator).unwrap_or(default)
}

/// True when `value` is within [`TOLERANCE`] of zero.
pub fn is_negligible(value: Decimal) -> bool {
    value.abs() <= TOLERANCE
}

/// Banker's rounding for reported rates. Engine state is never rounded.
pub fn round_rate(value: Rate) -> Rate {
    value.round_dp_with_strategy(RATE_DP, RoundingStrategy::MidpointNearestEven)
}

/// Linear-interpolated percentile (`pct` in 0..=100) of an unsorted sample.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}
