//! Money rounding using rust_decimal
//!
//! Values travel as `f64`; sums and rounding happen in `Decimal` so the
//! result carries no float noise beyond two decimals.

use rust_decimal::prelude::*;

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64, rounded half away from zero to 2 places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a monetary f64 to 2 decimals
#[inline]
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Sum monetary values in Decimal and round once
pub fn sum_money<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    to_f64(values.into_iter().map(to_decimal).sum())
}

/// Equal once both sides are rounded to cents
pub fn money_eq(a: f64, b: f64) -> bool {
    round_money(a) == round_money(b)
}
