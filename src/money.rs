//! Currency conversion over integer minor units.
//!
//! All monetary values in this crate are integer cents (minor units). The
//! tracker deals in exactly one currency pair, USD and UYU, with the exchange
//! rate quoted as "1 USD = `rate` UYU".

use crate::Error;

/// The currency amounts are converted into before aggregation when the
/// profile does not specify one.
pub const DEFAULT_BASE_CURRENCY: &str = "UYU";

/// Convert `amount_cents` from one currency to another at `rate`.
///
/// The rate is quoted as "1 USD = `rate` UYU", so converting USD to UYU
/// multiplies and converting UYU to USD divides. Results are rounded to the
/// nearest minor unit, halves away from zero.
///
/// Amounts in a currency outside the supported pair are returned unconverted.
/// This favours availability over correctness and produces wrong totals if a
/// third currency ever holds a meaningful share of the data.
///
/// # Errors
/// Returns [Error::InvalidRate] if `rate` is not a finite, positive number.
/// Callers are expected to fall back to a configured default rate instead of
/// converting with a stale or undefined one.
pub fn convert(amount_cents: i64, from: &str, to: &str, rate: f64) -> Result<i64, Error> {
    if from == to {
        return Ok(amount_cents);
    }

    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::InvalidRate(rate));
    }

    match (from, to) {
        ("USD", "UYU") => Ok(round_half_up(amount_cents as f64 * rate)),
        ("UYU", "USD") => Ok(round_half_up(amount_cents as f64 / rate)),
        _ => Ok(amount_cents),
    }
}

/// Convert `amount_cents` into the user's base currency.
///
/// Shortcut for [convert] used by the budget engine and the statistics
/// aggregator, which always normalise towards one currency.
pub fn convert_to_base(
    amount_cents: i64,
    currency: &str,
    base_currency: &str,
    rate: f64,
) -> Result<i64, Error> {
    convert(amount_cents, currency, base_currency, rate)
}

// f64::round rounds halves away from zero, which is round-half-up for the
// non-negative amounts transactions are allowed to carry.
fn round_half_up(value: f64) -> i64 {
    value.round() as i64
}
