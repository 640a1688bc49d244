// Money helpers - two-decimal convention
//
// Amounts are stored as f64 exactly as computed (e.g. 100/3 stays unrounded).
// Rounding to cents only happens when comparing or displaying.

use crate::error::{LedgerError, LedgerResult};

/// Default currency glyph used for display
pub const DEFAULT_CURRENCY: &str = "₹";

/// Half a cent: anything below this is treated as zero
pub const CENT_TOLERANCE: f64 = 0.005;

/// Relative slack for summation error in `exceeds`
pub const FLOAT_NOISE: f64 = 1e-9;

/// Round to two decimals (cents)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `lhs > rhs` in cents, or by any sub-cent amount larger than float noise
///
/// 33.33 + 33.33 + 33.34 does not exceed 100.0, but 10.004 exceeds 10.0.
pub fn exceeds(lhs: f64, rhs: f64) -> bool {
    round2(lhs) > round2(rhs) || lhs - rhs > FLOAT_NOISE * rhs.abs().max(1.0)
}

/// Equal within half a cent
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < CENT_TOLERANCE
}

/// Format an amount with the currency glyph, e.g. `₹100.00`
pub fn format_amount(symbol: &str, value: f64) -> String {
    // + 0.0 turns -0.0 into 0.0
    format!("{}{:.2}", symbol, round2(value) + 0.0)
}

/// Parse an expense total typed by the user
///
/// Blank, non-numeric, non-finite, zero and negative values are all rejected
/// with `InvalidAmount`.
pub fn parse_amount(raw: &str) -> LedgerResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidAmount("amount is empty".to_string()));
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| LedgerError::InvalidAmount(format!("'{}' is not a number", trimmed)))?;

    validate_total(value)?;
    Ok(value)
}

/// Check that a total is a positive finite number
pub fn validate_total(total: f64) -> LedgerResult<()> {
    if !total.is_finite() {
        return Err(LedgerError::InvalidAmount(format!("{} is not a finite number", total)));
    }
    if total <= 0.0 {
        return Err(LedgerError::InvalidAmount(format!(
            "total must be greater than zero, got {}",
            total
        )));
    }
    Ok(())
}
