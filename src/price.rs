//! Currency text parsing and promotion math.
//!
//! Prices on both stores are rendered as `$1,234.50`. Parsing is deliberately
//! tolerant: anything that does not yield a positive finite amount becomes
//! `0.0`, which every caller treats as "no price".

const CURRENCY_SYMBOL: char = '$';

/// Parse displayed currency text into an amount.
///
/// Returns `0.0` when the text carries no currency symbol, is malformed, or is
/// not strictly positive. Never returns a negative or NaN value.
pub fn parse_price(text: &str) -> f64 {
    if !text.contains(CURRENCY_SYMBOL) {
        return 0.0;
    }

    let cleaned: String = text
        .chars()
        .filter(|c| *c != CURRENCY_SYMBOL && *c != ',')
        .collect();

    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Render an amount as two-decimal currency text.
pub fn format_price(value: f64) -> String {
    format!("{}{:.2}", CURRENCY_SYMBOL, value)
}

/// Reconcile an extracted original price against the current one.
///
/// Returns `(original, current)`. A non-positive original is unknown. An
/// original lower than the current price comes from a stale DOM fragment and
/// collapses to the current price.
pub fn reconcile(current: f64, original: f64) -> (Option<f64>, f64) {
    if original <= 0.0 {
        return (None, current);
    }
    if original < current {
        return (Some(current), current);
    }
    (Some(original), current)
}

/// Savings when the original price is strictly higher than the current one.
pub fn promotion(original: f64, current: f64) -> Option<f64> {
    (original > current).then(|| original - current)
}
