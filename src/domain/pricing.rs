//! Pricing rules: distance-to-price conversion and margin application.
//!
//! Monetary values are kept unrounded here; only the presentation layer
//! rounds to 2 decimals, so aggregating over the ledger does not compound
//! rounding error.

/// Price of one road leg: per-km rate against a minimum-price floor.
/// Callers guarantee non-negative inputs.
pub fn leg_price(distance_km: f64, per_km: f64, minimum: f64) -> f64 {
    (distance_km * per_km).max(minimum)
}

/// Outcome of applying a signed margin percentage to a subtotal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarginOutcome {
    pub margin_amount: f64,
    pub total: f64,
}

/// Applies an operator margin to a subtotal. Positive percent is a markup,
/// negative a discount; the amount itself is always the absolute share.
pub fn apply_margin(subtotal: f64, margin_percent: i32) -> MarginOutcome {
    // unsigned_abs: i32::MIN has no i32 absolute value.
    let margin_amount = subtotal * f64::from(margin_percent.unsigned_abs()) / 100.0;
    let total = if margin_percent > 0 {
        subtotal + margin_amount
    } else if margin_percent < 0 {
        subtotal - margin_amount
    } else {
        subtotal
    };

    MarginOutcome {
        margin_amount,
        total,
    }
}

/// Formats a monetary amount for display. The single place where money gets
/// rounded to 2 decimals.
pub fn format_money(amount: f64) -> String {
    format!("{amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_price_uses_rate_above_the_floor() {
        assert_eq!(leg_price(200.0, 2.5, 450.0), 500.0);
    }

    #[test]
    fn leg_price_never_undercuts_the_minimum() {
        assert_eq!(leg_price(3.0, 2.5, 450.0), 450.0);
        assert_eq!(leg_price(0.0, 3.0, 300.0), 300.0);
    }

    #[test]
    fn zero_margin_is_identity() {
        let outcome = apply_margin(1310.0, 0);
        assert_eq!(outcome.margin_amount, 0.0);
        assert_eq!(outcome.total, 1310.0);
    }

    #[test]
    fn positive_margin_is_a_markup() {
        let outcome = apply_margin(100.0, 10);
        assert_eq!(outcome.margin_amount, 10.0);
        assert_eq!(outcome.total, 110.0);
    }

    #[test]
    fn negative_margin_is_a_discount() {
        let outcome = apply_margin(100.0, -10);
        assert_eq!(outcome.margin_amount, 10.0);
        assert_eq!(outcome.total, 90.0);
    }

    #[test]
    fn extreme_discount_percentages_do_not_overflow() {
        let outcome = apply_margin(100.0, i32::MIN);
        assert_eq!(outcome.margin_amount, 100.0 * 2147483648.0 / 100.0);
        assert_eq!(outcome.total, 100.0 - outcome.margin_amount);

        let outcome = apply_margin(100.0, i32::MAX);
        assert_eq!(outcome.total, 100.0 + outcome.margin_amount);
    }

    #[test]
    fn money_rounds_only_at_formatting() {
        assert_eq!(format_money(1441.0), "1441.00");
        assert_eq!(format_money(1234.567), "1234.57");
    }
}
