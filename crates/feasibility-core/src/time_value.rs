//! Time-value primitives over annual cash-flow vectors.
//!
//! Convention: `flows[0]` is the year-0 outlay (negative for an investment)
//! and `flows[t]` the net flow at the end of year `t`. Every function is
//! total: degenerate input produces NaN or a sentinel, never an error.

use crate::types::Money;

const IRR_INITIAL_GUESS: f64 = 0.10;
const IRR_MAX_ITERATIONS: u32 = 100;
const IRR_TOLERANCE: f64 = 1e-6;
const IRR_DERIVATIVE_STEP: f64 = 1e-6;

/// Sentinel for a payback that never happens (or no initial investment).
pub const PAYBACK_NOT_ACHIEVED: f64 = -1.0;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Net present value of `flows` at `rate` (decimal, 0.10 = 10%).
///
/// `flows[0]` is taken at face value; later flows are discounted by a
/// running factor.
pub fn npv(rate: f64, flows: &[Money]) -> f64 {
    let mut discount = 1.0;
    let mut total = 0.0;
    for (t, flow) in flows.iter().enumerate() {
        if t > 0 {
            discount *= 1.0 + rate;
        }
        total += flow / discount;
    }
    total
}

/// Internal rate of return via Newton-Raphson.
///
/// Starts from a fixed 10% guess, uses a forward-difference derivative and
/// a budget of 100 iterations. Returns NaN when the flows never change
/// sign, the derivative vanishes, or the budget is exhausted.
pub fn irr(flows: &[Money]) -> f64 {
    let has_positive = flows.iter().any(|f| *f > 0.0);
    let has_negative = flows.iter().any(|f| *f < 0.0);
    if !has_positive || !has_negative {
        return f64::NAN;
    }

    let mut rate = IRR_INITIAL_GUESS;
    for _ in 0..IRR_MAX_ITERATIONS {
        let value = npv(rate, flows);
        if value.abs() < IRR_TOLERANCE {
            return rate;
        }
        let derivative = (npv(rate + IRR_DERIVATIVE_STEP, flows) - value) / IRR_DERIVATIVE_STEP;
        if derivative == 0.0 || !derivative.is_finite() {
            return f64::NAN;
        }
        rate -= value / derivative;
        if !rate.is_finite() {
            return f64::NAN;
        }
    }
    f64::NAN
}

/// Years until the cumulative flows first reach zero, interpolated linearly
/// inside the recovery year.
///
/// Returns [`PAYBACK_NOT_ACHIEVED`] when there is no initial investment
/// (`flows[0] >= 0`) or the investment is never recovered.
pub fn payback_period(flows: &[Money]) -> f64 {
    if flows.is_empty() || flows[0] >= 0.0 {
        return PAYBACK_NOT_ACHIEVED;
    }
    let mut cumulative = flows[0];
    for (t, flow) in flows.iter().enumerate().skip(1) {
        let previous = cumulative;
        cumulative += flow;
        if cumulative >= 0.0 {
            // previous < 0 here, so flow covers at least -previous
            return (t - 1) as f64 + (-previous / flow);
        }
    }
    PAYBACK_NOT_ACHIEVED
}

/// Payback measured on flows discounted at `rate`.
pub fn discounted_payback_period(flows: &[Money], rate: f64) -> f64 {
    let mut discount = 1.0;
    let discounted: Vec<f64> = flows
        .iter()
        .enumerate()
        .map(|(t, flow)| {
            if t > 0 {
                discount *= 1.0 + rate;
            }
            flow / discount
        })
        .collect();
    payback_period(&discounted)
}

/// Total return over the initial investment, in percent.
///
/// Zero when `flows[0]` is not an actual outlay.
pub fn return_on_investment(flows: &[Money]) -> f64 {
    let Some((initial, rest)) = flows.split_first() else {
        return 0.0;
    };
    let invested = -initial;
    if invested <= 0.0 {
        return 0.0;
    }
    rest.iter().sum::<f64>() / invested * 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npv_discounts_from_year_one() {
        let flows = [-1000.0, 500.0, 500.0, 500.0];
        let value = npv(0.10, &flows);
        // 500/1.1 + 500/1.21 + 500/1.331 - 1000
        assert!((value - 243.426).abs() < 0.01, "npv={value}");
    }

    #[test]
    fn test_npv_zero_rate_is_plain_sum() {
        let flows = [-100.0, 60.0, 60.0];
        assert!((npv(0.0, &flows) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_irr_recovers_known_rate() {
        // -100 now, 110 in a year: exactly 10%
        let rate = irr(&[-100.0, 110.0]);
        assert!((rate - 0.10).abs() < 1e-4, "irr={rate}");
    }

    #[test]
    fn test_irr_npv_round_trip() {
        let flows = [-1000.0, 300.0, 420.0, 680.0];
        let rate = irr(&flows);
        assert!(rate.is_finite());
        assert!(npv(rate, &flows).abs() < 1e-4);
    }

    #[test]
    fn test_irr_requires_sign_change() {
        assert!(irr(&[100.0, 50.0, 25.0]).is_nan());
        assert!(irr(&[-100.0, -50.0]).is_nan());
        assert!(irr(&[]).is_nan());
    }

    #[test]
    fn test_payback_interpolates_within_year() {
        // -1000, then 400/year: recovered 200/400 into year 3
        let flows = [-1000.0, 400.0, 400.0, 400.0];
        assert!((payback_period(&flows) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_payback_exact_year_boundary() {
        let flows = [-1000.0, 500.0, 500.0, 500.0];
        assert!((payback_period(&flows) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_payback_sentinel_cases() {
        assert_eq!(payback_period(&[-1000.0, 100.0]), PAYBACK_NOT_ACHIEVED);
        assert_eq!(payback_period(&[1000.0, -100.0]), PAYBACK_NOT_ACHIEVED);
        assert_eq!(payback_period(&[]), PAYBACK_NOT_ACHIEVED);
    }

    #[test]
    fn test_discounted_payback_lags_simple_payback() {
        let flows = [-1000.0, 400.0, 400.0, 400.0, 400.0];
        let simple = payback_period(&flows);
        let discounted = discounted_payback_period(&flows, 0.10);
        assert!(discounted > simple, "{discounted} vs {simple}");
    }

    #[test]
    fn test_roi_is_total_return_percent() {
        let flows = [-1000.0, 600.0, 600.0];
        assert!((return_on_investment(&flows) - 120.0).abs() < 1e-12);
    }

    #[test]
    fn test_roi_zero_without_investment() {
        assert_eq!(return_on_investment(&[0.0, 500.0]), 0.0);
        assert_eq!(return_on_investment(&[500.0, 500.0]), 0.0);
        assert_eq!(return_on_investment(&[]), 0.0);
    }
}
