//! Break-even analysis: per-year operating break-even and the cumulative
//! time-based view.

use serde::{Deserialize, Serialize};

use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Operating break-even for one project year.
///
/// Sentinel conventions: break-even revenue is +∞ when the contribution
/// margin is not positive (fixed costs can never be covered), and the margin
/// of safety is −∞ in that case. A fully zero year reports all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenYear {
    /// Project year (1-indexed).
    pub year: u32,
    pub revenue: Money,
    pub variable_costs: Money,
    pub fixed_costs: Money,
    /// `(revenue − variable costs) / revenue`; zero when revenue is zero.
    pub contribution_margin_ratio: f64,
    pub break_even_revenue: Money,
    /// Fraction of revenue above break-even.
    pub margin_of_safety: f64,
}

/// One step of the cumulative revenue-vs-cost race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeBreakEvenYear {
    /// Project year (1-indexed).
    pub year: u32,
    pub cumulative_revenue: Money,
    /// Cumulative operating costs and capex, seeded with the initial outlay.
    pub cumulative_costs: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Break-even for a single year's figures.
pub fn break_even_year(
    year: u32,
    revenue: f64,
    variable_costs: f64,
    fixed_costs: f64,
) -> BreakEvenYear {
    if revenue == 0.0 && variable_costs == 0.0 && fixed_costs == 0.0 {
        return BreakEvenYear {
            year,
            revenue,
            variable_costs,
            fixed_costs,
            contribution_margin_ratio: 0.0,
            break_even_revenue: 0.0,
            margin_of_safety: 0.0,
        };
    }

    let contribution_margin_ratio = if revenue != 0.0 {
        (revenue - variable_costs) / revenue
    } else {
        0.0
    };

    let break_even_revenue = if contribution_margin_ratio > 0.0 {
        fixed_costs / contribution_margin_ratio
    } else {
        f64::INFINITY
    };

    let margin_of_safety = if break_even_revenue.is_infinite() {
        f64::NEG_INFINITY
    } else if revenue > break_even_revenue {
        (revenue - break_even_revenue) / revenue
    } else {
        0.0
    };

    BreakEvenYear {
        year,
        revenue,
        variable_costs,
        fixed_costs,
        contribution_margin_ratio,
        break_even_revenue,
        margin_of_safety,
    }
}

/// Per-year break-even rows over the whole horizon.
pub fn annual_break_even(
    revenue: &[f64],
    variable_costs: &[f64],
    fixed_costs: &[f64],
) -> Vec<BreakEvenYear> {
    revenue
        .iter()
        .enumerate()
        .map(|(idx, rev)| {
            break_even_year(idx as u32 + 1, *rev, variable_costs[idx], fixed_costs[idx])
        })
        .collect()
}

/// Cumulative revenue against cumulative cost, the cost ladder starting at
/// the total initial outlay.
pub fn cumulative_break_even(
    revenue: &[f64],
    operating_costs: &[f64],
    capex: &[f64],
    initial_outlay: f64,
) -> Vec<CumulativeBreakEvenYear> {
    let mut cumulative_revenue = 0.0;
    let mut cumulative_costs = initial_outlay;
    revenue
        .iter()
        .enumerate()
        .map(|(idx, rev)| {
            cumulative_revenue += rev;
            cumulative_costs += operating_costs[idx] + capex[idx];
            CumulativeBreakEvenYear {
                year: idx as u32 + 1,
                cumulative_revenue,
                cumulative_costs,
            }
        })
        .collect()
}

/// First year (1-indexed) in which cumulative revenue reaches cumulative
/// cost.
pub fn first_break_even_year(series: &[CumulativeBreakEvenYear]) -> Option<u32> {
    series
        .iter()
        .find(|step| step.cumulative_revenue >= step.cumulative_costs)
        .map(|step| step.year)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
