//! Margin series and balance-sheet ratios.

use serde::{Deserialize, Serialize};

use crate::types::{EstimationBasis, Money};

use super::cash_flow::CashFlowYear;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Profitability margins for one project year, as fractions of revenue.
/// Zero-revenue years report zero margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginYear {
    /// Project year (1-indexed).
    pub year: u32,
    /// `(revenue − operating costs) / revenue`.
    pub ebitda_margin: f64,
    /// `EBIT / revenue`.
    pub operating_margin: f64,
    /// `NOPAT / revenue`.
    pub net_margin: f64,
}

/// Leverage and liquidity snapshot at project start.
///
/// Every ratio is +∞ when its denominator is exactly zero; none of them
/// ever raises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageRatios {
    /// Initial debt over initial equity (equity = investment + working
    /// capital − debt).
    pub debt_to_equity: f64,
    pub current_ratio: f64,
    /// Current ratio with inventory stripped from the numerator.
    pub quick_ratio: f64,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `numerator / denominator`, with the whole family's zero-denominator
/// convention: +∞ instead of a NaN or an error.
pub(crate) fn ratio_or_infinite(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::INFINITY
    } else {
        numerator / denominator
    }
}

/// Margin rows for each year of the statement.
pub fn margin_series(rows: &[CashFlowYear]) -> Vec<MarginYear> {
    rows.iter()
        .map(|row| {
            if row.revenue == 0.0 {
                return MarginYear {
                    year: row.year,
                    ebitda_margin: 0.0,
                    operating_margin: 0.0,
                    net_margin: 0.0,
                };
            }
            MarginYear {
                year: row.year,
                ebitda_margin: (row.revenue - row.operating_costs) / row.revenue,
                operating_margin: row.ebit / row.revenue,
                net_margin: row.nopat / row.revenue,
            }
        })
        .collect()
}

/// Leverage and liquidity ratios from the opening balance sheet.
pub fn leverage_ratios(
    basis: &EstimationBasis,
    initial_capex: Money,
    initial_working_capital: Money,
    initial_debt: Money,
) -> LeverageRatios {
    let equity = initial_capex + initial_working_capital - initial_debt;
    LeverageRatios {
        debt_to_equity: ratio_or_infinite(initial_debt, equity),
        current_ratio: ratio_or_infinite(
            basis.initial_current_assets,
            basis.initial_current_liabilities,
        ),
        quick_ratio: ratio_or_infinite(
            basis.initial_current_assets - basis.initial_inventory,
            basis.initial_current_liabilities,
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
