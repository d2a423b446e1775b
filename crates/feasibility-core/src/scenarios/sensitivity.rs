//! One-variable-at-a-time "tornado" analysis.
//!
//! Each input category is scaled by a fixed +10% shift and the full pipeline
//! is re-run; the row reports the relative change in the chosen KPI. Rows
//! come back in the order the variables were requested, never re-sorted by
//! impact.

use serde::{Deserialize, Serialize};

use crate::engine::{self, Kpis};
use crate::types::{CostBasis, ProjectData};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input categories that can be shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensitivityVariable {
    InvestmentCost,
    Revenue,
    VariableCost,
    FixedCost,
    DiscountRate,
}

/// KPI the tornado is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensitivityKpi {
    Npv,
    Irr,
    Roi,
    PaybackPeriod,
}

/// One bar of the tornado chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub variable: SensitivityVariable,
    pub base_value: f64,
    pub shifted_value: f64,
    /// Relative change in percent; `±ZERO_BASE_CHANGE_PCT` when the base KPI
    /// is exactly zero.
    pub change_pct: f64,
}

/// Multiplier applied to the shifted category.
pub const SHIFT_FACTOR: f64 = 1.10;

/// Stands in for an undefined relative change on a zero base.
pub const ZERO_BASE_CHANGE_PCT: f64 = 9_999.0;

/// Shift order used when the caller has no preference.
pub const DEFAULT_VARIABLES: [SensitivityVariable; 5] = [
    SensitivityVariable::InvestmentCost,
    SensitivityVariable::Revenue,
    SensitivityVariable::VariableCost,
    SensitivityVariable::FixedCost,
    SensitivityVariable::DiscountRate,
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the tornado for one KPI over the given variables, in order.
pub fn run_sensitivity(
    project: &ProjectData,
    kpi: SensitivityKpi,
    variables: &[SensitivityVariable],
) -> Vec<SensitivityRow> {
    let base_value = kpi.value(&engine::calculate_outputs(project).kpis);
    variables
        .iter()
        .map(|&variable| {
            let shifted_project = apply_shift(project, variable);
            let shifted_value = kpi.value(&engine::calculate_outputs(&shifted_project).kpis);
            SensitivityRow {
                variable,
                base_value,
                shifted_value,
                change_pct: relative_change_pct(base_value, shifted_value),
            }
        })
        .collect()
}

impl SensitivityKpi {
    fn value(self, kpis: &Kpis) -> f64 {
        match self {
            SensitivityKpi::Npv => kpis.npv,
            SensitivityKpi::Irr => kpis.irr,
            SensitivityKpi::Roi => kpis.roi,
            SensitivityKpi::PaybackPeriod => kpis.payback_period,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn relative_change_pct(base: f64, shifted: f64) -> f64 {
    if base == 0.0 {
        if shifted > 0.0 {
            ZERO_BASE_CHANGE_PCT
        } else if shifted < 0.0 {
            -ZERO_BASE_CHANGE_PCT
        } else {
            0.0
        }
    } else {
        (shifted - base) / base.abs() * 100.0
    }
}

fn apply_shift(project: &ProjectData, variable: SensitivityVariable) -> ProjectData {
    let mut shifted = project.clone();
    match variable {
        SensitivityVariable::InvestmentCost => {
            for item in &mut shifted.capital_items {
                item.cost *= SHIFT_FACTOR;
            }
        }
        SensitivityVariable::Revenue => {
            for item in &mut shifted.revenue_items {
                item.unit_price *= SHIFT_FACTOR;
            }
        }
        SensitivityVariable::VariableCost => {
            for item in &mut shifted.operating_cost_items {
                if let CostBasis::RawMaterials { unit_cost, .. } = &mut item.basis {
                    *unit_cost *= SHIFT_FACTOR;
                }
            }
        }
        SensitivityVariable::FixedCost => {
            for item in &mut shifted.operating_cost_items {
                match &mut item.basis {
                    CostBasis::Labor { monthly_salary, .. } => *monthly_salary *= SHIFT_FACTOR,
                    CostBasis::GeneralAdmin { annual_cost } => *annual_cost *= SHIFT_FACTOR,
                    CostBasis::RawMaterials { .. } => {}
                }
            }
        }
        SensitivityVariable::DiscountRate => {
            shifted.estimation_basis.discount_rate *= SHIFT_FACTOR;
        }
    }
    shifted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
