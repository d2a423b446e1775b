//! The project's unlevered cash-flow statement.

use serde::{Deserialize, Serialize};

use crate::types::{EstimationBasis, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One operating year of the unlevered cash-flow statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    /// Project year (1-indexed).
    pub year: u32,
    pub revenue: Money,
    pub operating_costs: Money,
    pub depreciation: Money,
    pub ebit: Money,
    /// Cash taxes; zero when EBIT is negative (no loss carry-forward).
    pub tax: Money,
    pub nopat: Money,
    /// Working capital balance required at the end of the year.
    pub working_capital: Money,
    /// Working capital funded (or released) this year.
    pub working_capital_change: Money,
    pub capex: Money,
    /// Exit value recognised in the final year, zero elsewhere.
    pub terminal_value: Money,
    /// Salvage proceeds recognised in the final year, zero elsewhere.
    pub salvage_recovery: Money,
    /// Working capital released in the final year, zero elsewhere.
    pub working_capital_recovery: Money,
    /// Unlevered free cash flow.
    pub ufcf: Money,
}

/// Assembled statement plus the flow vector the valuation functions consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub rows: Vec<CashFlowYear>,
    /// `flows[0]` is the year-0 outlay; `flows[t]` the year-`t` UFCF.
    pub flows: Vec<Money>,
    /// Working capital balance per operating year.
    pub working_capital: Vec<Money>,
    /// Total money out the door at year 0: up-front capex plus initial
    /// working capital.
    pub initial_outlay: Money,
}

/// Inputs to the statement builder, already reduced to annual series.
#[derive(Debug, Clone, Copy)]
pub struct StatementInputs<'a> {
    pub basis: &'a EstimationBasis,
    pub revenue: &'a [f64],
    pub variable_costs: &'a [f64],
    pub fixed_costs: &'a [f64],
    pub depreciation: &'a [f64],
    pub capex: &'a [f64],
    pub initial_capex: f64,
    pub total_salvage: f64,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the unlevered cash-flow statement.
///
/// Taxes apply to positive EBIT only. Working capital tracks the configured
/// percentage of revenue, is funded through its annual change, and is
/// released in full in the final year together with terminal value and
/// salvage proceeds.
pub fn build_statement(inputs: StatementInputs) -> CashFlowStatement {
    let basis = inputs.basis;
    let life = basis.project_life_years as usize;
    let initial_working_capital =
        basis.initial_current_assets - basis.initial_current_liabilities;
    let initial_outlay = inputs.initial_capex + initial_working_capital;

    let mut rows = Vec::with_capacity(life);
    let mut flows = Vec::with_capacity(life + 1);
    let mut working_capital = Vec::with_capacity(life);
    flows.push(-initial_outlay);

    let mut prior_wc = initial_working_capital;
    for idx in 0..life {
        let revenue = inputs.revenue[idx];
        let operating_costs = inputs.variable_costs[idx] + inputs.fixed_costs[idx];
        let depreciation = inputs.depreciation[idx];
        let ebit = revenue - operating_costs - depreciation;
        let tax = ebit.max(0.0) * basis.tax_rate / 100.0;
        let nopat = ebit - tax;
        let wc = revenue * basis.working_capital_pct / 100.0;
        let wc_change = wc - prior_wc;
        let capex = inputs.capex[idx];

        let is_final = idx + 1 == life;
        let terminal_value = if is_final && ebit > 0.0 {
            ebit * basis.ebit_multiple
        } else {
            0.0
        };
        let salvage_recovery = if is_final { inputs.total_salvage } else { 0.0 };
        let working_capital_recovery = if is_final { wc } else { 0.0 };

        let ufcf = nopat + depreciation - wc_change - capex
            + terminal_value
            + salvage_recovery
            + working_capital_recovery;

        rows.push(CashFlowYear {
            year: idx as u32 + 1,
            revenue,
            operating_costs,
            depreciation,
            ebit,
            tax,
            nopat,
            working_capital: wc,
            working_capital_change: wc_change,
            capex,
            terminal_value,
            salvage_recovery,
            working_capital_recovery,
            ufcf,
        });
        flows.push(ufcf);
        working_capital.push(wc);
        prior_wc = wc;
    }

    CashFlowStatement {
        rows,
        flows,
        working_capital,
        initial_outlay,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
