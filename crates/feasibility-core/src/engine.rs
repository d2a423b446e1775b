//! The deterministic calculation pipeline.
//!
//! `calculate_outputs` is a pure function from [`ProjectData`] to
//! [`CalculatedOutputs`]: schedules, the cash-flow statement, break-even
//! analysis, margins, the consolidated loan ladder and the scalar KPI
//! block. It never fails; degenerate numeric input surfaces as NaN,
//! infinity or sentinel values in the outputs.

use serde::{Deserialize, Serialize};

use crate::financing::amortization::{self, ConsolidatedLoanYear};
use crate::projection::{depreciation, schedules};
use crate::time_value;
use crate::types::{Money, ProjectData};
use crate::valuation::break_even::{self, BreakEvenYear, CumulativeBreakEvenYear};
use crate::valuation::cash_flow::{self, CashFlowStatement, CashFlowYear, StatementInputs};
use crate::valuation::ratios::{self, MarginYear};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Scalar headline figures.
///
/// `first_operating_year` is the first year with strictly positive revenue;
/// the break-even snapshot is quoted from that year so pre-revenue ramp-up
/// years do not distort it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub npv: f64,
    /// NaN when the flows never change sign or the solver fails.
    pub irr: f64,
    /// Total return over the initial investment, percent.
    pub roi: f64,
    /// −1 when never recovered.
    pub payback_period: f64,
    /// −1 when never recovered.
    pub discounted_payback_period: f64,
    /// Present value of the operating flows (NPV excluding the outlay).
    pub enterprise_value: f64,
    pub debt_to_equity: f64,
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub first_operating_year: Option<u32>,
    pub break_even_revenue: Money,
    pub margin_of_safety: f64,
}

/// Everything the engine derives from one project, recomputed wholesale on
/// every input change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedOutputs {
    pub revenue_schedule: Vec<f64>,
    pub variable_cost_schedule: Vec<f64>,
    pub fixed_cost_schedule: Vec<f64>,
    pub operating_cost_schedule: Vec<f64>,
    pub depreciation_schedule: Vec<f64>,
    pub capex_schedule: Vec<f64>,
    pub working_capital_schedule: Vec<f64>,
    pub cash_flow_rows: Vec<CashFlowYear>,
    /// `[year 0 outlay, UFCF year 1, ..]`, length `project_life + 1`.
    pub ufcf_flows: Vec<Money>,
    pub initial_outlay: Money,
    pub break_even_rows: Vec<BreakEvenYear>,
    pub cumulative_break_even: Vec<CumulativeBreakEvenYear>,
    pub margin_rows: Vec<MarginYear>,
    pub loan_schedule: Vec<ConsolidatedLoanYear>,
    pub kpis: Kpis,
}

impl CalculatedOutputs {
    /// First year in which cumulative revenue covers cumulative cost.
    pub fn break_even_year(&self) -> Option<u32> {
        break_even::first_break_even_year(&self.cumulative_break_even)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full pipeline for one project.
pub fn calculate_outputs(project: &ProjectData) -> CalculatedOutputs {
    let basis = &project.estimation_basis;
    let timeline = schedules::TaskTimeline::new(&project.tasks);

    let revenue = schedules::revenue_schedule(&project.revenue_items, basis, &timeline);
    let (variable_costs, fixed_costs) =
        schedules::operating_cost_schedules(&project.operating_cost_items, basis, &timeline);
    let capital = schedules::capital_schedule(&project.capital_items, basis, &timeline);
    let depreciation =
        depreciation::depreciation_schedule(&project.capital_items, basis, &timeline);

    let statement = cash_flow::build_statement(StatementInputs {
        basis,
        revenue: &revenue,
        variable_costs: &variable_costs,
        fixed_costs: &fixed_costs,
        depreciation: &depreciation,
        capex: &capital.capex,
        initial_capex: capital.initial_outlay,
        total_salvage: capital.total_salvage,
    });

    let operating_costs: Vec<f64> = variable_costs
        .iter()
        .zip(&fixed_costs)
        .map(|(v, f)| v + f)
        .collect();
    let break_even_rows = break_even::annual_break_even(&revenue, &variable_costs, &fixed_costs);
    let cumulative = break_even::cumulative_break_even(
        &revenue,
        &operating_costs,
        &capital.capex,
        statement.initial_outlay,
    );
    let margin_rows = ratios::margin_series(&statement.rows);
    let loan_schedule =
        amortization::consolidated_schedule(&project.loans, basis.project_life_years);

    let kpis = compute_kpis(
        project,
        &statement,
        capital.initial_outlay,
        &break_even_rows,
        &revenue,
    );

    CalculatedOutputs {
        revenue_schedule: revenue,
        variable_cost_schedule: variable_costs,
        fixed_cost_schedule: fixed_costs,
        operating_cost_schedule: operating_costs,
        depreciation_schedule: depreciation,
        capex_schedule: capital.capex,
        working_capital_schedule: statement.working_capital.clone(),
        cash_flow_rows: statement.rows,
        ufcf_flows: statement.flows,
        initial_outlay: statement.initial_outlay,
        break_even_rows,
        cumulative_break_even: cumulative,
        margin_rows,
        loan_schedule,
        kpis,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn compute_kpis(
    project: &ProjectData,
    statement: &CashFlowStatement,
    initial_capex: f64,
    break_even_rows: &[BreakEvenYear],
    revenue: &[f64],
) -> Kpis {
    let basis = &project.estimation_basis;
    let rate = basis.discount_rate / 100.0;

    let npv = time_value::npv(rate, &statement.flows);
    let irr = time_value::irr(&statement.flows);
    let roi = time_value::return_on_investment(&statement.flows);
    let payback_period = time_value::payback_period(&statement.flows);
    let discounted_payback_period = time_value::discounted_payback_period(&statement.flows, rate);
    // flows[0] is always present (the year-0 outlay).
    let enterprise_value = npv - statement.flows[0];

    let initial_working_capital =
        basis.initial_current_assets - basis.initial_current_liabilities;
    let initial_debt = amortization::initial_debt(&project.loans);
    let leverage = ratios::leverage_ratios(
        basis,
        initial_capex,
        initial_working_capital,
        initial_debt,
    );

    let first_operating_year = revenue
        .iter()
        .position(|r| *r > 0.0)
        .map(|idx| idx as u32 + 1);
    let (break_even_revenue, margin_of_safety) = match first_operating_year {
        Some(year) => {
            let row = &break_even_rows[year as usize - 1];
            (row.break_even_revenue, row.margin_of_safety)
        }
        None => (0.0, 0.0),
    };

    Kpis {
        npv,
        irr,
        roi,
        payback_period,
        discounted_payback_period,
        enterprise_value,
        debt_to_equity: leverage.debt_to_equity,
        current_ratio: leverage.current_ratio,
        quick_ratio: leverage.quick_ratio,
        first_operating_year,
        break_even_revenue,
        margin_of_safety,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
