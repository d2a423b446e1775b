//! Named scenarios: partial estimation-basis overrides, each re-run through
//! the full pipeline.

use serde::{Deserialize, Serialize};

use crate::engine::{self, CalculatedOutputs};
use crate::types::{EstimationOverrides, ProjectData, Scenario};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One scenario's complete engine output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub outputs: CalculatedOutputs,
}

/// The base case plus every configured scenario, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub base: CalculatedOutputs,
    pub scenarios: Vec<ScenarioOutcome>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Clone the project with the override fields swapped into the basis.
/// Fields left at `None` keep their base value.
pub fn apply_overrides(project: &ProjectData, overrides: &EstimationOverrides) -> ProjectData {
    let mut adjusted = project.clone();
    let basis = &mut adjusted.estimation_basis;
    if let Some(rate) = overrides.discount_rate {
        basis.discount_rate = rate;
    }
    if let Some(rate) = overrides.tax_rate {
        basis.tax_rate = rate;
    }
    if let Some(rate) = overrides.inflation_rate {
        basis.inflation_rate = rate;
    }
    if let Some(rate) = overrides.revenue_growth_rate {
        basis.revenue_growth_rate = rate;
    }
    if let Some(pct) = overrides.working_capital_pct {
        basis.working_capital_pct = pct;
    }
    if let Some(multiple) = overrides.ebit_multiple {
        basis.ebit_multiple = multiple;
    }
    adjusted
}

/// Run the pipeline for the base case and each scenario.
pub fn run_scenario_analysis(project: &ProjectData, scenarios: &[Scenario]) -> ScenarioAnalysis {
    let base = engine::calculate_outputs(project);
    let scenarios = scenarios
        .iter()
        .map(|scenario| ScenarioOutcome {
            name: scenario.name.clone(),
            outputs: engine::calculate_outputs(&apply_overrides(project, &scenario.overrides)),
        })
        .collect();
    ScenarioAnalysis { base, scenarios }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
