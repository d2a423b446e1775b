use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// All monetary values. IEEE-754 f64 so that degenerate inputs flow through
/// as NaN or infinity sentinels instead of errors.
pub type Money = f64;

/// Rates expressed as user-facing percentages (5.0 = 5%). Formulas divide
/// by 100 at the point of use.
pub type Percent = f64;

/// Currency code. Carried through untouched for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    Other(String),
}

// ---------------------------------------------------------------------------
// Estimation basis
// ---------------------------------------------------------------------------

/// Global assumptions applied across the whole project horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationBasis {
    pub currency: Currency,
    /// Project horizon in years. Every annual output series has exactly
    /// this many entries.
    pub project_life_years: u32,
    /// Discount rate applied to unlevered free cash flows.
    pub discount_rate: Percent,
    /// Corporate tax rate, applied to positive EBIT only.
    pub tax_rate: Percent,
    /// Annual growth applied to operating cost items.
    pub inflation_rate: Percent,
    /// Annual growth applied to revenue items.
    pub revenue_growth_rate: Percent,
    /// Depreciation convention applied to all capital items.
    pub depreciation_method: DepreciationMethod,
    /// Per-category depreciation and salvage settings. Categories missing
    /// from the list fall back to zero rates.
    pub asset_categories: Vec<AssetCategorySettings>,
    /// Working capital requirement as a percentage of annual revenue.
    pub working_capital_pct: Percent,
    pub initial_current_assets: Money,
    pub initial_current_liabilities: Money,
    /// Inventory component of initial current assets (excluded from the
    /// quick ratio).
    pub initial_inventory: Money,
    /// EBIT multiple used for terminal value in the final projection year.
    pub ebit_multiple: f64,
}

/// Depreciation convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepreciationMethod {
    #[default]
    StraightLine,
    DecliningBalance,
    SumOfYearsDigits,
}

/// The fixed asset classes recognised by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    Buildings,
    Machinery,
    Vehicles,
    OfficeEquipment,
}

/// Depreciation and salvage settings for one asset category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCategorySettings {
    pub category: AssetCategory,
    /// Declining-balance rate, percent of book value per year.
    pub depreciation_rate: Percent,
    /// Salvage value, percent of acquisition cost.
    pub salvage_pct: Percent,
}

// ---------------------------------------------------------------------------
// Project items
// ---------------------------------------------------------------------------

/// A capital asset purchased by the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalInvestmentItem {
    pub id: String,
    pub name: String,
    pub category: AssetCategory,
    pub cost: Money,
    /// Optional link to a plan task; shifts the purchase into the year
    /// containing the task's start date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// A project-plan task. The engine reads only `id` and `start_date` (to
/// derive item start years); the remaining fields belong to the planning UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub progress_pct: f64,
}

/// A revenue stream priced as unit price times annual quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueItem {
    pub id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl RevenueItem {
    /// Annual amount before growth.
    pub fn annual_amount(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// An operating cost line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCostItem {
    pub id: String,
    pub name: String,
    pub basis: CostBasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// How an operating cost is quantified. Raw materials scale with production
/// (variable); labor and general administration are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CostBasis {
    RawMaterials { unit_cost: Money, quantity: f64 },
    Labor { headcount: f64, monthly_salary: Money },
    GeneralAdmin { annual_cost: Money },
}

impl CostBasis {
    /// Annual amount before growth.
    pub fn annual_amount(&self) -> Money {
        match self {
            CostBasis::RawMaterials {
                unit_cost,
                quantity,
            } => unit_cost * quantity,
            CostBasis::Labor {
                headcount,
                monthly_salary,
            } => headcount * monthly_salary * 12.0,
            CostBasis::GeneralAdmin { annual_cost } => *annual_cost,
        }
    }

    /// Variable costs enter the contribution margin; fixed costs do not.
    pub fn is_variable(&self) -> bool {
        matches!(self, CostBasis::RawMaterials { .. })
    }
}

/// A term loan drawn in full at the start of its first year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub name: String,
    pub principal: Money,
    /// Annual nominal rate.
    pub interest_rate: Percent,
    pub term_years: u32,
    /// Project year (1-indexed) in which the loan is drawn.
    pub start_year: u32,
}

// ---------------------------------------------------------------------------
// Scenarios and simulation settings
// ---------------------------------------------------------------------------

/// A named what-if case: partial overrides applied on top of the base
/// estimation basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub overrides: EstimationOverrides,
}

/// Optional replacements for the numeric estimation-basis assumptions.
/// `None` fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimationOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_growth_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_capital_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebit_multiple: Option<f64>,
}

/// Risk-simulation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSettings {
    /// Number of simulation iterations.
    pub iterations: u32,
    /// Optional seed for reproducibility.
    pub seed: Option<u64>,
    /// Distribution assigned to each stochastic input, keyed by variable id
    /// (see `monte_carlo::parse_variable_id` for the recognised forms).
    /// Ordered map so a seeded run samples variables in a stable order.
    #[serde(default)]
    pub variables: BTreeMap<String, DistributionConfig>,
}

/// Probability distribution assigned to one stochastic input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DistributionConfig {
    /// Keep the deterministic estimate.
    #[default]
    None,
    Normal {
        mean: f64,
        std_dev: f64,
    },
    Uniform {
        min: f64,
        max: f64,
    },
    Triangular {
        min: f64,
        mode: f64,
        max: f64,
    },
    Beta {
        alpha: f64,
        beta: f64,
    },
    Pert {
        min: f64,
        mode: f64,
        max: f64,
        /// Weight given to the mode; 4 is the classical PERT value.
        #[serde(default = "default_pert_shape")]
        shape: f64,
    },
    Lognormal {
        log_mean: f64,
        log_std_dev: f64,
    },
}

fn default_pert_shape() -> f64 {
    4.0
}

// ---------------------------------------------------------------------------
// Project data
// ---------------------------------------------------------------------------

/// Complete description of one capital project. The engine treats this as
/// immutable; every output is recomputed wholesale from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub estimation_basis: EstimationBasis,
    #[serde(default)]
    pub capital_items: Vec<CapitalInvestmentItem>,
    #[serde(default)]
    pub revenue_items: Vec<RevenueItem>,
    #[serde(default)]
    pub operating_cost_items: Vec<OperatingCostItem>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub monte_carlo: MonteCarloSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_basis_annual_amounts() {
        let materials = CostBasis::RawMaterials {
            unit_cost: 2.5,
            quantity: 1000.0,
        };
        assert_eq!(materials.annual_amount(), 2500.0);
        assert!(materials.is_variable());

        let labor = CostBasis::Labor {
            headcount: 3.0,
            monthly_salary: 4000.0,
        };
        assert_eq!(labor.annual_amount(), 144_000.0);
        assert!(!labor.is_variable());

        let admin = CostBasis::GeneralAdmin {
            annual_cost: 18_000.0,
        };
        assert_eq!(admin.annual_amount(), 18_000.0);
        assert!(!admin.is_variable());
    }

    #[test]
    fn test_distribution_config_tagged_serde() {
        let json = r#"{ "type": "Pert", "min": 1.0, "mode": 2.0, "max": 4.0 }"#;
        let config: DistributionConfig = serde_json::from_str(json).unwrap();
        match config {
            DistributionConfig::Pert { shape, .. } => assert_eq!(shape, 4.0),
            other => panic!("expected Pert, got {other:?}"),
        }

        let none: DistributionConfig = serde_json::from_str(r#"{ "type": "None" }"#).unwrap();
        assert_eq!(none, DistributionConfig::None);
    }

    #[test]
    fn test_monte_carlo_variables_keep_key_order() {
        let mut settings = MonteCarloSettings::default();
        settings.variables.insert(
            "revenue:r1:unitPrice".into(),
            DistributionConfig::Uniform { min: 1.0, max: 2.0 },
        );
        settings.variables.insert(
            "estimation-basis:discountRate".into(),
            DistributionConfig::Normal {
                mean: 10.0,
                std_dev: 1.0,
            },
        );
        let keys: Vec<&str> = settings.variables.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["estimation-basis:discountRate", "revenue:r1:unitPrice"]
        );
    }
}
