//! Annual revenue, operating-cost and capital schedules.
//!
//! Items optionally anchor to a plan task; anchored items begin contributing
//! in the project year containing the task's start date and keep
//! contributing, compounded by their growth rate, through the end of the
//! horizon.

use chrono::NaiveDate;

use crate::types::{
    CapitalInvestmentItem, EstimationBasis, Money, OperatingCostItem, RevenueItem, Task,
};

use super::depreciation::salvage_value;

// ---------------------------------------------------------------------------
// Task timeline
// ---------------------------------------------------------------------------

/// Resolves item start years from the project plan.
///
/// Years are 365-day buckets measured from the earliest task start date.
#[derive(Debug, Clone, Copy)]
pub struct TaskTimeline<'a> {
    tasks: &'a [Task],
    anchor: Option<NaiveDate>,
}

impl<'a> TaskTimeline<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        let anchor = tasks.iter().map(|t| t.start_date).min();
        Self { tasks, anchor }
    }

    /// Effective start year (1-indexed) for an item optionally linked to a
    /// task. Unlinked items and dangling task ids start in year 1.
    pub fn start_year(&self, task_id: Option<&str>) -> u32 {
        let Some(id) = task_id else {
            return 1;
        };
        let Some(anchor) = self.anchor else {
            return 1;
        };
        let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
            return 1;
        };
        // Non-negative: the anchor is the minimum start date.
        let days = task.start_date.signed_duration_since(anchor).num_days();
        1 + (days / 365) as u32
    }
}

// ---------------------------------------------------------------------------
// Schedule builders
// ---------------------------------------------------------------------------

/// Grows `base` geometrically from `start_year` onward and accumulates it
/// into `schedule` (1-indexed years over a 0-indexed vec).
fn accumulate(schedule: &mut [f64], base: f64, rate_pct: f64, start_year: u32) {
    let growth = 1.0 + rate_pct / 100.0;
    for (idx, slot) in schedule.iter_mut().enumerate() {
        let year = idx as u32 + 1;
        if year >= start_year {
            *slot += base * growth.powi((year - start_year) as i32);
        }
    }
}

/// Annual revenue, grown at the basis revenue growth rate.
pub fn revenue_schedule(
    items: &[RevenueItem],
    basis: &EstimationBasis,
    timeline: &TaskTimeline,
) -> Vec<f64> {
    let mut schedule = vec![0.0; basis.project_life_years as usize];
    for item in items {
        let start = timeline.start_year(item.task_id.as_deref());
        accumulate(
            &mut schedule,
            item.annual_amount(),
            basis.revenue_growth_rate,
            start,
        );
    }
    schedule
}

/// Annual variable and fixed operating costs, both grown at the inflation
/// rate.
pub fn operating_cost_schedules(
    items: &[OperatingCostItem],
    basis: &EstimationBasis,
    timeline: &TaskTimeline,
) -> (Vec<f64>, Vec<f64>) {
    let life = basis.project_life_years as usize;
    let mut variable = vec![0.0; life];
    let mut fixed = vec![0.0; life];
    for item in items {
        let start = timeline.start_year(item.task_id.as_deref());
        let target = if item.basis.is_variable() {
            &mut variable
        } else {
            &mut fixed
        };
        accumulate(target, item.basis.annual_amount(), basis.inflation_rate, start);
    }
    (variable, fixed)
}

/// Capital spending split into the year-0 outlay and the in-life schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalSchedule {
    /// Spending on items acquired before operations begin (year 0).
    pub initial_outlay: Money,
    /// Spending per operating year; index 0 is year 1.
    pub capex: Vec<f64>,
    /// Salvage value recovered at the end of the horizon, across all items.
    pub total_salvage: Money,
}

/// Posts each capital item's cost once, in its effective start year.
///
/// Items starting in year 1 are treated as the up-front investment and kept
/// out of the in-life capex schedule; items starting after the horizon post
/// nowhere.
pub fn capital_schedule(
    items: &[CapitalInvestmentItem],
    basis: &EstimationBasis,
    timeline: &TaskTimeline,
) -> CapitalSchedule {
    let life = basis.project_life_years as usize;
    let mut capex = vec![0.0; life];
    let mut initial_outlay = 0.0;
    let mut total_salvage = 0.0;
    for item in items {
        let start = timeline.start_year(item.task_id.as_deref());
        if start <= 1 {
            initial_outlay += item.cost;
        } else if (start as usize) <= life {
            capex[start as usize - 1] += item.cost;
        }
        total_salvage += salvage_value(item, basis);
    }
    CapitalSchedule {
        initial_outlay,
        capex,
        total_salvage,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AssetCategory, AssetCategorySettings, CostBasis, Currency, DepreciationMethod,
    };
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn basis(life: u32) -> EstimationBasis {
        EstimationBasis {
            currency: Currency::USD,
            project_life_years: life,
            discount_rate: 10.0,
            tax_rate: 20.0,
            inflation_rate: 5.0,
            revenue_growth_rate: 8.0,
            depreciation_method: DepreciationMethod::StraightLine,
            asset_categories: vec![AssetCategorySettings {
                category: AssetCategory::Machinery,
                depreciation_rate: 20.0,
                salvage_pct: 10.0,
            }],
            working_capital_pct: 0.0,
            initial_current_assets: 0.0,
            initial_current_liabilities: 0.0,
            initial_inventory: 0.0,
            ebit_multiple: 0.0,
        }
    }

    fn task(id: &str, start: NaiveDate) -> Task {
        Task {
            id: id.into(),
            name: id.into(),
            start_date: start,
            end_date: start,
            progress_pct: 0.0,
        }
    }

    fn revenue_item(task_id: Option<&str>) -> RevenueItem {
        RevenueItem {
            id: "r1".into(),
            name: "Sales".into(),
            unit_price: 10.0,
            quantity: 100.0,
            task_id: task_id.map(String::from),
        }
    }

    #[test]
    fn test_unlinked_items_start_in_year_one() {
        let timeline = TaskTimeline::new(&[]);
        assert_eq!(timeline.start_year(None), 1);
        assert_eq!(timeline.start_year(Some("missing")), 1);
    }

    #[test]
    fn test_start_year_buckets_by_365_days() {
        let tasks = vec![
            task("t1", date(2024, 1, 1)),
            task("t2", date(2024, 12, 30)), // day 364
            task("t3", date(2025, 1, 1)),   // day 366
            task("t4", date(2027, 1, 1)),
        ];
        let timeline = TaskTimeline::new(&tasks);
        assert_eq!(timeline.start_year(Some("t1")), 1);
        assert_eq!(timeline.start_year(Some("t2")), 1);
        assert_eq!(timeline.start_year(Some("t3")), 2);
        assert_eq!(timeline.start_year(Some("t4")), 4);
    }

    #[test]
    fn test_revenue_compounds_from_start_year() {
        let tasks = vec![task("t1", date(2024, 1, 1)), task("t2", date(2025, 6, 1))];
        let timeline = TaskTimeline::new(&tasks);
        let schedule = revenue_schedule(&[revenue_item(Some("t2"))], &basis(4), &timeline);

        // Task t2 starts 517 days after t1: year 2.
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[0], 0.0);
        assert!((schedule[1] - 1000.0).abs() < 1e-9);
        assert!((schedule[2] - 1080.0).abs() < 1e-9);
        assert!((schedule[3] - 1166.4).abs() < 1e-9);
    }

    #[test]
    fn test_cost_items_split_variable_and_fixed() {
        let items = vec![
            OperatingCostItem {
                id: "c1".into(),
                name: "Steel".into(),
                basis: CostBasis::RawMaterials {
                    unit_cost: 3.0,
                    quantity: 100.0,
                },
                task_id: None,
            },
            OperatingCostItem {
                id: "c2".into(),
                name: "Crew".into(),
                basis: CostBasis::Labor {
                    headcount: 2.0,
                    monthly_salary: 1000.0,
                },
                task_id: None,
            },
            OperatingCostItem {
                id: "c3".into(),
                name: "Office".into(),
                basis: CostBasis::GeneralAdmin { annual_cost: 600.0 },
                task_id: None,
            },
        ];
        let timeline = TaskTimeline::new(&[]);
        let (variable, fixed) = operating_cost_schedules(&items, &basis(2), &timeline);

        assert!((variable[0] - 300.0).abs() < 1e-9);
        assert!((fixed[0] - 24_600.0).abs() < 1e-9);
        // 5% inflation on both groups
        assert!((variable[1] - 315.0).abs() < 1e-9);
        assert!((fixed[1] - 25_830.0).abs() < 1e-9);
    }

    #[test]
    fn test_capital_items_split_initial_and_in_life() {
        let tasks = vec![task("t1", date(2024, 1, 1)), task("t2", date(2026, 2, 1))];
        let timeline = TaskTimeline::new(&tasks);
        let items = vec![
            CapitalInvestmentItem {
                id: "k1".into(),
                name: "Press".into(),
                category: AssetCategory::Machinery,
                cost: 50_000.0,
                task_id: None,
            },
            CapitalInvestmentItem {
                id: "k2".into(),
                name: "Lift".into(),
                category: AssetCategory::Machinery,
                cost: 20_000.0,
                task_id: Some("t2".into()),
            },
        ];
        let schedule = capital_schedule(&items, &basis(5), &timeline);

        assert!((schedule.initial_outlay - 50_000.0).abs() < 1e-9);
        // t2 starts 762 days in: year 3
        assert!((schedule.capex[2] - 20_000.0).abs() < 1e-9);
        assert_eq!(schedule.capex.iter().filter(|c| **c != 0.0).count(), 1);
        // 10% salvage on both machinery items
        assert!((schedule.total_salvage - 7_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_items_beyond_horizon_post_nowhere() {
        let tasks = vec![task("t1", date(2024, 1, 1)), task("t2", date(2034, 1, 1))];
        let timeline = TaskTimeline::new(&tasks);
        let items = vec![CapitalInvestmentItem {
            id: "k1".into(),
            name: "Late".into(),
            category: AssetCategory::Machinery,
            cost: 9_000.0,
            task_id: Some("t2".into()),
        }];
        let schedule = capital_schedule(&items, &basis(3), &timeline);

        assert_eq!(schedule.initial_outlay, 0.0);
        assert!(schedule.capex.iter().all(|c| *c == 0.0));
        // Salvage is still recognised for every configured item.
        assert!((schedule.total_salvage - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_horizon_yields_empty_series() {
        let timeline = TaskTimeline::new(&[]);
        assert!(revenue_schedule(&[revenue_item(None)], &basis(0), &timeline).is_empty());
        let schedule = capital_schedule(&[], &basis(0), &timeline);
        assert!(schedule.capex.is_empty());
        assert_eq!(schedule.initial_outlay, 0.0);
    }
}
