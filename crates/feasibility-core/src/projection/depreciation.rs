//! Depreciation of capital items over their in-project life.

use crate::types::{
    AssetCategory, CapitalInvestmentItem, DepreciationMethod, EstimationBasis, Money, Percent,
};

use super::schedules::TaskTimeline;

/// (declining-balance rate, salvage percent) for a category; zero rates when
/// the category is not configured in the basis.
fn category_rates(basis: &EstimationBasis, category: AssetCategory) -> (Percent, Percent) {
    basis
        .asset_categories
        .iter()
        .find(|s| s.category == category)
        .map(|s| (s.depreciation_rate, s.salvage_pct))
        .unwrap_or((0.0, 0.0))
}

/// Residual value of an item at the end of its depreciable life.
pub fn salvage_value(item: &CapitalInvestmentItem, basis: &EstimationBasis) -> Money {
    let (_, salvage_pct) = category_rates(basis, item.category);
    item.cost * salvage_pct / 100.0
}

/// Annual depreciation charge across all capital items.
///
/// Each item depreciates from its effective start year through the end of
/// the horizon, so late items depreciate over a correspondingly shorter
/// life. Items starting beyond the horizon contribute nothing. Book value
/// never falls below salvage.
pub fn depreciation_schedule(
    items: &[CapitalInvestmentItem],
    basis: &EstimationBasis,
    timeline: &TaskTimeline,
) -> Vec<f64> {
    let life = basis.project_life_years;
    let mut schedule = vec![0.0; life as usize];

    for item in items {
        let start = timeline.start_year(item.task_id.as_deref());
        if start > life {
            continue;
        }
        let effective_life = life - start + 1;
        let (rate, salvage_pct) = category_rates(basis, item.category);
        let salvage = item.cost * salvage_pct / 100.0;

        match basis.depreciation_method {
            DepreciationMethod::StraightLine => {
                let annual = (item.cost - salvage) / effective_life as f64;
                for year in start..=life {
                    schedule[year as usize - 1] += annual;
                }
            }
            DepreciationMethod::DecliningBalance => {
                let mut book = item.cost;
                for year in start..=life {
                    let charge = (book * rate / 100.0).min(book - salvage).max(0.0);
                    schedule[year as usize - 1] += charge;
                    book -= charge;
                }
            }
            DepreciationMethod::SumOfYearsDigits => {
                let base = item.cost - salvage;
                let n = effective_life as f64;
                let denominator = n * (n + 1.0) / 2.0;
                for (offset, year) in (start..=life).enumerate() {
                    let remaining = n - offset as f64;
                    schedule[year as usize - 1] += base * remaining / denominator;
                }
            }
        }
    }

    schedule
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetCategorySettings, Currency};

    fn machinery(cost: f64) -> CapitalInvestmentItem {
        CapitalInvestmentItem {
            id: "k1".into(),
            name: "Press".into(),
            category: AssetCategory::Machinery,
            cost,
            task_id: None,
        }
    }

    fn basis(life: u32, method: DepreciationMethod) -> EstimationBasis {
        EstimationBasis {
            currency: Currency::USD,
            project_life_years: life,
            discount_rate: 10.0,
            tax_rate: 20.0,
            inflation_rate: 0.0,
            revenue_growth_rate: 0.0,
            depreciation_method: method,
            asset_categories: vec![AssetCategorySettings {
                category: AssetCategory::Machinery,
                depreciation_rate: 40.0,
                salvage_pct: 10.0,
            }],
            working_capital_pct: 0.0,
            initial_current_assets: 0.0,
            initial_current_liabilities: 0.0,
            initial_inventory: 0.0,
            ebit_multiple: 0.0,
        }
    }

    #[test]
    fn test_straight_line_conserves_depreciable_base() {
        let basis = basis(5, DepreciationMethod::StraightLine);
        let timeline = TaskTimeline::new(&[]);
        let schedule = depreciation_schedule(&[machinery(10_000.0)], &basis, &timeline);

        let total: f64 = schedule.iter().sum();
        let base = 10_000.0 - 1_000.0;
        assert!((total - base).abs() / base < 1e-6, "total={total}");
        assert!((schedule[0] - 1_800.0).abs() < 1e-9);
        assert!(schedule.iter().all(|d| (*d - 1_800.0).abs() < 1e-9));
    }

    #[test]
    fn test_declining_balance_clamps_at_salvage() {
        let basis = basis(10, DepreciationMethod::DecliningBalance);
        let timeline = TaskTimeline::new(&[]);
        let schedule = depreciation_schedule(&[machinery(10_000.0)], &basis, &timeline);

        // Year 1: 40% of 10000; year 2: 40% of 6000; ...
        assert!((schedule[0] - 4_000.0).abs() < 1e-9);
        assert!((schedule[1] - 2_400.0).abs() < 1e-9);

        let total: f64 = schedule.iter().sum();
        assert!(total <= 9_000.0 + 1e-9, "book value dipped below salvage");
        let book = 10_000.0 - total;
        assert!(book >= 1_000.0 - 1e-9, "book={book}");
        // Charges never negative even after the clamp binds.
        assert!(schedule.iter().all(|d| *d >= 0.0));
    }

    #[test]
    fn test_sum_of_years_digits_weights_decline() {
        let basis = basis(4, DepreciationMethod::SumOfYearsDigits);
        let timeline = TaskTimeline::new(&[]);
        let schedule = depreciation_schedule(&[machinery(10_000.0)], &basis, &timeline);

        // Base 9000 over digits 4+3+2+1 = 10
        assert!((schedule[0] - 3_600.0).abs() < 1e-9);
        assert!((schedule[1] - 2_700.0).abs() < 1e-9);
        assert!((schedule[2] - 1_800.0).abs() < 1e-9);
        assert!((schedule[3] - 900.0).abs() < 1e-9);
        let total: f64 = schedule.iter().sum();
        assert!((total - 9_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_unconfigured_category_depreciates_full_cost() {
        let mut basis = basis(2, DepreciationMethod::StraightLine);
        basis.asset_categories.clear();
        let timeline = TaskTimeline::new(&[]);
        let schedule = depreciation_schedule(&[machinery(8_000.0)], &basis, &timeline);

        // No salvage configured: the full cost is the depreciable base.
        assert!((schedule[0] - 4_000.0).abs() < 1e-9);
        assert!((schedule[1] - 4_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_horizon_contributes_nothing() {
        let basis = basis(0, DepreciationMethod::StraightLine);
        let timeline = TaskTimeline::new(&[]);
        let schedule = depreciation_schedule(&[machinery(10_000.0)], &basis, &timeline);
        assert!(schedule.is_empty());
    }
}
