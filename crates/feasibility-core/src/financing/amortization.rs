//! Loan amortization: per-loan annuity schedules and the consolidated
//! project-level debt ladder.

use serde::{Deserialize, Serialize};

use crate::types::{Loan, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One year of a single loan's amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanYear {
    /// Year within the loan's own term (1-indexed).
    pub year: u32,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// One project year of the combined debt position across all loans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedLoanYear {
    /// Project year (1-indexed).
    pub year: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Amortization schedule for a single loan.
///
/// Empty when the loan has no term or no positive principal. The final
/// year's principal is capped at the remaining balance, so the closing
/// balance never goes negative.
pub fn amortize_loan(loan: &Loan) -> Vec<LoanYear> {
    if loan.term_years == 0 || loan.principal <= 0.0 {
        return Vec::new();
    }
    let rate = loan.interest_rate / 100.0;
    let payment = annuity_payment(loan.principal, rate, loan.term_years);

    let mut schedule = Vec::with_capacity(loan.term_years as usize);
    let mut balance = loan.principal;
    for year in 1..=loan.term_years {
        let interest = balance * rate;
        let principal = (payment - interest).min(balance);
        let closing = balance - principal;
        schedule.push(LoanYear {
            year,
            opening_balance: balance,
            payment,
            interest,
            principal,
            closing_balance: closing,
        });
        balance = closing;
    }
    schedule
}

/// Combined debt ladder over the project horizon.
///
/// A loan drawn in year `s` raises that year's opening balance by its
/// principal; repayment years falling beyond the horizon are cut off.
pub fn consolidated_schedule(loans: &[Loan], project_life: u32) -> Vec<ConsolidatedLoanYear> {
    let life = project_life as usize;
    let mut draws = vec![0.0; life];
    let mut interest = vec![0.0; life];
    let mut principal = vec![0.0; life];

    for loan in loans {
        let start = loan.start_year.max(1);
        if (start as usize) <= life {
            draws[start as usize - 1] += loan.principal.max(0.0);
        }
        for row in amortize_loan(loan) {
            let project_year = (start + row.year - 1) as usize;
            if project_year <= life {
                interest[project_year - 1] += row.interest;
                principal[project_year - 1] += row.principal;
            }
        }
    }

    let mut ladder = Vec::with_capacity(life);
    let mut balance = 0.0;
    for year in 1..=life {
        let opening = balance + draws[year - 1];
        let closing = opening - principal[year - 1];
        ladder.push(ConsolidatedLoanYear {
            year: year as u32,
            opening_balance: opening,
            interest: interest[year - 1],
            principal: principal[year - 1],
            closing_balance: closing,
        });
        balance = closing;
    }
    ladder
}

/// Principal of loans already drawn when operations start (year 1).
pub fn initial_debt(loans: &[Loan]) -> Money {
    loans
        .iter()
        .filter(|l| l.start_year <= 1)
        .map(|l| l.principal.max(0.0))
        .sum()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Fixed annuity payment for `principal` at `rate` (decimal) over `term`
/// years. Equal principal installments when the rate is zero.
fn annuity_payment(principal: f64, rate: f64, term: u32) -> f64 {
    if rate == 0.0 {
        return principal / term as f64;
    }
    let factor = (1.0 + rate).powi(term as i32);
    principal * rate * factor / (factor - 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(principal: f64, rate_pct: f64, term: u32, start_year: u32) -> Loan {
        Loan {
            id: "l1".into(),
            name: "Term loan".into(),
            principal,
            interest_rate: rate_pct,
            term_years: term,
            start_year,
        }
    }

    #[test]
    fn test_annuity_schedule_matches_reference_case() {
        let schedule = amortize_loan(&loan(100_000.0, 8.0, 10, 1));
        assert_eq!(schedule.len(), 10);

        let first = &schedule[0];
        assert!((first.payment - 14_902.9489).abs() < 0.01, "pmt={}", first.payment);
        assert!((first.interest - 8_000.0).abs() < 1e-6);
        assert!((first.principal - 6_902.9489).abs() < 0.01);

        let last = schedule.last().unwrap();
        assert!(last.closing_balance.abs() < 1e-6, "closing={}", last.closing_balance);

        let repaid: f64 = schedule.iter().map(|y| y.principal).sum();
        assert!((repaid - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_conservation_at_five_percent() {
        let schedule = amortize_loan(&loan(10_000.0, 5.0, 5, 1));
        let repaid: f64 = schedule.iter().map(|y| y.principal).sum();
        assert!((repaid - 10_000.0).abs() < 1e-6);
        assert!(schedule.last().unwrap().closing_balance.abs() < 1e-6);
        // Interest declines as the balance amortizes.
        for pair in schedule.windows(2) {
            assert!(pair[1].interest < pair[0].interest);
        }
    }

    #[test]
    fn test_zero_rate_amortizes_in_equal_installments() {
        let schedule = amortize_loan(&loan(10_000.0, 0.0, 5, 1));
        for row in &schedule {
            assert!((row.payment - 2_000.0).abs() < 1e-12);
            assert_eq!(row.interest, 0.0);
            assert!((row.principal - 2_000.0).abs() < 1e-12);
        }
        assert!(schedule.last().unwrap().closing_balance.abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_loans_produce_empty_schedules() {
        assert!(amortize_loan(&loan(10_000.0, 5.0, 0, 1)).is_empty());
        assert!(amortize_loan(&loan(0.0, 5.0, 5, 1)).is_empty());
        assert!(amortize_loan(&loan(-500.0, 5.0, 5, 1)).is_empty());
    }

    #[test]
    fn test_consolidated_ladder_adds_draws_in_start_years() {
        let loans = vec![loan(10_000.0, 0.0, 5, 1), loan(6_000.0, 0.0, 3, 3)];
        let ladder = consolidated_schedule(&loans, 6);
        assert_eq!(ladder.len(), 6);

        // Year 1: only the first loan.
        assert!((ladder[0].opening_balance - 10_000.0).abs() < 1e-9);
        assert!((ladder[0].principal - 2_000.0).abs() < 1e-9);
        // Year 3: second loan drawn on top of the amortized first.
        assert!((ladder[2].opening_balance - (6_000.0 + 6_000.0)).abs() < 1e-9);
        assert!((ladder[2].principal - 4_000.0).abs() < 1e-9);
        // Year 5: both fully repaid by year end.
        assert!(ladder[4].closing_balance.abs() < 1e-9);
        assert_eq!(ladder[5].principal, 0.0);
    }

    #[test]
    fn test_consolidated_ladder_cuts_off_at_horizon() {
        let ladder = consolidated_schedule(&[loan(10_000.0, 5.0, 10, 1)], 3);
        assert_eq!(ladder.len(), 3);
        // Still owing after year 3: the tail is simply not shown.
        assert!(ladder[2].closing_balance > 0.0);
    }

    #[test]
    fn test_initial_debt_counts_year_one_loans_only() {
        let loans = vec![loan(10_000.0, 5.0, 5, 1), loan(7_000.0, 5.0, 5, 2)];
        assert!((initial_debt(&loans) - 10_000.0).abs() < 1e-12);
    }
}
