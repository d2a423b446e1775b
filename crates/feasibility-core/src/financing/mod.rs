//! Debt financing: loan amortization schedules.

pub mod amortization;
