//! Valuation: the cash-flow statement, break-even analysis and ratio
//! batteries built on top of the schedules.

pub mod break_even;
pub mod cash_flow;
pub mod ratios;
