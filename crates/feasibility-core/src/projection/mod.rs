//! Scheduling: turns itemized inputs into annual time series.

pub mod depreciation;
pub mod schedules;
