pub mod engine;
pub mod error;
pub mod financing;
pub mod monte_carlo;
pub mod projection;
pub mod scenarios;
pub mod time_value;
pub mod types;
pub mod valuation;

pub use engine::{calculate_outputs, CalculatedOutputs, Kpis};
pub use error::FeasibilityError;
pub use types::*;

/// Standard result type for all feasibility operations
pub type FeasibilityResult<T> = Result<T, FeasibilityError>;
