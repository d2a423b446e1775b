//! Monte Carlo risk analysis: the distribution sampling library and the
//! worker-threaded simulation driver.

pub mod distributions;
pub mod simulation;

pub use simulation::{
    parse_variable_id, run_simulation, spawn_simulation, KpiStatistics, SimulationHandle,
    SimulationMessage, SimulationRawData, SimulationResults, SimulationRunner, StochasticTarget,
};
