use std::io;
use thiserror::Error;

/// Errors crossing the simulation-worker boundary.
///
/// The deterministic calculation pipeline is total and never returns these:
/// degenerate numeric input flows through as NaN, infinity or sentinel
/// values instead.
#[derive(Debug, Error)]
pub enum FeasibilityError {
    #[error("Failed to spawn simulation worker: {0}")]
    WorkerSpawn(#[from] io::Error),

    #[error("Simulation worker disconnected before reporting a result")]
    WorkerDisconnected,

    #[error("Simulation failed: {0}")]
    SimulationFailed(String),
}
