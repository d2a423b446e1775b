//! What-if analysis layers over the deterministic engine: named scenario
//! overrides and one-variable-at-a-time sensitivity.

pub mod scenario;
pub mod sensitivity;
