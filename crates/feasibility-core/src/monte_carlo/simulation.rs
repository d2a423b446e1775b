//! Monte Carlo risk simulation.
//!
//! The driver repeatedly re-runs the deterministic pipeline with stochastic
//! inputs overwritten by fresh draws, then reduces the collected KPI
//! outcomes to summary statistics. The loop runs on a dedicated worker
//! thread and streams progress back over a channel; this boundary is the
//! only place the crate uses an error channel at all.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::engine;
use crate::error::FeasibilityError;
use crate::monte_carlo::distributions::DistributionSampler;
use crate::types::{DistributionConfig, ProjectData};
use crate::FeasibilityResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Descriptive statistics over one KPI's filtered sample vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
}

/// Aggregated outcome of one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    /// Iterations actually run; 0 when the pre-check short-circuits.
    pub iterations: u32,
    pub npv: KpiStatistics,
    pub irr: KpiStatistics,
    pub roi: KpiStatistics,
    pub payback: KpiStatistics,
    /// Fraction of sampled NPVs above zero.
    pub probability_npv_positive: f64,
    /// Fraction of sampled IRRs above the base discount rate.
    pub probability_irr_above_discount: f64,
}

/// Sorted per-KPI sample vectors, returned for downstream histogram and CDF
/// rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationRawData {
    pub npv: Vec<f64>,
    pub irr: Vec<f64>,
    pub roi: Vec<f64>,
    pub payback: Vec<f64>,
}

/// Messages streamed from the worker: zero or more `progress` updates, then
/// exactly one terminal `result` or `error`. A cancelled run sends no
/// terminal message at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimulationMessage {
    #[serde(rename = "progress")]
    Progress { progress: u8 },
    #[serde(rename = "result")]
    Completed {
        results: SimulationResults,
        #[serde(rename = "rawData")]
        raw_data: SimulationRawData,
    },
    #[serde(rename = "error")]
    Failed { error: String },
}

/// Field addressed by a stochastic variable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StochasticTarget {
    DiscountRate,
    TaxRate,
    InflationRate,
    RevenueGrowthRate,
    WorkingCapitalPct,
    RevenueUnitPrice(String),
    RevenueQuantity(String),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a stable variable id into the field it addresses.
///
/// Recognised forms are `estimation-basis:<field>` for basis scalars and
/// `revenue:<item id>:<field>` for revenue items, with the camelCase field
/// names the host protocol uses. Unrecognised ids map to `None` and the
/// driver skips them.
pub fn parse_variable_id(id: &str) -> Option<StochasticTarget> {
    if let Some(field) = id.strip_prefix("estimation-basis:") {
        return match field {
            "discountRate" => Some(StochasticTarget::DiscountRate),
            "taxRate" => Some(StochasticTarget::TaxRate),
            "inflationRate" => Some(StochasticTarget::InflationRate),
            "revenueGrowthRate" => Some(StochasticTarget::RevenueGrowthRate),
            "workingCapitalPct" => Some(StochasticTarget::WorkingCapitalPct),
            _ => None,
        };
    }
    if let Some(rest) = id.strip_prefix("revenue:") {
        let (item_id, field) = rest.rsplit_once(':')?;
        if item_id.is_empty() {
            return None;
        }
        return match field {
            "unitPrice" => Some(StochasticTarget::RevenueUnitPrice(item_id.to_string())),
            "quantity" => Some(StochasticTarget::RevenueQuantity(item_id.to_string())),
            _ => None,
        };
    }
    None
}

/// Run a simulation synchronously on the calling thread.
///
/// Hosts that want progress streaming and cancellation use
/// [`spawn_simulation`] instead; the worker wraps this same loop.
pub fn run_simulation(project: &ProjectData) -> (SimulationResults, SimulationRawData) {
    // Never cancelled and no listener to lose, so the loop always completes.
    simulate(project, || false, |_| true).unwrap_or_default()
}

/// Start a simulation on its own worker thread and hand back the channel
/// end plus cancellation control.
pub fn spawn_simulation(project: ProjectData) -> FeasibilityResult<SimulationHandle> {
    let (sender, messages) = mpsc::channel();
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let worker_flag = Arc::clone(&cancel_flag);

    let worker = thread::Builder::new()
        .name("monte-carlo-worker".into())
        .spawn(move || worker_main(project, &worker_flag, &sender))?;

    Ok(SimulationHandle {
        messages,
        cancel_flag,
        worker: Some(worker),
    })
}

/// Host-side handle to a running simulation.
///
/// Dropping the handle cancels the run and joins the worker.
pub struct SimulationHandle {
    messages: Receiver<SimulationMessage>,
    cancel_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SimulationHandle {
    /// Receiver carrying the progress stream and the terminal message.
    pub fn messages(&self) -> &Receiver<SimulationMessage> {
        &self.messages
    }

    /// Block until the worker delivers its terminal message, draining
    /// progress updates along the way. A run cancelled before finishing
    /// surfaces as [`FeasibilityError::WorkerDisconnected`].
    pub fn wait(mut self) -> FeasibilityResult<SimulationMessage> {
        let mut terminal = None;
        while let Ok(message) = self.messages.recv() {
            match message {
                SimulationMessage::Progress { .. } => continue,
                other => {
                    terminal = Some(other);
                    break;
                }
            }
        }
        self.join_worker();
        terminal.ok_or(FeasibilityError::WorkerDisconnected)
    }

    /// Block until completion and unwrap the success payload.
    pub fn wait_for_results(self) -> FeasibilityResult<(SimulationResults, SimulationRawData)> {
        match self.wait()? {
            SimulationMessage::Completed { results, raw_data } => Ok((results, raw_data)),
            SimulationMessage::Failed { error } => Err(FeasibilityError::SimulationFailed(error)),
            SimulationMessage::Progress { .. } => Err(FeasibilityError::WorkerDisconnected),
        }
    }

    /// Ask the worker to stop after its current iteration. Accumulated
    /// samples are discarded and no terminal message follows.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
        self.join_worker();
    }
}

/// Owns at most one live simulation; starting a new run cancels the
/// previous one first.
#[derive(Default)]
pub struct SimulationRunner {
    active: Option<SimulationHandle>,
}

impl SimulationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any prior run and start a fresh one.
    pub fn start(&mut self, project: ProjectData) -> FeasibilityResult<&SimulationHandle> {
        self.stop();
        Ok(self.active.insert(spawn_simulation(project)?))
    }

    /// Cancel the active run, if any, discarding its samples.
    pub fn stop(&mut self) {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
    }

    pub fn active(&self) -> Option<&SimulationHandle> {
        self.active.as_ref()
    }

    /// Detach the active handle, e.g. to wait on it.
    pub fn take_active(&mut self) -> Option<SimulationHandle> {
        self.active.take()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn worker_main(
    project: ProjectData,
    cancel_flag: &AtomicBool,
    sender: &Sender<SimulationMessage>,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        simulate(
            &project,
            || cancel_flag.load(Ordering::Relaxed),
            |progress| sender.send(SimulationMessage::Progress { progress }).is_ok(),
        )
    }));
    match outcome {
        Ok(Some((results, raw_data))) => {
            let _ = sender.send(SimulationMessage::Completed { results, raw_data });
        }
        // Cancelled or the host hung up: drop the samples silently.
        Ok(None) => {}
        Err(panic) => {
            let _ = sender.send(SimulationMessage::Failed {
                error: panic_message(&panic),
            });
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "simulation worker panicked".to_string()
    }
}

/// The sampling loop shared by the synchronous and worker entry points.
///
/// `should_stop` is checked between iterations; `on_progress` returns false
/// when the listener has gone away. Either condition abandons the run and
/// returns `None`.
fn simulate(
    project: &ProjectData,
    should_stop: impl Fn() -> bool,
    mut on_progress: impl FnMut(u8) -> bool,
) -> Option<(SimulationResults, SimulationRawData)> {
    let settings = &project.monte_carlo;
    let iterations = settings.iterations;

    // Active variables keep the map's stable key order so seeded runs draw
    // in a reproducible sequence.
    let targets: Vec<(StochasticTarget, &DistributionConfig)> = settings
        .variables
        .iter()
        .filter(|(_, config)| !matches!(config, DistributionConfig::None))
        .filter_map(|(id, config)| parse_variable_id(id).map(|target| (target, config)))
        .collect();

    // A project that never earns revenue would only ever produce degenerate
    // samples; short-circuit with an explicit all-zero result set.
    let base = engine::calculate_outputs(project);
    if !base.revenue_schedule.iter().any(|revenue| *revenue > 0.0) {
        return Some((SimulationResults::default(), SimulationRawData::default()));
    }

    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sampler = DistributionSampler::new(rng);

    let mut npv = Vec::with_capacity(iterations as usize);
    let mut irr = Vec::with_capacity(iterations as usize);
    let mut roi = Vec::with_capacity(iterations as usize);
    let mut payback = Vec::new();

    let stride = (iterations / 100).max(1);
    for iteration in 0..iterations {
        if should_stop() {
            return None;
        }

        let mut draw = project.clone();
        for (target, config) in &targets {
            apply_sample(&mut draw, target, sampler.sample(config));
        }
        let kpis = engine::calculate_outputs(&draw).kpis;

        if kpis.npv.is_finite() {
            npv.push(kpis.npv);
        }
        if kpis.irr.is_finite() {
            irr.push(kpis.irr);
        }
        if kpis.roi.is_finite() {
            roi.push(kpis.roi);
        }
        // -1 marks "never recovered"; it is finite but not a sample.
        if kpis.payback_period.is_finite() && kpis.payback_period >= 0.0 {
            payback.push(kpis.payback_period);
        }

        let done = iteration + 1;
        if done % stride == 0 || done == iterations {
            let progress = (done as f64 / iterations as f64 * 100.0) as u8;
            if !on_progress(progress) {
                return None;
            }
        }
    }

    let discount_rate = project.estimation_basis.discount_rate / 100.0;
    Some(reduce_samples(
        iterations,
        npv,
        irr,
        roi,
        payback,
        discount_rate,
    ))
}

fn apply_sample(project: &mut ProjectData, target: &StochasticTarget, sample: f64) {
    let basis = &mut project.estimation_basis;
    match target {
        StochasticTarget::DiscountRate => basis.discount_rate = sample,
        StochasticTarget::TaxRate => basis.tax_rate = sample,
        StochasticTarget::InflationRate => basis.inflation_rate = sample,
        StochasticTarget::RevenueGrowthRate => basis.revenue_growth_rate = sample,
        StochasticTarget::WorkingCapitalPct => basis.working_capital_pct = sample,
        StochasticTarget::RevenueUnitPrice(id) => {
            if let Some(item) = project.revenue_items.iter_mut().find(|item| item.id == *id) {
                item.unit_price = sample;
            }
        }
        StochasticTarget::RevenueQuantity(id) => {
            if let Some(item) = project.revenue_items.iter_mut().find(|item| item.id == *id) {
                item.quantity = sample;
            }
        }
    }
}

fn reduce_samples(
    iterations: u32,
    mut npv: Vec<f64>,
    mut irr: Vec<f64>,
    mut roi: Vec<f64>,
    mut payback: Vec<f64>,
    discount_rate: f64,
) -> (SimulationResults, SimulationRawData) {
    let npv_stats = compute_statistics(&mut npv);
    let irr_stats = compute_statistics(&mut irr);
    let roi_stats = compute_statistics(&mut roi);
    let payback_stats = compute_statistics(&mut payback);
    let results = SimulationResults {
        iterations,
        npv: npv_stats,
        irr: irr_stats,
        roi: roi_stats,
        payback: payback_stats,
        probability_npv_positive: fraction_above(&npv, 0.0),
        probability_irr_above_discount: fraction_above(&irr, discount_rate),
    };
    let raw_data = SimulationRawData {
        npv,
        irr,
        roi,
        payback,
    };
    (results, raw_data)
}

/// Statistics for one KPI vector, sorting the slice in place. An empty
/// vector reduces to all zeros.
fn compute_statistics(values: &mut [f64]) -> KpiStatistics {
    if values.is_empty() {
        return KpiStatistics::default();
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();

    let mean = values.iter().sum::<f64>() / n as f64;
    let median = if n.is_multiple_of(2) {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    };
    // Sample deviation; population divisor below two observations.
    let divisor = if n <= 1 { n as f64 } else { (n - 1) as f64 };
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / divisor;

    KpiStatistics {
        mean,
        median,
        std_dev: variance.sqrt(),
        p10: percentile_sorted(values, 0.10),
        p25: percentile_sorted(values, 0.25),
        p75: percentile_sorted(values, 0.75),
        p90: percentile_sorted(values, 0.90),
    }
}

/// `sorted[floor(n·q)]`, clamped to the last element.
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let idx = (sorted.len() as f64 * q) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn fraction_above(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|value| **value > threshold).count() as f64 / values.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
