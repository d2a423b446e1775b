//! Sampling routines for the distributions a stochastic variable can take.
//!
//! Parameters are taken at face value: nothing here validates ranges beyond
//! defending against division by zero, and invalid shape parameters come
//! back as NaN rather than an error.

use rand::Rng;

use crate::types::DistributionConfig;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Draws samples for one simulation worker.
///
/// The polar Box-Muller transform produces normal deviates in pairs; the
/// sampler keeps the spare in a single slot it owns, so concurrent workers
/// never share cache state.
pub struct DistributionSampler<R: Rng> {
    rng: R,
    spare_normal: Option<f64>,
}

impl<R: Rng> DistributionSampler<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            spare_normal: None,
        }
    }

    /// One sample per the configured distribution. `None` yields NaN; the
    /// driver filters inactive variables out before sampling.
    pub fn sample(&mut self, config: &DistributionConfig) -> f64 {
        match *config {
            DistributionConfig::None => f64::NAN,
            DistributionConfig::Normal { mean, std_dev } => self.normal(mean, std_dev),
            DistributionConfig::Uniform { min, max } => self.uniform(min, max),
            DistributionConfig::Triangular { min, mode, max } => self.triangular(min, mode, max),
            DistributionConfig::Beta { alpha, beta } => self.beta(alpha, beta),
            DistributionConfig::Pert {
                min,
                mode,
                max,
                shape,
            } => self.pert(min, mode, max, shape),
            DistributionConfig::Lognormal {
                log_mean,
                log_std_dev,
            } => self.lognormal(log_mean, log_std_dev),
        }
    }

    /// Polar Box-Muller. Each accepted point yields two independent standard
    /// normals; the second is cached for the next call.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if let Some(spare) = self.spare_normal.take() {
            return mean + std_dev * spare;
        }
        loop {
            let u: f64 = self.rng.gen_range(-1.0..1.0);
            let v: f64 = self.rng.gen_range(-1.0..1.0);
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let factor = (-2.0 * s.ln() / s).sqrt();
                self.spare_normal = Some(v * factor);
                return mean + std_dev * u * factor;
            }
        }
    }

    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.rng.gen::<f64>()
    }

    /// Inverse-CDF triangular draw. A zero-width range collapses to `min`.
    pub fn triangular(&mut self, min: f64, mode: f64, max: f64) -> f64 {
        if max == min {
            return min;
        }
        let span = max - min;
        let cut = (mode - min) / span;
        let u: f64 = self.rng.gen();
        if u < cut {
            min + (u * span * (mode - min)).sqrt()
        } else {
            max - ((1.0 - u) * span * (max - mode)).sqrt()
        }
    }

    /// Johnk's rejection algorithm. NaN when either shape is non-positive.
    pub fn beta(&mut self, alpha: f64, beta: f64) -> f64 {
        if alpha <= 0.0 || beta <= 0.0 {
            return f64::NAN;
        }
        loop {
            let v1 = self.rng.gen::<f64>().powf(1.0 / alpha);
            let v2 = self.rng.gen::<f64>().powf(1.0 / beta);
            let sum = v1 + v2;
            if sum > 0.0 && sum <= 1.0 {
                return v1 / sum;
            }
        }
    }

    /// PERT draw via Beta shape derivation; `shape` weights the mode (4 is
    /// classical). Degenerate ranges fall back: `min` when `min == max`,
    /// `mode` when the range is inverted or the mode lies outside it.
    pub fn pert(&mut self, min: f64, mode: f64, max: f64, shape: f64) -> f64 {
        if min == max {
            return min;
        }
        if min > max || mode < min || mode > max {
            return mode;
        }
        let span = max - min;
        let alpha = 1.0 + shape * (mode - min) / span;
        let beta = 1.0 + shape * (max - mode) / span;
        min + span * self.beta(alpha, beta)
    }

    pub fn lognormal(&mut self, log_mean: f64, log_std_dev: f64) -> f64 {
        self.normal(log_mean, log_std_dev).exp()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
