// src/mc/stats.rs
//! Moment accumulators and the estimator result record
//!
//! Accumulators use Welford updates and Chan's pairwise merge, so chunk
//! partials can be combined without the `Σx² - n·x̄²` cancellation that the
//! raw-sum form suffers for large payoffs. Merging happens in chunk order,
//! which keeps results bit-identical across thread counts.

use crate::error::{McError, McResult};
use serde::Serialize;

/// A partial result that can be merged with another of the same kind
pub trait Accumulator: Default + Send {
    fn merge(&mut self, other: &Self);
}

/// Running count, mean and sum of squared deviations of one quantity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PayoffStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl PayoffStats {
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance, zero for fewer than two samples
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).max(0.0)
        }
    }

    /// Standard error of the mean
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.variance() / self.count as f64).sqrt()
        }
    }
}

impl Accumulator for PayoffStats {
    fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count += other.count;
    }
}

impl FromIterator<f64> for PayoffStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = PayoffStats::default();
        for x in iter {
            stats.push(x);
        }
        stats
    }
}

/// Joint moments of an auxiliary payoff `x` and a target payoff `y`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PairStats {
    count: usize,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    c_xy: f64,
}

impl PairStats {
    #[inline]
    pub fn push(&mut self, x: f64, y: f64) {
        self.count += 1;
        let n = self.count as f64;
        let dx = x - self.mean_x;
        self.mean_x += dx / n;
        let dy = y - self.mean_y;
        self.mean_y += dy / n;
        self.m2_x += dx * (x - self.mean_x);
        self.m2_y += dy * (y - self.mean_y);
        self.c_xy += dx * (y - self.mean_y);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean_x(&self) -> f64 {
        self.mean_x
    }

    pub fn mean_y(&self) -> f64 {
        self.mean_y
    }

    fn denom(&self) -> f64 {
        (self.count.max(2) - 1) as f64
    }

    pub fn var_x(&self) -> f64 {
        (self.m2_x / self.denom()).max(0.0)
    }

    pub fn var_y(&self) -> f64 {
        (self.m2_y / self.denom()).max(0.0)
    }

    pub fn covariance(&self) -> f64 {
        self.c_xy / self.denom()
    }

    /// Cov(X, Y) / Var(X); zero when the auxiliary payoff never varies
    pub fn optimal_coefficient(&self) -> f64 {
        if self.m2_x > 0.0 {
            self.c_xy / self.m2_x
        } else {
            0.0
        }
    }

    /// Mean and standard error of `Y - b(X - expected_x)`
    pub fn controlled(&self, b: f64, expected_x: f64) -> (f64, f64) {
        let mean = self.mean_y - b * (self.mean_x - expected_x);
        let variance = (self.var_y() - 2.0 * b * self.covariance() + b * b * self.var_x()).max(0.0);
        let se = if self.count == 0 {
            0.0
        } else {
            (variance / self.count as f64).sqrt()
        };
        (mean, se)
    }
}

impl Accumulator for PairStats {
    fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let dx = other.mean_x - self.mean_x;
        let dy = other.mean_y - self.mean_y;
        self.mean_x += dx * n_b / n;
        self.mean_y += dy * n_b / n;
        self.m2_x += other.m2_x + dx * dx * n_a * n_b / n;
        self.m2_y += other.m2_y + dy * dy * n_a * n_b / n;
        self.c_xy += other.c_xy + dx * dy * n_a * n_b / n;
        self.count += other.count;
    }
}

/// Where the randomness behind an estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawProvenance {
    /// Streams `first_stream .. first_stream + streams` of the seeded factory
    Seeded {
        seed: u64,
        first_stream: u64,
        streams: u64,
    },
    /// Sobol points `first_index .. first_index + points`
    Sobol { first_index: u64, points: u64 },
    /// No randomness consumed
    Deterministic,
}

/// Outcome of one estimator call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatorResult {
    /// Discounted price (or probability) estimate
    pub estimate: f64,
    /// Sample standard error; `None` where it is not meaningful (quasi-random)
    pub std_error: Option<f64>,
    pub samples: usize,
    pub provenance: DrawProvenance,
    /// True when the deterministic short-circuit produced the value
    pub short_circuit: bool,
}

impl EstimatorResult {
    /// Applies the single late discount to an undiscounted mean and its SE
    pub fn discounted(
        method: &str,
        mean: f64,
        std_error: Option<f64>,
        discount: f64,
        samples: usize,
        provenance: DrawProvenance,
    ) -> McResult<Self> {
        let estimate = discount * mean;
        let std_error = std_error.map(|se| discount * se);
        if !estimate.is_finite() || std_error.map_or(false, |se| !se.is_finite()) {
            return Err(McError::overflow(
                method,
                format!("estimate {} / standard error {:?} not finite", estimate, std_error),
            ));
        }
        Ok(EstimatorResult {
            estimate,
            std_error,
            samples,
            provenance,
            short_circuit: false,
        })
    }

    /// Exact value with zero variance
    pub fn deterministic(value: f64, samples: usize) -> Self {
        EstimatorResult {
            estimate: value,
            std_error: Some(0.0),
            samples,
            provenance: DrawProvenance::Deterministic,
            short_circuit: true,
        }
    }

    /// `estimate ± z·SE`, or `None` without a standard error
    pub fn confidence_interval(&self, z: f64) -> Option<(f64, f64)> {
        self.std_error
            .map(|se| (self.estimate - z * se, self.estimate + z * se))
    }

    /// |estimate - reference| in units of SE
    pub fn z_score(&self, reference: f64) -> Option<f64> {
        match self.std_error {
            Some(se) if se > 0.0 => Some((self.estimate - reference).abs() / se),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_payoff_stats_matches_two_pass() {
        let data: Vec<f64> = (0..1000).map(|i| ((i * 37) % 101) as f64 * 0.5).collect();
        let stats: PayoffStats = data.iter().copied().collect();

        let mean = data.iter().sum::<f64>() / data.len() as f64;
        let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64;

        assert_approx_eq!(stats.mean(), mean, 1e-10);
        assert_approx_eq!(stats.variance(), var, 1e-8);
    }

    #[test]
    fn test_merge_equals_single_pass() {
        let data: Vec<f64> = (0..500).map(|i| (i as f64).sin() * 10.0 + 3.0).collect();
        let full: PayoffStats = data.iter().copied().collect();

        let mut merged = PayoffStats::default();
        for chunk in data.chunks(64) {
            let part: PayoffStats = chunk.iter().copied().collect();
            merged.merge(&part);
        }

        assert_eq!(merged.count(), full.count());
        assert_approx_eq!(merged.mean(), full.mean(), 1e-12);
        assert_approx_eq!(merged.variance(), full.variance(), 1e-10);
    }

    #[test]
    fn test_pair_stats_regression() {
        // y = 2x + 1 exactly: b* = 2 and the controlled variance vanishes
        let mut pairs = PairStats::default();
        let mut other = PairStats::default();
        for i in 0..200 {
            let x = (i as f64 * 0.7).cos();
            let target = if i < 120 { &mut pairs } else { &mut other };
            target.push(x, 2.0 * x + 1.0);
        }
        pairs.merge(&other);

        assert_approx_eq!(pairs.optimal_coefficient(), 2.0, 1e-10);
        let (_, se) = pairs.controlled(2.0, 0.0);
        assert!(se < 1e-7, "se = {}", se);
    }

    #[test]
    fn test_discounted_rejects_non_finite() {
        let err = EstimatorResult::discounted(
            "crude",
            f64::INFINITY,
            Some(1.0),
            0.9,
            10,
            DrawProvenance::Deterministic,
        );
        assert!(matches!(err, Err(McError::NumericOverflow { .. })));
    }

    #[test]
    fn test_provenance_serializes() {
        let result = EstimatorResult::discounted(
            "crude",
            10.0,
            Some(0.5),
            0.5,
            100,
            DrawProvenance::Seeded {
                seed: 7,
                first_stream: 0,
                streams: 1,
            },
        )
        .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"kind\":\"seeded\""));
        assert!(json.contains("\"estimate\":5.0"));
    }

    #[test]
    fn test_confidence_interval_and_z_score() {
        let result = EstimatorResult::discounted(
            "crude",
            10.0,
            Some(0.5),
            1.0,
            100,
            DrawProvenance::Deterministic,
        )
        .unwrap();
        let (lo, hi) = result.confidence_interval(1.96).unwrap();
        assert_approx_eq!(lo, 9.02, 1e-12);
        assert_approx_eq!(hi, 10.98, 1e-12);
        assert_approx_eq!(result.z_score(11.0).unwrap(), 2.0, 1e-12);

        // Short-circuits carry a zero SE, QMC none at all
        assert_eq!(EstimatorResult::deterministic(3.0, 10).z_score(3.0), None);
        let qmc = EstimatorResult { std_error: None, ..result };
        assert_eq!(qmc.confidence_interval(1.96), None);
    }
}
