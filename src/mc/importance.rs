// src/mc/importance.rs
//! Importance sampling for normal tail probabilities
//!
//! Estimates `P(X < -α)` for `X ~ N(μ, σ²)` by sampling from a proposal
//! `N(μ_g, σ_g²)` shifted into the tail and reweighting:
//! ```text
//! P̂ = (1/n) Σ 1{x_i < -α} · f(x_i) / g(x_i),    x_i ~ g
//! ```
//! A proposal centred on the threshold puts about half its samples in the
//! event, where naive sampling of a 3σ event hits it roughly once in 740
//! draws.

use crate::error::{validation::*, McError, McResult};
use crate::math_utils::{norm_cdf, normal_pdf};
use crate::mc::mc_engine::{chunk_count, run_chunks};
use crate::mc::stats::{DrawProvenance, EstimatorResult, PayoffStats};
use crate::rng::{get_normal_draw, RngFactory};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImportanceSamplingSpec {
    pub mu: f64,
    pub sigma: f64,
    pub proposal_mu: f64,
    pub proposal_sigma: f64,
    /// Event threshold, the event is `X < -alpha`
    pub alpha: f64,
}

impl ImportanceSamplingSpec {
    /// Proposal N(-α, σ) for a standard normal-style target
    pub fn shifted_to_threshold(mu: f64, sigma: f64, alpha: f64) -> Self {
        ImportanceSamplingSpec {
            mu,
            sigma,
            proposal_mu: -alpha,
            proposal_sigma: sigma,
            alpha,
        }
    }

    pub fn validate(&self) -> McResult<()> {
        validate_finite("mu", self.mu)?;
        validate_positive("sigma", self.sigma)?;
        validate_finite("proposal_mu", self.proposal_mu)?;
        validate_positive("proposal_sigma", self.proposal_sigma)?;
        validate_finite("alpha", self.alpha)?;
        Ok(())
    }

    /// Closed-form Φ((-α - μ)/σ)
    pub fn exact(&self) -> f64 {
        norm_cdf((-self.alpha - self.mu) / self.sigma)
    }

    /// Likelihood ratio f(x)/g(x)
    pub fn weight(&self, x: f64) -> McResult<f64> {
        let f = normal_pdf(x, self.mu, self.sigma);
        let g = normal_pdf(x, self.proposal_mu, self.proposal_sigma);
        if g > 0.0 {
            Ok(f / g)
        } else if f > 0.0 {
            Err(McError::DegenerateProposal {
                x,
                original_density: f,
            })
        } else {
            Ok(0.0)
        }
    }
}

/// Importance-sampling estimate of `P(X < -alpha)` from `n` proposal draws
pub fn tail_probability_importance(
    spec: &ImportanceSamplingSpec,
    n: usize,
    factory: &mut RngFactory,
) -> McResult<EstimatorResult> {
    spec.validate()?;
    validate_paths(n)?;
    let block = factory.reserve(chunk_count(n) as u64);

    let stats: PayoffStats = run_chunks(n, &block, |rng, len, acc: &mut PayoffStats| {
        for _ in 0..len {
            let x = spec.proposal_mu + spec.proposal_sigma * get_normal_draw(rng);
            let sample = if x < -spec.alpha { spec.weight(x)? } else { 0.0 };
            acc.push(sample);
        }
        Ok(())
    })?;

    EstimatorResult::discounted(
        "importance sampling",
        stats.mean(),
        Some(stats.std_error()),
        1.0,
        n,
        DrawProvenance::from(&block),
    )
}

/// Plain Monte Carlo estimate of the same probability, for comparison
pub fn tail_probability_naive(
    spec: &ImportanceSamplingSpec,
    n: usize,
    factory: &mut RngFactory,
) -> McResult<EstimatorResult> {
    spec.validate()?;
    validate_paths(n)?;
    let block = factory.reserve(chunk_count(n) as u64);

    let stats: PayoffStats = run_chunks(n, &block, |rng, len, acc: &mut PayoffStats| {
        for _ in 0..len {
            let x = spec.mu + spec.sigma * get_normal_draw(rng);
            acc.push(if x < -spec.alpha { 1.0 } else { 0.0 });
        }
        Ok(())
    })?;

    EstimatorResult::discounted(
        "naive tail Monte Carlo",
        stats.mean(),
        Some(stats.std_error()),
        1.0,
        n,
        DrawProvenance::from(&block),
    )
}
