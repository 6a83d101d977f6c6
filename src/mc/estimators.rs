// src/mc/estimators.rs
//! Variance-reduction estimators behind one interface
//!
//! # Estimators
//!
//! 1. **Crude**: `e^(-rT) * mean(Y)`, SE `e^(-rT) * s / √n`
//!
//! 2. **Antithetic Variates**: for each normal vector Z, also simulate the
//!    path driven by -Z and average the two payoffs. The SE comes from the
//!    n/2 pair means, which are independent.
//!
//! 3. **Control Variates**: with X a European payoff on the same path and a
//!    known expectation,
//!    ```text
//!    Y_cv = Y - b(X - E[X]),   E[X] = analytic_price * e^(rT)
//!    ```
//!    `E[X]` is undiscounted because the discount is applied once at the
//!    end. `b = 1` or the sample-optimal `b* = Cov(Y,X)/Var(X)`.
//!
//! 4. **Quasi-random**: Sobol points mapped through Φ⁻¹, see [`crate::mc::quasi`]

use crate::analytics::bs_analytic::black_scholes;
use crate::error::{validation::*, McError, McResult};
use crate::market::{MarketParameters, OptionSpec};
use crate::mc::mc_engine::{chunk_count, run_chunks, short_circuit, McConfig};
use crate::mc::path_generator::PathSimulator;
use crate::mc::quasi::quasi_random_estimate;
use crate::mc::stats::{DrawProvenance, EstimatorResult, PairStats, PayoffStats};
use crate::rng::{fill_normals, RngFactory, StreamBlock};
use crate::sobol::SobolSequence;
use serde::Serialize;
use tracing::{debug, instrument};

/// Caller-owned randomness handed to an estimator.
///
/// Both variants are cursors: every estimate advances them, so repeated
/// calls never reuse draws.
#[derive(Debug, Clone)]
pub enum DrawSource {
    Pseudo(RngFactory),
    Sobol(SobolSequence),
}

impl DrawSource {
    pub fn seeded(seed: u64) -> Self {
        DrawSource::Pseudo(RngFactory::new(seed))
    }

    /// Sobol sequence sized for `cfg`'s normals per path
    pub fn sobol_for(cfg: &McConfig) -> McResult<Self> {
        let dimension = cfg.steps * cfg.dynamics.drivers_per_step();
        Ok(DrawSource::Sobol(SobolSequence::new(dimension)?))
    }

    fn factory(&mut self, estimator: &str) -> McResult<&mut RngFactory> {
        match self {
            DrawSource::Pseudo(factory) => Ok(factory),
            DrawSource::Sobol(_) => Err(McError::configuration(
                "draw_source",
                format!("{} estimator needs a seeded pseudo-random source", estimator),
            )),
        }
    }

    fn sequence(&mut self, estimator: &str) -> McResult<&mut SobolSequence> {
        match self {
            DrawSource::Sobol(seq) => Ok(seq),
            DrawSource::Pseudo(_) => Err(McError::configuration(
                "draw_source",
                format!("{} estimator needs a Sobol source", estimator),
            )),
        }
    }
}

impl From<&StreamBlock> for DrawProvenance {
    fn from(block: &StreamBlock) -> Self {
        DrawProvenance::Seeded {
            seed: block.base_seed,
            first_stream: block.first,
            streams: block.count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CvCoefficient {
    /// b = 1, i.e. `Y + analytic - X`
    Unit,
    /// b* = Cov(X, Y) / Var(X) from the same samples
    Optimal,
}

/// Auxiliary European option with a closed-form price.
///
/// `analytic_price` must be computed with the same rate, volatility and
/// maturity as the simulation, otherwise the estimator is biased;
/// [`ControlVariateSpec::black_scholes`] guarantees that under GBM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlVariateSpec {
    pub auxiliary: OptionSpec,
    /// Discounted closed-form price of `auxiliary`
    pub analytic_price: f64,
    pub coefficient: CvCoefficient,
}

impl ControlVariateSpec {
    pub fn black_scholes(
        market: &MarketParameters,
        auxiliary: OptionSpec,
        coefficient: CvCoefficient,
    ) -> McResult<Self> {
        auxiliary.validate()?;
        let analytic_price = black_scholes(&market.with_strike(auxiliary.strike), auxiliary.kind)?;
        Ok(ControlVariateSpec {
            auxiliary,
            analytic_price,
            coefficient,
        })
    }

    pub fn validate(&self) -> McResult<()> {
        self.auxiliary.validate()?;
        validate_non_negative("analytic_price", self.analytic_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Estimator {
    Crude,
    Antithetic,
    ControlVariate(ControlVariateSpec),
    QuasiRandom,
}

impl Estimator {
    pub fn name(&self) -> &'static str {
        match self {
            Estimator::Crude => "crude",
            Estimator::Antithetic => "antithetic",
            Estimator::ControlVariate(_) => "control_variate",
            Estimator::QuasiRandom => "quasi_random",
        }
    }

    /// Price `cfg.payoff` with this estimator, drawing from `source`.
    ///
    /// Deterministic configurations (T = 0, or no diffusion) return the
    /// exact value with zero standard error and leave `source` untouched.
    #[instrument(skip_all, fields(estimator = self.name(), paths = cfg.paths, steps = cfg.steps))]
    pub fn estimate(&self, cfg: &McConfig, source: &mut DrawSource) -> McResult<EstimatorResult> {
        cfg.validate()?;
        match self {
            Estimator::Antithetic => validate_even_paths(cfg.paths)?,
            Estimator::ControlVariate(spec) => spec.validate()?,
            _ => {}
        }
        // Source mismatches are configuration errors even when no draw is needed
        match self {
            Estimator::QuasiRandom => {
                source.sequence(self.name())?;
            }
            _ => {
                source.factory(self.name())?;
            }
        }

        if cfg.is_deterministic() {
            return short_circuit(cfg, self.name());
        }

        let result = match self {
            Estimator::Crude => crude(cfg, source.factory(self.name())?),
            Estimator::Antithetic => antithetic(cfg, source.factory(self.name())?),
            Estimator::ControlVariate(spec) => {
                control_variate(cfg, spec, source.factory(self.name())?)
            }
            Estimator::QuasiRandom => quasi_random_estimate(cfg, source.sequence(self.name())?),
        }?;

        debug!(
            estimate = result.estimate,
            std_error = ?result.std_error,
            "estimate complete"
        );
        Ok(result)
    }
}

fn crude(cfg: &McConfig, factory: &mut RngFactory) -> McResult<EstimatorResult> {
    let sim = PathSimulator::new(&cfg.dynamics, &cfg.market, cfg.steps)?;
    let block = factory.reserve(chunk_count(cfg.paths) as u64);

    let stats: PayoffStats = run_chunks(cfg.paths, &block, |rng, len, acc: &mut PayoffStats| {
        let mut ws = sim.workspace();
        for _ in 0..len {
            fill_normals(rng, &mut ws.normals);
            sim.simulate(&mut ws)?;
            acc.push(cfg.payoff.calculate(&ws.path));
        }
        Ok(())
    })?;

    EstimatorResult::discounted(
        "crude Monte Carlo",
        stats.mean(),
        Some(stats.std_error()),
        cfg.market.discount_factor(),
        cfg.paths,
        DrawProvenance::from(&block),
    )
}

fn antithetic(cfg: &McConfig, factory: &mut RngFactory) -> McResult<EstimatorResult> {
    let sim = PathSimulator::new(&cfg.dynamics, &cfg.market, cfg.steps)?;
    let pairs = cfg.paths / 2;
    let block = factory.reserve(chunk_count(pairs) as u64);

    let stats: PayoffStats = run_chunks(pairs, &block, |rng, len, acc: &mut PayoffStats| {
        let mut ws = sim.workspace();
        for _ in 0..len {
            fill_normals(rng, &mut ws.normals);
            sim.simulate(&mut ws)?;
            let y_plus = cfg.payoff.calculate(&ws.path);

            ws.negate_normals();
            sim.simulate(&mut ws)?;
            let y_minus = cfg.payoff.calculate(&ws.path);

            acc.push(0.5 * (y_plus + y_minus));
        }
        Ok(())
    })?;

    EstimatorResult::discounted(
        "antithetic Monte Carlo",
        stats.mean(),
        Some(stats.std_error()),
        cfg.market.discount_factor(),
        cfg.paths,
        DrawProvenance::from(&block),
    )
}

fn control_variate(
    cfg: &McConfig,
    spec: &ControlVariateSpec,
    factory: &mut RngFactory,
) -> McResult<EstimatorResult> {
    let sim = PathSimulator::new(&cfg.dynamics, &cfg.market, cfg.steps)?;
    let block = factory.reserve(chunk_count(cfg.paths) as u64);

    let pairs: PairStats = run_chunks(cfg.paths, &block, |rng, len, acc: &mut PairStats| {
        let mut ws = sim.workspace();
        for _ in 0..len {
            fill_normals(rng, &mut ws.normals);
            sim.simulate(&mut ws)?;
            let s_t = ws.path[ws.path.len() - 1];
            acc.push(spec.auxiliary.intrinsic(s_t), cfg.payoff.calculate(&ws.path));
        }
        Ok(())
    })?;

    let b = match spec.coefficient {
        CvCoefficient::Unit => 1.0,
        CvCoefficient::Optimal => pairs.optimal_coefficient(),
    };
    let expected_x = spec.analytic_price / cfg.market.discount_factor();
    let (mean, se) = pairs.controlled(b, expected_x);
    debug!(
        b,
        correlation = pairs.covariance() / (pairs.var_x() * pairs.var_y()).sqrt(),
        "control variate coefficient"
    );

    EstimatorResult::discounted(
        "control variate Monte Carlo",
        mean,
        Some(se),
        cfg.market.discount_factor(),
        cfg.paths,
        DrawProvenance::from(&block),
    )
}
