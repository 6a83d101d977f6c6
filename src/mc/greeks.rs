// src/mc/greeks.rs
//! Monte Carlo Greeks for European options under GBM
//!
//! # Pathwise derivatives
//!
//! With `S_T = S₀ exp((r - σ²/2)T + σW_T)` and `ψ = sign · 1{in the money}`
//! (+1 for calls, -1 for puts), differentiating inside the expectation gives
//! ```text
//! Δ = e^(-rT) E[ψ · S_T/S₀]
//! ν = e^(-rT) E[ψ · S_T(-σT + W_T)]
//! ρ = e^(-rT) E[-T·payoff + ψ · S_T·T]
//! ```
//!
//! # Gamma
//!
//! The pathwise delta is discontinuous at the strike, so gamma is a
//! central difference of pathwise deltas with common random numbers:
//! ```text
//! Γ ≈ [Δ(S₀ + ε) - Δ(S₀ - ε)] / (2ε)
//! ```
//! The same draw Z is applied to both spot scenarios within a single pass.

use crate::analytics::bs_analytic::bs_greeks;
use crate::error::{validation::*, McError, McResult};
use crate::market::{MarketParameters, OptionSpec};
use crate::mc::mc_engine::{chunk_count, run_chunks};
use crate::mc::stats::{Accumulator, DrawProvenance, PayoffStats};
use crate::models::Gbm;
use crate::rng::{get_normal_draw, RngFactory};
use bitflags::bitflags;
use serde::Serialize;
use tracing::{info, instrument};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GreeksConfig: u32 {
        const NONE  = 0;
        const DELTA = 1 << 0;
        const VEGA  = 1 << 1;
        const RHO   = 1 << 2;
        const GAMMA = 1 << 3;
    }
}

#[derive(Clone, Debug)]
pub struct McGreeksConfig {
    pub paths: usize,
    pub market: MarketParameters,
    pub option: OptionSpec,
    pub greeks: GreeksConfig,
    pub use_antithetic: bool,
    pub epsilon: Option<f64>, // For finite difference gamma (default: 1e-3 * spot)
}

impl McGreeksConfig {
    pub fn validate(&self) -> McResult<()> {
        validate_paths(self.paths)?;
        self.market.validate()?;
        self.option.validate()?;

        if let Some(eps) = self.epsilon {
            validate_positive("epsilon", eps)?;
            if eps > self.market.spot * 0.1 {
                return Err(McError::InvalidParameter {
                    parameter: "epsilon".to_string(),
                    value: eps,
                    constraint: format!(
                        "should be much smaller than spot price ({})",
                        self.market.spot
                    ),
                });
            }
        }

        Ok(())
    }

    fn epsilon(&self) -> f64 {
        self.epsilon.unwrap_or(1e-3 * self.market.spot)
    }
}

impl Default for McGreeksConfig {
    fn default() -> Self {
        McGreeksConfig {
            paths: 1_000_000,
            market: MarketParameters::default(),
            option: OptionSpec::call(100.0),
            greeks: GreeksConfig::DELTA | GreeksConfig::VEGA | GreeksConfig::RHO,
            use_antithetic: true,
            epsilon: None,
        }
    }
}

/// A Greek estimate with its standard error
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GreekEstimate {
    pub value: f64,
    pub std_error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McGreeks {
    pub price: GreekEstimate,
    pub delta: Option<GreekEstimate>,
    pub vega: Option<GreekEstimate>,
    pub rho: Option<GreekEstimate>,
    pub gamma: Option<GreekEstimate>,
    pub samples: usize,
    pub provenance: DrawProvenance,
    pub short_circuit: bool,
}

#[derive(Default)]
struct GreekStats {
    price: PayoffStats,
    delta: PayoffStats,
    vega: PayoffStats,
    rho: PayoffStats,
    gamma: PayoffStats,
}

impl Accumulator for GreekStats {
    fn merge(&mut self, other: &Self) {
        self.price.merge(&other.price);
        self.delta.merge(&other.delta);
        self.vega.merge(&other.vega);
        self.rho.merge(&other.rho);
        self.gamma.merge(&other.gamma);
    }
}

/// Per-draw pathwise contributions, undiscounted
#[derive(Default, Clone, Copy)]
struct PathwiseSample {
    payoff: f64,
    delta: f64,
    vega: f64,
    rho: f64,
    gamma: f64,
}

impl PathwiseSample {
    fn average(self, other: Self) -> Self {
        PathwiseSample {
            payoff: 0.5 * (self.payoff + other.payoff),
            delta: 0.5 * (self.delta + other.delta),
            vega: 0.5 * (self.vega + other.vega),
            rho: 0.5 * (self.rho + other.rho),
            gamma: 0.5 * (self.gamma + other.gamma),
        }
    }
}

struct PathwiseKernel {
    gbm: Gbm,
    option: OptionSpec,
    spot: f64,
    t: f64,
    epsilon: f64,
}

impl PathwiseKernel {
    /// ψ · S_T/s, the pathwise delta at spot `s`
    #[inline]
    fn delta_at(&self, s: f64, z: f64) -> f64 {
        let st = self.gbm.terminal(s, self.t, z);
        if self.option.intrinsic(st) > 0.0 {
            self.option.kind.sign() * st / s
        } else {
            0.0
        }
    }

    #[inline]
    fn sample(&self, z: f64, with_gamma: bool) -> PathwiseSample {
        let w_t = self.t.sqrt() * z;
        let st = self.gbm.terminal(self.spot, self.t, z);
        let payoff = self.option.intrinsic(st);
        let psi = if payoff > 0.0 {
            self.option.kind.sign()
        } else {
            0.0
        };

        let gamma = if with_gamma {
            (self.delta_at(self.spot + self.epsilon, z) - self.delta_at(self.spot - self.epsilon, z))
                / (2.0 * self.epsilon)
        } else {
            0.0
        };

        PathwiseSample {
            payoff,
            delta: psi * st / self.spot,
            // dS_T/dsigma = S_T * (-sigma * T + W_T)
            vega: psi * st * (-self.gbm.sigma * self.t + w_t),
            // dS_T/dr = S_T * T
            rho: -self.t * payoff + psi * st * self.t,
            gamma,
        }
    }
}

/// Price and the requested Greeks of a European option by pathwise Monte Carlo
#[instrument(skip_all, fields(paths = cfg.paths, greeks = ?cfg.greeks))]
pub fn mc_greeks(cfg: &McGreeksConfig, factory: &mut RngFactory) -> McResult<McGreeks> {
    cfg.validate()?;
    let market = &cfg.market;
    let pick = |flag: GreeksConfig, value: f64| cfg.greeks.contains(flag).then_some(value);

    if market.is_deterministic() {
        let g = bs_greeks(
            cfg.option.kind,
            market.spot,
            cfg.option.strike,
            market.rate,
            market.volatility,
            market.maturity,
        );
        info!(value = g.price, "deterministic short-circuit for Greeks");
        let exact = |value: f64| GreekEstimate {
            value,
            std_error: 0.0,
        };
        return Ok(McGreeks {
            price: exact(g.price),
            delta: pick(GreeksConfig::DELTA, g.delta).map(exact),
            vega: pick(GreeksConfig::VEGA, g.vega).map(exact),
            rho: pick(GreeksConfig::RHO, g.rho).map(exact),
            gamma: pick(GreeksConfig::GAMMA, g.gamma).map(exact),
            samples: cfg.paths,
            provenance: DrawProvenance::Deterministic,
            short_circuit: true,
        });
    }

    let kernel = PathwiseKernel {
        gbm: Gbm::from_market(market),
        option: cfg.option,
        spot: market.spot,
        t: market.maturity,
        epsilon: cfg.epsilon(),
    };
    let with_gamma = cfg.greeks.contains(GreeksConfig::GAMMA);
    let block = factory.reserve(chunk_count(cfg.paths) as u64);

    let stats: GreekStats = run_chunks(cfg.paths, &block, |rng, len, acc: &mut GreekStats| {
        for _ in 0..len {
            let z = get_normal_draw(rng);
            let mut s = kernel.sample(z, with_gamma);
            if cfg.use_antithetic {
                s = s.average(kernel.sample(-z, with_gamma));
            }
            acc.price.push(s.payoff);
            acc.delta.push(s.delta);
            acc.vega.push(s.vega);
            acc.rho.push(s.rho);
            acc.gamma.push(s.gamma);
        }
        Ok(())
    })?;

    let discount = market.discount_factor();
    let finish = |name: &str, stats: &PayoffStats| -> McResult<GreekEstimate> {
        let value = discount * stats.mean();
        if !value.is_finite() {
            return Err(McError::overflow(
                "pathwise Greeks",
                format!("{} estimate is not finite", name),
            ));
        }
        Ok(GreekEstimate {
            value,
            std_error: discount * stats.std_error(),
        })
    };
    let select = |flag: GreeksConfig, name: &str, stats: &PayoffStats| {
        if cfg.greeks.contains(flag) {
            finish(name, stats).map(Some)
        } else {
            Ok(None)
        }
    };

    Ok(McGreeks {
        price: finish("price", &stats.price)?,
        delta: select(GreeksConfig::DELTA, "delta", &stats.delta)?,
        vega: select(GreeksConfig::VEGA, "vega", &stats.vega)?,
        rho: select(GreeksConfig::RHO, "rho", &stats.rho)?,
        gamma: select(GreeksConfig::GAMMA, "gamma", &stats.gamma)?,
        samples: cfg.paths,
        provenance: DrawProvenance::from(&block),
        short_circuit: false,
    })
}
