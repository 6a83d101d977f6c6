// src/models/model.rs
use super::gbm::Gbm;
use super::heston::{Heston, HestonParams};
use super::merton::{Merton, MertonParams};
use crate::error::{McError, McResult};
use crate::market::MarketParameters;
use serde::Serialize;

/// A risk-neutral price process driven only by standard normals.
///
/// `evolve` receives `steps * drivers_per_step()` normals laid out step by
/// step and writes `steps + 1` prices into `path`, with `path[0] = s0`.
/// Because every model consumes plain normals, antithetic negation and
/// quasi-random inputs work for all of them.
pub trait PathModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn drivers_per_step(&self) -> usize;

    fn evolve(&self, s0: f64, dt: f64, normals: &[f64], path: &mut [f64]) -> McResult<()>;
}

/// Which process the Monte Carlo engine simulates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Dynamics {
    Gbm,
    Heston(HestonParams),
    Merton(MertonParams),
}

impl Default for Dynamics {
    fn default() -> Self {
        Dynamics::Gbm
    }
}

impl Dynamics {
    /// Builds the path model for `market`, validating model parameters
    pub fn model(&self, market: &MarketParameters) -> McResult<Box<dyn PathModel>> {
        Ok(match self {
            Dynamics::Gbm => Box::new(Gbm::from_market(market)),
            Dynamics::Heston(params) => Box::new(Heston::new(market.rate, *params)?),
            Dynamics::Merton(params) => {
                Box::new(Merton::new(market.rate, market.volatility, *params)?)
            }
        })
    }

    pub fn drivers_per_step(&self) -> usize {
        match self {
            Dynamics::Gbm => 1,
            Dynamics::Heston(_) => 2,
            Dynamics::Merton(_) => 3,
        }
    }

    /// True when every simulated path collapses to S0·e^{rt}
    pub fn is_deterministic(&self, market: &MarketParameters) -> bool {
        if market.maturity == 0.0 {
            return true;
        }
        match self {
            Dynamics::Gbm => market.volatility == 0.0,
            Dynamics::Heston(_) => false,
            Dynamics::Merton(p) => market.volatility == 0.0 && p.lambda == 0.0,
        }
    }
}

/// Rejects NaN/∞ produced while stepping a path
#[inline]
pub(crate) fn ensure_finite(method: &str, step: usize, value: f64) -> McResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(McError::overflow(
            method,
            format!("non-finite value {} at step {}", value, step),
        ))
    }
}

/// Checks the buffer sizes handed to `PathModel::evolve`
pub(crate) fn check_buffers(
    model: &dyn PathModel,
    normals: &[f64],
    path: &[f64],
) -> McResult<usize> {
    let steps = path.len().saturating_sub(1);
    if steps == 0 || normals.len() != steps * model.drivers_per_step() {
        return Err(McError::configuration(
            "normals",
            format!(
                "{} needs {} normals for {} steps, got {}",
                model.name(),
                steps * model.drivers_per_step(),
                steps,
                normals.len()
            ),
        ));
    }
    Ok(steps)
}
