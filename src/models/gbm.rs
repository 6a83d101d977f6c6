// src/models/gbm.rs
use super::model::{check_buffers, ensure_finite, PathModel};
use crate::error::McResult;
use crate::market::MarketParameters;

/// Geometric Brownian motion under the risk-neutral measure,
/// `dS = r S dt + σ S dW`, stepped with the exact log-normal solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gbm {
    pub r: f64,
    pub sigma: f64,
}

impl Gbm {
    pub fn new(r: f64, sigma: f64) -> Self {
        Gbm { r, sigma }
    }

    pub fn from_market(market: &MarketParameters) -> Self {
        Gbm::new(market.rate, market.volatility)
    }

    #[inline]
    pub fn exact_step(&self, s_t: f64, dt: f64, normal_draw: f64) -> f64 {
        s_t * ((self.r - 0.5 * self.sigma * self.sigma) * dt
            + self.sigma * dt.sqrt() * normal_draw)
            .exp()
    }

    /// S_T = S0 exp((r - σ²/2)T + σ√T Z)
    #[inline]
    pub fn terminal(&self, s0: f64, t: f64, normal_draw: f64) -> f64 {
        self.exact_step(s0, t, normal_draw)
    }
}

impl PathModel for Gbm {
    fn name(&self) -> &'static str {
        "GBM"
    }

    fn drivers_per_step(&self) -> usize {
        1
    }

    fn evolve(&self, s0: f64, dt: f64, normals: &[f64], path: &mut [f64]) -> McResult<()> {
        check_buffers(self, normals, path)?;
        path[0] = s0;
        for (i, &z) in normals.iter().enumerate() {
            path[i + 1] = self.exact_step(path[i], dt, z);
            ensure_finite("GBM step", i + 1, path[i + 1])?;
        }
        Ok(())
    }
}
