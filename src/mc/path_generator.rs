// src/mc/path_generator.rs
//! Terminal values and full paths from standard normal draws
//!
//! Terminal values under plain GBM come straight from the exact solution:
//! ```text
//! S_T = S_0 * exp((r - σ²/2)T + σ√T * Z)
//! ```
//! Full paths go through a [`PathModel`], which may need several normals
//! per step.

use crate::error::{validation::*, McResult};
use crate::market::MarketParameters;
use crate::models::model::ensure_finite;
use crate::models::{Dynamics, Gbm, PathModel};
use crate::rng::fill_normals;
use ndarray::{Array1, Array2};
use rand::Rng;

/// `n` GBM terminal values, one normal each
pub fn terminal_values<R: Rng + ?Sized>(
    market: &MarketParameters,
    n: usize,
    rng: &mut R,
) -> McResult<Array1<f64>> {
    market.validate()?;
    validate_paths(n)?;
    let gbm = Gbm::from_market(market);

    let mut z = vec![0.0; n];
    fill_normals(rng, &mut z);
    let mut out = Array1::zeros(n);
    for (i, &zi) in z.iter().enumerate() {
        out[i] = gbm.terminal(market.spot, market.maturity, zi);
        ensure_finite("GBM terminal value", 1, out[i])?;
    }
    Ok(out)
}

/// `n/2` normals `Z` give the first half, `-Z` the second half
pub fn antithetic_terminal_values<R: Rng + ?Sized>(
    market: &MarketParameters,
    n: usize,
    rng: &mut R,
) -> McResult<Array1<f64>> {
    market.validate()?;
    validate_even_paths(n)?;
    let gbm = Gbm::from_market(market);
    let half = n / 2;

    let mut z = vec![0.0; half];
    fill_normals(rng, &mut z);
    let mut out = Array1::zeros(n);
    for (i, &zi) in z.iter().enumerate() {
        out[i] = gbm.terminal(market.spot, market.maturity, zi);
        out[half + i] = gbm.terminal(market.spot, market.maturity, -zi);
        ensure_finite("GBM terminal value", 1, out[i])?;
        ensure_finite("GBM terminal value", 1, out[half + i])?;
    }
    Ok(out)
}

/// `n` paths of `steps + 1` points, one path per row
pub fn generate_paths<R: Rng + ?Sized>(
    model: &dyn PathModel,
    market: &MarketParameters,
    steps: usize,
    n: usize,
    rng: &mut R,
) -> McResult<Array2<f64>> {
    market.validate()?;
    validate_paths(n)?;
    validate_steps(steps)?;

    let mut paths = Array2::zeros((n, steps + 1));
    if market.maturity == 0.0 {
        paths.fill(market.spot);
        return Ok(paths);
    }

    let dt = market.maturity / steps as f64;
    let mut normals = vec![0.0; steps * model.drivers_per_step()];
    let mut path = vec![0.0; steps + 1];
    for mut row in paths.rows_mut() {
        fill_normals(rng, &mut normals);
        model.evolve(market.spot, dt, &normals, &mut path)?;
        for (r, p) in row.iter_mut().zip(&path) {
            *r = *p;
        }
    }
    Ok(paths)
}

/// The no-diffusion path S_0·e^{r t_i}
pub fn deterministic_path(market: &MarketParameters, steps: usize) -> Vec<f64> {
    let dt = market.maturity / steps.max(1) as f64;
    (0..=steps)
        .map(|i| market.spot * (market.rate * dt * i as f64).exp())
        .collect()
}

/// A validated model bound to one market and time grid
pub struct PathSimulator {
    model: Box<dyn PathModel>,
    spot: f64,
    dt: f64,
    steps: usize,
}

impl PathSimulator {
    pub fn new(dynamics: &Dynamics, market: &MarketParameters, steps: usize) -> McResult<Self> {
        validate_steps(steps)?;
        Ok(PathSimulator {
            model: dynamics.model(market)?,
            spot: market.spot,
            dt: market.maturity / steps as f64,
            steps,
        })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn drivers_per_step(&self) -> usize {
        self.model.drivers_per_step()
    }

    /// Normals consumed per path
    pub fn dimension(&self) -> usize {
        self.steps * self.model.drivers_per_step()
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn workspace(&self) -> PathWorkspace {
        PathWorkspace {
            normals: vec![0.0; self.dimension()],
            path: vec![0.0; self.steps + 1],
        }
    }

    /// Writes the path driven by `ws.normals` into `ws.path`
    #[inline]
    pub fn simulate(&self, ws: &mut PathWorkspace) -> McResult<()> {
        self.model.evolve(self.spot, self.dt, &ws.normals, &mut ws.path)
    }
}

/// Per-chunk scratch buffers, reused across paths
pub struct PathWorkspace {
    pub normals: Vec<f64>,
    pub path: Vec<f64>,
}

impl PathWorkspace {
    pub fn negate_normals(&mut self) {
        for z in self.normals.iter_mut() {
            *z = -*z;
        }
    }
}
