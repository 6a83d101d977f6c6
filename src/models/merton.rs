// src/models/merton.rs
//! Merton (1976) jump-diffusion
//!
//! ```text
//! dS_t / S_t- = (r - λk) dt + σ dW_t + (J - 1) dN_t
//! ln J ~ N(μ_J, σ_J²),   k = E[J - 1] = exp(μ_J + σ_J²/2) - 1
//! ```
//!
//! Each step consumes three standard normals: the diffusion draw, a draw
//! mapped through Φ to a uniform that selects the Poisson jump count by
//! inverse CDF, and a draw for the summed log jump size
//! `N μ_J + σ_J √N Z`.

use super::model::{check_buffers, ensure_finite, PathModel};
use crate::error::{validation::*, McResult};
use crate::math_utils::norm_cdf;
use serde::Serialize;

/// Cap on jumps in a single step; the Poisson tail beyond it is negligible
/// for any λΔt a simulation would use.
pub const MAX_JUMPS_PER_STEP: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MertonParams {
    pub lambda: f64,  // Jump intensity
    pub mu_j: f64,    // Mean of log-jump size
    pub sigma_j: f64, // Std dev of log-jump size
}

impl Default for MertonParams {
    fn default() -> Self {
        MertonParams {
            lambda: 0.5,
            mu_j: -0.1,
            sigma_j: 0.15,
        }
    }
}

impl MertonParams {
    pub fn validate(&self) -> McResult<()> {
        validate_non_negative("lambda", self.lambda)?;
        validate_finite("mu_j", self.mu_j)?;
        validate_non_negative("sigma_j", self.sigma_j)?;
        Ok(())
    }

    /// Mean relative jump size k = E[J] - 1
    pub fn jump_compensator(&self) -> f64 {
        (self.mu_j + 0.5 * self.sigma_j * self.sigma_j).exp() - 1.0
    }
}

/// Smallest n with P(N ≤ n) ≥ u for N ~ Poisson(mean)
pub fn poisson_inverse(mean: f64, u: f64) -> u32 {
    let mut p = (-mean).exp();
    let mut cdf = p;
    let mut n = 0;
    while u > cdf && n < MAX_JUMPS_PER_STEP {
        n += 1;
        p *= mean / n as f64;
        cdf += p;
    }
    n
}

pub struct Merton {
    pub r: f64,
    pub sigma: f64,
    pub params: MertonParams,
}

impl Merton {
    pub fn new(r: f64, sigma: f64, params: MertonParams) -> McResult<Self> {
        validate_finite("r", r)?;
        validate_non_negative("sigma", sigma)?;
        params.validate()?;
        Ok(Merton { r, sigma, params })
    }

    /// Compensated log drift per unit time, r - λk - σ²/2
    pub fn log_drift(&self) -> f64 {
        self.r
            - self.params.lambda * self.params.jump_compensator()
            - 0.5 * self.sigma * self.sigma
    }

    #[inline]
    pub fn step(&self, s: f64, dt: f64, z_diffusion: f64, z_count: f64, z_size: f64) -> f64 {
        let jumps = poisson_inverse(self.params.lambda * dt, norm_cdf(z_count));
        let log_jump = if jumps == 0 {
            0.0
        } else {
            let n = jumps as f64;
            n * self.params.mu_j + self.params.sigma_j * n.sqrt() * z_size
        };
        s * (self.log_drift() * dt + self.sigma * dt.sqrt() * z_diffusion + log_jump).exp()
    }
}

impl PathModel for Merton {
    fn name(&self) -> &'static str {
        "Merton"
    }

    fn drivers_per_step(&self) -> usize {
        3
    }

    fn evolve(&self, s0: f64, dt: f64, normals: &[f64], path: &mut [f64]) -> McResult<()> {
        check_buffers(self, normals, path)?;
        path[0] = s0;
        for (i, z) in normals.chunks_exact(3).enumerate() {
            path[i + 1] = self.step(path[i], dt, z[0], z[1], z[2]);
            ensure_finite("Merton step", i + 1, path[i + 1])?;
        }
        Ok(())
    }
}
