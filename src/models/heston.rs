// src/models/heston.rs
//! Heston Stochastic Volatility Model Implementation
//!
//! # Mathematical Framework
//!
//! The Heston model describes asset price evolution with stochastic volatility:
//! ```text
//! dS_t = r S_t dt + √V_t S_t dW_t^(1)
//! dV_t = κ(θ - V_t) dt + ξ√V_t dW_t^(2)
//! ```
//!
//! Where:
//! - S_t: Asset price
//! - V_t: Instantaneous variance (volatility squared)
//! - κ: Mean reversion speed for variance
//! - θ: Long-term variance level
//! - ξ: Volatility of variance (vol-of-vol)
//! - ρ: Correlation between dW_t^(1) and dW_t^(2)
//!
//! # Feller Condition
//!
//! For variance to remain positive, the Feller condition must hold:
//! ```text
//! 2κθ > ξ²
//! ```
//!
//! When violated, variance can hit zero. Construction still succeeds but a
//! warning is logged.
//!
//! # Discretization Schemes
//!
//! Both schemes take two independent normals per step, `Z1` for the price
//! and `Z3` for the variance, correlated as `Z2 = ρZ1 + √(1-ρ²)Z3`:
//! 1. **Full Truncation Euler**: negative variance is floored at zero
//! 2. **Reflection**: negative variance is mirrored back, `|V|`

use super::model::{check_buffers, ensure_finite, PathModel};
use crate::error::{validation::*, McError, McResult};
use serde::Serialize;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HestonScheme {
    FullTruncation,
    Reflection,
}

/// Variance-process parameters. Spot and rate come from the market snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HestonParams {
    pub v0: f64,    // Initial variance
    pub kappa: f64, // Mean reversion speed
    pub theta: f64, // Long-term variance
    pub xi: f64,    // Volatility of variance (vol-of-vol)
    pub rho: f64,   // Correlation between stock and variance
}

impl Default for HestonParams {
    fn default() -> Self {
        HestonParams {
            v0: 0.04,
            kappa: 2.0,
            theta: 0.04,
            xi: 0.3,
            rho: -0.7,
        }
    }
}

impl HestonParams {
    pub fn validate(&self) -> McResult<()> {
        validate_non_negative("v0", self.v0)?;
        validate_positive("kappa", self.kappa)?;
        validate_positive("theta", self.theta)?;
        validate_non_negative("xi", self.xi)?;
        validate_correlation("rho", self.rho)?;

        if self.kappa > 100.0 {
            return Err(McError::InvalidParameter {
                parameter: "kappa".to_string(),
                value: self.kappa,
                constraint: "extremely high mean reversion speed (>100) may cause numerical issues"
                    .to_string(),
            });
        }

        if self.xi > 5.0 {
            return Err(McError::InvalidParameter {
                parameter: "xi".to_string(),
                value: self.xi,
                constraint: "extremely high vol-of-vol (>5) may cause numerical issues".to_string(),
            });
        }

        if self.theta > 1.0 {
            return Err(McError::InvalidParameter {
                parameter: "theta".to_string(),
                value: self.theta,
                constraint: "long-term variance >1 (100% vol) is unrealistic".to_string(),
            });
        }

        Ok(())
    }

    /// 2κθ > ξ²
    pub fn satisfies_feller(&self) -> bool {
        2.0 * self.kappa * self.theta > self.xi * self.xi
    }
}

pub struct Heston {
    pub r: f64,
    pub params: HestonParams,
    pub scheme: HestonScheme,
}

impl Heston {
    pub fn new(r: f64, params: HestonParams) -> McResult<Self> {
        Self::new_with_scheme(r, params, HestonScheme::FullTruncation)
    }

    pub fn new_with_scheme(r: f64, params: HestonParams, scheme: HestonScheme) -> McResult<Self> {
        validate_finite("r", r)?;
        params.validate()?;

        if !params.satisfies_feller() {
            warn!(
                kappa = params.kappa,
                theta = params.theta,
                xi = params.xi,
                "Feller condition violated (2κθ ≤ ξ²), variance may hit zero"
            );
        }

        Ok(Heston { r, params, scheme })
    }

    /// Two-factor step: updates both stock price and variance.
    ///
    /// ```text
    /// V⁺      = max(V_n, 0)
    /// V_{n+1} = max(V_n + κ(θ - V⁺)Δt + ξ√V⁺ √Δt Z2, 0)      (|·| for Reflection)
    /// S_{n+1} = S_n exp((r - V_{n+1}/2)Δt + √V_{n+1} √Δt Z1)
    /// ```
    #[inline]
    pub fn step(&self, s: &mut f64, v: &mut f64, dt: f64, z1: f64, z3: f64) {
        let p = &self.params;
        let sqrt_dt = dt.sqrt();
        let z2 = p.rho * z1 + (1.0 - p.rho * p.rho).sqrt() * z3;

        let v_plus = v.max(0.0);
        let v_raw = *v + p.kappa * (p.theta - v_plus) * dt + p.xi * v_plus.sqrt() * sqrt_dt * z2;
        *v = match self.scheme {
            HestonScheme::FullTruncation => v_raw.max(0.0),
            HestonScheme::Reflection => v_raw.abs(),
        };

        *s *= ((self.r - 0.5 * *v) * dt + v.sqrt() * sqrt_dt * z1).exp();
    }

    /// Get current scheme name for reporting
    pub fn scheme_name(&self) -> &'static str {
        match self.scheme {
            HestonScheme::FullTruncation => "Full Truncation Euler",
            HestonScheme::Reflection => "Reflection",
        }
    }
}

impl PathModel for Heston {
    fn name(&self) -> &'static str {
        "Heston"
    }

    fn drivers_per_step(&self) -> usize {
        2
    }

    fn evolve(&self, s0: f64, dt: f64, normals: &[f64], path: &mut [f64]) -> McResult<()> {
        check_buffers(self, normals, path)?;
        path[0] = s0;
        let mut s = s0;
        let mut v = self.params.v0;
        for (i, z) in normals.chunks_exact(2).enumerate() {
            self.step(&mut s, &mut v, dt, z[0], z[1]);
            ensure_finite(self.scheme_name(), i + 1, s)?;
            ensure_finite(self.scheme_name(), i + 1, v)?;
            path[i + 1] = s;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{fill_normals, RngFactory};

    #[test]
    fn test_heston_schemes() {
        let params = HestonParams {
            v0: 0.04,
            kappa: 2.0,
            theta: 0.04,
            xi: 0.3,
            rho: -0.5,
        };

        for scheme in [HestonScheme::FullTruncation, HestonScheme::Reflection] {
            let heston = Heston::new_with_scheme(0.05, params, scheme).expect("Valid parameters");
            let mut rng = RngFactory::new(42).create_std_rng();

            let mut s = 100.0;
            let mut v = params.v0;
            let mut z = [0.0; 2];

            for _ in 0..100 {
                fill_normals(&mut rng, &mut z);
                heston.step(&mut s, &mut v, 0.01, z[0], z[1]);
                assert!(s > 0.0, "Stock price must remain positive");
                assert!(v >= 0.0, "Variance must be non-negative");
            }

            println!(
                "Scheme {}: S_T = {:.4}, V_T = {:.6}",
                heston.scheme_name(),
                s,
                v
            );
        }
    }

    #[test]
    fn test_truncation_floors_variance() {
        let params = HestonParams {
            v0: 0.0001,
            kappa: 0.5,
            theta: 0.01,
            xi: 1.0,
            rho: 0.0,
        };
        let heston = Heston::new(0.0, params).unwrap();
        let (mut s, mut v) = (100.0, params.v0);
        heston.step(&mut s, &mut v, 0.1, 0.0, -5.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_feller_condition() {
        let params = HestonParams {
            v0: 0.04,
            kappa: 1.0,
            theta: 0.04,
            xi: 1.0,
            rho: 0.0,
        };

        assert!(!params.satisfies_feller());
        // Should create without error, a warning is logged
        let _heston = Heston::new(0.05, params).expect("Should create despite Feller violation");
    }

    #[test]
    fn test_invalid_parameters() {
        let base = HestonParams::default();

        assert!(Heston::new(0.05, HestonParams { xi: -0.3, ..base }).is_err());
        assert!(Heston::new(0.05, HestonParams { rho: 1.5, ..base }).is_err());
        assert!(Heston::new(0.05, HestonParams { kappa: 0.0, ..base }).is_err());
        assert!(Heston::new(f64::NAN, base).is_err());
    }
}
