// src/analytics/merton.rs
//! Merton (1976) jump-diffusion closed-form series
//!
//! Conditioning on the number of jumps `n` gives a Black-Scholes price with
//! adjusted rate and volatility, weighted by a Poisson probability:
//! ```text
//! k   = exp(μ_J + σ_J²/2) - 1,    λ' = λ(1 + k)
//! σₙ² = σ² + n σ_J² / T
//! rₙ  = r - λk + n ln(1 + k) / T
//! V   = Σₙ e^(-λ'T) (λ'T)ⁿ / n! · BS(S, K, T, rₙ, σₙ)
//! ```

use crate::analytics::bs_analytic::bs_price;
use crate::error::{McError, McResult};
use crate::market::{MarketParameters, OptionKind};
use crate::models::MertonParams;
use tracing::debug;

const MAX_TERMS: usize = 2_000;
const TAIL_TOLERANCE: f64 = 1e-16;

/// European option price under Merton jump-diffusion
pub fn merton_jump_price(
    kind: OptionKind,
    market: &MarketParameters,
    params: &MertonParams,
) -> McResult<f64> {
    market.validate()?;
    params.validate()?;

    let t = market.maturity;
    if t == 0.0 {
        return Ok(market.option(kind).intrinsic(market.spot));
    }

    let k = params.jump_compensator();
    let log_jump_mean = params.mu_j + 0.5 * params.sigma_j * params.sigma_j;
    let mean_jumps = params.lambda * (1.0 + k) * t;
    let sigma2 = market.volatility * market.volatility;

    if mean_jumps == 0.0 {
        return Ok(bs_price(
            kind,
            market.spot,
            market.strike,
            market.rate,
            market.volatility,
            t,
        ));
    }

    // Poisson weights in log space so large λ'T does not underflow e^(-λ'T)
    let ln_mean = mean_jumps.ln();
    let mut ln_weight = -mean_jumps;
    let mut price = 0.0;

    for n in 0..MAX_TERMS {
        if n > 0 {
            ln_weight += ln_mean - (n as f64).ln();
        }
        let weight = ln_weight.exp();
        let nf = n as f64;
        let sigma_n = (sigma2 + nf * params.sigma_j * params.sigma_j / t).sqrt();
        let r_n = market.rate - params.lambda * k + nf * log_jump_mean / t;
        price += weight * bs_price(kind, market.spot, market.strike, r_n, sigma_n, t);

        if nf > mean_jumps && weight < TAIL_TOLERANCE {
            debug!(terms = n + 1, price, "Merton series converged");
            if !price.is_finite() {
                break;
            }
            return Ok(price);
        }
    }

    Err(McError::overflow(
        "Merton series",
        format!(
            "no convergence within {} terms for mean jump count {}",
            MAX_TERMS, mean_jumps
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::bs_analytic::bs_call_price;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_no_jumps_is_black_scholes() {
        let params = MertonParams {
            lambda: 0.0,
            ..Default::default()
        };
        let price = merton_jump_price(OptionKind::Call, &MarketParameters::default(), &params).unwrap();
        assert_approx_eq!(price, bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0), 1e-12);
    }

    #[test]
    fn test_put_call_parity() {
        let market = MarketParameters::default();
        let params = MertonParams::default();
        let call = merton_jump_price(OptionKind::Call, &market, &params).unwrap();
        let put = merton_jump_price(OptionKind::Put, &market, &params).unwrap();
        let parity = market.spot - market.strike * market.discount_factor();
        assert_approx_eq!(call - put, parity, 1e-9);
    }

    #[test]
    fn test_jumps_raise_at_the_money_value() {
        let market = MarketParameters::default();
        let params = MertonParams {
            lambda: 1.0,
            mu_j: 0.0,
            sigma_j: 0.3,
        };
        let jump = merton_jump_price(OptionKind::Call, &market, &params).unwrap();
        assert!(jump > bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0));
    }

    #[test]
    fn test_zero_maturity() {
        let market = MarketParameters::new(110.0, 100.0, 0.0, 0.05, 0.2);
        let price = merton_jump_price(OptionKind::Call, &market, &MertonParams::default()).unwrap();
        assert_eq!(price, 10.0);
    }
}
