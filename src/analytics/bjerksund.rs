// src/analytics/bjerksund.rs
//! Bjerksund-Stensland (1993) American option approximation
//!
//! The early exercise boundary is approximated by a flat trigger price `I`.
//! With cost of carry `b = r - q`:
//! ```text
//! β  = (1/2 - b/σ²) + √((b/σ² - 1/2)² + 2r/σ²)
//! B∞ = β/(β - 1) · K,   B₀ = max(K, r/(r - b) · K)
//! h  = -(bT + 2σ√T) · B₀/(B∞ - B₀)
//! I  = B₀ + (B∞ - B₀)(1 - e^h)
//! ```
//! Puts use the transformation `P(S, K, T, r, b, σ) = C(K, S, T, r - b, -b, σ)`.

use crate::error::{validation::*, McError, McResult};
use crate::math_utils::norm_cdf;
use crate::market::OptionKind;

/// Black-Scholes-Merton price with cost of carry `b`
fn generalized_bs(kind: OptionKind, s: f64, k: f64, t: f64, r: f64, b: f64, sigma: f64) -> f64 {
    let carry = ((b - r) * t).exp();
    let disc = (-r * t).exp();
    if sigma == 0.0 {
        let forward_value = s * carry - k * disc;
        return match kind {
            OptionKind::Call => forward_value.max(0.0),
            OptionKind::Put => (-forward_value).max(0.0),
        };
    }
    let vol_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (b + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    let d2 = d1 - vol_sqrt_t;
    match kind {
        OptionKind::Call => s * carry * norm_cdf(d1) - k * disc * norm_cdf(d2),
        OptionKind::Put => k * disc * norm_cdf(-d2) - s * carry * norm_cdf(-d1),
    }
}

fn phi(s: f64, t: f64, gamma: f64, h: f64, i: f64, r: f64, b: f64, sigma: f64) -> f64 {
    let sigma2 = sigma * sigma;
    let vol_sqrt_t = sigma * t.sqrt();
    let lambda = (-r + gamma * b + 0.5 * gamma * (gamma - 1.0) * sigma2) * t;
    let d = -((s / h).ln() + (b + (gamma - 0.5) * sigma2) * t) / vol_sqrt_t;
    let kappa = 2.0 * b / sigma2 + (2.0 * gamma - 1.0);
    lambda.exp()
        * s.powf(gamma)
        * (norm_cdf(d) - (i / s).powf(kappa) * norm_cdf(d - 2.0 * (i / s).ln() / vol_sqrt_t))
}

fn american_call(s: f64, k: f64, t: f64, r: f64, b: f64, sigma: f64) -> f64 {
    // Never optimal to exercise early
    if b >= r {
        return generalized_bs(OptionKind::Call, s, k, t, r, b, sigma);
    }

    let sigma2 = sigma * sigma;
    let beta = (0.5 - b / sigma2) + ((b / sigma2 - 0.5).powi(2) + 2.0 * r / sigma2).sqrt();
    let b_inf = beta / (beta - 1.0) * k;
    let b_zero = k.max(r / (r - b) * k);
    let h = -(b * t + 2.0 * sigma * t.sqrt()) * b_zero / (b_inf - b_zero);
    let trigger = b_zero + (b_inf - b_zero) * (1.0 - h.exp());

    if s >= trigger {
        return s - k;
    }

    let alpha = (trigger - k) * trigger.powf(-beta);
    alpha * s.powf(beta) - alpha * phi(s, t, beta, trigger, trigger, r, b, sigma)
        + phi(s, t, 1.0, trigger, trigger, r, b, sigma)
        - phi(s, t, 1.0, k, trigger, r, b, sigma)
        - k * phi(s, t, 0.0, trigger, trigger, r, b, sigma)
        + k * phi(s, t, 0.0, k, trigger, r, b, sigma)
}

/// American option price under the Bjerksund-Stensland (1993) approximation.
///
/// `q` is a continuous dividend yield. `t == 0` returns intrinsic value and
/// `sigma == 0` the better of immediate exercise and the deterministic
/// European value.
pub fn bjerksund_stensland(
    kind: OptionKind,
    s: f64,
    k: f64,
    t: f64,
    r: f64,
    q: f64,
    sigma: f64,
) -> McResult<f64> {
    validate_positive("spot", s)?;
    validate_positive("strike", k)?;
    validate_non_negative("maturity", t)?;
    validate_finite("rate", r)?;
    validate_finite("dividend_yield", q)?;
    validate_non_negative("volatility", sigma)?;

    let intrinsic = match kind {
        OptionKind::Call => (s - k).max(0.0),
        OptionKind::Put => (k - s).max(0.0),
    };
    if t == 0.0 {
        return Ok(intrinsic);
    }

    let b = r - q;
    if sigma == 0.0 {
        return Ok(generalized_bs(kind, s, k, t, r, b, 0.0).max(intrinsic));
    }

    let price = match kind {
        OptionKind::Call => american_call(s, k, t, r, b, sigma),
        OptionKind::Put => american_call(k, s, t, r - b, -b, sigma),
    };

    if !price.is_finite() {
        return Err(McError::overflow(
            "Bjerksund-Stensland",
            format!("price {} is not finite", price),
        ));
    }
    Ok(price.max(intrinsic))
}
