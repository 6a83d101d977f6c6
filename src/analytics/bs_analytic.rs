// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes formulas for European options and Greeks
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes model, the underlying asset follows:
//! ```text
//! dS_t = r S_t dt + σ S_t dW_t
//! ```
//!
//! The risk-neutral pricing formula gives:
//! ```text
//! V(S,t) = e^(-r(T-t)) * E^Q[payoff(S_T) | S_t = S]
//! ```
//!
//! For European options, this has closed-form solutions involving
//! the cumulative normal distribution function Φ(x).
//!
//! # Degenerate inputs
//!
//! `d₁` divides by σ√T. When either factor is zero the terminal price is
//! deterministic, so every function here switches to the limiting value
//! instead of evaluating the formula:
//! - T ≤ 0: intrinsic value `max(S - K, 0)` / `max(K - S, 0)`
//! - σ = 0: discounted forward intrinsic `max(S - K e^(-rT), 0)`

use crate::error::McResult;
use crate::market::{MarketParameters, OptionKind};
use crate::math_utils::{norm_cdf, norm_pdf};
use serde::Serialize;
use std::ops::AddAssign;

/// Price and first/second order sensitivities of one option
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Greeks {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

impl Greeks {
    /// Every field multiplied by `quantity`
    pub fn scale(self, quantity: f64) -> Greeks {
        Greeks {
            price: self.price * quantity,
            delta: self.delta * quantity,
            gamma: self.gamma * quantity,
            vega: self.vega * quantity,
            theta: self.theta * quantity,
            rho: self.rho * quantity,
        }
    }
}

impl AddAssign for Greeks {
    fn add_assign(&mut self, other: Greeks) {
        self.price += other.price;
        self.delta += other.delta;
        self.gamma += other.gamma;
        self.vega += other.vega;
        self.theta += other.theta;
        self.rho += other.rho;
    }
}

#[inline]
fn is_degenerate(sigma: f64, t: f64) -> bool {
    t <= 0.0 || sigma <= 0.0
}

/// d₁ and d₂. Callers must rule out σ√T = 0 first.
#[inline]
fn d1_d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Discount factor clamped to 1 for non-positive maturities
#[inline]
fn discount(r: f64, t: f64) -> f64 {
    if t <= 0.0 {
        1.0
    } else {
        (-r * t).exp()
    }
}

/// Black-Scholes European call option price
///
/// # Formula
/// ```text
/// C(S,K,r,σ,T) = S*Φ(d₁) - K*e^(-rT)*Φ(d₂)
/// ```
///
/// Where:
/// ```text
/// d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T)
/// d₂ = d₁ - σ√T
/// ```
///
/// # Parameters
/// - `s`: Current stock price
/// - `k`: Strike price
/// - `r`: Risk-free rate
/// - `sigma`: Volatility
/// - `t`: Time to expiration
pub fn bs_call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        return (s - k * discount(r, t)).max(0.0);
    }
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    s * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
}

/// Black-Scholes European put option price
///
/// # Formula
/// ```text
/// P(S,K,r,σ,T) = K*e^(-rT)*Φ(-d₂) - S*Φ(-d₁)
/// ```
pub fn bs_put_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        return (k * discount(r, t) - s).max(0.0);
    }
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    k * (-r * t).exp() * norm_cdf(-d2) - s * norm_cdf(-d1)
}

pub fn bs_price(kind: OptionKind, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    match kind {
        OptionKind::Call => bs_call_price(s, k, r, sigma, t),
        OptionKind::Put => bs_put_price(s, k, r, sigma, t),
    }
}

/// Black-Scholes Delta (∂V/∂S) for European call
///
/// # Formula
/// ```text
/// Δ = ∂C/∂S = Φ(d₁)
/// ```
///
/// # Interpretation
/// - Hedge ratio: number of shares to buy per option sold
/// - Range: [0, 1] for calls
pub fn bs_call_delta(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        return if s > k * discount(r, t) { 1.0 } else { 0.0 };
    }
    let (d1, _) = d1_d2(s, k, r, sigma, t);
    norm_cdf(d1)
}

/// Put delta, Φ(d₁) - 1
pub fn bs_put_delta(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        return if s < k * discount(r, t) { -1.0 } else { 0.0 };
    }
    let (d1, _) = d1_d2(s, k, r, sigma, t);
    norm_cdf(d1) - 1.0
}

/// Black-Scholes Gamma (∂²V/∂S²), identical for calls and puts
///
/// # Formula
/// ```text
/// Γ = φ(d₁) / (S * σ * √T)
/// ```
pub fn bs_gamma(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        return 0.0;
    }
    let (d1, _) = d1_d2(s, k, r, sigma, t);
    norm_pdf(d1) / (s * sigma * t.sqrt())
}

pub fn bs_call_gamma(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    bs_gamma(s, k, r, sigma, t)
}

/// Black-Scholes Vega (∂V/∂σ), identical for calls and puts
///
/// # Formula
/// ```text
/// ν = S * φ(d₁) * √T
/// ```
///
/// Units: price change per unit (100%) volatility change.
pub fn bs_vega(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        return 0.0;
    }
    let (d1, _) = d1_d2(s, k, r, sigma, t);
    s * norm_pdf(d1) * t.sqrt()
}

pub fn bs_call_vega(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    bs_vega(s, k, r, sigma, t)
}

/// Black-Scholes Theta (∂V/∂t, calendar time) for European call
///
/// # Formula
/// ```text
/// Θ = -S*φ(d₁)*σ/(2√T) - r*K*e^(-rT)*Φ(d₂)
/// ```
///
/// Negative for long options: value decays as expiry approaches. Units are
/// price change per year.
pub fn bs_call_theta(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        let df = discount(r, t);
        return if s > k * df { -r * k * df } else { 0.0 };
    }
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    (-s * norm_pdf(d1) * sigma) / (2.0 * t.sqrt()) - r * k * (-r * t).exp() * norm_cdf(d2)
}

/// Put theta, -S*φ(d₁)*σ/(2√T) + r*K*e^(-rT)*Φ(-d₂)
pub fn bs_put_theta(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if is_degenerate(sigma, t) {
        let df = discount(r, t);
        return if s < k * df { r * k * df } else { 0.0 };
    }
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    (-s * norm_pdf(d1) * sigma) / (2.0 * t.sqrt()) + r * k * (-r * t).exp() * norm_cdf(-d2)
}

/// Black-Scholes Rho (∂V/∂r) for European call
///
/// # Formula
/// ```text
/// ρ = K * T * e^(-rT) * Φ(d₂)
/// ```
pub fn bs_call_rho(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if sigma <= 0.0 {
        let df = discount(r, t);
        return if s > k * df { k * t * df } else { 0.0 };
    }
    let (_, d2) = d1_d2(s, k, r, sigma, t);
    k * t * (-r * t).exp() * norm_cdf(d2)
}

/// Put rho, -K * T * e^(-rT) * Φ(-d₂)
pub fn bs_put_rho(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if sigma <= 0.0 {
        let df = discount(r, t);
        return if s < k * df { -k * t * df } else { 0.0 };
    }
    let (_, d2) = d1_d2(s, k, r, sigma, t);
    -k * t * (-r * t).exp() * norm_cdf(-d2)
}

/// Price and all Greeks in one call
pub fn bs_greeks(kind: OptionKind, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> Greeks {
    match kind {
        OptionKind::Call => Greeks {
            price: bs_call_price(s, k, r, sigma, t),
            delta: bs_call_delta(s, k, r, sigma, t),
            gamma: bs_gamma(s, k, r, sigma, t),
            vega: bs_vega(s, k, r, sigma, t),
            theta: bs_call_theta(s, k, r, sigma, t),
            rho: bs_call_rho(s, k, r, sigma, t),
        },
        OptionKind::Put => Greeks {
            price: bs_put_price(s, k, r, sigma, t),
            delta: bs_put_delta(s, k, r, sigma, t),
            gamma: bs_gamma(s, k, r, sigma, t),
            vega: bs_vega(s, k, r, sigma, t),
            theta: bs_put_theta(s, k, r, sigma, t),
            rho: bs_put_rho(s, k, r, sigma, t),
        },
    }
}

/// Validated Black-Scholes price for a market snapshot
pub fn black_scholes(market: &MarketParameters, kind: OptionKind) -> McResult<f64> {
    market.validate()?;
    Ok(bs_price(
        kind,
        market.spot,
        market.strike,
        market.rate,
        market.volatility,
        market.maturity,
    ))
}

/// Validated Black-Scholes price and Greeks for a market snapshot
pub fn black_scholes_greeks(market: &MarketParameters, kind: OptionKind) -> McResult<Greeks> {
    market.validate()?;
    Ok(bs_greeks(
        kind,
        market.spot,
        market.strike,
        market.rate,
        market.volatility,
        market.maturity,
    ))
}
