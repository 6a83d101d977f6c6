// src/hedging.rs
//! Position Greeks, discrete delta and delta-gamma hedging, vega profiles
//!
//! # Delta hedge of a short option
//!
//! The writer receives the Black-Scholes premium, buys `Δ₀` shares and keeps
//! the rest in cash earning `r`. The stock moves under the real-world drift
//! `μ`; at each of the `N` rebalancing dates the hedge is reset to the
//! Black-Scholes delta for the remaining maturity:
//! ```text
//! cash₀ = V₀ - Δ₀ S₀
//! cashⱼ = cashⱼ₋₁ e^(rΔt) + (Δⱼ₋₁ - Δⱼ) Sⱼ
//! P&L   = Δ_N S_N + cash_N - payoff(S_N)
//! ```
//! With continuous rebalancing the P&L is zero; the dispersion shrinks
//! roughly as `1/√N`.
//!
//! # Gamma-neutral variant
//!
//! With a [`GammaInstrument`] H the book also holds `n = Γ_V / Γ_H` units
//! of H and `Δ_V - n Δ_H` shares, both reset on every date. The leftover
//! error is of order `Δt` per step instead of `√Δt`.

use crate::analytics::bs_analytic::{bs_greeks, bs_price, Greeks};
use crate::error::{validation::*, McError, McResult};
use crate::market::{MarketParameters, OptionKind, OptionSpec};
use crate::mc::mc_engine::{chunk_count, run_chunks};
use crate::mc::stats::{Accumulator, DrawProvenance};
use crate::risk::historical_var_es;
use crate::rng::{get_normal_draw, RngFactory};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, instrument};

/// A holding of `quantity` options; negative quantities are short
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionPosition {
    pub option: OptionSpec,
    pub quantity: f64,
    /// Overrides the market maturity for this position
    pub maturity: Option<f64>,
}

impl OptionPosition {
    pub fn new(option: OptionSpec, quantity: f64) -> Self {
        OptionPosition {
            option,
            quantity,
            maturity: None,
        }
    }

    pub fn with_maturity(self, maturity: f64) -> Self {
        OptionPosition {
            maturity: Some(maturity),
            ..self
        }
    }

    pub fn greeks(&self, market: &MarketParameters) -> McResult<Greeks> {
        self.option.validate()?;
        validate_finite("quantity", self.quantity)?;
        let t = match self.maturity {
            Some(t) => {
                validate_non_negative("maturity", t)?;
                t
            }
            None => market.maturity,
        };
        let g = bs_greeks(
            self.option.kind,
            market.spot,
            self.option.strike,
            market.rate,
            market.volatility,
            t,
        );
        Ok(g.scale(self.quantity))
    }
}

/// Quantity-weighted sum of the Black-Scholes Greeks of every position
pub fn portfolio_greeks(positions: &[OptionPosition], market: &MarketParameters) -> McResult<Greeks> {
    market.validate()?;
    let mut total = Greeks::default();
    for position in positions {
        total += position.greeks(market)?;
    }
    Ok(total)
}

/// Second option traded to keep the hedged book gamma-neutral.
///
/// It must outlive the hedged option so its gamma stays finite on the last
/// rebalancing date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GammaInstrument {
    pub option: OptionSpec,
    pub maturity: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DeltaHedgeConfig {
    pub paths: usize,
    pub rebalances: usize,
    /// Real-world drift of the stock
    pub drift: f64,
    pub market: MarketParameters,
    pub kind: OptionKind,
    pub confidence_level: f64,
    /// When set, gamma is neutralised with this option before delta
    pub gamma_instrument: Option<GammaInstrument>,
}

impl Default for DeltaHedgeConfig {
    fn default() -> Self {
        DeltaHedgeConfig {
            paths: 10_000,
            rebalances: 10,
            drift: 0.15,
            market: MarketParameters::new(100.0, 105.0, 1.0, 0.05, 0.1),
            kind: OptionKind::Call,
            confidence_level: 0.95,
            gamma_instrument: None,
        }
    }
}

impl DeltaHedgeConfig {
    pub fn validate(&self) -> McResult<()> {
        validate_paths(self.paths)?;
        validate_steps(self.rebalances)?;
        validate_finite("drift", self.drift)?;
        validate_confidence_level(self.confidence_level)?;
        self.market.validate()?;
        if let Some(instrument) = &self.gamma_instrument {
            instrument.option.validate()?;
            validate_finite("gamma_instrument.maturity", instrument.maturity)?;
            if instrument.maturity <= self.market.maturity {
                return Err(McError::configuration(
                    "gamma_instrument",
                    format!(
                        "maturity {} must exceed the hedged option's {}",
                        instrument.maturity, self.market.maturity
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HedgeReport {
    pub mean_pnl: f64,
    pub std_pnl: f64,
    pub confidence_level: f64,
    pub var: f64,
    pub es: f64,
    pub paths: usize,
    pub rebalances: usize,
    pub provenance: DrawProvenance,
}

/// Final P&L of every path, in path order
#[derive(Default)]
struct PnlSample(Vec<f64>);

impl Accumulator for PnlSample {
    fn merge(&mut self, other: &Self) {
        self.0.extend_from_slice(&other.0);
    }
}

#[derive(Clone, Copy)]
struct Holdings {
    stock: f64,
    instrument: f64,
}

struct HedgeKernel {
    market: MarketParameters,
    kind: OptionKind,
    drift: f64,
    rebalances: usize,
    instrument: Option<GammaInstrument>,
}

impl HedgeKernel {
    fn new(cfg: &DeltaHedgeConfig) -> Self {
        HedgeKernel {
            market: cfg.market,
            kind: cfg.kind,
            drift: cfg.drift,
            rebalances: cfg.rebalances,
            instrument: cfg.gamma_instrument,
        }
    }

    fn option_value(&self, s: f64, remaining: f64) -> f64 {
        let m = &self.market;
        bs_price(self.kind, s, m.strike, m.rate, m.volatility, remaining)
    }

    fn instrument_value(&self, s: f64, remaining: f64) -> f64 {
        let m = &self.market;
        match &self.instrument {
            Some(h) => {
                let t = remaining + h.maturity - m.maturity;
                bs_price(h.option.kind, s, h.option.strike, m.rate, m.volatility, t)
            }
            None => 0.0,
        }
    }

    fn holdings(&self, s: f64, remaining: f64) -> Holdings {
        let m = &self.market;
        let target = bs_greeks(self.kind, s, m.strike, m.rate, m.volatility, remaining);
        match &self.instrument {
            Some(h) => {
                let t = remaining + h.maturity - m.maturity;
                let hedge = bs_greeks(h.option.kind, s, h.option.strike, m.rate, m.volatility, t);
                let units = if hedge.gamma > 0.0 {
                    target.gamma / hedge.gamma
                } else {
                    0.0
                };
                Holdings {
                    stock: target.delta - units * hedge.delta,
                    instrument: units,
                }
            }
            None => Holdings {
                stock: target.delta,
                instrument: 0.0,
            },
        }
    }

    /// Walks one path, handing the hedge's tracking error (book minus option
    /// value) to `observe` at inception and after every rebalance. Returns
    /// the final P&L.
    fn walk(&self, normals: impl Iterator<Item = f64>, mut observe: impl FnMut(f64)) -> f64 {
        let m = &self.market;
        let dt = m.maturity / self.rebalances as f64;
        let growth = (m.rate * dt).exp();
        let log_drift = (self.drift - 0.5 * m.volatility * m.volatility) * dt;
        let diffusion = m.volatility * dt.sqrt();

        let mut s = m.spot;
        let mut held = self.holdings(s, m.maturity);
        let h_value = self.instrument_value(s, m.maturity);
        let premium = self.option_value(s, m.maturity);
        let mut cash = premium - held.stock * s - held.instrument * h_value;
        let mut pnl = cash + held.stock * s + held.instrument * h_value - premium;
        observe(pnl);

        for (j, z) in normals.take(self.rebalances).enumerate() {
            s *= (log_drift + diffusion * z).exp();
            let remaining = if j + 1 == self.rebalances {
                0.0
            } else {
                m.maturity - (j + 1) as f64 * dt
            };
            let next = self.holdings(s, remaining);
            let h_value = self.instrument_value(s, remaining);
            cash = cash * growth
                + (held.stock - next.stock) * s
                + (held.instrument - next.instrument) * h_value;
            held = next;
            pnl = held.stock * s + held.instrument * h_value + cash - self.option_value(s, remaining);
            observe(pnl);
        }
        pnl
    }
}

fn non_finite_pnl(value: f64, rebalances: usize) -> McError {
    McError::overflow(
        "delta hedge",
        format!("non-finite P&L {} after {} rebalances", value, rebalances),
    )
}

/// Simulates a short option hedged with `rebalances` discrete trades, delta
/// only or gamma-neutral when `cfg.gamma_instrument` is set
#[instrument(skip_all, fields(paths = cfg.paths, rebalances = cfg.rebalances))]
pub fn simulate_delta_hedge(cfg: &DeltaHedgeConfig, factory: &mut RngFactory) -> McResult<HedgeReport> {
    cfg.validate()?;
    let kernel = HedgeKernel::new(cfg);
    let block = factory.reserve(chunk_count(cfg.paths) as u64);

    let PnlSample(pnl) = run_chunks(cfg.paths, &block, |rng, len, acc: &mut PnlSample| {
        acc.0.reserve(len);
        for _ in 0..len {
            let value = kernel.walk(std::iter::repeat_with(|| get_normal_draw(&mut *rng)), |_| {});
            if !value.is_finite() {
                return Err(non_finite_pnl(value, kernel.rebalances));
            }
            acc.0.push(value);
        }
        Ok(())
    })?;

    let n = pnl.len() as f64;
    let mean_pnl = pnl.iter().sum::<f64>() / n;
    let std_pnl = (pnl.iter().map(|v| (v - mean_pnl).powi(2)).sum::<f64>() / n).sqrt();
    let risk = historical_var_es(&pnl, cfg.confidence_level)?;
    debug!(
        mean_pnl,
        std_pnl,
        var = risk.var,
        es = risk.es,
        gamma_neutral = cfg.gamma_instrument.is_some(),
        "hedge simulated"
    );

    Ok(HedgeReport {
        mean_pnl,
        std_pnl,
        confidence_level: risk.confidence_level,
        var: risk.var,
        es: risk.es,
        paths: cfg.paths,
        rebalances: cfg.rebalances,
        provenance: DrawProvenance::from(&block),
    })
}

/// Tracking error of one hedged path at inception and each rebalancing date,
/// `rebalances + 1` values starting at zero. `cfg.paths` is ignored.
pub fn hedge_tracking_path<R: Rng + ?Sized>(cfg: &DeltaHedgeConfig, rng: &mut R) -> McResult<Vec<f64>> {
    cfg.validate()?;
    let kernel = HedgeKernel::new(cfg);
    let mut path = Vec::with_capacity(cfg.rebalances + 1);
    let last = kernel.walk(std::iter::repeat_with(|| get_normal_draw(&mut *rng)), |v| path.push(v));
    if path.iter().any(|v| !v.is_finite()) {
        return Err(non_finite_pnl(last, cfg.rebalances));
    }
    Ok(path)
}

/// Price and vega of one option at a given volatility
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolPoint {
    pub sigma: f64,
    pub price: f64,
    pub vega: f64,
}

/// Black-Scholes price and vega on `points` evenly spaced volatilities
/// from `sigma_low` to `sigma_high`, the exposure a vega hedge has to cover
pub fn vega_profile(
    market: &MarketParameters,
    kind: OptionKind,
    sigma_low: f64,
    sigma_high: f64,
    points: usize,
) -> McResult<Vec<VolPoint>> {
    market.validate()?;
    validate_positive("sigma_low", sigma_low)?;
    validate_positive("sigma_high", sigma_high)?;
    if sigma_high <= sigma_low {
        return Err(McError::configuration(
            "sigma_high",
            format!("{} must exceed sigma_low {}", sigma_high, sigma_low),
        ));
    }
    if points < 2 {
        return Err(McError::configuration("points", "need at least two volatilities"));
    }

    let step = (sigma_high - sigma_low) / (points - 1) as f64;
    Ok((0..points)
        .map(|i| {
            let sigma = sigma_low + step * i as f64;
            let g = bs_greeks(kind, market.spot, market.strike, market.rate, sigma, market.maturity);
            VolPoint {
                sigma,
                price: g.price,
                vega: g.vega,
            }
        })
        .collect())
}
