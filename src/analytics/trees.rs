// src/analytics/trees.rs
//! Recombining lattice pricers
//!
//! # Binomial (Cox-Ross-Rubinstein)
//! ```text
//! u = e^(σ√Δt),  d = 1/u,  p = (e^(rΔt) - d)/(u - d)
//! V_i,j = e^(-rΔt) [p V_i+1,j+1 + (1-p) V_i+1,j]
//! ```
//! `N + 1` leaves `S u^j d^(N-j)`.
//!
//! # Trinomial (Boyle, probabilities as in Hull)
//! ```text
//! u = e^(σ√(2Δt))
//! p_u = ((e^(rΔt/2) - e^(-σ√(Δt/2))) / (e^(σ√(Δt/2)) - e^(-σ√(Δt/2))))²
//! p_d = ((e^(σ√(Δt/2)) - e^(rΔt/2)) / (e^(σ√(Δt/2)) - e^(-σ√(Δt/2))))²
//! p_m = 1 - p_u - p_d
//! ```
//! `2N + 1` leaves `S u^(j-N)`.
//!
//! American exercise compares the continuation value with the intrinsic
//! value at every node.

use crate::analytics::bs_analytic::bs_price;
use crate::error::{validation::*, McError, McResult};
use crate::market::{MarketParameters, OptionKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExerciseStyle {
    European,
    American,
}

/// Values that need no lattice: T = 0, or σ = 0 where the path is S e^(rt)
fn degenerate_price(
    market: &MarketParameters,
    kind: OptionKind,
    exercise: ExerciseStyle,
) -> Option<f64> {
    let option = market.option(kind);
    if market.maturity == 0.0 {
        return Some(option.intrinsic(market.spot));
    }
    if market.volatility == 0.0 {
        let european = bs_price(
            kind,
            market.spot,
            market.strike,
            market.rate,
            0.0,
            market.maturity,
        );
        // Along a deterministic path the best exercise time is either now or expiry
        return Some(match exercise {
            ExerciseStyle::European => european,
            ExerciseStyle::American => european.max(option.intrinsic(market.spot)),
        });
    }
    None
}

fn check_probability(name: &str, p: f64, steps: usize) -> McResult<()> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(McError::configuration(
            "steps",
            format!(
                "{} = {} is not a probability with {} steps; increase the step count",
                name, p, steps
            ),
        ))
    }
}

fn finite_price(method: &str, price: f64) -> McResult<f64> {
    if price.is_finite() {
        Ok(price)
    } else {
        Err(McError::overflow(method, format!("price {} is not finite", price)))
    }
}

/// CRR binomial price with `steps` time steps
pub fn binomial_price(
    market: &MarketParameters,
    kind: OptionKind,
    steps: usize,
    exercise: ExerciseStyle,
) -> McResult<f64> {
    market.validate()?;
    validate_steps(steps)?;
    if let Some(price) = degenerate_price(market, kind, exercise) {
        return Ok(price);
    }

    let option = market.option(kind);
    let dt = market.maturity / steps as f64;
    let u = (market.volatility * dt.sqrt()).exp();
    let d = 1.0 / u;
    let p = ((market.rate * dt).exp() - d) / (u - d);
    check_probability("p", p, steps)?;

    let disc = (-market.rate * dt).exp();
    let disc_p = disc * p;
    let disc_q = disc * (1.0 - p);

    // values[j] holds the node with j up-moves
    let mut values: Vec<f64> = (0..=steps)
        .map(|j| option.intrinsic(market.spot * u.powi(j as i32) * d.powi((steps - j) as i32)))
        .collect();

    for i in (0..steps).rev() {
        for j in 0..=i {
            let continuation = disc_p * values[j + 1] + disc_q * values[j];
            values[j] = match exercise {
                ExerciseStyle::European => continuation,
                ExerciseStyle::American => {
                    let st = market.spot * u.powi(j as i32) * d.powi((i - j) as i32);
                    continuation.max(option.intrinsic(st))
                }
            };
        }
    }

    finite_price("binomial tree", values[0])
}

/// Trinomial price with `steps` time steps
pub fn trinomial_price(
    market: &MarketParameters,
    kind: OptionKind,
    steps: usize,
    exercise: ExerciseStyle,
) -> McResult<f64> {
    market.validate()?;
    validate_steps(steps)?;
    if let Some(price) = degenerate_price(market, kind, exercise) {
        return Ok(price);
    }

    let option = market.option(kind);
    let sigma = market.volatility;
    let dt = market.maturity / steps as f64;
    let u = (sigma * (2.0 * dt).sqrt()).exp();

    let a = (market.rate * dt / 2.0).exp();
    let b = (sigma * (dt / 2.0).sqrt()).exp();
    let pu = ((a - 1.0 / b) / (b - 1.0 / b)).powi(2);
    let pd = ((b - a) / (b - 1.0 / b)).powi(2);
    let pm = 1.0 - pu - pd;
    check_probability("p_u", pu, steps)?;
    check_probability("p_d", pd, steps)?;
    check_probability("p_m", pm, steps)?;

    let disc = (-market.rate * dt).exp();
    let n = steps as i32;

    // values[j] holds the node at level S u^(j - i)
    let mut values: Vec<f64> = (0..=2 * steps)
        .map(|j| option.intrinsic(market.spot * u.powi(j as i32 - n)))
        .collect();

    for i in (0..steps).rev() {
        for j in 0..=2 * i {
            let continuation = disc * (pd * values[j] + pm * values[j + 1] + pu * values[j + 2]);
            values[j] = match exercise {
                ExerciseStyle::European => continuation,
                ExerciseStyle::American => {
                    let st = market.spot * u.powi(j as i32 - i as i32);
                    continuation.max(option.intrinsic(st))
                }
            };
        }
    }

    finite_price("trinomial tree", values[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::bs_analytic::{bs_call_price, bs_put_price};

    #[test]
    fn test_binomial_converges_to_black_scholes() {
        let market = MarketParameters::default();
        let tree = binomial_price(&market, OptionKind::Call, 500, ExerciseStyle::European).unwrap();
        let bs = bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0);
        assert!((tree - bs).abs() < 0.01, "tree {} bs {}", tree, bs);
    }

    #[test]
    fn test_trinomial_converges_to_black_scholes() {
        let market = MarketParameters::default();
        let tree = trinomial_price(&market, OptionKind::Put, 200, ExerciseStyle::European).unwrap();
        let bs = bs_put_price(100.0, 100.0, 0.05, 0.2, 1.0);
        assert!((tree - bs).abs() < 0.02, "tree {} bs {}", tree, bs);
    }

    #[test]
    fn test_american_put_premium() {
        let market = MarketParameters::default();
        let european = binomial_price(&market, OptionKind::Put, 300, ExerciseStyle::European).unwrap();
        let american = binomial_price(&market, OptionKind::Put, 300, ExerciseStyle::American).unwrap();
        assert!(american > european + 0.3);

        // No early exercise premium for a call without dividends
        let eu_call = binomial_price(&market, OptionKind::Call, 300, ExerciseStyle::European).unwrap();
        let am_call = binomial_price(&market, OptionKind::Call, 300, ExerciseStyle::American).unwrap();
        assert!((am_call - eu_call).abs() < 1e-9);
    }

    #[test]
    fn test_zero_maturity_intrinsic() {
        let market = MarketParameters::new(90.0, 100.0, 0.0, 0.05, 0.2);
        for exercise in [ExerciseStyle::European, ExerciseStyle::American] {
            assert_eq!(binomial_price(&market, OptionKind::Put, 50, exercise).unwrap(), 10.0);
            assert_eq!(trinomial_price(&market, OptionKind::Put, 50, exercise).unwrap(), 10.0);
        }
    }

    #[test]
    fn test_zero_volatility_american_put_exercises_now() {
        let market = MarketParameters::new(80.0, 100.0, 1.0, 0.05, 0.0);
        let price = binomial_price(&market, OptionKind::Put, 10, ExerciseStyle::American).unwrap();
        assert_eq!(price, 20.0);
    }

    #[test]
    fn test_rejects_zero_steps() {
        let market = MarketParameters::default();
        assert!(binomial_price(&market, OptionKind::Call, 0, ExerciseStyle::European).is_err());
    }
}
