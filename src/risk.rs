// src/risk.rs
//! Value at Risk and Expected Shortfall of a return or P&L sample
//!
//! Both measures are reported as quantities of the distribution itself, so a
//! loss shows up as a negative number: VaR is the `1 - cl` quantile and ES
//! the mean of the outcomes at or beyond it.
//!
//! Parametric (normal) form with population moments `μ`, `σ`:
//! ```text
//! VaR = μ + σ Φ⁻¹(1 - cl)
//! ES  = μ - σ φ(Φ⁻¹(1 - cl)) / (1 - cl)
//! ```

use crate::error::{validation::*, McError, McResult};
use crate::math_utils::{norm_inv_cdf, norm_pdf};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarEs {
    pub confidence_level: f64,
    pub var: f64,
    pub es: f64,
}

fn validate_sample(values: &[f64], confidence_level: f64) -> McResult<()> {
    if values.is_empty() {
        return Err(McError::InvalidSampleCount {
            count: 0,
            reason: "VaR needs at least one observation".to_string(),
        });
    }
    validate_confidence_level(confidence_level)?;
    for &v in values {
        validate_finite("observation", v)?;
    }
    Ok(())
}

/// Empirical quantile `sorted[⌊(1 - cl)·n⌋]` and the mean of the tail below it
pub fn historical_var_es(values: &[f64], confidence_level: f64) -> McResult<VarEs> {
    validate_sample(values, confidence_level)?;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let index = (((1.0 - confidence_level) * n as f64) as usize).min(n - 1);
    let var = sorted[index];
    let tail = &sorted[..index.max(1)];
    let es = tail.iter().sum::<f64>() / tail.len() as f64;

    Ok(VarEs {
        confidence_level,
        var,
        es,
    })
}

/// Normal approximation from the sample mean and population standard deviation
pub fn parametric_var_es(values: &[f64], confidence_level: f64) -> McResult<VarEs> {
    validate_sample(values, confidence_level)?;

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let tail = 1.0 - confidence_level;
    let z = norm_inv_cdf(tail);

    Ok(VarEs {
        confidence_level,
        var: mean + std * z,
        es: mean - std * norm_pdf(z) / tail,
    })
}
