//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! This module implements the payoff functions applied to simulated asset
//! price paths. Each payoff represents a different contract type.
//!
//! ## European Options
//! - **Call**: max(S_T - K, 0) - right to buy at strike K
//! - **Put**: max(K - S_T, 0) - right to sell at strike K
//!
//! ## Path-Dependent Options
//! - **Asian**: Based on the arithmetic average over the path (S_0 included)
//! - **Up-and-out barrier**: Worthless once the path touches the barrier
//! - **Custom**: Any caller-supplied function of the path
//!
//! # Implementation Notes
//!
//! All payoffs operate on the full price path `&[f64]` to support both
//! European (terminal price only) and exotic (full path) options. Batch
//! helpers work on ndarray views, one path per row.

use crate::error::{validation::*, McResult};
use crate::market::OptionSpec;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use std::fmt;
use std::sync::Arc;

/// A named payoff function of the whole path
#[derive(Clone)]
pub struct CustomPayoff {
    name: String,
    func: Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>,
}

impl CustomPayoff {
    pub fn new(name: impl Into<String>, func: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        CustomPayoff {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomPayoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPayoff").field("name", &self.name).finish()
    }
}

/// Enumeration of supported option payoff types
#[derive(Clone, Debug)]
pub enum Payoff {
    /// max(S_T - K, 0) or max(K - S_T, 0)
    European(OptionSpec),

    /// Vanilla payoff on the arithmetic path average
    Asian(OptionSpec),

    /// Vanilla payoff if max(S_t) < H, else 0
    UpAndOut { option: OptionSpec, barrier: f64 },

    Custom(CustomPayoff),
}

impl Payoff {
    /// Calculate payoff value from a simulated asset price path
    ///
    /// # Parameters
    /// - `path`: Complete asset price path [S_0, S_1, ..., S_T]
    ///
    /// An empty path pays nothing.
    pub fn calculate(&self, path: &[f64]) -> f64 {
        let s_t = match path.last() {
            Some(&s) => s,
            None => return 0.0,
        };
        match self {
            Payoff::European(option) => option.intrinsic(s_t),

            Payoff::Asian(option) => {
                let average_price = path.iter().sum::<f64>() / path.len() as f64;
                option.intrinsic(average_price)
            }

            // Knocked out if price ever touches or exceeds barrier H
            Payoff::UpAndOut { option, barrier } => {
                if path.iter().any(|&s| s >= *barrier) {
                    0.0
                } else {
                    option.intrinsic(s_t)
                }
            }

            Payoff::Custom(custom) => (custom.func)(path),
        }
    }

    /// Underlying vanilla contract, if the payoff has one
    pub fn option(&self) -> Option<&OptionSpec> {
        match self {
            Payoff::European(option) | Payoff::Asian(option) => Some(option),
            Payoff::UpAndOut { option, .. } => Some(option),
            Payoff::Custom(_) => None,
        }
    }

    /// False only for payoffs that read the terminal value alone
    pub fn is_path_dependent(&self) -> bool {
        !matches!(self, Payoff::European(_))
    }

    pub fn validate(&self) -> McResult<()> {
        if let Some(option) = self.option() {
            option.validate()?;
        }
        if let Payoff::UpAndOut { barrier, .. } = self {
            validate_positive("barrier", *barrier)?;
        }
        Ok(())
    }

    /// Payoff of every row of a path matrix
    pub fn evaluate_paths(&self, paths: ArrayView2<'_, f64>) -> Array1<f64> {
        paths
            .axis_iter(Axis(0))
            .map(|row| match row.as_slice() {
                Some(slice) => self.calculate(slice),
                None => self.calculate(&row.to_vec()),
            })
            .collect()
    }

    pub fn name(&self) -> String {
        match self {
            Payoff::European(o) => format!("European {:?} K={}", o.kind, o.strike),
            Payoff::Asian(o) => format!("Asian {:?} K={}", o.kind, o.strike),
            Payoff::UpAndOut { option, barrier } => {
                format!("Up-and-out {:?} K={} H={}", option.kind, option.strike, barrier)
            }
            Payoff::Custom(c) => c.name().to_string(),
        }
    }
}

/// Vanilla payoffs of a batch of terminal values
pub fn vanilla_payoffs(option: &OptionSpec, terminals: ArrayView1<'_, f64>) -> Array1<f64> {
    terminals.mapv(|s| option.intrinsic(s))
}
