// src/market.rs
//! Market inputs shared by every pricer.
//!
//! `MarketParameters` is an already-validated snapshot supplied by the
//! caller; nothing in this crate fetches market data.

use crate::error::{validation::*, McResult};
use serde::Serialize;

/// Call or put
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// +1 for calls, -1 for puts
    pub fn sign(self) -> f64 {
        match self {
            OptionKind::Call => 1.0,
            OptionKind::Put => -1.0,
        }
    }
}

/// Strike and type of a plain option
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionSpec {
    pub strike: f64,
    pub kind: OptionKind,
}

impl OptionSpec {
    pub fn call(strike: f64) -> Self {
        OptionSpec {
            strike,
            kind: OptionKind::Call,
        }
    }

    pub fn put(strike: f64) -> Self {
        OptionSpec {
            strike,
            kind: OptionKind::Put,
        }
    }

    /// Exercise value at underlying level `s`
    #[inline]
    pub fn intrinsic(&self, s: f64) -> f64 {
        match self.kind {
            OptionKind::Call => (s - self.strike).max(0.0),
            OptionKind::Put => (self.strike - s).max(0.0),
        }
    }

    pub fn validate(&self) -> McResult<()> {
        validate_positive("strike", self.strike)
    }
}

/// Spot, strike, maturity, rate and volatility for one pricing call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketParameters {
    pub spot: f64,
    pub strike: f64,
    pub maturity: f64,
    pub rate: f64,
    pub volatility: f64,
}

impl Default for MarketParameters {
    fn default() -> Self {
        MarketParameters {
            spot: 100.0,
            strike: 100.0,
            maturity: 1.0,
            rate: 0.05,
            volatility: 0.2,
        }
    }
}

impl MarketParameters {
    pub fn new(spot: f64, strike: f64, maturity: f64, rate: f64, volatility: f64) -> Self {
        MarketParameters {
            spot,
            strike,
            maturity,
            rate,
            volatility,
        }
    }

    /// Checks the admissible domain. Zero maturity and zero volatility are
    /// valid and select the deterministic short-circuit.
    pub fn validate(&self) -> McResult<()> {
        validate_positive("spot", self.spot)?;
        validate_positive("strike", self.strike)?;
        validate_non_negative("maturity", self.maturity)?;
        validate_finite("rate", self.rate)?;
        validate_non_negative("volatility", self.volatility)?;
        Ok(())
    }

    pub fn call(&self) -> OptionSpec {
        OptionSpec::call(self.strike)
    }

    pub fn put(&self) -> OptionSpec {
        OptionSpec::put(self.strike)
    }

    pub fn option(&self, kind: OptionKind) -> OptionSpec {
        OptionSpec {
            strike: self.strike,
            kind,
        }
    }

    /// exp(-rT)
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.maturity).exp()
    }

    /// σ√T, the total diffusion over the option's life
    pub fn total_volatility(&self) -> f64 {
        self.volatility * self.maturity.sqrt()
    }

    /// True when σ√T is zero and the GBM terminal value is deterministic
    pub fn is_deterministic(&self) -> bool {
        self.maturity == 0.0 || self.volatility == 0.0
    }

    /// Terminal value with no diffusion, S0·e^{rT}
    pub fn forward(&self) -> f64 {
        self.spot * (self.rate * self.maturity).exp()
    }

    pub fn with_spot(&self, spot: f64) -> Self {
        MarketParameters { spot, ..*self }
    }

    pub fn with_strike(&self, strike: f64) -> Self {
        MarketParameters { strike, ..*self }
    }

    pub fn with_volatility(&self, volatility: f64) -> Self {
        MarketParameters {
            volatility,
            ..*self
        }
    }

    pub fn with_maturity(&self, maturity: f64) -> Self {
        MarketParameters { maturity, ..*self }
    }

    pub fn with_rate(&self, rate: f64) -> Self {
        MarketParameters { rate, ..*self }
    }
}
