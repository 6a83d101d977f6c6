//! # fast-mc: Monte Carlo option pricing and variance reduction
//!
//! Prices European and path-dependent options by simulation under GBM,
//! Heston or Merton jump-diffusion dynamics, with interchangeable
//! estimators (crude, antithetic, control variate, quasi-random) and
//! closed-form or lattice references to check them against.
//!
//! ## Key Features
//!
//! - **Reproducible parallelism**: chunked Rayon execution with per-chunk
//!   seeded streams, identical results for any thread count
//! - **Variance Reduction**: antithetic variates, control variates,
//!   importance sampling and Sobol quasi-random sampling
//! - **Reference Pricers**: Black-Scholes with Greeks, binomial and trinomial
//!   trees, Bjerksund-Stensland, Merton series
//! - **Risk**: pathwise Greeks, discrete delta hedging, VaR and ES
//!
//! ## Quick Start
//!
//! ```rust
//! use fast_mc::market::{MarketParameters, OptionSpec};
//! use fast_mc::mc::{DrawSource, Estimator, McConfig};
//!
//! let cfg = McConfig::european(MarketParameters::default(), OptionSpec::call(100.0), 100_000);
//! let mut source = DrawSource::seeded(42);
//!
//! let result = Estimator::Antithetic
//!     .estimate(&cfg, &mut source)
//!     .expect("valid configuration");
//! println!("{:.4} ± {:.4}", result.estimate, result.std_error.unwrap_or(0.0));
//! ```
//!
//! Every estimate is discounted once, after averaging, and records where its
//! random draws came from so that any run can be replayed.

pub mod analytics;
pub mod error;
pub mod hedging;
pub mod market;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod output;
pub mod risk;
pub mod rng;
pub mod sobol;

pub use error::{McError, McResult};
