// src/mc/mc_engine.rs
//! Monte Carlo configuration and the chunked parallel driver
//!
//! # Math Framework
//!
//! Every estimator approximates the risk-neutral expectation
//! ```text
//! V = e^(-rT) * E^Q[payoff(S)]
//! ```
//! by averaging payoffs over simulated paths and discounting once.
//!
//! # Parallelism
//!
//! Samples are cut into chunks of [`CHUNK_SIZE`]. Chunk `i` draws from
//! stream `i` of a [`StreamBlock`] reserved for the call, accumulates its
//! own moments, and the partials are merged in chunk order. The result is
//! therefore independent of the rayon thread count.

use crate::error::{validation::*, McError, McResult};
use crate::market::{MarketParameters, OptionKind, OptionSpec};
use crate::mc::path_generator::deterministic_path;
use crate::mc::payoffs::Payoff;
use crate::mc::stats::{Accumulator, EstimatorResult};
use crate::models::Dynamics;
use crate::rng::StreamBlock;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::info;

/// Samples handled by one parallel task
pub const CHUNK_SIZE: usize = 8_192;

#[derive(Clone, Debug)]
pub struct McConfig {
    pub paths: usize,
    pub steps: usize,
    pub market: MarketParameters,
    pub payoff: Payoff,
    pub dynamics: Dynamics,
}

impl McConfig {
    /// Single-step GBM pricing of a European option
    pub fn european(market: MarketParameters, option: OptionSpec, paths: usize) -> Self {
        McConfig {
            paths,
            steps: 1,
            market,
            payoff: Payoff::European(option),
            dynamics: Dynamics::Gbm,
        }
    }

    /// Validate the Monte Carlo configuration
    pub fn validate(&self) -> McResult<()> {
        validate_paths(self.paths)?;
        validate_steps(self.steps)?;
        self.market.validate()?;
        self.payoff.validate()?;
        match &self.dynamics {
            Dynamics::Gbm => Ok(()),
            Dynamics::Heston(p) => p.validate(),
            Dynamics::Merton(p) => p.validate(),
        }
    }

    /// True when the simulated value is known without sampling
    pub fn is_deterministic(&self) -> bool {
        self.dynamics.is_deterministic(&self.market)
    }

    /// Discounted payoff of the single no-diffusion path.
    ///
    /// A vanilla payoff is taken against the discounted strike,
    /// `max(S_0 - K e^{-rT}, 0)` for a call, so a forward too large for `f64`
    /// does not leak into the result. Anything non-finite is `NumericOverflow`.
    pub fn deterministic_value(&self) -> McResult<f64> {
        let m = &self.market;
        let value = match &self.payoff {
            Payoff::European(option) => {
                let discounted_strike = option.strike * m.discount_factor();
                match option.kind {
                    OptionKind::Call => (m.spot - discounted_strike).max(0.0),
                    OptionKind::Put => (discounted_strike - m.spot).max(0.0),
                }
            }
            payoff => {
                let path = deterministic_path(m, self.steps);
                m.discount_factor() * payoff.calculate(&path)
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(McError::overflow(
                "deterministic short-circuit",
                format!(
                    "value {} for r = {}, T = {} ({} payoff)",
                    value,
                    m.rate,
                    m.maturity,
                    if self.payoff.is_path_dependent() { "path-dependent" } else { "terminal" }
                ),
            ))
        }
    }
}

impl Default for McConfig {
    fn default() -> Self {
        McConfig {
            paths: 100_000,
            steps: 1,
            market: MarketParameters::default(),
            payoff: Payoff::European(OptionSpec::call(100.0)),
            dynamics: Dynamics::Gbm,
        }
    }
}

/// Number of chunks needed for `samples`
pub fn chunk_count(samples: usize) -> usize {
    (samples + CHUNK_SIZE - 1) / CHUNK_SIZE
}

/// Runs `body` once per chunk in parallel and merges the partials in order.
///
/// `body` gets the chunk's own generator and the number of samples it must
/// produce.
pub fn run_chunks<A, F>(samples: usize, block: &StreamBlock, body: F) -> McResult<A>
where
    A: Accumulator,
    F: Fn(&mut StdRng, usize, &mut A) -> McResult<()> + Sync,
{
    let partials: Vec<McResult<A>> = (0..chunk_count(samples))
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_SIZE;
            let len = CHUNK_SIZE.min(samples - start);
            let mut rng = block.stream(chunk as u64);
            let mut acc = A::default();
            body(&mut rng, len, &mut acc)?;
            Ok(acc)
        })
        .collect();

    let mut total = A::default();
    for partial in partials {
        total.merge(&partial?);
    }
    Ok(total)
}

/// Same as [`run_chunks`] for sources that are indexed rather than streamed:
/// `body` gets the index of the chunk's first sample instead of a generator.
pub fn run_indexed_chunks<A, F>(samples: usize, body: F) -> McResult<A>
where
    A: Accumulator,
    F: Fn(usize, usize, &mut A) -> McResult<()> + Sync,
{
    let partials: Vec<McResult<A>> = (0..chunk_count(samples))
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_SIZE;
            let len = CHUNK_SIZE.min(samples - start);
            let mut acc = A::default();
            body(start, len, &mut acc)?;
            Ok(acc)
        })
        .collect();

    let mut total = A::default();
    for partial in partials {
        total.merge(&partial?);
    }
    Ok(total)
}

/// Short-circuit result for a deterministic configuration, logged at info
pub(crate) fn short_circuit(cfg: &McConfig, method: &str) -> McResult<EstimatorResult> {
    let value = cfg.deterministic_value()?;
    info!(
        method,
        maturity = cfg.market.maturity,
        volatility = cfg.market.volatility,
        value,
        "deterministic short-circuit, no samples drawn"
    );
    Ok(EstimatorResult::deterministic(value, cfg.paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::stats::PayoffStats;
    use crate::rng::{get_normal_draw, RngFactory};

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(1), 1);
        assert_eq!(chunk_count(CHUNK_SIZE), 1);
        assert_eq!(chunk_count(CHUNK_SIZE + 1), 2);
    }

    #[test]
    fn test_run_chunks_covers_every_sample() {
        let block = RngFactory::new(9).reserve(chunk_count(20_000) as u64);
        let stats: PayoffStats = run_chunks(20_000, &block, |rng, len, acc: &mut PayoffStats| {
            for _ in 0..len {
                acc.push(get_normal_draw(rng));
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(stats.count(), 20_000);
        assert!(stats.mean().abs() < 0.05);
    }

    #[test]
    fn test_run_chunks_is_deterministic() {
        let block = RngFactory::new(11).reserve(chunk_count(50_000) as u64);
        let run = || {
            run_chunks(50_000, &block, |rng, len, acc: &mut PayoffStats| {
                for _ in 0..len {
                    acc.push(get_normal_draw(rng));
                }
                Ok(())
            })
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_validate() {
        let mut cfg = McConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.paths = 0;
        assert!(cfg.validate().is_err());
        cfg.paths = 10;
        cfg.market.maturity = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_deterministic_value() {
        let cfg = McConfig::european(
            MarketParameters::new(110.0, 100.0, 0.0, 0.05, 0.2),
            OptionSpec::call(100.0),
            1_000,
        );
        assert!(cfg.is_deterministic());
        assert_eq!(cfg.deterministic_value().unwrap(), 10.0);
    }

    #[test]
    fn test_deterministic_value_with_extreme_rate() {
        // e^{-rT} underflows and the forward overflows
        let market = MarketParameters::new(100.0, 100.0, 1.0, 1000.0, 0.0);
        let call = McConfig::european(market, OptionSpec::call(100.0), 1_000);
        assert_eq!(call.deterministic_value().unwrap(), 100.0);
        let put = McConfig::european(market, OptionSpec::put(100.0), 1_000);
        assert_eq!(put.deterministic_value().unwrap(), 0.0);

        let asian = McConfig {
            steps: 4,
            payoff: Payoff::Asian(OptionSpec::call(100.0)),
            ..call
        };
        assert!(asian.payoff.is_path_dependent());
        assert!(matches!(
            asian.deterministic_value(),
            Err(McError::NumericOverflow { .. })
        ));
    }
}
