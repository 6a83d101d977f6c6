// src/rng.rs
//! Random Number Generation for Monte Carlo Simulations
//!
//! # Design
//!
//! Every estimator receives its randomness from an explicit handle owned by
//! the caller. There is no process-wide seed:
//! 1. **Reproducibility**: same seed and same call sequence give identical results
//! 2. **Parallel safety**: each chunk of paths draws from its own stream
//! 3. **No reuse**: a factory hands out fresh stream ranges on every call
//!
//! # Streams
//!
//! A stream is a `StdRng` seeded from `(base_seed, stream_index)` through a
//! splitmix64 finaliser:
//! ```text
//! z = base_seed + 0x9E3779B97F4A7C15 * (stream_index + 1)
//! z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
//! z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
//! seed = z ⊕ (z >> 31)
//! ```
//! Chunk `i` of a simulation always uses stream `first + i`, so the output
//! does not depend on how rayon schedules the chunks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// splitmix64 output function
pub fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// Seeded source of independent random streams.
///
/// The factory remembers how many streams it has handed out; each call to
/// [`RngFactory::reserve`] returns a block of streams that no earlier call
/// has touched.
#[derive(Debug, Clone)]
pub struct RngFactory {
    base_seed: u64,
    next_stream: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            next_stream: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.base_seed
    }

    /// Index of the next stream that will be handed out
    pub fn position(&self) -> u64 {
        self.next_stream
    }

    /// Reserve `count` consecutive streams for one simulation
    pub fn reserve(&mut self, count: u64) -> StreamBlock {
        let block = StreamBlock {
            base_seed: self.base_seed,
            first: self.next_stream,
            count,
        };
        self.next_stream = self.next_stream.wrapping_add(count);
        block
    }

    /// Standalone generator for callers that want a single sequential stream
    pub fn create_std_rng(&mut self) -> StdRng {
        self.reserve(1).stream(0)
    }
}

/// A contiguous range of streams reserved from a [`RngFactory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamBlock {
    pub base_seed: u64,
    pub first: u64,
    pub count: u64,
}

impl StreamBlock {
    /// Generator for the `index`-th stream of the block
    pub fn stream(&self, index: u64) -> StdRng {
        let id = self.first.wrapping_add(index).wrapping_add(1);
        let seed = splitmix64(self.base_seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(id)));
        StdRng::seed_from_u64(seed)
    }
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// Overwrite `out` with independent standard normal draws
pub fn fill_normals<R: Rng + ?Sized>(rng: &mut R, out: &mut [f64]) {
    for z in out.iter_mut() {
        *z = StandardNormal.sample(rng);
    }
}
