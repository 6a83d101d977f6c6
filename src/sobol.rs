// src/sobol.rs
//! Sobol low-discrepancy sequence
//!
//! Gray-code construction (Antonov-Saleev) over 32-bit direction numbers.
//! Dimensions 2..=16 use the Joe-Kuo `new-joe-kuo-6.21201` primitive
//! polynomials and initial direction numbers. Dimensions above that use
//! odd pseudo-random initial numbers derived with splitmix64, which keeps
//! every one-dimensional projection a (0,1)-sequence but gives weaker
//! two-dimensional uniformity.
//!
//! # Recurrence
//! ```text
//! V_i = m_i · 2^(32-i)                                     i ≤ s
//! V_i = V_{i-s} ⊕ (V_{i-s} >> s) ⊕ ⊕_{k=1}^{s-1} a_k V_{i-k}   i > s
//! x_n = x_{n-1} ⊕ V_c,  c = position of the rightmost zero bit of n-1
//! ```
//!
//! The sequence is a caller-owned cursor: [`SobolSequence::position`] is the
//! index of the next point, and nothing resets it implicitly.

use crate::error::{McError, McResult};
use crate::rng::splitmix64;
use ndarray::Array2;

const BITS: usize = 32;
const INV_TWO_POW_32: f64 = 1.0 / 4_294_967_296.0;
const FALLBACK_SEED: u64 = 0x5EED_0F50_B01D_1CE5;

/// Dimensions backed by published direction numbers
pub const MAX_TABLE_DIMENSIONS: usize = 16;

/// Hard cap on the dimension of a single sequence
pub const MAX_DIMENSIONS: usize = 21_201;

/// (degree s, polynomial coefficients a, initial m_1..m_s) for dimensions 2..=16
const JOE_KUO: [(u32, u32, &[u32]); MAX_TABLE_DIMENSIONS - 1] = [
    (1, 0, &[1]),
    (2, 1, &[1, 3]),
    (3, 1, &[1, 3, 1]),
    (3, 2, &[1, 1, 1]),
    (4, 1, &[1, 1, 3, 3]),
    (4, 4, &[1, 3, 5, 13]),
    (5, 2, &[1, 1, 5, 5, 17]),
    (5, 4, &[1, 1, 5, 5, 5]),
    (5, 7, &[1, 1, 7, 11, 19]),
    (5, 11, &[1, 1, 5, 1, 1]),
    (5, 13, &[1, 1, 1, 3, 11]),
    (5, 14, &[1, 3, 5, 5, 31]),
    (6, 1, &[1, 3, 3, 9, 7, 49]),
    (6, 13, &[1, 1, 1, 15, 21, 21]),
    (6, 16, &[1, 3, 1, 13, 27, 49]),
];

#[derive(Debug, Clone)]
pub struct SobolSequence {
    dimensions: usize,
    position: u64,
    x: Vec<u32>,
    directions: Vec<[u32; BITS]>,
}

impl SobolSequence {
    pub fn new(dimensions: usize) -> McResult<Self> {
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return Err(McError::configuration(
                "sobol_dimensions",
                format!("must be in [1, {}], got {}", MAX_DIMENSIONS, dimensions),
            ));
        }

        let directions = (0..dimensions).map(direction_numbers).collect();

        Ok(SobolSequence {
            dimensions,
            position: 0,
            x: vec![0; dimensions],
            directions,
        })
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Index of the next point to be produced
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Points left before the 32-bit sequence is exhausted
    pub fn remaining(&self) -> u64 {
        (1u64 << BITS) - self.position
    }

    /// Writes the next point into `out[..dimensions]`.
    ///
    /// Returns `false` once all 2^32 points have been used.
    #[inline]
    pub fn next_into(&mut self, out: &mut [f64]) -> bool {
        if self.position >= 1u64 << BITS {
            return false;
        }
        if self.position > 0 {
            let c = (self.position - 1).trailing_ones() as usize;
            for (x, v) in self.x.iter_mut().zip(&self.directions) {
                *x ^= v[c];
            }
        }
        for (o, &x) in out.iter_mut().zip(&self.x) {
            *o = x as f64 * INV_TWO_POW_32;
        }
        self.position += 1;
        true
    }

    /// Advances the cursor by `count` points without producing them
    pub fn skip(&mut self, count: u64) -> McResult<()> {
        if count > self.remaining() {
            return Err(McError::InvalidSampleCount {
                count: count as usize,
                reason: format!("only {} Sobol points remain", self.remaining()),
            });
        }
        self.position += count;
        if self.position == 0 {
            return Ok(());
        }

        // Point n-1 is the XOR of V_j over the set bits of gray(n-1)
        let index = self.position - 1;
        let gray = index ^ (index >> 1);
        for (x, v) in self.x.iter_mut().zip(&self.directions) {
            *x = (0..BITS)
                .filter(|&j| (gray >> j) & 1 == 1)
                .fold(0, |acc, j| acc ^ v[j]);
        }
        Ok(())
    }

    /// Next `n` points, one per row
    pub fn points(&mut self, n: usize) -> McResult<Array2<f64>> {
        if n as u64 > self.remaining() {
            return Err(McError::InvalidSampleCount {
                count: n,
                reason: format!("only {} Sobol points remain", self.remaining()),
            });
        }
        let mut out = Array2::zeros((n, self.dimensions));
        let mut point = vec![0.0; self.dimensions];
        for mut row in out.rows_mut() {
            self.next_into(&mut point);
            for (r, p) in row.iter_mut().zip(&point) {
                *r = *p;
            }
        }
        Ok(out)
    }
}

fn direction_numbers(dim: usize) -> [u32; BITS] {
    let mut v = [0u32; BITS];

    if dim == 0 {
        for (i, item) in v.iter_mut().enumerate() {
            *item = 1u32 << (BITS - 1 - i);
        }
        return v;
    }

    if dim < MAX_TABLE_DIMENSIONS {
        let (s, a, m) = JOE_KUO[dim - 1];
        let s = s as usize;
        for i in 0..s.min(BITS) {
            v[i] = m[i] << (BITS - 1 - i);
        }
        for i in s..BITS {
            let mut value = v[i - s] ^ (v[i - s] >> s);
            for k in 1..s {
                if (a >> (s - 1 - k)) & 1 == 1 {
                    value ^= v[i - k];
                }
            }
            v[i] = value;
        }
        return v;
    }

    for (i, item) in v.iter_mut().enumerate() {
        let hash = splitmix64(FALLBACK_SEED ^ ((dim as u64) << 20) ^ i as u64);
        let mask = if i == BITS - 1 {
            u32::MAX
        } else {
            (1u32 << (i + 1)) - 1
        };
        let m = (hash as u32 | 1) & mask;
        *item = m << (BITS - 1 - i);
    }
    v
}
