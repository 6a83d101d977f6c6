// src/mc/brownian_bridge.rs
//! Brownian-bridge path construction on a uniform grid
//!
//! Maps `N` independent standard normals to the `N` standardized increments
//! of a Brownian path, spending the first normal on the terminal value, the
//! second on the midpoint, and so on by bisection:
//! ```text
//! W(t_N) = √t_N · z₀
//! W(t_l) = w_L·W(t_j) + w_R·W(t_k) + σ_l·z_i      t_j < t_l < t_k
//! ```
//! Low-discrepancy sequences are most uniform in their leading coordinates,
//! so this ordering puts them on the coarse shape of the path.
//!
//! The map is orthogonal: output increments are again i.i.d. N(0,1).

/// Precomputed bisection schedule for a fixed number of steps
#[derive(Debug, Clone)]
pub struct BrownianBridge {
    steps: usize,
    left_index: Vec<usize>,
    right_index: Vec<usize>,
    bridge_index: Vec<usize>,
    left_weight: Vec<f64>,
    right_weight: Vec<f64>,
    std_dev: Vec<f64>,
}

impl BrownianBridge {
    pub fn new(steps: usize) -> Self {
        let steps = steps.max(1);
        // Time of grid point i, in units of one step
        let t = |i: usize| (i + 1) as f64;

        let mut map = vec![0usize; steps];
        let mut left_index = vec![0; steps];
        let mut right_index = vec![0; steps];
        let mut bridge_index = vec![0; steps];
        let mut left_weight = vec![0.0; steps];
        let mut right_weight = vec![0.0; steps];
        let mut std_dev = vec![0.0; steps];

        map[steps - 1] = 1;
        bridge_index[0] = steps - 1;
        std_dev[0] = t(steps - 1).sqrt();

        let mut j = 0;
        for i in 1..steps {
            while map[j] != 0 {
                j += 1;
            }
            let mut k = j;
            while map[k] == 0 {
                k += 1;
            }
            // j..k-1 is the leftmost unfilled gap, k its right anchor
            let l = j + ((k - 1 - j) >> 1);
            map[l] = i;
            bridge_index[i] = l;
            left_index[i] = j;
            right_index[i] = k;

            let t_left = if j == 0 { 0.0 } else { t(j - 1) };
            let span = t(k) - t_left;
            left_weight[i] = (t(k) - t(l)) / span;
            right_weight[i] = (t(l) - t_left) / span;
            std_dev[i] = ((t(l) - t_left) * (t(k) - t(l)) / span).sqrt();

            j = k + 1;
            if j >= steps {
                j = 0;
            }
        }

        BrownianBridge {
            steps,
            left_index,
            right_index,
            bridge_index,
            left_weight,
            right_weight,
            std_dev,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Overwrites `out` with standardized increments built from `normals`.
    /// Both slices hold `steps` values.
    pub fn transform(&self, normals: &[f64], out: &mut [f64]) {
        let n = self.steps;
        out[n - 1] = self.std_dev[0] * normals[0];
        for i in 1..n {
            let j = self.left_index[i];
            let k = self.right_index[i];
            let l = self.bridge_index[i];
            let left = if j == 0 { 0.0 } else { out[j - 1] };
            out[l] = self.left_weight[i] * left
                + self.right_weight[i] * out[k]
                + self.std_dev[i] * normals[i];
        }
        for i in (1..n).rev() {
            out[i] -= out[i - 1];
        }
    }
}
