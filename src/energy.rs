//! QUBO energy for cardinality-constrained portfolio selection.
//!
//! ```text
//! E(x) = -mu·x + lambda * xᵀ·sigma·x + penalty_A * (sum(x) - K)²
//! ```
//!
//! Lower is better. The return term rewards expected return, the risk term
//! charges portfolio variance, and the penalty term charges deviation from
//! the required cardinality K. Swap moves keep `sum(x) == K`, so during a
//! search the penalty is always zero; it matters only when scoring a
//! selection that was not produced by the optimizer.

use crate::instance::ProblemInstance;
use crate::sa::Swap;
use crate::selection::Selection;

/// Computes `E(x)` by full recomputation, O(N²).
///
/// `x` must have length N with entries in {0, 1}; this is not re-checked.
/// NaN and infinities in the inputs propagate into the result.
pub fn energy(
    x: &[u8],
    mu: &[f64],
    sigma: &[Vec<f64>],
    k: usize,
    lambda: f64,
    penalty_a: f64,
) -> f64 {
    let (ret, quad, count) = terms(x, mu, sigma);
    let dev = count - k as f64;
    -ret + lambda * quad + penalty_a * dev * dev
}

/// Returns `(mu·x, xᵀ·sigma·x, sum(x))`.
fn terms(x: &[u8], mu: &[f64], sigma: &[Vec<f64>]) -> (f64, f64, f64) {
    let mut ret = 0.0;
    let mut quad = 0.0;
    let mut count = 0.0;
    for (i, &xi) in x.iter().enumerate() {
        let xi = f64::from(xi);
        ret += mu[i] * xi;
        count += xi;
        let row: f64 = sigma[i]
            .iter()
            .zip(x)
            .map(|(&s, &xj)| s * f64::from(xj))
            .sum();
        quad += xi * row;
    }
    (ret, quad, count)
}

/// The three energy terms of a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnergyBreakdown {
    /// `-mu·x`
    pub return_term: f64,
    /// `lambda * xᵀ·sigma·x`
    pub risk_term: f64,
    /// `penalty_A * (sum(x) - K)²`
    pub penalty_term: f64,
    /// Sum of the three terms.
    pub total: f64,
}

impl EnergyBreakdown {
    /// Evaluates every term of `E(x)` under `instance`.
    pub fn evaluate(instance: &ProblemInstance, x: &Selection) -> Self {
        let (ret, quad, count) = terms(x.as_slice(), &instance.mu, &instance.sigma);
        let dev = count - instance.k as f64;
        let return_term = -ret;
        let risk_term = instance.lambda * quad;
        let penalty_term = instance.penalty_a * dev * dev;
        Self {
            return_term,
            risk_term,
            penalty_term,
            total: return_term + risk_term + penalty_term,
        }
    }
}

/// Cached `sigma·x` over the currently selected assets.
///
/// `row_sums[r] = Σ_{s selected} sigma[r][s]`. Lets a swap delta be
/// computed in O(1); an accepted swap costs O(N) to fold in.
#[derive(Debug, Clone)]
pub struct SigmaRowCache {
    row_sums: Vec<f64>,
}

impl SigmaRowCache {
    pub fn new(sigma: &[Vec<f64>], x: &Selection) -> Self {
        let selected = x.selected_indices();
        let row_sums = sigma
            .iter()
            .map(|row| selected.iter().map(|&s| row[s]).sum())
            .collect();
        Self { row_sums }
    }

    /// `(sigma·x)[r]`.
    pub fn row_sum(&self, r: usize) -> f64 {
        self.row_sums[r]
    }

    /// Folds an accepted swap into the cache.
    pub fn apply(&mut self, sigma: &[Vec<f64>], swap: Swap) {
        for (sum, row) in self.row_sums.iter_mut().zip(sigma) {
            *sum += row[swap.added] - row[swap.removed];
        }
    }
}

/// Energy change of applying `swap` to the selection that `cache` describes.
///
/// With `r` leaving and `a` entering the portfolio and `x' = x - e_r + e_a`:
///
/// ```text
/// Δ = (mu_r - mu_a)
///   + lambda * (2 (σx)_a - 2 (σx)_r + σ_rr + σ_aa - 2 σ_ra)
/// ```
///
/// The penalty term is unchanged by a swap. Agrees with recomputing
/// [`energy`] up to floating-point rounding.
pub fn swap_delta(instance: &ProblemInstance, cache: &SigmaRowCache, swap: Swap) -> f64 {
    let (r, a) = (swap.removed, swap.added);
    let sigma = &instance.sigma;
    let ret = instance.mu[r] - instance.mu[a];
    let quad = 2.0 * cache.row_sum(a) - 2.0 * cache.row_sum(r) + sigma[r][r] + sigma[a][a]
        - 2.0 * sigma[r][a];
    ret + instance.lambda * quad
}
