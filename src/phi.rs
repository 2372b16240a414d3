//! ## Bias correction
//! Multiplicative correction applied by the large multiplicity estimator.
//!
//! For a prior multiplicity `n` and bitmap density `p`, the probability that the
//! first `k` columns of a row are all set is
//!
//! ```text
//! q_0 = 1
//! q_k = prod_{i=0}^{k-1} (1 - (1 - 2^-i)^n * (1 - p))
//! ```
//!
//! which gives the expected run length `E[Z] = sum_{k=0}^{w-1} k * (q_k - q_{k+1})`
//! and the correction `phi = 2^E[Z] / n`. From `N_MAX` on the asymptotic
//! probabilistic counting constant `PHI_INF` is used instead. Since the model
//! treats column 0 as always set, the exact form tends to `2 * PHI_INF`, so the
//! correction halves when the prior crosses `N_MAX`.
//!
//! [Probabilistic counting paper](https://algo.inria.fr/flajolet/Publications/FlMa85.pdf)

/// Prior multiplicity from which `PHI_INF` is used
pub const N_MAX: f64 = 1e5;
/// Asymptotic bias constant of probabilistic counting
pub const PHI_INF: f64 = 0.77351;

/// Return bias correction factor for prior `n`, density `p` and `w` columns.
///
/// `n` must be positive.
#[inline]
pub fn phi(n: u64, p: f64, w: u64) -> f64 {
    let n = n as f64;
    if n >= N_MAX {
        return PHI_INF;
    }
    expected_run_length(n, p, w).exp2() / n
}

/// Expected run length of set columns `E[Z]` under the sketch model.
pub fn expected_run_length(n: f64, p: f64, w: u64) -> f64 {
    let mut expectation = 0.0;
    // q_k, advanced incrementally to q_{k+1} on every step
    let mut q = 1.0;
    for k in 0..w {
        let k = k as f64;
        let next = q * (1.0 - (1.0 - (-k).exp2()).powf(n) * (1.0 - p));
        expectation += k * (q - next);
        q = next;
    }
    expectation
}
