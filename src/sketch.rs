//! Multiplicity sketch estimates how many times each key was inserted,
//! using one bitmap of `l` bits shared by all keys. It is defined with
//! runtime parameters `(l, m, w)`:
//! - `l`: bitmap length in bits, in `[1..min(2^w, 2^32)]`.
//! - `m`: number of rows each key spreads its insertions over.
//! - `w`: maximum column depth of a row.
//!
//! # Insertion
//! Every insertion picks a row `i` uniformly from `[0, m)` and a column `j`
//! geometrically from `[0, w]`, then sets bit `H(key, i, j) mod l`. Row `i` of a
//! key therefore records, in expectation, the base-2 logarithm of the number of
//! insertions that landed in it, like a probabilistic counting bitmap with
//! stochastic averaging. Unlike per-key counters the bitmap is shared, so other
//! keys show up as background density `p`.
//!
//! # Estimation
//! Estimation never samples. It re-derives the `m * w` candidate positions of
//! the key and picks one of two estimators:
//!
//! - Small multiplicity, when `k / (1 - p) > 0.3 * m` where `k` is the number of
//!   rows whose first column is unset:
//!   `-2 * m * ln(k / ((1 - p) * m))`, a linear counting style estimate
//!   corrected for density.
//! - Large multiplicity otherwise: `m * 2^(Z / m) / phi(p)`, where `Z` sums the
//!   per-row run lengths of set columns (first unset column minus one) and
//!   `phi` is the bias correction from [`crate::phi`].
//!
//! The large regime needs a prior multiplicity for `phi`. The sketch uses the
//! last value it returned, for whichever key that was. The prior is a property
//! of the sketch's estimation history, not of a single key.
//!
//! # Density
//! `p` is the fraction of set bits over the whole bitmap. It costs `O(l)` to
//! compute, so it is cached and recomputed only after an insertion flipped a
//! bit from 0 to 1.
use std::fmt::{Debug, Formatter};
use std::hash::Hasher;
use std::mem::size_of;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, trace, warn};
use wyhash::WyHash;

use crate::bitmap::{Bitmap, Density};
use crate::coordinate::CoordinateHasher;
use crate::error::{Result, SketchError};
use crate::params::Params;
use crate::phi::phi;
use crate::sampler::Sampler;

/// Fraction of rows that must look empty, after density correction,
/// for the small multiplicity estimator to apply
pub const SMALL_MULTIPLICITY_THRESHOLD: f64 = 0.3;

/// Probabilistic multiplicity sketch.
///
/// `H` addresses bits from `(key, row, column)`; `R` is the random source used
/// by insertions only.
pub struct Sketch<H: Hasher + Default = WyHash, R: RngCore = StdRng> {
    /// Validated configuration
    params: Params,
    /// Shared bit array
    bitmap: Bitmap,
    /// Cached fraction of set bits
    density: Density,
    /// Last returned estimate, prior of the next bias correction
    last_estimate: u64,
    /// Bit addressing
    coordinates: CoordinateHasher<H>,
    /// Insertion coordinate source
    sampler: Sampler<R>,
}

/// Estimator branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Regime {
    Small,
    Large,
}

impl Regime {
    /// Select branch from density-corrected empty row count `kp` and row count `m`.
    /// A tie goes to the large regime.
    #[inline]
    pub(crate) fn select(kp: f64, m: f64) -> Self {
        if kp > SMALL_MULTIPLICITY_THRESHOLD * m {
            Regime::Small
        } else {
            Regime::Large
        }
    }
}

impl Sketch {
    /// Creates new sketch with `WyHash` addressing and an entropy seeded random source
    pub fn new(l: u64, m: u64, w: u64) -> Result<Self> {
        Ok(Self::from_params(Params::new(l, m, w)?))
    }

    /// Creates new sketch from validated parameters
    pub fn from_params(params: Params) -> Self {
        Self::from_params_with_rng(params, StdRng::from_entropy())
    }
}

impl<R: RngCore> Sketch<WyHash, R> {
    /// Creates new sketch drawing insertion coordinates from `rng`
    pub fn with_rng(l: u64, m: u64, w: u64, rng: R) -> Result<Self> {
        Ok(Self::from_params_with_rng(Params::new(l, m, w)?, rng))
    }
}

impl<H: Hasher + Default, R: RngCore> Sketch<H, R> {
    /// Creates new sketch from validated parameters and random source
    pub fn from_params_with_rng(params: Params, rng: R) -> Self {
        debug!(
            l = params.l(),
            m = params.m(),
            w = params.w(),
            "creating multiplicity sketch"
        );
        Self {
            params,
            bitmap: Bitmap::new(params.bitmap_len()),
            density: Density::new(),
            last_estimate: 0,
            coordinates: CoordinateHasher::new(params.l()),
            sampler: Sampler::new(rng),
        }
    }

    /// Record one occurrence of `key`.
    ///
    /// Fails with [`SketchError::SamplerRange`] if `w` is wider than the
    /// sampler supports, leaving the sketch untouched.
    #[inline]
    pub fn count<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> Result<()> {
        let (row, column) = self.sampler.coordinate(self.params.m(), self.params.w())?;
        let position = self.coordinates.position(key.as_ref(), row, column);
        if self.bitmap.set(position) {
            self.density.invalidate();
            trace!(row, column, position, "bit set");
        }
        Ok(())
    }

    /// Return estimated number of times `key` was counted.
    ///
    /// The returned value becomes the bias correction prior of the next call,
    /// whatever key that call is for.
    ///
    /// Fails with [`SketchError::SaturatedBitmap`] when every bit is set, and with
    /// [`SketchError::UninitializedEstimate`] when the large multiplicity
    /// estimator is needed before any estimate was returned. A failed call
    /// keeps the previous prior.
    pub fn estimate<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> Result<u64> {
        let key = key.as_ref();
        let k = self.empty_rows(key);
        let p = self.fill_rate();
        if p >= 1.0 {
            warn!(l = self.params.l(), "bitmap saturated");
            return Err(SketchError::SaturatedBitmap);
        }

        let m = self.params.m() as f64;
        let kp = k as f64 / (1.0 - p);
        let regime = Regime::select(kp, m);
        let estimate = match regime {
            Regime::Small => -2.0 * m * (kp / m).ln(),
            Regime::Large => {
                if self.last_estimate == 0 {
                    return Err(SketchError::UninitializedEstimate);
                }
                let z = self.run_length_sum(key) as f64;
                m * (z / m).exp2() / phi(self.last_estimate, p, self.params.w())
            }
        };

        let estimate = if estimate.is_finite() {
            estimate.abs().ceil() as u64
        } else {
            0
        };
        debug!(?regime, k, p, prior = self.last_estimate, estimate, "estimated multiplicity");
        self.last_estimate = estimate;
        Ok(estimate)
    }

    /// Return fraction of set bits, recomputing it only after the bitmap changed
    #[inline]
    pub fn fill_rate(&mut self) -> f64 {
        self.density.get(&self.bitmap)
    }

    /// Return last estimate, the prior of the next bias correction
    #[inline]
    pub fn last_estimate(&self) -> u64 {
        self.last_estimate
    }

    /// Return sketch parameters
    #[inline]
    pub fn params(&self) -> Params {
        self.params
    }

    /// Iterate over positions of set bits in increasing order
    pub fn set_bits(&self) -> impl Iterator<Item = u64> + '_ {
        self.bitmap.ones().map(|idx| idx as u64)
    }

    /// Return memory size of `Sketch`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.bitmap.heap_size()
    }

    /// Number of rows whose first column bit is unset for `key`
    #[inline]
    fn empty_rows(&self, key: &[u8]) -> u64 {
        (0..self.params.m())
            .filter(|&row| !self.bitmap.get(self.coordinates.position(key, row, 0)))
            .count() as u64
    }

    /// Sum over rows of the run length of set columns for `key`.
    ///
    /// A row contributes its first unset column minus one, saturating at zero,
    /// or `w - 1` when all of its columns are set.
    #[inline]
    fn run_length_sum(&self, key: &[u8]) -> u64 {
        let w = self.params.w();
        (0..self.params.m())
            .map(|row| {
                (0..w)
                    .find(|&column| !self.bitmap.get(self.coordinates.position(key, row, column)))
                    .map_or(w - 1, |column| column.saturating_sub(1))
            })
            .sum()
    }
}

impl<H: Hasher + Default, R: RngCore> Debug for Sketch<H, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fill_rate = self
            .density
            .cached()
            .unwrap_or_else(|| Density::compute(&self.bitmap));
        write!(
            f,
            "{{ l: {}, m: {}, w: {}, fill_rate: {:.6}, last_estimate: {}, size: {} }}",
            self.params.l(),
            self.params.m(),
            self.params.w(),
            fill_rate,
            self.last_estimate,
            self.size_of()
        )
    }
}
