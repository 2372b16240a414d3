//! ## Row/column sampler
//! Chooses the single `(row, column)` coordinate an insertion sets.
//!
//! - Row is uniform over `[0, m)`.
//! - Column is geometric over `[0, w]`: the index of the lowest set bit of a
//!   uniform random `u64`, so `P(j) = 2^-(j+1)` for `j < w`, with the residual
//!   mass collapsed onto `j = w`.
//!
//! Only insertion samples. Estimation re-derives coordinates by hashing and
//! never touches the random source.
use rand::{Rng, RngCore};

use crate::error::{Result, SketchError};

/// Width of the random word backing the geometric draw
pub const MAX_COLUMN_DEPTH: u32 = u64::BITS;

/// Random coordinate source owned by a sketch
#[derive(Debug, Clone)]
pub(crate) struct Sampler<R: RngCore> {
    rng: R,
}

impl<R: RngCore> Sampler<R> {
    pub(crate) fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw uniform row index in `[0, m)`
    #[inline]
    pub(crate) fn row(&mut self, m: u64) -> u64 {
        self.rng.gen_range(0..m)
    }

    /// Draw geometric column index in `[0, w]`
    #[inline]
    pub(crate) fn column(&mut self, w: u64) -> Result<u64> {
        check_depth(w)?;
        Ok(u64::from(self.rng.next_u64().trailing_zeros()).min(w))
    }

    /// Draw `(row, column)` pair. Fails before drawing anything if `w` is out of range.
    #[inline]
    pub(crate) fn coordinate(&mut self, m: u64, w: u64) -> Result<(u64, u64)> {
        check_depth(w)?;
        let row = self.row(m);
        let column = self.column(w)?;
        Ok((row, column))
    }
}

/// Fail if `w` needs more random bits than one `u64` provides
#[inline]
fn check_depth(w: u64) -> Result<()> {
    if w > u64::from(MAX_COLUMN_DEPTH) {
        return Err(SketchError::SamplerRange {
            w,
            max: MAX_COLUMN_DEPTH,
        });
    }
    Ok(())
}
