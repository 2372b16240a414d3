//! Sketch configuration.
//!
//! - `l`: number of bits in the shared bitmap, in `[1..min(2^w, 2^32)]`.
//! - `m`: number of rows an insertion is spread over, at least 1.
//! - `w`: maximum column depth of the geometric sampler, at least 1.
//!
//! With the `with_serde` feature `Params` can be loaded from any serde format.
//! Deserialized values go through the same validation as [`Params::new`].
#[cfg(feature = "with_serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SketchError};

/// Upper bound on `l` so that hash-derived positions fit in 32 bits.
pub const MAX_BITMAP_LEN: u64 = 1 << 32;

/// Validated `(l, m, w)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with_serde", serde(try_from = "RawParams"))]
pub struct Params {
    l: u64,
    m: u64,
    w: u64,
}

impl Params {
    /// Validate and create a new parameter set.
    pub fn new(l: u64, m: u64, w: u64) -> Result<Self> {
        if l == 0 || m == 0 || w == 0 {
            return Err(SketchError::InvalidParameter(format!(
                "l, m and w must all be positive (l = {l}, m = {m}, w = {w})"
            )));
        }
        if l > MAX_BITMAP_LEN {
            return Err(SketchError::InvalidParameter(format!("l = {l} exceeds 2^32")));
        }
        if usize::try_from(l).is_err() {
            return Err(SketchError::InvalidParameter(format!(
                "l = {l} does not fit in the address space"
            )));
        }
        // for w >= 64 the 2^w bound is implied by the 2^32 one
        if w < 64 && l > 1 << w {
            return Err(SketchError::InvalidParameter(format!("l = {l} exceeds 2^w = 2^{w}")));
        }
        Ok(Self { l, m, w })
    }

    /// Bitmap length in bits
    #[inline]
    pub fn l(&self) -> u64 {
        self.l
    }

    /// Bitmap length as an index bound, checked to fit `usize` on construction
    #[inline]
    pub(crate) fn bitmap_len(&self) -> usize {
        self.l as usize
    }

    /// Number of rows
    #[inline]
    pub fn m(&self) -> u64 {
        self.m
    }

    /// Maximum column depth
    #[inline]
    pub fn w(&self) -> u64 {
        self.w
    }
}

#[cfg(feature = "with_serde")]
#[derive(Deserialize)]
struct RawParams {
    l: u64,
    m: u64,
    w: u64,
}

#[cfg(feature = "with_serde")]
impl TryFrom<RawParams> for Params {
    type Error = SketchError;

    fn try_from(raw: RawParams) -> Result<Self> {
        Params::new(raw.l, raw.m, raw.w)
    }
}
