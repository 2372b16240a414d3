use std::result::Result as StdResult;

use thiserror::Error;

/// Errors returned by [`Sketch`](crate::Sketch) operations.
///
/// None of them leave the sketch in a partially updated state: a failed
/// `count` sets no bit and a failed `estimate` keeps the previous estimate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Construction parameters are out of range.
    #[error("invalid sketch parameter: {0}")]
    InvalidParameter(String),
    /// Column depth `w` is wider than the random word used by the geometric sampler.
    #[error("column depth w = {w} exceeds the sampler word width of {max} bits")]
    SamplerRange { w: u64, max: u32 },
    /// Large multiplicity regime was reached before any estimate could act as the
    /// bias correction prior.
    #[error("no prior estimate available for bias correction")]
    UninitializedEstimate,
    /// Every bit of the bitmap is set and the estimators are undefined.
    #[error("bitmap is saturated, rebuild the sketch with a larger l")]
    SaturatedBitmap,
}

pub type Result<T> = StdResult<T, SketchError>;
