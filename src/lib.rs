//! `multiplicity-estimator` is a Rust crate designed to estimate how many times each key occurs in a stream.
//!
//! This library uses probabilistic multiplicity counting: all keys share one fixed-size bitmap, so memory
//! does not depend on the number of distinct keys and grows only logarithmically with their counts.
//!
//! ```
//! use multiplicity_estimator::Sketch;
//!
//! let mut sketch = Sketch::new(1 << 20, 64, 32).unwrap();
//! for _ in 0..40 {
//!     sketch.count("flow-1").unwrap();
//! }
//! let estimate = sketch.estimate("flow-1").unwrap();
//! assert!(estimate > 0);
//! ```
mod bitmap;
mod coordinate;
pub mod error;
pub mod params;
pub mod phi;
mod sampler;
pub mod sketch;

pub use error::{Result, SketchError};
pub use params::Params;
pub use sampler::MAX_COLUMN_DEPTH;
pub use sketch::Sketch;
