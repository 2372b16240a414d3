//! ## Coordinate hashing
//! Maps `(key, row, column)` to a bit position in `[0, l)`.
//!
//! Row and column are written into the hasher as fixed-width salts ahead of
//! the key bytes, so distinct triples never feed the same byte stream.
//! Insertion and estimation share this mapping, which makes estimation able to
//! re-derive every coordinate an insertion could have chosen.
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hasher};

/// Hash-based bit addressing for a bitmap of `l` bits
pub(crate) struct CoordinateHasher<H: Hasher + Default> {
    /// Bitmap length
    l: u64,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
}

impl<H: Hasher + Default> CoordinateHasher<H> {
    pub(crate) fn new(l: u64) -> Self {
        Self {
            l,
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Return bit position addressed by `key` at `(row, column)`
    #[inline]
    pub(crate) fn position(&self, key: &[u8], row: u64, column: u64) -> usize {
        let mut hasher = self.build_hasher.build_hasher();
        hasher.write_u64(row);
        hasher.write_u64(column);
        hasher.write(key);
        // `l <= 2^32` keeps the result within `usize` on 64-bit targets
        (hasher.finish() % self.l) as usize
    }
}

impl<H: Hasher + Default> Clone for CoordinateHasher<H> {
    fn clone(&self) -> Self {
        Self::new(self.l)
    }
}

impl<H: Hasher + Default> Debug for CoordinateHasher<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateHasher").field("l", &self.l).finish()
    }
}
