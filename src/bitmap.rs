//! ## Bitmap
//! Fixed-length bit vector shared by every key of a sketch.
//!
//! Bits are packed into `u64` words, least significant bit first, and the
//! allocation is sized once at construction.
//!
//! The bitmap only ever grows: there is no way to clear a bit.
use bitvec::boxed::BitBox;
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;

/// Owned fixed-length bit vector
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Bitmap {
    bits: BitBox<u64, Lsb0>,
}

impl Bitmap {
    /// Create bitmap of `len` bits, all unset
    pub(crate) fn new(len: usize) -> Self {
        Self {
            bits: BitVec::<u64, Lsb0>::repeat(false, len).into_boxed_bitslice(),
        }
    }

    /// Number of addressable bits
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bits.len()
    }

    /// Return whether bit `idx` is set
    #[inline]
    pub(crate) fn get(&self, idx: usize) -> bool {
        self.bits[idx]
    }

    /// Set bit `idx`, returning `true` if it transitioned from 0 to 1
    #[inline]
    pub(crate) fn set(&mut self, idx: usize) -> bool {
        !self.bits.replace(idx, true)
    }

    /// Number of set bits
    #[inline]
    pub(crate) fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Iterate over indices of set bits in increasing order
    pub(crate) fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Heap memory used by the packed words
    #[inline]
    pub(crate) fn heap_size(&self) -> usize {
        std::mem::size_of_val(self.bits.as_raw_slice())
    }
}

/// Lazily recomputed fraction of set bits.
///
/// The cached value is valid iff the cache is not dirty. `invalidate` must be
/// called on every 0 -> 1 transition of the bitmap it describes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Density {
    value: f64,
    dirty: bool,
}

impl Density {
    /// Create a dirty cache, forcing computation on first read
    pub(crate) fn new() -> Self {
        Self {
            value: 0.0,
            dirty: true,
        }
    }

    /// Mark cached value as stale
    #[inline]
    pub(crate) fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Return cached density of `bitmap`, recounting set bits if stale
    #[inline]
    pub(crate) fn get(&mut self, bitmap: &Bitmap) -> f64 {
        if self.dirty {
            self.value = Self::compute(bitmap);
            self.dirty = false;
        }
        self.value
    }

    /// Return cached density if valid, without recomputing
    #[inline]
    pub(crate) fn cached(&self) -> Option<f64> {
        (!self.dirty).then_some(self.value)
    }

    /// Fraction of set bits in `bitmap`
    #[inline]
    pub(crate) fn compute(bitmap: &Bitmap) -> f64 {
        bitmap.count_ones() as f64 / bitmap.len() as f64
    }
}
