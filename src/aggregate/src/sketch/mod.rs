//! Distinct value estimation with probabilistic counting (Flajolet and
//! Martin, "Probabilistic Counting Algorithms for Data Base Applications").
//!
//! Four phases per group: allocate a zeroed bitmap, set bits per row, OR the
//! bitmaps of all partitions together, turn the bitmap into an estimate.

pub mod bitmap;
pub mod hash;

pub use bitmap::DistinctBitmap;
pub use hash::HashKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Every value updates every row, each row with its own hash seed.
    Plain,
    /// Every value updates a single row picked by its hash (PCSA).
    StochasticAveraging,
}
