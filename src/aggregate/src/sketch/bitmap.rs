use std::fmt;

use common::NUM_PC_BITMAPS;
use common::PC_BITMAP_BYTES;
use common::PC_BITMAP_LENGTH;
use common::PC_THETA;

use crate::context::FunctionContext;
use crate::error::AggregateError;
use crate::error::Result;
use crate::sketch::hash::HashKey;
use crate::sketch::Variant;

const ROW_BYTES: usize = PC_BITMAP_LENGTH / 8;

/// Probabilistic counting bitmap matrix (Flajolet and Martin).
///
/// `NUM_PC_BITMAPS` rows of `PC_BITMAP_LENGTH` bits in one contiguous region
/// allocated from the fragment's memory context. Row `r` is the little-endian
/// 32-bit word at bytes `4r..4r + 4`, so column `c` is bit `c % 8` of byte
/// `4r + c / 8`.
#[derive(Debug, PartialEq, Eq)]
pub struct DistinctBitmap {
    bits: Vec<u8>,
}

impl DistinctBitmap {
    pub fn try_new(ctx: &FunctionContext) -> Result<Self> {
        Ok(Self {
            bits: ctx.allocate(PC_BITMAP_BYTES)?,
        })
    }

    pub fn set(&mut self, row: usize, col: usize) {
        self.bits[row * ROW_BYTES + col / 8] |= 1 << (col % 8);
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.bits[row * ROW_BYTES + col / 8] & (1 << (col % 8)) != 0
    }

    pub fn update(&mut self, variant: Variant, key: &HashKey) {
        match variant {
            Variant::Plain => self.update_pc(key),
            Variant::StochasticAveraging => self.update_pcsa(key),
        }
    }

    /// Hashes the value once per row with the row index as seed and sets the
    /// bit at the hash's trailing-zero count in every row.
    pub fn update_pc(&mut self, key: &HashKey) {
        for row in 0..NUM_PC_BITMAPS {
            let hash = key.hash_seeded(row);
            self.set(row, column(hash));
        }
    }

    /// Hashes the value once: the low bits pick the row, the trailing-zero
    /// count of the remaining bits picks the column.
    pub fn update_pcsa(&mut self, key: &HashKey) {
        self.set_pcsa(key.hash_seeded(0));
    }

    fn set_pcsa(&mut self, hash: u32) {
        let row = hash as usize % NUM_PC_BITMAPS;
        self.set(row, column(hash / NUM_PC_BITMAPS as u32));
    }

    pub fn merge(&mut self, other: &DistinctBitmap) {
        self.or(&other.bits);
    }

    /// ORs a serialized bitmap into this one.
    pub fn merge_bytes(&mut self, src: &[u8]) -> Result<()> {
        if src.len() != PC_BITMAP_BYTES {
            return Err(AggregateError::ContractViolation(format!(
                "distinct estimate bitmap must be {PC_BITMAP_BYTES} bytes, got {}",
                src.len()
            )));
        }
        self.or(src);

        Ok(())
    }

    fn or(&mut self, src: &[u8]) {
        for (dst, src) in self.bits.iter_mut().zip(src) {
            *dst |= *src;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|b| *b == 0)
    }

    /// Number of consecutive set bits of `row` starting at column 0.
    pub fn leading_run(&self, row: usize) -> usize {
        (0..PC_BITMAP_LENGTH)
            .take_while(|col| self.get(row, *col))
            .count()
    }

    /// Distinct count estimate; exactly 0 when no bit is set.
    pub fn estimate(&self, variant: Variant) -> f64 {
        if self.is_empty() {
            return 0.;
        }

        let sum: usize = (0..NUM_PC_BITMAPS).map(|row| self.leading_run(row)).sum();
        let avg = sum as f64 / NUM_PC_BITMAPS as f64;
        let estimate = 2f64.powf(avg) / PC_THETA as f64;
        match variant {
            Variant::Plain => estimate,
            // each observation lands in a single row
            Variant::StochasticAveraging => estimate * NUM_PC_BITMAPS as f64,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bits
    }
}

/// Column of a hash value: its trailing-zero count, the last column for zero.
fn column(hash: u32) -> usize {
    if hash == 0 {
        PC_BITMAP_LENGTH - 1
    } else {
        hash.trailing_zeros() as usize
    }
}

impl fmt::Display for DistinctBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..NUM_PC_BITMAPS {
            for col in 0..PC_BITMAP_LENGTH {
                write!(f, "{}", self.get(row, col) as u8)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
