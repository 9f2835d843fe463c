// Probabilistic counting (Flajolet and Martin) sketch geometry.
pub const NUM_PC_BITMAPS: usize = 64;
pub const PC_BITMAP_LENGTH: usize = 32;
pub const PC_BITMAP_BYTES: usize = NUM_PC_BITMAPS * PC_BITMAP_LENGTH / 8;
/// Bias correction of the probabilistic counting estimate. Kept in single
/// precision, the estimate divides by it widened to f64.
pub const PC_THETA: f32 = 0.77351;

/// Delimiter used by group concatenation when the separator is null.
pub const DEFAULT_STRING_CONCAT_DELIM: &[u8] = b", ";
