pub mod config;
pub mod defaults;
pub mod error;

pub use defaults::DEFAULT_STRING_CONCAT_DELIM;
pub use defaults::NUM_PC_BITMAPS;
pub use defaults::PC_BITMAP_BYTES;
pub use defaults::PC_BITMAP_LENGTH;
pub use defaults::PC_THETA;
