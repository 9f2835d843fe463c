pub use accumulator::Accumulator;
pub use context::FunctionContext;
pub use error::Result;
pub use function::create_accumulator;
pub use function::AggregateFunction;

pub mod accumulator;
pub mod context;
pub mod error;
pub mod function;
pub mod scratch;
pub mod serialize;
pub mod sketch;
