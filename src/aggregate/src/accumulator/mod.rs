use std::fmt::Debug;

use datafusion_common::ScalarValue;

use crate::context::FunctionContext;
use crate::error::AggregateError;
use crate::error::Result;

pub mod distinct;
pub mod scalar;
pub mod text;

/// Per-group running state of an aggregate function.
///
/// The grouping engine creates one accumulator per group, feeds it every row
/// routed to the group, merges partial results of other partitions into it
/// and finally consumes it with either [`Accumulator::serialize`] (partial
/// result for another node) or [`Accumulator::finalize`] (query result).
/// Both terminal calls release any memory the accumulator holds in the
/// [`FunctionContext`].
pub trait Accumulator: Debug + Send {
    fn update(&mut self, ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()>;
    fn merge(&mut self, ctx: &FunctionContext, partial: &ScalarValue) -> Result<()>;
    fn serialize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue>;
    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue>;
}

/// Fixed-width value domain an accumulator can hold inline.
pub trait Domain: Copy + PartialOrd + Debug + Send + 'static {
    /// Extracts the value, `None` for null.
    fn from_scalar(v: &ScalarValue) -> Result<Option<Self>>;
    fn to_scalar(v: Option<Self>) -> Result<ScalarValue>;
}

macro_rules! domain {
    ($ty:ty, $variant:ident) => {
        impl Domain for $ty {
            fn from_scalar(v: &ScalarValue) -> Result<Option<Self>> {
                match v {
                    ScalarValue::$variant(v) => Ok(*v),
                    ScalarValue::Null => Ok(None),
                    other => Err(unexpected(stringify!($variant), other)),
                }
            }

            fn to_scalar(v: Option<Self>) -> Result<ScalarValue> {
                Ok(ScalarValue::$variant(v))
            }
        }
    };
}

domain!(bool, Boolean);
domain!(i8, Int8);
domain!(i16, Int16);
domain!(i32, Int32);
domain!(i64, Int64);
domain!(f32, Float32);
domain!(f64, Float64);

/// Row counter. Starts at zero and can't be null, so counting never has to
/// check whether the state was initialised.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counter(i64);

impl Counter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn incr(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn add(&mut self, n: i64) {
        self.0 = self.0.wrapping_add(n);
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

pub(crate) fn single_arg<'a>(name: &str, args: &'a [ScalarValue]) -> Result<&'a ScalarValue> {
    match args {
        [arg] => Ok(arg),
        _ => Err(AggregateError::ContractViolation(format!(
            "{name} takes one argument, got {}",
            args.len()
        ))),
    }
}

fn unexpected(expected: &str, got: &ScalarValue) -> AggregateError {
    AggregateError::ContractViolation(format!(
        "expected {expected} value, got {}",
        got.data_type()
    ))
}

#[cfg(test)]
mod tests {
    use datafusion_common::ScalarValue;

    use crate::accumulator::single_arg;
    use crate::accumulator::Counter;
    use crate::accumulator::Domain;
    use crate::error::AggregateError;

    #[test]
    fn scalar_domains() {
        assert_eq!(i8::from_scalar(&ScalarValue::Int8(Some(4))).unwrap(), Some(4));
        assert_eq!(f64::from_scalar(&ScalarValue::Float64(None)).unwrap(), None);
        assert_eq!(bool::from_scalar(&ScalarValue::Null).unwrap(), None);
        assert!(matches!(
            i32::from_scalar(&ScalarValue::Int64(Some(1))),
            Err(AggregateError::ContractViolation(_))
        ));
        assert_eq!(
            i16::to_scalar(Some(-2)).unwrap(),
            ScalarValue::Int16(Some(-2))
        );
    }

    #[test]
    fn counter() {
        let mut c = Counter::new();
        c.incr();
        c.add(4);
        assert_eq!(c.value(), 5);
    }

    #[test]
    fn args() {
        let args = vec![ScalarValue::Int8(Some(1))];
        assert!(single_arg("f", &args).is_ok());
        assert!(single_arg("f", &[]).is_err());
    }
}
