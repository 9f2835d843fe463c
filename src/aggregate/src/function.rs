use std::fmt;
use std::str::FromStr;

use arrow::datatypes::DataType;
use tracing::debug;

use crate::accumulator::distinct::DistinctEstimate;
use crate::accumulator::scalar::Count;
use crate::accumulator::scalar::CountStar;
use crate::accumulator::scalar::MinMax;
use crate::accumulator::scalar::Sum;
use crate::accumulator::scalar::TimestampMinMax;
use crate::accumulator::text::GroupConcat;
use crate::accumulator::text::TextMinMax;
use crate::accumulator::Accumulator;
use crate::context::FunctionContext;
use crate::error::AggregateError;
use crate::error::Result;
use crate::serialize::BytesKind;
use crate::sketch::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    CountStar,
    Sum,
    Min,
    Max,
    GroupConcat,
    DistinctPc,
    DistinctPcsa,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::CountStar => "count_star",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::GroupConcat => "group_concat",
            AggregateFunction::DistinctPc => "distinctpc",
            AggregateFunction::DistinctPcsa => "distinctpcsa",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AggregateFunction {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "count" => AggregateFunction::Count,
            "count_star" => AggregateFunction::CountStar,
            "sum" => AggregateFunction::Sum,
            "min" => AggregateFunction::Min,
            "max" => AggregateFunction::Max,
            "group_concat" => AggregateFunction::GroupConcat,
            "distinctpc" => AggregateFunction::DistinctPc,
            "distinctpcsa" => AggregateFunction::DistinctPcsa,
            _ => {
                return Err(AggregateError::Unsupported(format!(
                    "unknown aggregate function {s}"
                )));
            }
        })
    }
}

fn unsupported(func: AggregateFunction, data_type: &DataType) -> AggregateError {
    AggregateError::Unsupported(format!("{func} is not defined for {data_type}"))
}

fn is_fixed_width(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
            | DataType::Timestamp(_, _)
    )
}

/// Type of the final value of `func` applied to `data_type`.
pub fn return_type(func: AggregateFunction, data_type: &DataType) -> Result<DataType> {
    let ret = match func {
        AggregateFunction::Count | AggregateFunction::CountStar => DataType::Int64,
        AggregateFunction::Sum => match data_type {
            DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64 => DataType::Int64,
            DataType::Float32 | DataType::Float64 => DataType::Float64,
            _ => return Err(unsupported(func, data_type)),
        },
        AggregateFunction::Min | AggregateFunction::Max => match data_type {
            dt if is_fixed_width(dt) => dt.to_owned(),
            dt => match BytesKind::try_from_data_type(dt) {
                Some(kind) => kind.data_type(),
                None => return Err(unsupported(func, data_type)),
            },
        },
        AggregateFunction::GroupConcat => match BytesKind::try_from_data_type(data_type) {
            Some(kind) => kind.data_type(),
            None => return Err(unsupported(func, data_type)),
        },
        AggregateFunction::DistinctPc | AggregateFunction::DistinctPcsa => {
            if !is_fixed_width(data_type) && BytesKind::try_from_data_type(data_type).is_none() {
                return Err(unsupported(func, data_type));
            }
            DataType::Utf8
        }
    };

    Ok(ret)
}

/// Type of the partial value [`Accumulator::serialize`] emits for `func`.
pub fn state_type(func: AggregateFunction, data_type: &DataType) -> Result<DataType> {
    let ret = return_type(func, data_type)?;
    Ok(match func {
        AggregateFunction::DistinctPc | AggregateFunction::DistinctPcsa => DataType::Binary,
        _ => ret,
    })
}

macro_rules! sum {
    ($src:ty,$dst:ty) => {
        Box::new(Sum::<$src, $dst>::new()) as Box<dyn Accumulator>
    };
}

macro_rules! min_max {
    ($ty:ty,$func:expr) => {
        match $func {
            AggregateFunction::Min => Box::new(MinMax::<$ty>::new_min()) as Box<dyn Accumulator>,
            _ => Box::new(MinMax::<$ty>::new_max()) as Box<dyn Accumulator>,
        }
    };
}

/// Creates the accumulator of one group for `func` over values of
/// `data_type`.
pub fn create_accumulator(
    ctx: &FunctionContext,
    func: AggregateFunction,
    data_type: &DataType,
) -> Result<Box<dyn Accumulator>> {
    // rejects unsupported pairs before anything is allocated
    return_type(func, data_type)?;
    debug!("creating {func} accumulator for {data_type}");

    let acc = match func {
        AggregateFunction::Count => Box::new(Count::new()) as Box<dyn Accumulator>,
        AggregateFunction::CountStar => Box::new(CountStar::new()) as Box<dyn Accumulator>,
        AggregateFunction::Sum => match data_type {
            DataType::Boolean => sum!(bool, i64),
            DataType::Int8 => sum!(i8, i64),
            DataType::Int16 => sum!(i16, i64),
            DataType::Int32 => sum!(i32, i64),
            DataType::Int64 => sum!(i64, i64),
            DataType::Float32 => sum!(f32, f64),
            DataType::Float64 => sum!(f64, f64),
            _ => return Err(unsupported(func, data_type)),
        },
        AggregateFunction::Min | AggregateFunction::Max => match data_type {
            DataType::Boolean => min_max!(bool, func),
            DataType::Int8 => min_max!(i8, func),
            DataType::Int16 => min_max!(i16, func),
            DataType::Int32 => min_max!(i32, func),
            DataType::Int64 => min_max!(i64, func),
            DataType::Float32 => min_max!(f32, func),
            DataType::Float64 => min_max!(f64, func),
            DataType::Timestamp(unit, tz) => match func {
                AggregateFunction::Min => {
                    Box::new(TimestampMinMax::new_min(*unit, tz.clone())) as Box<dyn Accumulator>
                }
                _ => Box::new(TimestampMinMax::new_max(*unit, tz.clone())) as Box<dyn Accumulator>,
            },
            dt => {
                let kind =
                    BytesKind::try_from_data_type(dt).ok_or_else(|| unsupported(func, dt))?;
                match func {
                    AggregateFunction::Min => {
                        Box::new(TextMinMax::new_min(kind)) as Box<dyn Accumulator>
                    }
                    _ => Box::new(TextMinMax::new_max(kind)) as Box<dyn Accumulator>,
                }
            }
        },
        AggregateFunction::GroupConcat => {
            let kind = BytesKind::try_from_data_type(data_type)
                .ok_or_else(|| unsupported(func, data_type))?;
            Box::new(GroupConcat::new(kind)) as Box<dyn Accumulator>
        }
        AggregateFunction::DistinctPc => {
            Box::new(DistinctEstimate::try_new(ctx, Variant::Plain)?) as Box<dyn Accumulator>
        }
        AggregateFunction::DistinctPcsa => Box::new(DistinctEstimate::try_new(
            ctx,
            Variant::StochasticAveraging,
        )?) as Box<dyn Accumulator>,
    };

    Ok(acc)
}
