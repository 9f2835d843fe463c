use std::cmp::Ordering;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use arrow::datatypes::TimeUnit;
use datafusion_common::ScalarValue;
use num_traits::Zero;

use crate::accumulator::single_arg;
use crate::accumulator::unexpected;
use crate::accumulator::Accumulator;
use crate::accumulator::Counter;
use crate::accumulator::Domain;
use crate::context::FunctionContext;
use crate::error::AggregateError;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct Count {
    counter: Counter,
}

impl Count {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for Count {
    fn update(&mut self, _ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()> {
        if !single_arg("count", args)?.is_null() {
            self.counter.incr();
        }

        Ok(())
    }

    fn merge(&mut self, _ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        merge_count(&mut self.counter, partial)
    }

    fn serialize(self: Box<Self>, _ctx: &FunctionContext) -> Result<ScalarValue> {
        Ok(ScalarValue::Int64(Some(self.counter.value())))
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        self.serialize(ctx)
    }
}

/// Counts rows whatever their content is.
#[derive(Debug, Default)]
pub struct CountStar {
    counter: Counter,
}

impl CountStar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for CountStar {
    fn update(&mut self, _ctx: &FunctionContext, _args: &[ScalarValue]) -> Result<()> {
        self.counter.incr();

        Ok(())
    }

    fn merge(&mut self, _ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        merge_count(&mut self.counter, partial)
    }

    fn serialize(self: Box<Self>, _ctx: &FunctionContext) -> Result<ScalarValue> {
        Ok(ScalarValue::Int64(Some(self.counter.value())))
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        self.serialize(ctx)
    }
}

fn merge_count(counter: &mut Counter, partial: &ScalarValue) -> Result<()> {
    match partial {
        ScalarValue::Int64(v) => {
            counter.add(v.unwrap_or_default());
            Ok(())
        }
        other => Err(AggregateError::ContractViolation(format!(
            "count partial must be Int64, got {}",
            other.data_type()
        ))),
    }
}

/// Destination domain of a sum. Integer sums wrap like the native type does.
pub trait SumDomain: Domain + Zero {
    fn add_value(self, v: Self) -> Self;
}

impl SumDomain for i64 {
    fn add_value(self, v: Self) -> Self {
        self.wrapping_add(v)
    }
}

impl SumDomain for f64 {
    fn add_value(self, v: Self) -> Self {
        self + v
    }
}

/// Input domain of a sum, widened into its destination domain.
pub trait SumInput<D>: Domain {
    fn widen(self) -> D;
}

macro_rules! sum_input {
    ($ty:ty, $dst:ty) => {
        impl SumInput<$dst> for $ty {
            fn widen(self) -> $dst {
                self as $dst
            }
        }
    };
}

sum_input!(bool, i64);
sum_input!(i8, i64);
sum_input!(i16, i64);
sum_input!(i32, i64);
sum_input!(i64, i64);
sum_input!(f32, f64);
sum_input!(f64, f64);

#[derive(Debug)]
pub struct Sum<S, D> {
    sum: Option<D>,
    src: PhantomData<S>,
}

impl<S, D> Sum<S, D>
where
    S: SumInput<D>,
    D: SumDomain,
{
    pub fn new() -> Self {
        Self {
            sum: None,
            src: PhantomData,
        }
    }

    pub fn add(&mut self, v: D) {
        let sum = self.sum.get_or_insert_with(D::zero);
        *sum = sum.add_value(v);
    }

    pub fn value(&self) -> Option<D> {
        self.sum
    }
}

impl<S, D> Default for Sum<S, D>
where
    S: SumInput<D>,
    D: SumDomain,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, D> Accumulator for Sum<S, D>
where
    S: SumInput<D>,
    D: SumDomain,
{
    fn update(&mut self, _ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()> {
        if let Some(v) = S::from_scalar(single_arg("sum", args)?)? {
            self.add(v.widen());
        }

        Ok(())
    }

    fn merge(&mut self, _ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        if let Some(v) = D::from_scalar(partial)? {
            self.add(v);
        }

        Ok(())
    }

    fn serialize(self: Box<Self>, _ctx: &FunctionContext) -> Result<ScalarValue> {
        D::to_scalar(self.sum)
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        self.serialize(ctx)
    }
}

/// Min or max over a fixed-width domain. The state is replaced only when it
/// is null or the input orders strictly before (min) / after (max) it.
#[derive(Debug)]
pub struct MinMax<T> {
    value: Option<T>,
    ordering: Ordering,
}

impl<T: Domain> MinMax<T> {
    pub fn new_min() -> Self {
        Self {
            value: None,
            ordering: Ordering::Less,
        }
    }

    pub fn new_max() -> Self {
        Self {
            value: None,
            ordering: Ordering::Greater,
        }
    }

    pub fn accumulate(&mut self, v: Option<T>) {
        let Some(v) = v else {
            return;
        };
        let replace = match self.value {
            Some(cur) => v.partial_cmp(&cur) == Some(self.ordering),
            None => true,
        };
        if replace {
            self.value = Some(v);
        }
    }

    pub fn value(&self) -> Option<T> {
        self.value
    }

    fn name(&self) -> &'static str {
        if self.ordering == Ordering::Less {
            "min"
        } else {
            "max"
        }
    }
}

impl<T: Domain> Accumulator for MinMax<T> {
    fn update(&mut self, _ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()> {
        self.accumulate(T::from_scalar(single_arg(self.name(), args)?)?);

        Ok(())
    }

    fn merge(&mut self, _ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        self.accumulate(T::from_scalar(partial)?);

        Ok(())
    }

    fn serialize(self: Box<Self>, _ctx: &FunctionContext) -> Result<ScalarValue> {
        T::to_scalar(self.value)
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        self.serialize(ctx)
    }
}

/// Min or max of timestamps. Values are compared as raw ticks of the column's
/// unit and emitted in that same unit and timezone.
#[derive(Debug)]
pub struct TimestampMinMax {
    inner: MinMax<i64>,
    unit: TimeUnit,
    tz: Option<Arc<str>>,
}

impl TimestampMinMax {
    pub fn new_min(unit: TimeUnit, tz: Option<Arc<str>>) -> Self {
        Self {
            inner: MinMax::new_min(),
            unit,
            tz,
        }
    }

    pub fn new_max(unit: TimeUnit, tz: Option<Arc<str>>) -> Self {
        Self {
            inner: MinMax::new_max(),
            unit,
            tz,
        }
    }

    fn ticks(&self, v: &ScalarValue) -> Result<Option<i64>> {
        let (ticks, unit) = match v {
            ScalarValue::Null => return Ok(None),
            ScalarValue::TimestampSecond(v, _) => (*v, TimeUnit::Second),
            ScalarValue::TimestampMillisecond(v, _) => (*v, TimeUnit::Millisecond),
            ScalarValue::TimestampMicrosecond(v, _) => (*v, TimeUnit::Microsecond),
            ScalarValue::TimestampNanosecond(v, _) => (*v, TimeUnit::Nanosecond),
            other => return Err(unexpected("Timestamp", other)),
        };
        if unit != self.unit {
            return Err(AggregateError::ContractViolation(format!(
                "expected timestamp in {:?}, got {:?}",
                self.unit, unit
            )));
        }

        Ok(ticks)
    }

    fn to_scalar(&self) -> ScalarValue {
        let v = self.inner.value();
        let tz = self.tz.clone();
        match self.unit {
            TimeUnit::Second => ScalarValue::TimestampSecond(v, tz),
            TimeUnit::Millisecond => ScalarValue::TimestampMillisecond(v, tz),
            TimeUnit::Microsecond => ScalarValue::TimestampMicrosecond(v, tz),
            TimeUnit::Nanosecond => ScalarValue::TimestampNanosecond(v, tz),
        }
    }
}

impl Accumulator for TimestampMinMax {
    fn update(&mut self, _ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()> {
        let ticks = self.ticks(single_arg(self.inner.name(), args)?)?;
        self.inner.accumulate(ticks);

        Ok(())
    }

    fn merge(&mut self, _ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        let ticks = self.ticks(partial)?;
        self.inner.accumulate(ticks);

        Ok(())
    }

    fn serialize(self: Box<Self>, _ctx: &FunctionContext) -> Result<ScalarValue> {
        Ok(self.to_scalar())
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        self.serialize(ctx)
    }
}
