use datafusion_common::ScalarValue;
use tracing::trace;

use crate::accumulator::single_arg;
use crate::accumulator::Accumulator;
use crate::context::FunctionContext;
use crate::error::AggregateError;
use crate::error::Result;
use crate::serialize::finalize_bitmap;
use crate::serialize::serialize_bitmap;
use crate::sketch::DistinctBitmap;
use crate::sketch::HashKey;
use crate::sketch::Variant;

/// Approximate count of distinct non-null values.
#[derive(Debug)]
pub struct DistinctEstimate {
    bitmap: DistinctBitmap,
    variant: Variant,
}

impl DistinctEstimate {
    pub fn try_new(ctx: &FunctionContext, variant: Variant) -> Result<Self> {
        Ok(Self {
            bitmap: DistinctBitmap::try_new(ctx)?,
            variant,
        })
    }

    pub fn bitmap(&self) -> &DistinctBitmap {
        &self.bitmap
    }
}

impl Accumulator for DistinctEstimate {
    fn update(&mut self, _ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()> {
        if let Some(key) = HashKey::try_from_scalar(single_arg("distinct estimate", args)?)? {
            self.bitmap.update(self.variant, &key);
        }

        Ok(())
    }

    fn merge(&mut self, _ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        match partial {
            ScalarValue::Binary(Some(bytes)) => self.bitmap.merge_bytes(bytes)?,
            other => {
                return Err(AggregateError::ContractViolation(format!(
                    "distinct estimate partial must be a non-null binary bitmap, got {other:?}"
                )));
            }
        }
        trace!("merged distinct estimate bitmap:\n{}", self.bitmap);

        Ok(())
    }

    fn serialize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        Ok(serialize_bitmap(ctx, self.bitmap))
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        Ok(finalize_bitmap(ctx, self.bitmap, self.variant))
    }
}
