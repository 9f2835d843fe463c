use arrow::datatypes::DataType;
use datafusion_common::ScalarValue;
use tracing::trace;

use crate::context::FunctionContext;
use crate::error::AggregateError;
use crate::error::Result;
use crate::scratch::ScratchBuffer;
use crate::sketch::DistinctBitmap;
use crate::sketch::Variant;

/// Output family of a variable-length value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BytesKind {
    Utf8,
    LargeUtf8,
    Binary,
    LargeBinary,
}

impl BytesKind {
    pub fn try_from_data_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 => Some(BytesKind::Utf8),
            DataType::LargeUtf8 => Some(BytesKind::LargeUtf8),
            DataType::Binary => Some(BytesKind::Binary),
            DataType::LargeBinary => Some(BytesKind::LargeBinary),
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            BytesKind::Utf8 => DataType::Utf8,
            BytesKind::LargeUtf8 => DataType::LargeUtf8,
            BytesKind::Binary => DataType::Binary,
            BytesKind::LargeBinary => DataType::LargeBinary,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, BytesKind::Utf8 | BytesKind::LargeUtf8)
    }

    /// Borrows the payload of a value of this kind's family, `None` when it
    /// is null. Text accumulators accept only text, binary ones only binary.
    pub fn bytes_of<'a>(&self, v: &'a ScalarValue) -> Result<Option<&'a [u8]>> {
        match v {
            ScalarValue::Null => Ok(None),
            ScalarValue::Utf8(v) | ScalarValue::LargeUtf8(v) if self.is_text() => {
                Ok(v.as_ref().map(|v| v.as_bytes()))
            }
            ScalarValue::Binary(v) | ScalarValue::LargeBinary(v) if !self.is_text() => {
                Ok(v.as_deref())
            }
            other => Err(AggregateError::ContractViolation(format!(
                "expected {} value, got {}",
                self.data_type(),
                other.data_type()
            ))),
        }
    }

    pub fn to_scalar(&self, v: Option<Vec<u8>>) -> Result<ScalarValue> {
        let to_string = |v: Vec<u8>| {
            String::from_utf8(v).map_err(|err| {
                AggregateError::Internal(format!("accumulated text is not utf-8: {err}"))
            })
        };

        Ok(match self {
            BytesKind::Utf8 => ScalarValue::Utf8(v.map(to_string).transpose()?),
            BytesKind::LargeUtf8 => ScalarValue::LargeUtf8(v.map(to_string).transpose()?),
            BytesKind::Binary => ScalarValue::Binary(v),
            BytesKind::LargeBinary => ScalarValue::LargeBinary(v),
        })
    }
}

/// Turns scratch state into an output value and releases the scratch.
///
/// The populated region is detached from the memory context and moved into
/// the output; a scratch that never held a value yields a typed null.
pub fn serialize_scratch(
    ctx: &FunctionContext,
    scratch: ScratchBuffer,
    kind: BytesKind,
) -> Result<ScalarValue> {
    let (buffer, len, populated) = scratch.into_parts();
    let bytes = match buffer {
        Some(buffer) => {
            let mut bytes = ctx.detach(buffer);
            bytes.truncate(len);
            Some(bytes)
        }
        None if populated => Some(vec![]),
        None => None,
    };

    kind.to_scalar(bytes)
}

/// Partial result of a distinct estimate: the raw bitmap bytes.
pub fn serialize_bitmap(ctx: &FunctionContext, bitmap: DistinctBitmap) -> ScalarValue {
    ScalarValue::Binary(Some(ctx.detach(bitmap.into_bytes())))
}

/// Final result of a distinct estimate.
///
/// The estimate is truncated to an integer and emitted as decimal text.
// TODO: return Int64 once consumers stop reading the estimate as a string.
pub fn finalize_bitmap(
    ctx: &FunctionContext,
    bitmap: DistinctBitmap,
    variant: Variant,
) -> ScalarValue {
    trace!("finalize distinct estimate bitmap:\n{bitmap}");
    let estimate = bitmap.estimate(variant) as i64;
    ctx.free(bitmap.into_bytes());

    ScalarValue::Utf8(Some(estimate.to_string()))
}
