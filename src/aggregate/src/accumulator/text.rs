use std::cmp::Ordering;

use common::DEFAULT_STRING_CONCAT_DELIM;
use datafusion_common::ScalarValue;

use crate::accumulator::single_arg;
use crate::accumulator::Accumulator;
use crate::context::FunctionContext;
use crate::error::AggregateError;
use crate::error::Result;
use crate::scratch::ScratchBuffer;
use crate::serialize::serialize_scratch;
use crate::serialize::BytesKind;

/// Min or max of text/binary values, ordered lexicographically by bytes.
/// The current winner lives in a scratch buffer that is overwritten on every
/// replacement.
#[derive(Debug)]
pub struct TextMinMax {
    scratch: ScratchBuffer,
    ordering: Ordering,
    kind: BytesKind,
}

impl TextMinMax {
    pub fn new_min(kind: BytesKind) -> Self {
        Self {
            scratch: ScratchBuffer::new(),
            ordering: Ordering::Less,
            kind,
        }
    }

    pub fn new_max(kind: BytesKind) -> Self {
        Self {
            scratch: ScratchBuffer::new(),
            ordering: Ordering::Greater,
            kind,
        }
    }

    fn accumulate(&mut self, ctx: &FunctionContext, v: Option<&[u8]>) -> Result<()> {
        let Some(v) = v else {
            return Ok(());
        };
        if !self.scratch.is_populated() || v.cmp(self.scratch.as_bytes()) == self.ordering {
            self.scratch.set(ctx, v)?;
        }

        Ok(())
    }
}

impl Accumulator for TextMinMax {
    fn update(&mut self, ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()> {
        let name = if self.ordering == Ordering::Less {
            "min"
        } else {
            "max"
        };
        self.accumulate(ctx, self.kind.bytes_of(single_arg(name, args)?)?)
    }

    fn merge(&mut self, ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        self.accumulate(ctx, self.kind.bytes_of(partial)?)
    }

    fn serialize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        serialize_scratch(ctx, self.scratch, self.kind)
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        self.serialize(ctx)
    }
}

/// `group_concat(value [, separator])`.
///
/// The first non-null value is stored verbatim, every following one is
/// preceded by the row's separator, or by ", " when the separator is null.
#[derive(Debug)]
pub struct GroupConcat {
    scratch: ScratchBuffer,
    kind: BytesKind,
}

impl GroupConcat {
    pub fn new(kind: BytesKind) -> Self {
        Self {
            scratch: ScratchBuffer::new(),
            kind,
        }
    }

    pub fn concat(
        &mut self,
        ctx: &FunctionContext,
        v: Option<&[u8]>,
        separator: Option<&[u8]>,
    ) -> Result<()> {
        let Some(v) = v else {
            return Ok(());
        };
        if !self.scratch.is_populated() {
            return self.scratch.set(ctx, v);
        }

        self.scratch
            .append(ctx, separator.unwrap_or(DEFAULT_STRING_CONCAT_DELIM))?;
        self.scratch.append(ctx, v)
    }
}

impl Accumulator for GroupConcat {
    fn update(&mut self, ctx: &FunctionContext, args: &[ScalarValue]) -> Result<()> {
        let (v, separator) = match args {
            [v] => (self.kind.bytes_of(v)?, None),
            [v, separator] => (self.kind.bytes_of(v)?, self.kind.bytes_of(separator)?),
            _ => {
                return Err(AggregateError::ContractViolation(format!(
                    "group_concat takes one or two arguments, got {}",
                    args.len()
                )));
            }
        };

        self.concat(ctx, v, separator)
    }

    fn merge(&mut self, ctx: &FunctionContext, partial: &ScalarValue) -> Result<()> {
        self.concat(ctx, self.kind.bytes_of(partial)?, None)
    }

    fn serialize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        serialize_scratch(ctx, self.scratch, self.kind)
    }

    fn finalize(self: Box<Self>, ctx: &FunctionContext) -> Result<ScalarValue> {
        self.serialize(ctx)
    }
}

#[cfg(test)]
mod tests {
    use datafusion_common::ScalarValue;

    use crate::accumulator::text::GroupConcat;
    use crate::accumulator::text::TextMinMax;
    use crate::accumulator::Accumulator;
    use crate::context::FunctionContext;
    use crate::error::AggregateError;
    use crate::serialize::BytesKind;

    fn utf8(v: &str) -> ScalarValue {
        ScalarValue::Utf8(Some(v.to_string()))
    }

    #[test]
    fn min_max() {
        let ctx = FunctionContext::default();
        let mut min = Box::new(TextMinMax::new_min(BytesKind::Utf8));
        let mut max = Box::new(TextMinMax::new_max(BytesKind::Utf8));
        for v in [
            utf8("pear"),
            ScalarValue::Utf8(None),
            utf8("apple"),
            utf8("zucchini"),
            utf8("apples"),
        ] {
            min.update(&ctx, &[v.clone()]).unwrap();
            max.update(&ctx, &[v]).unwrap();
        }

        assert_eq!(min.finalize(&ctx).unwrap(), utf8("apple"));
        assert_eq!(max.finalize(&ctx).unwrap(), utf8("zucchini"));
        assert_eq!(ctx.allocated(), 0);
    }

    #[test]
    fn min_bytes_order() {
        let ctx = FunctionContext::default();
        let mut min = Box::new(TextMinMax::new_min(BytesKind::Binary));
        min.update(&ctx, &[ScalarValue::Binary(Some(vec![0x80]))]).unwrap();
        min.update(&ctx, &[ScalarValue::Binary(Some(vec![0x7f, 0xff]))])
            .unwrap();
        assert_eq!(
            min.finalize(&ctx).unwrap(),
            ScalarValue::Binary(Some(vec![0x7f, 0xff]))
        );
    }

    #[test]
    fn empty_string_is_a_value() {
        let ctx = FunctionContext::default();
        let mut min = Box::new(TextMinMax::new_min(BytesKind::Utf8));
        min.update(&ctx, &[utf8("b")]).unwrap();
        min.update(&ctx, &[utf8("")]).unwrap();
        min.update(&ctx, &[utf8("a")]).unwrap();
        assert_eq!(min.finalize(&ctx).unwrap(), utf8(""));
    }

    #[test]
    fn all_null() {
        let ctx = FunctionContext::default();
        let mut max = Box::new(TextMinMax::new_max(BytesKind::LargeUtf8));
        max.update(&ctx, &[ScalarValue::LargeUtf8(None)]).unwrap();
        assert_eq!(max.finalize(&ctx).unwrap(), ScalarValue::LargeUtf8(None));
    }

    #[test]
    fn concat_with_separator() {
        let ctx = FunctionContext::default();
        let mut acc = Box::new(GroupConcat::new(BytesKind::Utf8));
        for v in ["a", "b", "c"] {
            acc.update(&ctx, &[utf8(v), utf8("|")]).unwrap();
        }
        assert_eq!(acc.finalize(&ctx).unwrap(), utf8("a|b|c"));
    }

    #[test]
    fn concat_null_separator_per_row() {
        let ctx = FunctionContext::default();
        let mut acc = Box::new(GroupConcat::new(BytesKind::Utf8));
        acc.update(&ctx, &[utf8("a"), utf8("-")]).unwrap();
        acc.update(&ctx, &[utf8("b"), ScalarValue::Utf8(None)]).unwrap();
        acc.update(&ctx, &[utf8("c"), utf8("-")]).unwrap();
        acc.update(&ctx, &[utf8("d")]).unwrap();
        assert_eq!(acc.finalize(&ctx).unwrap(), utf8("a, b-c, d"));
    }

    #[test]
    fn concat_skips_nulls() {
        let ctx = FunctionContext::default();
        let mut acc = Box::new(GroupConcat::new(BytesKind::Utf8));
        acc.update(&ctx, &[ScalarValue::Utf8(None), utf8("/")]).unwrap();
        acc.update(&ctx, &[utf8("x"), utf8("/")]).unwrap();
        acc.update(&ctx, &[ScalarValue::Utf8(None), utf8("/")]).unwrap();
        acc.update(&ctx, &[utf8("y"), utf8("/")]).unwrap();
        assert_eq!(acc.finalize(&ctx).unwrap(), utf8("x/y"));

        let acc = Box::new(GroupConcat::new(BytesKind::Utf8));
        assert_eq!(acc.finalize(&ctx).unwrap(), ScalarValue::Utf8(None));
    }

    #[test]
    fn concat_merge() {
        let ctx = FunctionContext::default();
        let mut a = Box::new(GroupConcat::new(BytesKind::Utf8));
        let mut b = Box::new(GroupConcat::new(BytesKind::Utf8));
        a.update(&ctx, &[utf8("a1"), utf8(";")]).unwrap();
        a.update(&ctx, &[utf8("a2"), utf8(";")]).unwrap();
        b.update(&ctx, &[utf8("b1"), utf8(";")]).unwrap();

        let partial = b.serialize(&ctx).unwrap();
        a.merge(&ctx, &partial).unwrap();
        a.merge(&ctx, &ScalarValue::Utf8(None)).unwrap();
        assert_eq!(a.finalize(&ctx).unwrap(), utf8("a1;a2, b1"));
        assert_eq!(ctx.allocated(), 0);
    }

    #[test]
    fn wrong_family_rejected_on_update() {
        let ctx = FunctionContext::default();
        let mut min = Box::new(TextMinMax::new_min(BytesKind::Utf8));
        assert!(matches!(
            min.update(&ctx, &[ScalarValue::Binary(Some(vec![0xff, 0xfe]))]),
            Err(AggregateError::ContractViolation(_))
        ));
        min.update(&ctx, &[utf8("ok")]).unwrap();
        assert_eq!(min.finalize(&ctx).unwrap(), utf8("ok"));

        let mut acc = Box::new(GroupConcat::new(BytesKind::Binary));
        assert!(matches!(
            acc.update(&ctx, &[utf8("a")]),
            Err(AggregateError::ContractViolation(_))
        ));
        assert!(matches!(
            acc.update(&ctx, &[ScalarValue::Binary(Some(vec![1])), utf8(",")]),
            Err(AggregateError::ContractViolation(_))
        ));
        assert!(matches!(
            acc.merge(&ctx, &utf8("a")),
            Err(AggregateError::ContractViolation(_))
        ));
    }

    #[test]
    fn concat_arity() {
        let ctx = FunctionContext::default();
        let mut acc = Box::new(GroupConcat::new(BytesKind::Utf8));
        assert!(matches!(
            acc.update(&ctx, &[]),
            Err(AggregateError::ContractViolation(_))
        ));
    }
}
