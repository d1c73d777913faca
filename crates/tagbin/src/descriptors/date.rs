//! Timestamps and regular expressions.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

/// A [`Value::Date`] written as a signed 8-byte millisecond timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateDescriptor;

impl Descriptor for DateDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("date")
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(Value::Date(cursor.read_i64()?))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        match value {
            Value::Date(ms) => cursor.write_i64(*ms),
            other => Err(CodecError::unsupported(other)),
        }
    }

    fn size_raw(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
        Ok(8)
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        match value {
            Value::Date(_) => None,
            _ => Some(self.problem("Expected a date")),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Date(0))
    }

    fn adapt(&self, value: Value) -> Value {
        match value {
            Value::Number(n) if n.is_finite() => Value::Date(n as i64),
            other => other,
        }
    }
}

/// A [`Value::RegExp`] whose source text is written self-describing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegExpDescriptor;

impl RegExpDescriptor {
    fn source(value: &Value) -> CodecResult<Value> {
        match value {
            Value::RegExp(source) => Ok(Value::String(source.clone())),
            other => Err(CodecError::unsupported(other)),
        }
    }
}

impl Descriptor for RegExpDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("regexp")
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        match cx.any().read(cx, cursor)? {
            Value::String(source) => Ok(Value::RegExp(source)),
            other => Err(CodecError::unsupported(format_args!("{other} as regexp source"))),
        }
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        cx.any().write_raw(cx, cursor, &Self::source(value)?)
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        cx.any().size_raw(cx, &Self::source(value)?)
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        match value {
            Value::RegExp(source) => {
                cx.any().find_problem(cx, &Value::String(source.clone())).map(|problem| problem.owned_by(self.name()))
            }
            _ => Some(self.problem("Expected a regular expression")),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::RegExp("(?:)".to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::DescriptorExt;
    use crate::registry::Builtin;

    #[test]
    fn date_is_little_endian_millis() {
        let cx = Codec::default();
        let value = Value::Date(-2);
        let bytes = DateDescriptor.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(DateDescriptor.deserialize(&cx, &bytes).unwrap(), value);
        assert!(DateDescriptor.validate(&cx, &Value::from(5)).is_err());
    }

    #[test]
    fn regexp_source_is_tagged_text() {
        let cx = Codec::default();
        let value = Value::RegExp("a+b".to_owned());
        let bytes = RegExpDescriptor.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [Builtin::String8.tag(), 3, b'a', b'+', b'b']);
        assert_eq!(RegExpDescriptor.deserialize(&cx, &bytes).unwrap(), value);
    }
}
