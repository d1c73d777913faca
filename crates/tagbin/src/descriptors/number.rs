//! Plain numbers written at their narrowest classified width.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

/// Any [`Value::Number`], optionally bounded, written as `[tag][payload]`
/// where the tag names the narrowest fitting built-in.
///
/// Small integers take two bytes, zero and the non-finite values take one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumberDescriptor {
    min: Option<f64>,
    max: Option<f64>,
}

impl NumberDescriptor {
    /// An unbounded number.
    #[must_use]
    pub const fn new() -> Self {
        Self { min: None, max: None }
    }

    /// Rejects numbers below `min`.
    #[must_use]
    pub const fn min(self, min: f64) -> Self {
        Self { min: Some(min), ..self }
    }

    /// Rejects numbers above `max`.
    #[must_use]
    pub const fn max(self, max: f64) -> Self {
        Self { max: Some(max), ..self }
    }

    fn in_range(&self, n: f64) -> bool {
        self.min.map_or(true, |min| n >= min) && self.max.map_or(true, |max| n <= max)
    }
}

impl Descriptor for NumberDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("number")
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        match cx.any().read(cx, cursor)? {
            value @ Value::Number(_) => Ok(value),
            other => Err(CodecError::unsupported(format_args!("{other} as number"))),
        }
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        cx.any().write_raw(cx, cursor, value)
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        cx.any().size_raw(cx, value)
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        let Value::Number(n) = value else {
            return Some(self.problem("Expected a number"));
        };
        if n.is_nan() && (self.min.is_some() || self.max.is_some()) {
            return Some(self.problem("Expected a number"));
        }
        if self.in_range(*n) {
            return None;
        }
        let min = self.min.map_or_else(|| "-inf".to_owned(), |m| m.to_string());
        let max = self.max.map_or_else(|| "+inf".to_owned(), |m| m.to_string());
        Some(self.problem(format!("Expected a number between {min} and {max}")))
    }

    fn sample(&self) -> CodecResult<Value> {
        let n = match (self.min, self.max) {
            (Some(min), _) if min > 0.0 => min,
            (_, Some(max)) if max < 0.0 => max,
            _ => 0.0,
        };
        Ok(Value::Number(n))
    }

    fn adapt(&self, value: Value) -> Value {
        let n = match value {
            Value::Number(n) => n,
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            other => return other,
        };
        let n = self.min.map_or(n, |min| n.max(min));
        Value::Number(self.max.map_or(n, |max| n.min(max)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::DescriptorExt;
    use crate::registry::Builtin;

    #[test]
    fn narrowest_tag_is_used() {
        let cx = Codec::default();
        let d = NumberDescriptor::new();
        assert_eq!(d.serialize(&cx, &Value::from(0)).unwrap(), [Builtin::Zero.tag()]);
        assert_eq!(d.serialize(&cx, &Value::from(7)).unwrap(), [Builtin::U8.tag(), 7]);
        assert_eq!(d.serialize(&cx, &Value::from(-1)).unwrap(), [Builtin::I8.tag(), 0xFF]);
        assert_eq!(d.get_size(&cx, &Value::from(0.5)).unwrap(), 9);
        for n in [0.0, 1.0, -300.0, 1e12, 0.1, f64::INFINITY] {
            let bytes = d.serialize(&cx, &Value::Number(n)).unwrap();
            assert_eq!(d.deserialize(&cx, &bytes).unwrap(), Value::Number(n));
        }
    }

    #[test]
    fn bounds() {
        let cx = Codec::default();
        let d = NumberDescriptor::new().min(1.0).max(10.0);
        assert!(d.validate(&cx, &Value::from(5)).is_ok());
        let problem = d.find_problem(&cx, &Value::from(11)).unwrap();
        assert_eq!(problem.message(), "Expected a number between 1 and 10");
        assert_eq!(d.find_problem(&cx, &Value::from("5")).unwrap().message(), "Expected a number");
        assert_eq!(d.sample().unwrap(), Value::from(1));
        assert_eq!(d.adapt(Value::from(42)), Value::from(10));
    }

    #[test]
    fn non_numbers_in_the_stream_are_rejected() {
        let cx = Codec::default();
        let d = NumberDescriptor::new();
        assert!(d.deserialize(&cx, &[Builtin::Null.tag()]).is_err());
    }
}
