//! Zero-width constants, booleans and the ignore descriptor.

use std::borrow::Cow;

use malachite::Integer;

use crate::codec::Codec;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

/// A zero-width descriptor that accepts exactly one value.
///
/// Nothing is written; reading yields the constant. NaN constants accept NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDescriptor {
    name: String,
    value: Value,
}

impl ConstantDescriptor {
    /// Creates a constant with an explicit diagnostic name.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self { name: name.into(), value }
    }

    /// Creates a constant named after its rendered value.
    #[must_use]
    pub fn of(value: Value) -> Self {
        Self { name: value.to_string(), value }
    }

    /// `null`
    #[must_use]
    pub fn null() -> Self {
        Self::new("null", Value::Null)
    }

    /// `undefined`
    #[must_use]
    pub fn undefined() -> Self {
        Self::new("undefined", Value::Undefined)
    }

    /// Boolean `true` or `false`.
    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::new(if b { "true" } else { "false" }, Value::Bool(b))
    }

    /// The number zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::new("0", Value::Number(0.0))
    }

    /// The big integer zero.
    #[must_use]
    pub fn big_zero() -> Self {
        Self::new("0n", Value::BigInt(Integer::from(0)))
    }

    /// `NaN`
    #[must_use]
    pub fn nan() -> Self {
        Self::new("NaN", Value::Number(f64::NAN))
    }

    /// Positive or negative infinity.
    #[must_use]
    pub fn infinity(negative: bool) -> Self {
        if negative {
            Self::new("-inf", Value::Number(f64::NEG_INFINITY))
        } else {
            Self::new("+inf", Value::Number(f64::INFINITY))
        }
    }

    /// The constant value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

impl Descriptor for ConstantDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn read(&self, _cx: &Codec, _cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(self.value.clone())
    }

    fn write_raw(&self, _cx: &Codec, _cursor: &mut WriteCursor<'_>, _value: &Value) -> CodecResult<()> {
        Ok(())
    }

    fn size_raw(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
        Ok(0)
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        if value.same_value(&self.value) {
            None
        } else {
            Some(self.problem(format!("Expected the constant value {}", self.value)))
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(self.value.clone())
    }

    fn adapt(&self, _value: Value) -> Value {
        self.value.clone()
    }
}

/// A boolean stored as one byte, `0x00` or `0x01`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolDescriptor;

impl Descriptor for BoolDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("bool")
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(Value::Bool(cursor.shift()? != 0))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let b = value.as_bool().ok_or_else(|| CodecError::unsupported(value))?;
        cursor.push(u8::from(b))
    }

    fn size_raw(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
        Ok(1)
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        match value {
            Value::Bool(_) => None,
            _ => Some(self.problem("Expected a boolean")),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Bool(false))
    }

    fn adapt(&self, value: Value) -> Value {
        match value {
            Value::Bool(_) => value,
            Value::Undefined | Value::Null => Value::Bool(false),
            Value::Number(n) => Value::Bool(n != 0.0 && !n.is_nan()),
            Value::String(ref s) => Value::Bool(!s.is_empty()),
            _ => Value::Bool(true),
        }
    }
}

/// Accepts anything, writes nothing and reads back `undefined`.
///
/// Useful for record fields that exist at runtime but should not travel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoreDescriptor;

impl Descriptor for IgnoreDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("ignore")
    }

    fn read(&self, _cx: &Codec, _cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(Value::Undefined)
    }

    fn write_raw(&self, _cx: &Codec, _cursor: &mut WriteCursor<'_>, _value: &Value) -> CodecResult<()> {
        Ok(())
    }

    fn size_raw(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
        Ok(0)
    }

    fn find_problem(&self, _cx: &Codec, _value: &Value) -> Option<Problem> {
        None
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Undefined)
    }
}
