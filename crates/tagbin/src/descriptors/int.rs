//! Fixed-width integers and floats.
//!
//! Integers up to 32 bits carry [`Value::Number`]; the 64-bit widths carry
//! [`Value::BigInt`] so every accepted value survives a round trip.

use std::borrow::Cow;

use malachite::Integer;

use crate::codec::Codec;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

/// Width and signedness of a fixed-width integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit.
    U16,
    /// Unsigned 32-bit.
    U32,
    /// Unsigned 64-bit.
    U64,
    /// Signed 8-bit.
    I8,
    /// Signed 16-bit.
    I16,
    /// Signed 32-bit.
    I32,
    /// Signed 64-bit.
    I64,
}

impl IntKind {
    /// Descriptor name, e.g. `u16`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }

    /// Encoded size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
        }
    }

    /// Whether values travel as [`Value::BigInt`].
    #[must_use]
    pub const fn is_wide(self) -> bool {
        matches!(self, Self::U64 | Self::I64)
    }

    /// Smallest representable value.
    #[must_use]
    pub const fn min(self) -> i64 {
        match self {
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 0,
            Self::I8 => i8::MIN as i64,
            Self::I16 => i16::MIN as i64,
            Self::I32 => i32::MIN as i64,
            Self::I64 => i64::MIN,
        }
    }

    /// Largest representable value.
    #[must_use]
    pub const fn max(self) -> u64 {
        match self {
            Self::U8 => u8::MAX as u64,
            Self::U16 => u16::MAX as u64,
            Self::U32 => u32::MAX as u64,
            Self::U64 => u64::MAX,
            Self::I8 => i8::MAX as u64,
            Self::I16 => i16::MAX as u64,
            Self::I32 => i32::MAX as u64,
            Self::I64 => i64::MAX as u64,
        }
    }

    fn range_message(self) -> String {
        format!("Expected a number between {} and {}", self.min(), self.max())
    }
}

/// A fixed-width little-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntDescriptor {
    kind: IntKind,
}

impl IntDescriptor {
    /// Creates a descriptor for `kind`.
    #[must_use]
    pub const fn new(kind: IntKind) -> Self {
        Self { kind }
    }

    /// The integer kind.
    #[must_use]
    pub const fn kind(&self) -> IntKind {
        self.kind
    }

    fn narrow(&self, value: &Value) -> CodecResult<i64> {
        match value {
            Value::Number(n) => Ok(*n as i64),
            other => Err(CodecError::unsupported(format_args!("{other} as {}", self.kind.name()))),
        }
    }

    fn wide<'v>(&self, value: &'v Value) -> CodecResult<&'v Integer> {
        value.as_bigint().ok_or_else(|| CodecError::unsupported(format_args!("{value} as {}", self.kind.name())))
    }
}

impl Descriptor for IntDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.kind.name())
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(match self.kind {
            IntKind::U8 => Value::Number(f64::from(cursor.read_u8()?)),
            IntKind::U16 => Value::Number(f64::from(cursor.read_u16()?)),
            IntKind::U32 => Value::Number(f64::from(cursor.read_u32()?)),
            IntKind::I8 => Value::Number(f64::from(cursor.read_i8()?)),
            IntKind::I16 => Value::Number(f64::from(cursor.read_i16()?)),
            IntKind::I32 => Value::Number(f64::from(cursor.read_i32()?)),
            IntKind::U64 => Value::BigInt(Integer::from(cursor.read_u64()?)),
            IntKind::I64 => Value::BigInt(Integer::from(cursor.read_i64()?)),
        })
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        match self.kind {
            IntKind::U8 => cursor.write_u8(self.narrow(value)? as u8),
            IntKind::U16 => cursor.write_u16(self.narrow(value)? as u16),
            IntKind::U32 => cursor.write_u32(self.narrow(value)? as u32),
            IntKind::I8 => cursor.write_i8(self.narrow(value)? as i8),
            IntKind::I16 => cursor.write_i16(self.narrow(value)? as i16),
            IntKind::I32 => cursor.write_i32(self.narrow(value)? as i32),
            IntKind::U64 => {
                let n = u64::try_from(self.wide(value)?).map_err(|_| CodecError::unsupported(value))?;
                cursor.write_u64(n)
            }
            IntKind::I64 => {
                let n = i64::try_from(self.wide(value)?).map_err(|_| CodecError::unsupported(value))?;
                cursor.write_i64(n)
            }
        }
    }

    fn size_raw(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
        Ok(self.kind.size())
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        if self.kind.is_wide() {
            let Value::BigInt(i) = value else {
                return Some(self.problem("Expected a big integer"));
            };
            if *i < Integer::from(self.kind.min()) || *i > Integer::from(self.kind.max()) {
                return Some(self.problem(self.kind.range_message()));
            }
            return None;
        }

        let Value::Number(n) = value else {
            return Some(self.problem("Expected a number"));
        };
        if !n.is_finite() || n.fract() != 0.0 {
            return Some(self.problem("Expected an integer"));
        }
        if *n < self.kind.min() as f64 || *n > self.kind.max() as f64 {
            return Some(self.problem(self.kind.range_message()));
        }
        None
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(if self.kind.is_wide() { Value::BigInt(Integer::from(0)) } else { Value::Number(0.0) })
    }

    fn adapt(&self, value: Value) -> Value {
        if self.kind.is_wide() {
            let min = Integer::from(self.kind.min());
            let max = Integer::from(self.kind.max());
            let i = match value {
                Value::BigInt(i) => i,
                Value::Number(n) if n.is_finite() => Integer::from(n.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64),
                Value::Bool(b) => Integer::from(u8::from(b)),
                other => return other,
            };
            return Value::BigInt(if i < min {
                min
            } else if i > max {
                max
            } else {
                i
            });
        }

        let n = match value {
            Value::Number(n) => n,
            Value::BigInt(ref i) => match i64::try_from(i) {
                Ok(n) => n as f64,
                Err(_) if *i < Integer::from(0) => f64::NEG_INFINITY,
                Err(_) => f64::INFINITY,
            },
            Value::Bool(b) => f64::from(u8::from(b)),
            other => return other,
        };
        let n = if n.is_nan() { 0.0 } else { n };
        Value::Number(n.round().clamp(self.kind.min() as f64, self.kind.max() as f64))
    }
}

/// A little-endian IEEE 754 float of 32 or 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatDescriptor {
    double: bool,
}

impl FloatDescriptor {
    /// 32-bit float. Only values exactly representable as `f32` validate.
    pub const F32: Self = Self { double: false };
    /// 64-bit float.
    pub const F64: Self = Self { double: true };
}

impl Descriptor for FloatDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(if self.double { "f64" } else { "f32" })
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(Value::Number(if self.double { cursor.read_f64()? } else { f64::from(cursor.read_f32()?) }))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let n = value.as_number().ok_or_else(|| CodecError::unsupported(value))?;
        if self.double {
            cursor.write_f64(n)
        } else {
            cursor.write_f32(n as f32)
        }
    }

    fn size_raw(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
        Ok(if self.double { 8 } else { 4 })
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        let Value::Number(n) = value else {
            return Some(self.problem("Expected a number"));
        };
        if !self.double && !fits_f32(*n) {
            return Some(self.problem("Expected a number exactly representable as a 32-bit float"));
        }
        None
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Number(0.0))
    }

    fn adapt(&self, value: Value) -> Value {
        let n = match value {
            Value::Number(n) => n,
            Value::Bool(b) => f64::from(u8::from(b)),
            other => return other,
        };
        Value::Number(if self.double { n } else { f64::from(n as f32) })
    }
}

/// Returns `true` if `n` survives a round trip through `f32` unchanged.
pub(crate) fn fits_f32(n: f64) -> bool {
    n.is_nan() || f64::from(n as f32) == n
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::DescriptorExt;

    fn codec() -> Codec {
        Codec::default()
    }

    #[test]
    fn narrow_ints_roundtrip_little_endian() {
        let cx = codec();
        let d = IntDescriptor::new(IntKind::I16);
        let bytes = d.serialize(&cx, &Value::Number(-2.0)).unwrap();
        assert_eq!(bytes, [0xFE, 0xFF]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), Value::Number(-2.0));
    }

    #[test]
    fn range_and_integrality_are_checked() {
        let cx = codec();
        let d = IntDescriptor::new(IntKind::U8);
        assert_eq!(
            d.find_problem(&cx, &Value::Number(256.0)).unwrap().message(),
            "Expected a number between 0 and 255"
        );
        assert_eq!(d.find_problem(&cx, &Value::Number(1.5)).unwrap().message(), "Expected an integer");
        assert_eq!(d.find_problem(&cx, &Value::from("1")).unwrap().message(), "Expected a number");
        assert!(d.find_problem(&cx, &Value::Number(255.0)).is_none());
    }

    #[test]
    fn wide_ints_use_bigint() {
        let cx = codec();
        let d = IntDescriptor::new(IntKind::U64);
        let value = Value::from(u64::MAX);
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [0xFF; 8]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
        assert!(d.find_problem(&cx, &Value::Number(1.0)).is_some());
        assert!(d.find_problem(&cx, &Value::from(-1i64)).is_some());

        let d = IntDescriptor::new(IntKind::I64);
        let value = Value::from(i64::MIN);
        assert_eq!(d.deserialize(&cx, &d.serialize(&cx, &value).unwrap()).unwrap(), value);
    }

    #[test]
    fn adapt_clamps_and_rounds() {
        let d = IntDescriptor::new(IntKind::I8);
        assert_eq!(d.adapt(Value::Number(300.0)), Value::Number(127.0));
        assert_eq!(d.adapt(Value::Number(-2.6)), Value::Number(-3.0));
        assert_eq!(d.adapt(Value::Number(f64::NAN)), Value::Number(0.0));

        let d = IntDescriptor::new(IntKind::U64);
        assert_eq!(d.adapt(Value::from(-5i64)), Value::from(0u64));
        assert_eq!(d.adapt(Value::Number(7.0)), Value::from(7u64));
    }

    #[test]
    fn f32_requires_exact_representation() {
        let cx = codec();
        let d = FloatDescriptor::F32;
        assert!(d.find_problem(&cx, &Value::Number(0.5)).is_none());
        assert!(d.find_problem(&cx, &Value::Number(0.1)).is_some());
        assert!(d.find_problem(&cx, &Value::Number(f64::INFINITY)).is_none());
        assert_eq!(d.adapt(Value::Number(0.1)), Value::Number(f64::from(0.1f32)));
        let bytes = d.serialize(&cx, &Value::Number(1.5)).unwrap();
        assert_eq!(bytes, 1.5f32.to_le_bytes());
    }

    #[test]
    fn f64_roundtrips_nan() {
        let cx = codec();
        let bytes = FloatDescriptor::F64.serialize(&cx, &Value::Number(f64::NAN)).unwrap();
        let decoded = FloatDescriptor::F64.deserialize(&cx, &bytes).unwrap();
        assert!(decoded.same_value(&Value::Number(f64::NAN)));
    }
}
