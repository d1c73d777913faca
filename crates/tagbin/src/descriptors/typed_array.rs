//! Typed numeric arrays and raw byte buffers.
//!
//! Both are written as `[count:W][elements...]` with little-endian elements.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::config::IntWidth;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::{TypedArray, TypedArrayKind, Value};

macro_rules! read_elements {
    ($cursor:ident, $len:ident, $variant:ident, $read:ident) => {{
        let mut items = Vec::with_capacity($len.min($cursor.remaining()));
        for _ in 0..$len {
            items.push($cursor.$read()?);
        }
        TypedArray::$variant(items)
    }};
}

/// A homogeneous numeric vector of one [`TypedArrayKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedArrayDescriptor {
    kind: TypedArrayKind,
    length_width: IntWidth,
}

impl TypedArrayDescriptor {
    /// Creates a descriptor for `kind` with a count prefix of `length_width`.
    #[must_use]
    pub const fn new(kind: TypedArrayKind, length_width: IntWidth) -> Self {
        Self { kind, length_width }
    }

    /// Count prefix width.
    #[must_use]
    pub const fn length_width(self, width: IntWidth) -> Self {
        Self { length_width: width, ..self }
    }

    fn array<'v>(&self, value: &'v Value) -> CodecResult<&'v TypedArray> {
        match value {
            Value::TypedArray(array) if array.kind() == self.kind => Ok(array),
            other => Err(CodecError::unsupported(format_args!("{other} as {}", self.kind.name()))),
        }
    }
}

impl Descriptor for TypedArrayDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.kind.name())
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let len = self.length_width.read_count(cursor, cx.config().max_decode_elements)?;
        let array = match self.kind {
            TypedArrayKind::U8 => TypedArray::U8(cursor.take(len)?.to_vec()),
            TypedArrayKind::U8Clamped => TypedArray::U8Clamped(cursor.take(len)?.to_vec()),
            TypedArrayKind::U16 => read_elements!(cursor, len, U16, read_u16),
            TypedArrayKind::U32 => read_elements!(cursor, len, U32, read_u32),
            TypedArrayKind::U64 => read_elements!(cursor, len, U64, read_u64),
            TypedArrayKind::I8 => read_elements!(cursor, len, I8, read_i8),
            TypedArrayKind::I16 => read_elements!(cursor, len, I16, read_i16),
            TypedArrayKind::I32 => read_elements!(cursor, len, I32, read_i32),
            TypedArrayKind::I64 => read_elements!(cursor, len, I64, read_i64),
            TypedArrayKind::F32 => read_elements!(cursor, len, F32, read_f32),
            TypedArrayKind::F64 => read_elements!(cursor, len, F64, read_f64),
        };
        Ok(Value::TypedArray(array))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let array = self.array(value)?;
        self.length_width.write(cursor, array.len())?;
        match array {
            TypedArray::U8(v) | TypedArray::U8Clamped(v) => cursor.write_bytes(v),
            TypedArray::U16(v) => v.iter().try_for_each(|&x| cursor.write_u16(x)),
            TypedArray::U32(v) => v.iter().try_for_each(|&x| cursor.write_u32(x)),
            TypedArray::U64(v) => v.iter().try_for_each(|&x| cursor.write_u64(x)),
            TypedArray::I8(v) => v.iter().try_for_each(|&x| cursor.write_i8(x)),
            TypedArray::I16(v) => v.iter().try_for_each(|&x| cursor.write_i16(x)),
            TypedArray::I32(v) => v.iter().try_for_each(|&x| cursor.write_i32(x)),
            TypedArray::I64(v) => v.iter().try_for_each(|&x| cursor.write_i64(x)),
            TypedArray::F32(v) => v.iter().try_for_each(|&x| cursor.write_f32(x)),
            TypedArray::F64(v) => v.iter().try_for_each(|&x| cursor.write_f64(x)),
        }
    }

    fn size_raw(&self, _cx: &Codec, value: &Value) -> CodecResult<usize> {
        let array = self.array(value)?;
        Ok(self.length_width.size() + array.len() * self.kind.element_size())
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        match value {
            Value::TypedArray(array) if array.kind() == self.kind => {
                if self.length_width.fits(array.len()) {
                    None
                } else {
                    Some(self.problem(format!("Expected at most {} elements", self.length_width.max())))
                }
            }
            _ => Some(self.problem(format!("Expected a {}", self.kind.name()))),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::TypedArray(TypedArray::empty(self.kind)))
    }
}

/// A raw byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    length_width: IntWidth,
}

impl BufferDescriptor {
    /// Creates a buffer descriptor with a count prefix of `length_width`.
    #[must_use]
    pub const fn new(length_width: IntWidth) -> Self {
        Self { length_width }
    }

    fn bytes<'v>(value: &'v Value) -> CodecResult<&'v [u8]> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(CodecError::unsupported(other)),
        }
    }
}

impl Descriptor for BufferDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Buffer")
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let len = self.length_width.read_count(cursor, cx.config().max_decode_elements)?;
        Ok(Value::Bytes(cursor.take(len)?.to_vec()))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let bytes = Self::bytes(value)?;
        self.length_width.write(cursor, bytes.len())?;
        cursor.write_bytes(bytes)
    }

    fn size_raw(&self, _cx: &Codec, value: &Value) -> CodecResult<usize> {
        Ok(self.length_width.size() + Self::bytes(value)?.len())
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        match value {
            Value::Bytes(bytes) if self.length_width.fits(bytes.len()) => None,
            Value::Bytes(_) => Some(self.problem(format!("Expected at most {} bytes", self.length_width.max()))),
            _ => Some(self.problem("Expected a buffer")),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Bytes(Vec::new()))
    }

    fn adapt(&self, value: Value) -> Value {
        match value {
            Value::Bytes(mut bytes) => {
                bytes.truncate(usize::try_from(self.length_width.max()).unwrap_or(usize::MAX));
                Value::Bytes(bytes)
            }
            Value::String(s) => Value::Bytes(s.into_bytes()),
            Value::TypedArray(TypedArray::U8(bytes) | TypedArray::U8Clamped(bytes)) => Value::Bytes(bytes),
            other => other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::DescriptorExt;

    #[test]
    fn elements_are_little_endian() {
        let cx = Codec::default();
        let d = TypedArrayDescriptor::new(TypedArrayKind::I16, IntWidth::U8);
        let value = Value::TypedArray(TypedArray::I16(vec![1, -1]));
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [2, 0x01, 0x00, 0xFF, 0xFF]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
    }

    #[test]
    fn kind_must_match() {
        let cx = Codec::default();
        let d = TypedArrayDescriptor::new(TypedArrayKind::F32, IntWidth::U32);
        let err = d.validate(&cx, &Value::TypedArray(TypedArray::F64(vec![]))).unwrap_err();
        assert_eq!(err.to_string(), "Float32Array: Expected a Float32Array");
    }

    #[test]
    fn every_kind_roundtrips() {
        let cx = Codec::default();
        for kind in TypedArrayKind::ALL {
            let mut array = TypedArray::empty(kind);
            array.resize(3);
            let value = Value::TypedArray(array);
            let d = TypedArrayDescriptor::new(kind, IntWidth::U32);
            let bytes = d.serialize(&cx, &value).unwrap();
            assert_eq!(bytes.len(), 4 + 3 * kind.element_size());
            assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
        }
    }

    #[test]
    fn buffer_roundtrip() {
        let cx = Codec::default();
        let d = BufferDescriptor::new(IntWidth::U16);
        let value = Value::Bytes(vec![0xDE, 0xAD]);
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [2, 0, 0xDE, 0xAD]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
        assert_eq!(d.adapt(Value::from("hi")), Value::Bytes(b"hi".to_vec()));
    }
}
