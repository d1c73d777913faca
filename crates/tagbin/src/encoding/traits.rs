//! The descriptor contract every encodable type implements.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

use super::cursor::{ReadCursor, WriteCursor};

/// A type descriptor: how one kind of value is validated, sized, written and read.
///
/// The raw operations (`write_raw`, `size_raw`) assume the value already
/// passed [`find_problem`](Self::find_problem). Callers go through the
/// checked operations on [`DescriptorExt`] instead.
///
/// For any value `v` accepted by `find_problem`, `size_raw(v)` equals the
/// number of bytes `write_raw(v)` emits, and `read` over those bytes
/// reproduces `v`.
pub trait Descriptor: fmt::Debug + Send + Sync {
    /// Structural name used in diagnostics, e.g. `u8[]` or `{ x: u8 }`.
    fn name(&self) -> Cow<'_, str>;

    /// Reads one value.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is truncated or malformed.
    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value>;

    /// Writes a value that already passed validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented or the buffer is
    /// too small. Neither happens for validated values written into a buffer
    /// of exactly `size_raw` bytes.
    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()>;

    /// Exact encoded size of a value that already passed validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize>;

    /// Returns the first reason `value` cannot be encoded, if any.
    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem>;

    /// A canonical default value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NoSample`] for descriptors without a meaningful default.
    fn sample(&self) -> CodecResult<Value>;

    /// Coerces `value` toward something this descriptor accepts.
    ///
    /// The default leaves the value unchanged.
    fn adapt(&self, value: Value) -> Value {
        value
    }

    /// Builds a problem originating at this descriptor.
    fn problem(&self, message: impl Into<String>) -> Problem
    where
        Self: Sized,
    {
        Problem::new(message, self.name())
    }
}

/// Shared handle to a descriptor.
pub type DescriptorRef = Arc<dyn Descriptor>;

/// Checked operations derived from the raw [`Descriptor`] contract.
///
/// # Example
///
/// ```
/// use tagbin::descriptors::{struct_of, u8};
/// use tagbin::{Codec, DescriptorExt, Record, Value};
///
/// let codec = Codec::default();
/// let point = struct_of([("y", u8()), ("x", u8())]);
/// let value = Value::Object(Record::from_iter([("x", 10), ("y", 20)]));
///
/// let bytes = point.serialize(&codec, &value).unwrap();
/// assert_eq!(bytes, [0x0A, 0x14]);
/// assert_eq!(point.deserialize(&codec, &bytes).unwrap(), value);
/// ```
pub trait DescriptorExt: Descriptor {
    /// Checks `value`, converting the first problem into an error.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value is rejected.
    fn validate(&self, cx: &Codec, value: &Value) -> CodecResult<()> {
        match self.find_problem(cx, value) {
            Some(problem) => Err(CodecError::Validation(problem)),
            None => Ok(()),
        }
    }

    /// Validates `value` and returns its exact encoded size.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value is rejected.
    fn get_size(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        self.validate(cx, value)?;
        self.size_raw(cx, value)
    }

    /// Validates `value` and writes it at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value is rejected, or
    /// [`CodecError::Overflow`] if the cursor has too little room.
    fn write(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        self.validate(cx, value)?;
        self.write_raw(cx, cursor, value)
    }

    /// Validates `value` and encodes it into an exactly-sized buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value is rejected.
    fn serialize(&self, cx: &Codec, value: &Value) -> CodecResult<Vec<u8>> {
        let size = self.get_size(cx, value)?;
        let mut buf = vec![0u8; size];
        let mut cursor = WriteCursor::new(&mut buf);
        self.write_raw(cx, &mut cursor, value)?;
        debug_assert_eq!(cursor.position(), size, "size_raw disagrees with write_raw for {}", self.name());
        Ok(buf)
    }

    /// Decodes one value from the start of `bytes`.
    ///
    /// Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is truncated or malformed.
    fn deserialize(&self, cx: &Codec, bytes: &[u8]) -> CodecResult<Value> {
        self.read(cx, &mut ReadCursor::new(bytes))
    }

    /// Decodes one value and reports how many bytes it consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is truncated or malformed.
    fn deserialize_from(&self, cx: &Codec, bytes: &[u8]) -> CodecResult<(Value, usize)> {
        let mut cursor = ReadCursor::new(bytes);
        let value = self.read(cx, &mut cursor)?;
        Ok((value, cursor.position()))
    }

    /// Coerces `value` with [`Descriptor::adapt`] and then serializes it.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the adapted value is still rejected.
    fn serialize_adapted(&self, cx: &Codec, value: Value) -> CodecResult<Vec<u8>> {
        let adapted = self.adapt(value);
        self.serialize(cx, &adapted)
    }
}

impl<T: Descriptor + ?Sized> DescriptorExt for T {}

/// Conversion into a shared descriptor handle.
pub trait IntoDescriptor {
    /// Wraps `self` into a [`DescriptorRef`].
    fn into_descriptor(self) -> DescriptorRef;
}

impl<T: Descriptor + 'static> IntoDescriptor for T {
    fn into_descriptor(self) -> DescriptorRef {
        Arc::new(self)
    }
}

impl IntoDescriptor for DescriptorRef {
    fn into_descriptor(self) -> DescriptorRef {
        self
    }
}

impl IntoDescriptor for &DescriptorRef {
    fn into_descriptor(self) -> DescriptorRef {
        Arc::clone(self)
    }
}
