//! Homogeneous sequences: arrays and sets.
//!
//! # Format
//!
//! - Variable length: `[count:W][element...]`, `W` being the configured width
//! - Fixed length: `[element...]` with no prefix; the arity is validated
//!
//! Untyped sequences write each element self-describing (`[tag][payload]`).

use std::borrow::Cow;

use crate::codec::Codec;
use crate::config::IntWidth;
use crate::encoding::{Descriptor, DescriptorRef, IntoDescriptor, ReadCursor, WriteCursor};
use crate::error::{index_segment, CodecError, CodecResult, Problem};
use crate::types::Value;

use super::tuple::TupleDescriptor;

/// Which runtime collection a sequence accepts and produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    /// [`Value::Array`]
    Array,
    /// [`Value::Set`]
    Set,
}

/// An array or set descriptor, optionally typed and optionally fixed-length.
///
/// Configuration methods return a new descriptor.
///
/// # Example
///
/// ```
/// use tagbin::descriptors::{array, u8};
/// use tagbin::{Codec, DescriptorExt, Value};
///
/// let codec = Codec::default();
/// let ten_bytes = array().typed(u8()).sized(10);
/// let value = Value::Array((1..=10).map(Value::from).collect());
///
/// assert_eq!(ten_bytes.serialize(&codec, &value).unwrap(), (1..=10).collect::<Vec<u8>>());
/// ```
#[derive(Debug, Clone)]
pub struct SequenceDescriptor {
    kind: SequenceKind,
    element: Option<DescriptorRef>,
    fixed_len: Option<usize>,
    length_width: IntWidth,
}

impl SequenceDescriptor {
    /// An untyped sequence of `kind` with a count prefix of `length_width`.
    #[must_use]
    pub const fn new(kind: SequenceKind, length_width: IntWidth) -> Self {
        Self { kind, element: None, fixed_len: None, length_width }
    }

    /// Elements are written with `element` instead of self-describing.
    #[must_use]
    pub fn typed(&self, element: impl IntoDescriptor) -> Self {
        Self { element: Some(element.into_descriptor()), ..self.clone() }
    }

    /// Exactly `len` elements, written without a count prefix.
    #[must_use]
    pub fn sized(&self, len: usize) -> Self {
        Self { fixed_len: Some(len), ..self.clone() }
    }

    /// Count prefix width for variable-length sequences.
    #[must_use]
    pub fn length_width(&self, width: IntWidth) -> Self {
        Self { length_width: width, ..self.clone() }
    }

    /// A positional tuple with one descriptor per element.
    #[must_use]
    pub fn tuple<I, D>(elements: I) -> TupleDescriptor
    where
        I: IntoIterator<Item = D>,
        D: IntoDescriptor,
    {
        TupleDescriptor::new(elements)
    }

    /// The element descriptor, if typed.
    #[must_use]
    pub fn element(&self) -> Option<&DescriptorRef> {
        self.element.as_ref()
    }

    fn element_descriptor<'a>(&'a self, cx: &'a Codec) -> &'a dyn Descriptor {
        match &self.element {
            Some(element) => element.as_ref(),
            None => cx.any(),
        }
    }

    fn items<'v>(&self, value: &'v Value) -> Option<&'v [Value]> {
        match (self.kind, value) {
            (SequenceKind::Array, Value::Array(items)) | (SequenceKind::Set, Value::Set(items)) => Some(items),
            _ => None,
        }
    }

    fn items_or_err<'v>(&self, value: &'v Value) -> CodecResult<&'v [Value]> {
        self.items(value).ok_or_else(|| CodecError::unsupported(format_args!("{value} as {}", self.name())))
    }

    fn wrap(&self, items: Vec<Value>) -> Value {
        match self.kind {
            SequenceKind::Array => Value::Array(items),
            SequenceKind::Set => Value::Set(items),
        }
    }

    fn element_sample(&self) -> CodecResult<Value> {
        self.element.as_ref().map_or(Ok(Value::Null), |element| element.sample())
    }
}

impl Descriptor for SequenceDescriptor {
    fn name(&self) -> Cow<'_, str> {
        let element = self.element.as_ref().map_or(Cow::Borrowed("any"), |e| e.name());
        let base = match self.kind {
            SequenceKind::Array => format!("{element}[]"),
            SequenceKind::Set => format!("Set<{element}>"),
        };
        Cow::Owned(match (self.kind, self.fixed_len) {
            (SequenceKind::Array, Some(n)) => format!("{element}[{n}]"),
            (SequenceKind::Set, Some(n)) => format!("{base}[{n}]"),
            (_, None) => base,
        })
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let limit = cx.config().max_decode_elements;
        let len = match self.fixed_len {
            Some(n) if n > limit => return Err(CodecError::LengthLimit { length: n as u64, limit }),
            Some(n) => n,
            None => self.length_width.read_count(cursor, limit)?,
        };

        let element = self.element_descriptor(cx);
        let mut items = Vec::with_capacity(len.min(cursor.remaining()));
        for _ in 0..len {
            items.push(element.read(cx, cursor)?);
        }
        Ok(self.wrap(items))
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let items = self.items_or_err(value)?;
        if self.fixed_len.is_none() {
            self.length_width.write(cursor, items.len())?;
        }
        let element = self.element_descriptor(cx);
        for item in items {
            element.write_raw(cx, cursor, item)?;
        }
        Ok(())
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        let items = self.items_or_err(value)?;
        let element = self.element_descriptor(cx);
        let prefix = if self.fixed_len.is_some() { 0 } else { self.length_width.size() };
        items.iter().try_fold(prefix, |size, item| Ok(size + element.size_raw(cx, item)?))
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        let Some(items) = self.items(value) else {
            return Some(self.problem(match self.kind {
                SequenceKind::Array => "Expected an array",
                SequenceKind::Set => "Expected a set",
            }));
        };

        match self.fixed_len {
            Some(n) if items.len() != n => {
                return Some(self.problem(format!("Expected exactly {n} elements")));
            }
            None if !self.length_width.fits(items.len()) => {
                return Some(self.problem(format!("Expected at most {} elements", self.length_width.max())));
            }
            _ => {}
        }

        let element = self.element_descriptor(cx);
        items.iter().enumerate().find_map(|(i, item)| {
            element.find_problem(cx, item).map(|problem| problem.shifted(index_segment(i), self.name()))
        })
    }

    fn sample(&self) -> CodecResult<Value> {
        match self.fixed_len {
            None => Ok(self.wrap(Vec::new())),
            Some(n) => {
                let sample = self.element_sample()?;
                Ok(self.wrap(vec![sample; n]))
            }
        }
    }

    fn adapt(&self, value: Value) -> Value {
        let mut items = match value {
            Value::Array(items) | Value::Set(items) => items,
            _ => Vec::new(),
        };

        if let Some(n) = self.fixed_len {
            if items.len() > n {
                items.truncate(n);
            } else if items.len() < n {
                let fill = self.element_sample().unwrap_or(Value::Null);
                items.resize(n, fill);
            }
        } else {
            let max = usize::try_from(self.length_width.max()).unwrap_or(usize::MAX);
            items.truncate(max);
        }

        if let Some(element) = &self.element {
            items = items.into_iter().map(|item| element.adapt(item)).collect();
        }
        self.wrap(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::{cstring, u8};
    use crate::encoding::DescriptorExt;

    fn arr(items: impl IntoIterator<Item = i32>) -> Value {
        Value::Array(items.into_iter().map(Value::from).collect())
    }

    #[test]
    fn names_describe_shape() {
        let base = SequenceDescriptor::new(SequenceKind::Array, IntWidth::U32);
        assert_eq!(base.name(), "any[]");
        assert_eq!(base.typed(u8()).name(), "u8[]");
        assert_eq!(base.typed(u8()).sized(3).name(), "u8[3]");
        let set = SequenceDescriptor::new(SequenceKind::Set, IntWidth::U32);
        assert_eq!(set.typed(u8()).name(), "Set<u8>");
    }

    #[test]
    fn tuple_from_sequence() {
        let cx = Codec::default();
        let d = SequenceDescriptor::tuple([u8().into_descriptor(), cstring().into_descriptor()]);
        let value = Value::Array(vec![Value::from(3), Value::from("ab")]);
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [3, b'a', b'b', 0]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
    }

    #[test]
    fn typed_array_has_count_prefix() {
        let cx = Codec::default();
        let d = SequenceDescriptor::new(SequenceKind::Array, IntWidth::U16).typed(u8());
        let bytes = d.serialize(&cx, &arr([7, 8])).unwrap();
        assert_eq!(bytes, [0x02, 0x00, 7, 8]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), arr([7, 8]));
    }

    #[test]
    fn fixed_length_validates_arity() {
        let cx = Codec::default();
        let d = SequenceDescriptor::new(SequenceKind::Array, IntWidth::U32).typed(u8()).sized(3);
        let err = d.validate(&cx, &arr([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "u8[3]: Expected exactly 3 elements");
        assert_eq!(d.adapt(arr([1, 2])), arr([1, 2, 0]));
        assert_eq!(d.adapt(arr([1, 2, 3, 4])), arr([1, 2, 3]));
    }

    #[test]
    fn element_problems_carry_index() {
        let cx = Codec::default();
        let d = SequenceDescriptor::new(SequenceKind::Array, IntWidth::U32).typed(cstring());
        let value = Value::Array(vec![Value::from("ok"), Value::from(3)]);
        let problem = d.find_problem(&cx, &value).unwrap();
        assert_eq!(problem.to_string(), "string[][1] -> string: Expected a string");
    }

    #[test]
    fn count_must_fit_width() {
        let cx = Codec::default();
        let d = SequenceDescriptor::new(SequenceKind::Array, IntWidth::U8).typed(u8());
        let problem = d.find_problem(&cx, &arr(std::iter::repeat(0).take(256))).unwrap();
        assert_eq!(problem.message(), "Expected at most 255 elements");
    }

    #[test]
    fn set_and_array_are_distinct() {
        let cx = Codec::default();
        let d = SequenceDescriptor::new(SequenceKind::Set, IntWidth::U32).typed(u8());
        assert!(d.validate(&cx, &arr([1])).is_err());
        let set = Value::Set(vec![Value::from(1)]);
        assert_eq!(d.deserialize(&cx, &d.serialize(&cx, &set).unwrap()).unwrap(), set);
    }

    #[test]
    fn oversized_length_header_is_rejected() {
        let cx = Codec::new(crate::CodecConfig::new().max_decode_elements(4));
        let d = SequenceDescriptor::new(SequenceKind::Array, IntWidth::U32).typed(u8());
        let err = d.deserialize(&cx, &[0xFF, 0xFF, 0xFF, 0x00]).unwrap_err();
        assert_eq!(err, CodecError::LengthLimit { length: 0x00FF_FFFF, limit: 4 });
        assert!(d.deserialize(&Codec::default(), &[0x03, 0, 0, 0, 1]).is_err());
    }
}
