//! Bounded tagged unions.
//!
//! # Format
//!
//! - [`AnyOfDescriptor`]: `[candidate:1][candidate payload]`
//! - [`ValueEnumDescriptor`]: `[position:W]`, `W` the narrowest width that
//!   addresses every listed value

use std::borrow::Cow;

use crate::codec::Codec;
use crate::config::IntWidth;
use crate::encoding::{Descriptor, DescriptorRef, IntoDescriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

use super::special::ConstantDescriptor;

/// Largest number of candidates one index byte can address.
pub const MAX_CANDIDATES: usize = u8::MAX as usize;

/// A union of up to 255 candidate descriptors.
///
/// The first candidate, in list order, that accepts a value is the one used
/// to write it. Overlapping candidates must be listed most specific first.
///
/// # Example
///
/// ```
/// use tagbin::descriptors::{any_of, cstring, u8};
/// use tagbin::{Codec, DescriptorExt, Value};
///
/// let codec = Codec::default();
/// let small_or_text = any_of([u8()]).and_then(|d| d.or(cstring())).unwrap();
///
/// assert_eq!(small_or_text.serialize(&codec, &Value::from(10)).unwrap(), [0x00, 0x0A]);
/// assert_eq!(small_or_text.serialize(&codec, &Value::from("hi")).unwrap(), [0x01, 0x68, 0x69, 0x00]);
/// ```
#[derive(Debug, Clone)]
pub struct AnyOfDescriptor {
    candidates: Vec<DescriptorRef>,
}

impl AnyOfDescriptor {
    /// Creates a union from an ordered candidate list.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyCandidates`] for more than 255 candidates.
    pub fn new<I, D>(candidates: I) -> CodecResult<Self>
    where
        I: IntoIterator<Item = D>,
        D: IntoDescriptor,
    {
        let candidates: Vec<_> = candidates.into_iter().map(IntoDescriptor::into_descriptor).collect();
        if candidates.len() > MAX_CANDIDATES {
            return Err(CodecError::TooManyCandidates(candidates.len()));
        }
        Ok(Self { candidates })
    }

    /// A new union with `candidate` appended.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyCandidates`] if the union is already full.
    pub fn or(&self, candidate: impl IntoDescriptor) -> CodecResult<Self> {
        Self::new(self.candidates.iter().cloned().chain(std::iter::once(candidate.into_descriptor())))
    }

    /// A new union with a constant candidate accepting exactly `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyCandidates`] if the union is already full.
    pub fn or_value(&self, value: impl Into<Value>) -> CodecResult<Self> {
        self.or(ConstantDescriptor::of(value.into()))
    }

    /// Candidate list in precedence order.
    #[must_use]
    pub fn candidates(&self) -> &[DescriptorRef] {
        &self.candidates
    }

    fn select(&self, cx: &Codec, value: &Value) -> Option<(usize, &DescriptorRef)> {
        self.candidates.iter().enumerate().find(|(_, d)| d.find_problem(cx, value).is_none())
    }

    fn selected(&self, cx: &Codec, value: &Value) -> CodecResult<(usize, &DescriptorRef)> {
        self.select(cx, value).ok_or_else(|| CodecError::unsupported(format_args!("{value} as {}", self.name())))
    }
}

impl Descriptor for AnyOfDescriptor {
    fn name(&self) -> Cow<'_, str> {
        let names: Vec<_> = self.candidates.iter().map(|d| d.name()).collect();
        Cow::Owned(names.join(" | "))
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let index = usize::from(cursor.shift()?);
        let candidate = self
            .candidates
            .get(index)
            .ok_or(CodecError::UnknownCandidate { index, candidates: self.candidates.len() })?;
        candidate.read(cx, cursor)
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let (index, candidate) = self.selected(cx, value)?;
        cursor.push(index as u8)?;
        candidate.write_raw(cx, cursor, value)
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        let (_, candidate) = self.selected(cx, value)?;
        Ok(1 + candidate.size_raw(cx, value)?)
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        if self.select(cx, value).is_some() {
            return None;
        }
        let names: Vec<_> = self.candidates.iter().map(|d| d.name()).collect();
        Some(self.problem(format!("Expected one of {}", names.join(", "))))
    }

    fn sample(&self) -> CodecResult<Value> {
        match self.candidates.first() {
            Some(first) => first.sample(),
            None => Err(CodecError::NoSample(self.name().into_owned())),
        }
    }
}

/// A union of literal values, written as the value's position in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueEnumDescriptor {
    values: Vec<Value>,
    width: IntWidth,
}

impl ValueEnumDescriptor {
    /// Creates an enumeration over `values` in the given order.
    #[must_use]
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let width = IntWidth::for_max(values.len().saturating_sub(1) as u64);
        Self { values, width }
    }

    /// Listed values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn position(&self, value: &Value) -> Option<usize> {
        self.values.iter().position(|v| v.same_value(value))
    }
}

impl Descriptor for ValueEnumDescriptor {
    fn name(&self) -> Cow<'_, str> {
        let values: Vec<_> = self.values.iter().map(ToString::to_string).collect();
        Cow::Owned(values.join(" | "))
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let index = self.width.read(cursor)?;
        self.values
            .get(index)
            .cloned()
            .ok_or(CodecError::UnknownCandidate { index, candidates: self.values.len() })
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let index = self.position(value).ok_or_else(|| CodecError::unsupported(value))?;
        self.width.write(cursor, index)
    }

    fn size_raw(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
        Ok(self.width.size())
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        match self.position(value) {
            Some(_) => None,
            None => Some(self.problem("Unsupported value")),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        self.values.first().cloned().ok_or_else(|| CodecError::NoSample(self.name().into_owned()))
    }
}
