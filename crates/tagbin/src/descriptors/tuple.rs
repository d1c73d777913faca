//! Fixed-arity heterogeneous tuples.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::encoding::{Descriptor, DescriptorRef, IntoDescriptor, ReadCursor, WriteCursor};
use crate::error::{index_segment, CodecError, CodecResult, Problem};
use crate::types::Value;

/// A positional tuple: one descriptor per element, no length prefix.
#[derive(Debug, Clone)]
pub struct TupleDescriptor {
    elements: Vec<DescriptorRef>,
}

impl TupleDescriptor {
    /// Creates a tuple from its element descriptors, in order.
    #[must_use]
    pub fn new<I, D>(elements: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: IntoDescriptor,
    {
        Self { elements: elements.into_iter().map(IntoDescriptor::into_descriptor).collect() }
    }

    /// Number of positions.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.elements.len()
    }

    fn items<'v>(&self, value: &'v Value) -> CodecResult<&'v [Value]> {
        value.as_array().ok_or_else(|| CodecError::unsupported(value))
    }
}

impl Descriptor for TupleDescriptor {
    fn name(&self) -> Cow<'_, str> {
        let names: Vec<_> = self.elements.iter().map(|e| e.name()).collect();
        Cow::Owned(format!("[{}]", names.join(", ")))
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let items = self.elements.iter().map(|element| element.read(cx, cursor)).collect::<CodecResult<_>>()?;
        Ok(Value::Array(items))
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        for (element, item) in self.elements.iter().zip(self.items(value)?) {
            element.write_raw(cx, cursor, item)?;
        }
        Ok(())
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        self.elements
            .iter()
            .zip(self.items(value)?)
            .try_fold(0, |size, (element, item)| Ok(size + element.size_raw(cx, item)?))
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        let Some(items) = value.as_array() else {
            return Some(self.problem("Expected an array"));
        };
        if items.len() != self.elements.len() {
            return Some(self.problem(format!("Expected exactly {} elements", self.elements.len())));
        }
        self.elements.iter().zip(items).enumerate().find_map(|(i, (element, item))| {
            element.find_problem(cx, item).map(|problem| problem.shifted(index_segment(i), self.name()))
        })
    }

    fn sample(&self) -> CodecResult<Value> {
        let items = self.elements.iter().map(|element| element.sample()).collect::<CodecResult<_>>()?;
        Ok(Value::Array(items))
    }

    fn adapt(&self, value: Value) -> Value {
        let mut items = match value {
            Value::Array(items) | Value::Set(items) => items,
            _ => Vec::new(),
        };
        items.truncate(self.elements.len());
        for element in &self.elements[items.len()..] {
            items.push(element.sample().unwrap_or(Value::Null));
        }
        Value::Array(items.into_iter().zip(&self.elements).map(|(item, element)| element.adapt(item)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::{boolean, cstring, u16};
    use crate::encoding::DescriptorExt;

    fn point() -> TupleDescriptor {
        TupleDescriptor::new([u16(), u16()])
    }

    #[test]
    fn positions_are_concatenated() {
        let cx = Codec::default();
        let d = TupleDescriptor::new([cstring().into_descriptor(), boolean().into_descriptor()]);
        assert_eq!(d.name(), "[string, bool]");
        let value = Value::Array(vec![Value::from("a"), Value::Bool(true)]);
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [b'a', 0, 1]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
    }

    #[test]
    fn arity_mismatch_is_a_problem() {
        let cx = Codec::default();
        let value = Value::Array(vec![Value::from(1)]);
        assert_eq!(point().validate(&cx, &value).unwrap_err().to_string(), "[u16, u16]: Expected exactly 2 elements");
    }

    #[test]
    fn element_problem_is_shifted() {
        let cx = Codec::default();
        let value = Value::Array(vec![Value::from(1), Value::Number(-1.0)]);
        let problem = point().find_problem(&cx, &value).unwrap();
        assert_eq!(problem.path(), "[1]");
        assert_eq!(problem.origin(), "u16");
    }

    #[test]
    fn adapt_pads_with_samples() {
        let value = point().adapt(Value::Array(vec![Value::Number(70_000.0)]));
        assert_eq!(value, Value::Array(vec![Value::Number(65_535.0), Value::Number(0.0)]));
    }
}
