//! Associative collections.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::config::IntWidth;
use crate::encoding::{Descriptor, DescriptorRef, IntoDescriptor, ReadCursor, WriteCursor};
use crate::error::{index_segment, CodecError, CodecResult, Problem};
use crate::types::Value;

/// A map written as `[count:W]` followed by `[key][value]` per entry, in
/// iteration order. Untyped keys and values are self-describing.
#[derive(Debug, Clone)]
pub struct MapDescriptor {
    key: Option<DescriptorRef>,
    value: Option<DescriptorRef>,
    length_width: IntWidth,
}

impl MapDescriptor {
    /// An untyped map with a count prefix of `length_width`.
    #[must_use]
    pub const fn new(length_width: IntWidth) -> Self {
        Self { key: None, value: None, length_width }
    }

    /// Keys are written with `key`.
    #[must_use]
    pub fn key_typed(&self, key: impl IntoDescriptor) -> Self {
        Self { key: Some(key.into_descriptor()), ..self.clone() }
    }

    /// Values are written with `value`.
    #[must_use]
    pub fn value_typed(&self, value: impl IntoDescriptor) -> Self {
        Self { value: Some(value.into_descriptor()), ..self.clone() }
    }

    /// Count prefix width.
    #[must_use]
    pub fn length_width(&self, width: IntWidth) -> Self {
        Self { length_width: width, ..self.clone() }
    }

    fn parts<'a>(&'a self, cx: &'a Codec) -> (&'a dyn Descriptor, &'a dyn Descriptor) {
        let any: &dyn Descriptor = cx.any();
        (self.key.as_deref().unwrap_or(any), self.value.as_deref().unwrap_or(any))
    }

    fn entries<'v>(&self, value: &'v Value) -> CodecResult<&'v [(Value, Value)]> {
        match value {
            Value::Map(entries) => Ok(entries),
            other => Err(CodecError::unsupported(format_args!("{other} as {}", self.name()))),
        }
    }
}

impl Descriptor for MapDescriptor {
    fn name(&self) -> Cow<'_, str> {
        let key = self.key.as_ref().map_or(Cow::Borrowed("any"), |d| d.name());
        let value = self.value.as_ref().map_or(Cow::Borrowed("any"), |d| d.name());
        Cow::Owned(format!("Map<{key}, {value}>"))
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let len = self.length_width.read_count(cursor, cx.config().max_decode_elements)?;
        let (key, value) = self.parts(cx);
        let mut entries = Vec::with_capacity(len.min(cursor.remaining()));
        for _ in 0..len {
            let k = key.read(cx, cursor)?;
            let v = value.read(cx, cursor)?;
            entries.push((k, v));
        }
        Ok(Value::Map(entries))
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let entries = self.entries(value)?;
        self.length_width.write(cursor, entries.len())?;
        let (key_d, value_d) = self.parts(cx);
        for (k, v) in entries {
            key_d.write_raw(cx, cursor, k)?;
            value_d.write_raw(cx, cursor, v)?;
        }
        Ok(())
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        let (key_d, value_d) = self.parts(cx);
        self.entries(value)?
            .iter()
            .try_fold(self.length_width.size(), |size, (k, v)| Ok(size + key_d.size_raw(cx, k)? + value_d.size_raw(cx, v)?))
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        let Value::Map(entries) = value else {
            return Some(self.problem("Expected a map"));
        };
        if !self.length_width.fits(entries.len()) {
            return Some(self.problem(format!("Expected at most {} entries", self.length_width.max())));
        }
        let (key_d, value_d) = self.parts(cx);
        entries.iter().enumerate().find_map(|(i, (k, v))| {
            key_d
                .find_problem(cx, k)
                .or_else(|| value_d.find_problem(cx, v))
                .map(|problem| problem.shifted(index_segment(i), self.name()))
        })
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Map(Vec::new()))
    }

    fn adapt(&self, value: Value) -> Value {
        let entries = match value {
            Value::Map(entries) => entries,
            Value::Object(record) => record.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
            _ => Vec::new(),
        };
        let max = usize::try_from(self.length_width.max()).unwrap_or(usize::MAX);
        Value::Map(
            entries
                .into_iter()
                .take(max)
                .map(|(k, v)| {
                    let k = match &self.key {
                        Some(d) => d.adapt(k),
                        None => k,
                    };
                    let v = match &self.value {
                        Some(d) => d.adapt(v),
                        None => v,
                    };
                    (k, v)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::{cstring, u8};
    use crate::encoding::DescriptorExt;

    #[test]
    fn typed_map_layout() {
        let cx = Codec::default();
        let d = MapDescriptor::new(IntWidth::U8).key_typed(cstring()).value_typed(u8());
        assert_eq!(d.name(), "Map<string, u8>");
        let value = Value::Map(vec![(Value::from("b"), Value::from(2)), (Value::from("a"), Value::from(1))]);
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [2, b'b', 0, 2, b'a', 0, 1]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
    }

    #[test]
    fn untyped_entries_are_self_describing() {
        let cx = Codec::default();
        let d = MapDescriptor::new(IntWidth::U32);
        let value = Value::Map(vec![(Value::from(1), Value::Null), (Value::Bool(true), Value::from("x"))]);
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(d.get_size(&cx, &value).unwrap(), bytes.len());
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
    }

    #[test]
    fn entry_problem_carries_index() {
        let cx = Codec::default();
        let d = MapDescriptor::new(IntWidth::U32).value_typed(u8());
        let value = Value::Map(vec![(Value::from("a"), Value::from(1)), (Value::from("b"), Value::from(-1))]);
        let problem = d.find_problem(&cx, &value).unwrap();
        assert_eq!(problem.path(), "[1]");
        assert_eq!(problem.site(), "Map<any, u8>");
    }
}
