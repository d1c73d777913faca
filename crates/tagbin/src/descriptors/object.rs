//! Dynamic keyed records.
//!
//! # Format
//!
//! `[count:W]` followed by `[key][value]` per field in the record's own order.
//! Keys default to `string32`; values default to the self-describing path.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::config::IntWidth;
use crate::encoding::{Descriptor, DescriptorRef, IntoDescriptor, ReadCursor, WriteCursor};
use crate::error::{key_segment, CodecError, CodecResult, Problem};
use crate::types::{Record, Value};

use super::string::LengthPrefixedText;

/// A record with arbitrary keys.
///
/// A key descriptor that rejects text keys but accepts numbers (e.g. `u16`)
/// receives the key parsed as a number.
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    key: DescriptorRef,
    value: Option<DescriptorRef>,
    length_width: IntWidth,
    name: Option<String>,
}

impl ObjectDescriptor {
    /// `string32` keys, self-describing values, and a count of `length_width`.
    #[must_use]
    pub fn new(length_width: IntWidth) -> Self {
        Self { key: LengthPrefixedText::new(IntWidth::U32).into_descriptor(), value: None, length_width, name: None }
    }

    /// Keys are written with `key`.
    #[must_use]
    pub fn key_typed(&self, key: impl IntoDescriptor) -> Self {
        Self { key: key.into_descriptor(), ..self.clone() }
    }

    /// Values are written with `value` instead of self-describing.
    #[must_use]
    pub fn value_typed(&self, value: impl IntoDescriptor) -> Self {
        Self { value: Some(value.into_descriptor()), ..self.clone() }
    }

    /// Count prefix width.
    #[must_use]
    pub fn length_width(&self, width: IntWidth) -> Self {
        Self { length_width: width, ..self.clone() }
    }

    /// Overrides the diagnostic name.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..self.clone() }
    }

    fn value_descriptor<'a>(&'a self, cx: &'a Codec) -> &'a dyn Descriptor {
        match &self.value {
            Some(value) => value.as_ref(),
            None => cx.any(),
        }
    }

    /// The value a field key is written as.
    fn key_value(&self, cx: &Codec, key: &str) -> Value {
        let text = Value::String(key.to_owned());
        if self.key.find_problem(cx, &text).is_none() {
            return text;
        }
        match key.parse::<f64>() {
            Ok(n) if self.key.find_problem(cx, &Value::Number(n)).is_none() => Value::Number(n),
            _ => text,
        }
    }

    fn key_text(key: Value) -> String {
        match key {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    pub(crate) fn record_problem(&self, cx: &Codec, record: &Record) -> Option<Problem> {
        if !self.length_width.fits(record.len()) {
            return Some(self.problem(format!("Expected at most {} fields", self.length_width.max())));
        }
        let value_descriptor = self.value_descriptor(cx);
        record.iter().find_map(|(key, value)| {
            self.key_problem(cx, key)
                .or_else(|| value_descriptor.find_problem(cx, value))
                .map(|problem| problem.shifted(key_segment(key), self.name()))
        })
    }

    fn key_problem(&self, cx: &Codec, key: &str) -> Option<Problem> {
        let written = self.key_value(cx, key);
        // Numeric keys must read back as the same text.
        if let Value::Number(n) = written {
            if n.to_string() != key || (n == 0.0 && n.is_sign_negative()) {
                return Some(Problem::new("Expected a canonical numeric key", self.key.name()));
            }
        }
        self.key.find_problem(cx, &written)
    }

    pub(crate) fn record_size(&self, cx: &Codec, record: &Record) -> CodecResult<usize> {
        let value_descriptor = self.value_descriptor(cx);
        record.iter().try_fold(self.length_width.size(), |size, (key, value)| {
            Ok(size + self.key.size_raw(cx, &self.key_value(cx, key))? + value_descriptor.size_raw(cx, value)?)
        })
    }

    pub(crate) fn write_record(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, record: &Record) -> CodecResult<()> {
        self.length_width.write(cursor, record.len())?;
        let value_descriptor = self.value_descriptor(cx);
        for (key, value) in record.iter() {
            self.key.write_raw(cx, cursor, &self.key_value(cx, key))?;
            value_descriptor.write_raw(cx, cursor, value)?;
        }
        Ok(())
    }

    pub(crate) fn read_record(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Record> {
        let len = self.length_width.read_count(cursor, cx.config().max_decode_elements)?;
        let value_descriptor = self.value_descriptor(cx);
        let mut record = Record::with_capacity(len.min(cursor.remaining()));
        for _ in 0..len {
            let key = Self::key_text(self.key.read(cx, cursor)?);
            record.insert(key, value_descriptor.read(cx, cursor)?);
        }
        Ok(record)
    }

    fn record<'v>(&self, value: &'v Value) -> CodecResult<&'v Record> {
        value.as_object().ok_or_else(|| CodecError::unsupported(format_args!("{value} as {}", self.name())))
    }
}

impl Descriptor for ObjectDescriptor {
    fn name(&self) -> Cow<'_, str> {
        if let Some(name) = &self.name {
            return Cow::Borrowed(name);
        }
        let value = self.value.as_ref().map_or(Cow::Borrowed("any"), |v| v.name());
        Cow::Owned(format!("Object<{}, {value}>", self.key.name()))
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(Value::Object(self.read_record(cx, cursor)?))
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        self.write_record(cx, cursor, self.record(value)?)
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        self.record_size(cx, self.record(value)?)
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        match value {
            Value::Object(record) => self.record_problem(cx, record),
            _ => Some(self.problem("Expected an object")),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Object(Record::new()))
    }

    fn adapt(&self, value: Value) -> Value {
        let source = match value {
            Value::Object(record) => record,
            Value::Instance(instance) => instance.fields,
            _ => Record::new(),
        };
        let max = usize::try_from(self.length_width.max()).unwrap_or(usize::MAX);
        let record = source
            .into_iter()
            .take(max)
            .map(|(key, field)| {
                let field = match &self.value {
                    Some(d) => d.adapt(field),
                    None => field,
                };
                (key, field)
            })
            .collect();
        Value::Object(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::{string8, u16, u8};
    use crate::encoding::DescriptorExt;

    #[test]
    fn untyped_record_layout() {
        let cx = Codec::default();
        let d = ObjectDescriptor::new(IntWidth::U8).key_typed(string8());
        let value = Value::Object(Record::new().with("a", 5));
        let bytes = d.serialize(&cx, &value).unwrap();
        // count, key "a", then the self-describing u8 tag and payload
        assert_eq!(bytes[..3], [1, 1, b'a']);
        assert_eq!(bytes.len(), 5);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
    }

    #[test]
    fn typed_values() {
        let cx = Codec::default();
        let d = ObjectDescriptor::new(IntWidth::U8).key_typed(string8()).value_typed(u8());
        assert_eq!(d.name(), "Object<string8, u8>");
        let value = Value::Object(Record::new().with("k", 9));
        assert_eq!(d.serialize(&cx, &value).unwrap(), [1, 1, b'k', 9]);
        let problem = d.find_problem(&cx, &Value::Object(Record::new().with("k", "x"))).unwrap();
        assert_eq!(problem.to_string(), "Object<string8, u8>[\"k\"] -> u8: Expected a number");
    }

    #[test]
    fn numeric_keys() {
        let cx = Codec::default();
        let d = ObjectDescriptor::new(IntWidth::U8).key_typed(u16()).value_typed(u8());
        let value = Value::Object(Record::new().with("258", 1));
        let bytes = d.serialize(&cx, &value).unwrap();
        assert_eq!(bytes, [1, 0x02, 0x01, 1]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), value);
        assert!(d.validate(&cx, &Value::Object(Record::new().with("name", 1))).is_err());
    }

    #[test]
    fn numeric_keys_must_be_canonical() {
        let cx = Codec::default();
        let d = ObjectDescriptor::new(IntWidth::U8).key_typed(u16()).value_typed(u8());
        for key in ["1.0", "01", "+5", "1e2", "-0"] {
            let err = d.validate(&cx, &Value::Object(Record::new().with(key, 7))).unwrap_err();
            let problem = err.problem().unwrap();
            assert_eq!(problem.message(), "Expected a canonical numeric key", "key {key}");
            assert_eq!(problem.path(), format!("[{key:?}]"));
        }
        let value = Value::Object(Record::new().with("1", 7).with("65535", 8));
        assert_eq!(d.deserialize(&cx, &d.serialize(&cx, &value).unwrap()).unwrap(), value);
    }

    #[test]
    fn instances_are_not_plain_objects() {
        let cx = Codec::default();
        let d = ObjectDescriptor::new(IntWidth::U32);
        let instance = Value::Instance(crate::types::Instance::new("Point", Record::new()));
        assert_eq!(d.find_problem(&cx, &instance).unwrap().message(), "Expected an object");
        assert_eq!(d.adapt(instance), Value::Object(Record::new()));
    }
}
