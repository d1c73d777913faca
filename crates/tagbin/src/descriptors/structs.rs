//! Keyed records with a fixed, sorted field list.
//!
//! Fields are written in lexicographic key order regardless of declaration
//! order or the insertion order of the value, with no keys or count on the
//! wire.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::encoding::{Descriptor, DescriptorRef, IntoDescriptor, ReadCursor, WriteCursor};
use crate::error::{key_segment, CodecError, CodecResult, Problem};
use crate::types::{Record, Value};

/// Builds the runtime value for a decoded record, e.g. a class instance.
pub type Rehydrate = Arc<dyn Fn(Record) -> Value + Send + Sync>;

/// A record with a fixed set of typed fields.
///
/// Accepts [`Value::Object`] and [`Value::Instance`]; a field missing from the
/// value is validated as [`Value::Undefined`].
#[derive(Clone)]
pub struct StructDescriptor {
    fields: Vec<(String, DescriptorRef)>,
    name: Option<String>,
    rehydrate: Option<Rehydrate>,
}

impl fmt::Debug for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructDescriptor")
            .field("fields", &self.fields)
            .field("name", &self.name)
            .field("rehydrate", &self.rehydrate.is_some())
            .finish()
    }
}

impl StructDescriptor {
    /// Creates a record from `(key, descriptor)` pairs; later duplicates win.
    #[must_use]
    pub fn new<I, K, D>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: IntoDescriptor,
    {
        Self { fields: sorted_fields(fields.into_iter().map(|(k, d)| (k.into(), d.into_descriptor()))), name: None, rehydrate: None }
    }

    /// Sorted field list.
    #[must_use]
    pub fn fields(&self) -> &[(String, DescriptorRef)] {
        &self.fields
    }

    /// A new record holding these fields plus `other`'s, `other` winning on
    /// duplicate keys.
    #[must_use]
    pub fn extend(&self, other: &Self) -> Self {
        self.extend_with(other.fields.iter().cloned())
    }

    /// A new record holding these fields plus `fields`.
    #[must_use]
    pub fn extend_with<I, K, D>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: IntoDescriptor,
    {
        let merged = self
            .fields
            .iter()
            .cloned()
            .chain(fields.into_iter().map(|(k, d)| (k.into(), d.into_descriptor())));
        Self { fields: sorted_fields(merged), ..self.clone() }
    }

    /// Overrides the diagnostic name.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..self.clone() }
    }

    /// Decoded records are passed through `rehydrate` instead of becoming
    /// plain objects.
    #[must_use]
    pub fn with_rehydrate(&self, rehydrate: impl Fn(Record) -> Value + Send + Sync + 'static) -> Self {
        Self { rehydrate: Some(Arc::new(rehydrate)), ..self.clone() }
    }

    fn finish(&self, record: Record) -> Value {
        match &self.rehydrate {
            Some(rehydrate) => rehydrate(record),
            None => Value::Object(record),
        }
    }

    fn record<'v>(&self, value: &'v Value) -> CodecResult<&'v Record> {
        value.fields().ok_or_else(|| CodecError::unsupported(format_args!("{value} as {}", self.name())))
    }
}

fn sorted_fields(fields: impl Iterator<Item = (String, DescriptorRef)>) -> Vec<(String, DescriptorRef)> {
    fields.collect::<BTreeMap<_, _>>().into_iter().collect()
}

impl Descriptor for StructDescriptor {
    fn name(&self) -> Cow<'_, str> {
        if let Some(name) = &self.name {
            return Cow::Borrowed(name);
        }
        let fields: Vec<_> = self.fields.iter().map(|(key, d)| format!("{key}: {}", d.name())).collect();
        Cow::Owned(format!("{{ {} }}", fields.join(", ")))
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let mut record = Record::with_capacity(self.fields.len());
        for (key, d) in &self.fields {
            record.insert(key.clone(), d.read(cx, cursor)?);
        }
        Ok(self.finish(record))
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let record = self.record(value)?;
        for (key, d) in &self.fields {
            d.write_raw(cx, cursor, record.get(key).unwrap_or(&Value::Undefined))?;
        }
        Ok(())
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        let record = self.record(value)?;
        self.fields
            .iter()
            .try_fold(0, |size, (key, d)| Ok(size + d.size_raw(cx, record.get(key).unwrap_or(&Value::Undefined))?))
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        let Some(record) = value.fields() else {
            return Some(self.problem("Expected an object"));
        };
        self.fields.iter().find_map(|(key, d)| {
            d.find_problem(cx, record.get(key).unwrap_or(&Value::Undefined))
                .map(|problem| problem.shifted(key_segment(key), self.name()))
        })
    }

    fn sample(&self) -> CodecResult<Value> {
        let mut record = Record::with_capacity(self.fields.len());
        for (key, d) in &self.fields {
            record.insert(key.clone(), d.sample()?);
        }
        Ok(self.finish(record))
    }

    fn adapt(&self, value: Value) -> Value {
        let mut source = match value {
            Value::Object(record) => record,
            Value::Instance(instance) => instance.fields,
            _ => Record::new(),
        };
        let mut record = Record::with_capacity(self.fields.len());
        for (key, d) in &self.fields {
            let field = match source.remove(key) {
                Some(field) => d.adapt(field),
                None => d.sample().unwrap_or(Value::Undefined),
            };
            record.insert(key.clone(), field);
        }
        Value::Object(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::{cstring, u8};
    use crate::encoding::DescriptorExt;
    use crate::types::Instance;

    fn xy(x: i32, y: i32) -> Value {
        Value::Object(Record::new().with("x", x).with("y", y))
    }

    #[test]
    fn fields_are_sorted_by_key() {
        let cx = Codec::default();
        let d = StructDescriptor::new([("y", u8()), ("x", u8())]);
        assert_eq!(d.name(), "{ x: u8, y: u8 }");
        let bytes = d.serialize(&cx, &xy(10, 20)).unwrap();
        assert_eq!(bytes, [0x0A, 0x14]);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), xy(10, 20));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let cx = Codec::default();
        let d = StructDescriptor::new([("x", u8()), ("y", u8())]);
        let reversed = Value::Object(Record::new().with("y", 20).with("x", 10));
        assert_eq!(d.serialize(&cx, &xy(10, 20)).unwrap(), d.serialize(&cx, &reversed).unwrap());
    }

    #[test]
    fn field_problem_names_the_key() {
        let cx = Codec::default();
        let d = StructDescriptor::new([("x", u8())]).with_name("Point");
        let err = d.validate(&cx, &Value::Object(Record::new().with("x", 300))).unwrap_err();
        assert_eq!(err.to_string(), "Point[\"x\"] -> u8: Expected a number between 0 and 255");
        let err = d.validate(&cx, &Value::Object(Record::new())).unwrap_err();
        assert_eq!(err.problem().unwrap().message(), "Expected a number");
    }

    #[test]
    fn extend_merges_and_resorts() {
        let base = StructDescriptor::new([("b", u8())]);
        let extended = base.extend_with([("a", cstring())]);
        let keys: Vec<_> = extended.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(base.fields().len(), 1);
        let replaced = extended.extend(&StructDescriptor::new([("a", u8())]));
        assert_eq!(replaced.name(), "{ a: u8, b: u8 }");
    }

    #[test]
    fn rehydrate_builds_instances() {
        let cx = Codec::default();
        let d = StructDescriptor::new([("x", u8())]).with_rehydrate(|fields| Value::Instance(Instance::new("Point", fields)));
        let value = d.deserialize(&cx, &[5]).unwrap();
        assert_eq!(value, Value::Instance(Instance::new("Point", Record::new().with("x", 5))));
        assert_eq!(d.serialize(&cx, &value).unwrap(), [5]);
    }

    #[test]
    fn adapt_fills_missing_fields() {
        let d = StructDescriptor::new([("x", u8()), ("y", u8())]);
        let adapted = d.adapt(Value::Object(Record::new().with("x", 999).with("extra", 1)));
        assert_eq!(adapted, xy(255, 0));
        assert_eq!(d.sample().unwrap(), xy(0, 0));
    }
}
