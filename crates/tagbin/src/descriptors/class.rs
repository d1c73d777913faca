//! Registered-class instances.
//!
//! # Format
//!
//! `[class_index:W][record]`, where `W` is 1 byte for tables of up to 256
//! classes, 2 bytes up to 65 536 and 4 bytes beyond, and `record` uses the
//! dynamic record layout (`[count][key][value]...`).

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::config::IntWidth;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::{Instance, Record, Value};

use super::object::ObjectDescriptor;
use super::structs::Rehydrate;

/// One registered class.
#[derive(Clone)]
pub struct ClassEntry {
    name: String,
    rehydrate: Option<Rehydrate>,
    skip: Vec<String>,
}

impl fmt::Debug for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEntry")
            .field("name", &self.name)
            .field("rehydrate", &self.rehydrate.is_some())
            .field("skip", &self.skip)
            .finish()
    }
}

impl ClassEntry {
    /// A class whose decoded records become [`Value::Instance`] of `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), rehydrate: None, skip: Vec::new() }
    }

    /// Decoded records are passed through `rehydrate` instead.
    #[must_use]
    pub fn with_rehydrate(mut self, rehydrate: impl Fn(Record) -> Value + Send + Sync + 'static) -> Self {
        self.rehydrate = Some(Arc::new(rehydrate));
        self
    }

    /// Fields with this key are never written.
    #[must_use]
    pub fn skip_field(mut self, key: impl Into<String>) -> Self {
        self.skip.push(key.into());
        self
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn serialized_fields(&self, fields: &Record) -> Record {
        fields.iter().filter(|(key, _)| !self.skip.iter().any(|s| s == key)).map(|(k, v)| (k, v.clone())).collect()
    }

    fn rehydrate(&self, fields: Record) -> Value {
        match &self.rehydrate {
            Some(rehydrate) => rehydrate(fields),
            None => Value::Instance(Instance::new(self.name.clone(), fields)),
        }
    }
}

/// Classes ordered by name, so encoder and decoder agree on positions.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    entries: Vec<ClassEntry>,
}

impl ClassTable {
    /// An empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Adds a class, replacing any class with the same name.
    pub fn register(&mut self, entry: ClassEntry) {
        match self.entries.binary_search_by(|e| e.name.as_str().cmp(&entry.name)) {
            Ok(pos) => self.entries[pos] = entry,
            Err(pos) => self.entries.insert(pos, entry),
        }
    }

    /// Replaces the whole table.
    pub fn set(&mut self, entries: impl IntoIterator<Item = ClassEntry>) {
        self.entries.clear();
        for entry in entries {
            self.register(entry);
        }
    }

    /// Position of the class named `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.binary_search_by(|e| e.name.as_str().cmp(name)).ok()
    }

    /// Class at position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ClassEntry> {
        self.entries.get(index)
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Width of the class index for the current cardinality.
    #[must_use]
    pub fn index_width(&self) -> IntWidth {
        match IntWidth::for_max(self.entries.len().saturating_sub(1) as u64) {
            IntWidth::U64 => IntWidth::U32,
            width => width,
        }
    }

    /// Iterates classes in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
        self.entries.iter()
    }
}

/// Instances of classes registered in a [`ClassTable`].
///
/// Without an explicit table the codec's own table is used.
#[derive(Debug, Clone)]
pub struct ClassInstanceDescriptor {
    table: Option<Arc<ClassTable>>,
    record: ObjectDescriptor,
}

impl ClassInstanceDescriptor {
    /// Uses the codec's class table; fields are counted at `length_width`.
    #[must_use]
    pub fn new(length_width: IntWidth) -> Self {
        Self { table: None, record: ObjectDescriptor::new(length_width) }
    }

    /// Uses a fixed table instead of the codec's.
    #[must_use]
    pub fn with_table(&self, table: ClassTable) -> Self {
        Self { table: Some(Arc::new(table)), ..self.clone() }
    }

    fn table<'a>(&'a self, cx: &'a Codec) -> &'a ClassTable {
        self.table.as_deref().unwrap_or_else(|| cx.classes())
    }

    fn locate<'t, 'v>(&self, table: &'t ClassTable, value: &'v Value) -> CodecResult<(usize, &'t ClassEntry, &'v Record)> {
        let Value::Instance(instance) = value else {
            return Err(CodecError::unsupported(value));
        };
        let index = table.index_of(&instance.class).ok_or_else(|| CodecError::unsupported(value))?;
        let entry = table.get(index).ok_or_else(|| CodecError::unsupported(value))?;
        Ok((index, entry, &instance.fields))
    }
}

impl Descriptor for ClassInstanceDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("class")
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let table = self.table(cx);
        let index = table.index_width().read(cursor)?;
        let entry = table.get(index).ok_or(CodecError::UnknownClassIndex { index, classes: table.len() })?;
        let fields = self.record.read_record(cx, cursor)?;
        Ok(entry.rehydrate(fields))
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let table = self.table(cx);
        let (index, entry, fields) = self.locate(table, value)?;
        table.index_width().write(cursor, index)?;
        self.record.write_record(cx, cursor, &entry.serialized_fields(fields))
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        let table = self.table(cx);
        let (_, entry, fields) = self.locate(table, value)?;
        Ok(table.index_width().size() + self.record.record_size(cx, &entry.serialized_fields(fields))?)
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        let Value::Instance(instance) = value else {
            return Some(self.problem("Expected a class instance"));
        };
        let table = self.table(cx);
        let Some(entry) = table.index_of(&instance.class).and_then(|index| table.get(index)) else {
            let names: Vec<_> = table.iter().map(ClassEntry::name).collect();
            return Some(self.problem(format!("Expected one of {}", names.join(", "))));
        };
        self.record
            .record_problem(cx, &entry.serialized_fields(&instance.fields))
            .map(|problem| problem.owned_by(self.name()))
    }

    fn sample(&self) -> CodecResult<Value> {
        Err(CodecError::NoSample(self.name().into_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::DescriptorExt;

    fn point(x: i32) -> Value {
        Value::Instance(Instance::new("Point", Record::new().with("x", x)))
    }

    #[test]
    fn table_is_sorted_by_name() {
        let mut table = ClassTable::new();
        table.register(ClassEntry::new("Zebra"));
        table.register(ClassEntry::new("Apple"));
        table.register(ClassEntry::new("Mango"));
        assert_eq!(table.index_of("Apple"), Some(0));
        assert_eq!(table.index_of("Zebra"), Some(2));
        table.register(ClassEntry::new("Apple"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn index_width_tracks_cardinality() {
        let mut table = ClassTable::new();
        table.set((0..256).map(|i| ClassEntry::new(format!("C{i:03}"))));
        assert_eq!(table.index_width(), IntWidth::U8);
        table.register(ClassEntry::new("Extra"));
        assert_eq!(table.index_width(), IntWidth::U16);
    }

    #[test]
    fn instance_roundtrip_with_explicit_table() {
        let cx = Codec::default();
        let mut table = ClassTable::new();
        table.register(ClassEntry::new("Point"));
        let d = ClassInstanceDescriptor::new(IntWidth::U8).with_table(table);
        let bytes = d.serialize(&cx, &point(3)).unwrap();
        // index, field count, string32 key "x", tagged u8 3
        assert_eq!(bytes[..7], [0, 1, 1, 0, 0, 0, b'x']);
        assert_eq!(d.deserialize(&cx, &bytes).unwrap(), point(3));
    }

    #[test]
    fn unregistered_class_is_rejected() {
        let mut cx = Codec::default();
        cx.register_class(ClassEntry::new("Line"));
        cx.register_class(ClassEntry::new("Circle"));
        let d = ClassInstanceDescriptor::new(IntWidth::U32);
        let err = d.validate(&cx, &point(1)).unwrap_err();
        assert_eq!(err.to_string(), "class: Expected one of Circle, Line");
        assert!(matches!(d.sample(), Err(CodecError::NoSample(_))));
    }

    #[test]
    fn skipped_fields_are_not_written() {
        let mut cx = Codec::default();
        cx.register_class(ClassEntry::new("Point").skip_field("cache"));
        let d = ClassInstanceDescriptor::new(IntWidth::U32);
        let value = Value::Instance(Instance::new("Point", Record::new().with("x", 1).with("cache", "big")));
        let decoded = d.deserialize(&cx, &d.serialize(&cx, &value).unwrap()).unwrap();
        assert_eq!(decoded, point(1));
    }

    #[test]
    fn unknown_index_is_fatal() {
        let mut cx = Codec::default();
        cx.register_class(ClassEntry::new("Point"));
        let d = ClassInstanceDescriptor::new(IntWidth::U32);
        assert_eq!(d.deserialize(&cx, &[4, 0, 0, 0, 0]).unwrap_err(), CodecError::UnknownClassIndex { index: 4, classes: 1 });
    }

    #[test]
    fn custom_rehydrate() {
        let mut cx = Codec::default();
        cx.register_class(ClassEntry::new("Point").with_rehydrate(|fields| Value::Object(fields.with("rehydrated", true))));
        let d = ClassInstanceDescriptor::new(IntWidth::U32);
        let decoded = d.deserialize(&cx, &d.serialize(&cx, &point(2)).unwrap()).unwrap();
        assert_eq!(decoded.as_object().and_then(|r| r.get("rehydrated")), Some(&Value::Bool(true)));
    }
}
