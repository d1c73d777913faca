//! In-memory values the codec can encode.
//!
//! This module provides the [`Value`] enum, a closed set of runtime shapes
//! (numbers, arbitrary-precision integers, text, collections, keyed records
//! and class instances) that descriptors validate, size, write and read.
//!
//! # Example
//!
//! ```
//! use tagbin::{Record, Value};
//!
//! let name: Value = "Alice".into();
//! let age: Value = 30.into();
//! let score: Value = 95.5.into();
//!
//! assert_eq!(name.as_str(), Some("Alice"));
//! assert_eq!(age.as_number(), Some(30.0));
//! assert_eq!(score.as_number(), Some(95.5));
//!
//! let point = Value::Object(Record::from_iter([("x", Value::from(1)), ("y", Value::from(2))]));
//! assert_eq!(point.type_name(), "object");
//! ```

use std::fmt;

use indexmap::IndexMap;
use malachite::Integer;

/// A value that can be encoded.
///
/// # Supported Types
///
/// | Variant | Rust Type | Notes |
/// |---------|-----------|-------|
/// | `Undefined` | - | Absent value |
/// | `Null` | - | Explicit null |
/// | `Bool` | `bool` | |
/// | `Number` | `f64` | Includes NaN and the infinities |
/// | `BigInt` | [`Integer`] | Arbitrary precision |
/// | `String` | `String` | UTF-8 text |
/// | `Bytes` | `Vec<u8>` | Raw buffer |
/// | `Array` | `Vec<Value>` | Ordered sequence |
/// | `Set` | `Vec<Value>` | Unique-element collection |
/// | `TypedArray` | [`TypedArray`] | Homogeneous numeric vector |
/// | `Date` | `i64` | Milliseconds since the Unix epoch |
/// | `RegExp` | `String` | Pattern source |
/// | `Object` | [`Record`] | Keyed record |
/// | `Map` | `Vec<(Value, Value)>` | Associative collection |
/// | `Instance` | [`Instance`] | Registered-class instance |
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Double-precision number.
    Number(f64),
    /// Arbitrary-precision integer.
    BigInt(Integer),
    /// UTF-8 text.
    String(String),
    /// Raw byte buffer.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Collection of unique values, kept in insertion order.
    Set(Vec<Value>),
    /// Homogeneous numeric vector.
    TypedArray(TypedArray),
    /// Point in time, in milliseconds since the Unix epoch.
    Date(i64),
    /// Regular expression source text.
    RegExp(String),
    /// Keyed record.
    Object(Record),
    /// Associative collection, in insertion order.
    Map(Vec<(Value, Value)>),
    /// Instance of a registered class.
    Instance(Instance),
}

impl Value {
    /// Returns the name of the runtime shape, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Bytes(_) => "buffer",
            Self::Array(_) => "array",
            Self::Set(_) => "set",
            Self::TypedArray(array) => array.kind().name(),
            Self::Date(_) => "date",
            Self::RegExp(_) => "regexp",
            Self::Object(_) => "object",
            Self::Map(_) => "map",
            Self::Instance(_) => "instance",
        }
    }

    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a boolean if it is one.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a number if it is one.
    #[inline]
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a big integer if it is one.
    #[inline]
    #[must_use]
    pub const fn as_bigint(&self) -> Option<&Integer> {
        match self {
            Self::BigInt(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements of an array.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the record of an object.
    #[inline]
    #[must_use]
    pub const fn as_object(&self) -> Option<&Record> {
        match self {
            Self::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the keyed fields of an object or class instance.
    #[inline]
    #[must_use]
    pub const fn fields(&self) -> Option<&Record> {
        match self {
            Self::Object(record) => Some(record),
            Self::Instance(instance) => Some(&instance.fields),
            _ => None,
        }
    }

    /// Compares two values, treating NaN as equal to itself.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::BigInt(i) => write!(f, "{i}n"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(bytes) => write!(f, "<Buffer {} bytes>", bytes.len()),
            Self::Array(items) => write_list(f, "[", items, "]"),
            Self::Set(items) => write_list(f, "Set {", items, "}"),
            Self::TypedArray(array) => write!(f, "{}({})", array.kind().name(), array.len()),
            Self::Date(ms) => write!(f, "Date({ms})"),
            Self::RegExp(source) => write!(f, "/{source}/"),
            Self::Object(record) => write!(f, "{record}"),
            Self::Map(entries) => {
                write!(f, "Map {{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} => {value}")?;
                }
                write!(f, "}}")
            }
            Self::Instance(instance) => write!(f, "{} {}", instance.class, instance.fields),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(f64::from(n))
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Self::Number(f64::from(n))
            }
        })*
    };
}

number_from!(u8, u16, u32, i8, i16, i32);

macro_rules! bigint_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Self::BigInt(Integer::from(n))
            }
        })*
    };
}

bigint_from!(u64, i64, u128, i128);

impl From<Integer> for Value {
    fn from(i: Integer) -> Self {
        Self::BigInt(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Object(record)
    }
}

impl From<TypedArray> for Value {
    fn from(array: TypedArray) -> Self {
        Self::TypedArray(array)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// An insertion-ordered keyed record.
///
/// Keys are unique; inserting an existing key replaces its value in place.
/// Equality ignores key order, so two records holding the same fields compare
/// equal regardless of how they were built.
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: IndexMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    /// Creates an empty record with room for `capacity` fields.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: IndexMap::with_capacity(capacity) }
    }

    /// Inserts a field, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Returns `true` if the record holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {key}: {value}")?;
        }
        if self.is_empty() {
            write!(f, "}}")
        } else {
            write!(f, " }}")
        }
    }
}

/// An instance of a registered class: the class name plus its own fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Name the class is registered under.
    pub class: String,
    /// The instance's enumerable fields.
    pub fields: Record,
}

impl Instance {
    /// Creates an instance of `class` with the given fields.
    #[must_use]
    pub fn new(class: impl Into<String>, fields: Record) -> Self {
        Self { class: class.into(), fields }
    }
}

/// Element type of a [`TypedArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    /// Unsigned 8-bit elements.
    U8,
    /// Unsigned 8-bit elements, clamped on assignment.
    U8Clamped,
    /// Unsigned 16-bit elements.
    U16,
    /// Unsigned 32-bit elements.
    U32,
    /// Unsigned 64-bit elements.
    U64,
    /// Signed 8-bit elements.
    I8,
    /// Signed 16-bit elements.
    I16,
    /// Signed 32-bit elements.
    I32,
    /// Signed 64-bit elements.
    I64,
    /// 32-bit float elements.
    F32,
    /// 64-bit float elements.
    F64,
}

impl TypedArrayKind {
    /// All kinds, in registry order.
    pub const ALL: [Self; 11] = [
        Self::U8,
        Self::U8Clamped,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::F32,
        Self::F64,
    ];

    /// Conventional name of the array type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "Uint8Array",
            Self::U8Clamped => "Uint8ClampedArray",
            Self::U16 => "Uint16Array",
            Self::U32 => "Uint32Array",
            Self::U64 => "BigUint64Array",
            Self::I8 => "Int8Array",
            Self::I16 => "Int16Array",
            Self::I32 => "Int32Array",
            Self::I64 => "BigInt64Array",
            Self::F32 => "Float32Array",
            Self::F64 => "Float64Array",
        }
    }

    /// Encoded width of one element in bytes.
    #[must_use]
    pub const fn element_size(self) -> usize {
        match self {
            Self::U8 | Self::U8Clamped | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

/// A homogeneous numeric vector.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    /// `Uint8Array`
    U8(Vec<u8>),
    /// `Uint8ClampedArray`
    U8Clamped(Vec<u8>),
    /// `Uint16Array`
    U16(Vec<u16>),
    /// `Uint32Array`
    U32(Vec<u32>),
    /// `BigUint64Array`
    U64(Vec<u64>),
    /// `Int8Array`
    I8(Vec<i8>),
    /// `Int16Array`
    I16(Vec<i16>),
    /// `Int32Array`
    I32(Vec<i32>),
    /// `BigInt64Array`
    I64(Vec<i64>),
    /// `Float32Array`
    F32(Vec<f32>),
    /// `Float64Array`
    F64(Vec<f64>),
}

impl TypedArray {
    /// The element kind.
    #[must_use]
    pub const fn kind(&self) -> TypedArrayKind {
        match self {
            Self::U8(_) => TypedArrayKind::U8,
            Self::U8Clamped(_) => TypedArrayKind::U8Clamped,
            Self::U16(_) => TypedArrayKind::U16,
            Self::U32(_) => TypedArrayKind::U32,
            Self::U64(_) => TypedArrayKind::U64,
            Self::I8(_) => TypedArrayKind::I8,
            Self::I16(_) => TypedArrayKind::I16,
            Self::I32(_) => TypedArrayKind::I32,
            Self::I64(_) => TypedArrayKind::I64,
            Self::F32(_) => TypedArrayKind::F32,
            Self::F64(_) => TypedArrayKind::F64,
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) | Self::U8Clamped(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty array of the given kind.
    #[must_use]
    pub const fn empty(kind: TypedArrayKind) -> Self {
        match kind {
            TypedArrayKind::U8 => Self::U8(Vec::new()),
            TypedArrayKind::U8Clamped => Self::U8Clamped(Vec::new()),
            TypedArrayKind::U16 => Self::U16(Vec::new()),
            TypedArrayKind::U32 => Self::U32(Vec::new()),
            TypedArrayKind::U64 => Self::U64(Vec::new()),
            TypedArrayKind::I8 => Self::I8(Vec::new()),
            TypedArrayKind::I16 => Self::I16(Vec::new()),
            TypedArrayKind::I32 => Self::I32(Vec::new()),
            TypedArrayKind::I64 => Self::I64(Vec::new()),
            TypedArrayKind::F32 => Self::F32(Vec::new()),
            TypedArrayKind::F64 => Self::F64(Vec::new()),
        }
    }

    /// Truncates or zero-pads the array to exactly `len` elements.
    pub fn resize(&mut self, len: usize) {
        match self {
            Self::U8(v) | Self::U8Clamped(v) => v.resize(len, 0),
            Self::U16(v) => v.resize(len, 0),
            Self::U32(v) => v.resize(len, 0),
            Self::U64(v) => v.resize(len, 0),
            Self::I8(v) => v.resize(len, 0),
            Self::I16(v) => v.resize(len, 0),
            Self::I32(v) => v.resize(len, 0),
            Self::I64(v) => v.resize(len, 0),
            Self::F32(v) => v.resize(len, 0.0),
            Self::F64(v) => v.resize(len, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_insert_replaces_in_place() {
        let mut record = Record::new();
        assert!(record.insert("a", 1).is_none());
        record.insert("b", 2);
        assert_eq!(record.insert("a", 3), Some(Value::from(1)));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn record_remove_keeps_order() {
        let mut record = Record::from_iter([("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(record.remove("a"), Some(Value::from(1)));
        assert!(!record.contains_key("a"));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn record_equality_ignores_order() {
        let a = Record::from_iter([("x", 10), ("y", 20)]);
        let b = Record::from_iter([("y", 20), ("x", 10)]);
        assert_eq!(a, b);
        assert_ne!(a, Record::from_iter([("x", 10)]));
    }

    #[test]
    fn same_value_handles_nan() {
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert!(!Value::Number(1.0).same_value(&Value::Number(2.0)));
    }

    #[test]
    fn conversions_pick_number_or_bigint() {
        assert_eq!(Value::from(7u8), Value::Number(7.0));
        assert_eq!(Value::from(7i64), Value::BigInt(Integer::from(7)));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn display_is_compact() {
        let value = Value::Array(vec![Value::from(1), Value::from("a"), Value::Null]);
        assert_eq!(value.to_string(), "[1, \"a\", null]");
        let record = Record::new().with("x", 1);
        assert_eq!(record.to_string(), "{ x: 1 }");
    }

    #[test]
    fn typed_array_resize_pads_with_zero() {
        let mut array = TypedArray::I16(vec![-1, 2]);
        array.resize(4);
        assert_eq!(array, TypedArray::I16(vec![-1, 2, 0, 0]));
        assert_eq!(array.kind().element_size(), 2);
    }
}
