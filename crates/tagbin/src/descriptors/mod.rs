//! Built-in type descriptors and the functions that construct them.
//!
//! The free functions are the usual entry point: `u8()`, `cstring()`,
//! `array().typed(u8())`, `struct_of([...])` and so on. Configuration methods
//! on the returned descriptors never mutate; each returns a new descriptor.
//!
//! Collections built here use a 32-bit count prefix unless configured
//! otherwise with `length_width`.
//!
//! # Example
//!
//! ```
//! use tagbin::descriptors::{array, cstring, struct_of, u16};
//! use tagbin::{Codec, DescriptorExt, IntoDescriptor, Record, Value};
//!
//! let codec = Codec::default();
//! let user = struct_of([
//!     ("name", cstring().into_descriptor()),
//!     ("scores", array().typed(u16()).into_descriptor()),
//! ]);
//!
//! let value = Value::Object(
//!     Record::new()
//!         .with("name", "ada")
//!         .with("scores", vec![Value::from(7), Value::from(300)]),
//! );
//! let bytes = user.serialize(&codec, &value).unwrap();
//! assert_eq!(bytes, [b'a', b'd', b'a', 0, 2, 0, 0, 0, 7, 0, 0x2C, 0x01]);
//! ```

mod any;
mod any_of;
mod bigint;
mod class;
mod date;
mod int;
mod map;
mod number;
mod object;
mod sequence;
mod special;
mod string;
mod structs;
mod tuple;
mod typed_array;

pub use any::AnyDescriptor;
pub use any_of::{AnyOfDescriptor, ValueEnumDescriptor, MAX_CANDIDATES};
pub use bigint::{BigIntDescriptor, BigIntSign};
pub use class::{ClassEntry, ClassInstanceDescriptor, ClassTable};
pub use date::{DateDescriptor, RegExpDescriptor};
pub use int::{FloatDescriptor, IntDescriptor, IntKind};
pub use map::MapDescriptor;
pub use number::NumberDescriptor;
pub use object::ObjectDescriptor;
pub use sequence::{SequenceDescriptor, SequenceKind};
pub use special::{BoolDescriptor, ConstantDescriptor, IgnoreDescriptor};
pub use string::{LengthPrefixedText, NulTerminatedText, TextConstraints};
pub use structs::{Rehydrate, StructDescriptor};
pub use tuple::TupleDescriptor;
pub use typed_array::{BufferDescriptor, TypedArrayDescriptor};

pub(crate) use int::fits_f32;

use crate::config::IntWidth;
use crate::encoding::IntoDescriptor;
use crate::error::CodecResult;
use crate::types::{TypedArrayKind, Value};

macro_rules! int_constructors {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            #[doc = concat!("`", stringify!($name), "`, little-endian.")]
            #[must_use]
            pub const fn $name() -> IntDescriptor {
                IntDescriptor::new(IntKind::$kind)
            }
        )*
    };
}

int_constructors! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
}

/// 32-bit float. Accepts only numbers an `f32` represents exactly.
#[must_use]
pub const fn f32() -> FloatDescriptor {
    FloatDescriptor::F32
}

/// 64-bit float.
#[must_use]
pub const fn f64() -> FloatDescriptor {
    FloatDescriptor::F64
}

/// Non-negative arbitrary-precision integer.
#[must_use]
pub const fn ubigint() -> BigIntDescriptor {
    BigIntDescriptor::new(BigIntSign::Unsigned)
}

/// Non-positive arbitrary-precision integer.
#[must_use]
pub const fn negbigint() -> BigIntDescriptor {
    BigIntDescriptor::new(BigIntSign::Negative)
}

/// Arbitrary-precision integer with a sign byte.
#[must_use]
pub const fn bigint() -> BigIntDescriptor {
    BigIntDescriptor::new(BigIntSign::Signed)
}

/// Zero-width `null`.
#[must_use]
pub fn null() -> ConstantDescriptor {
    ConstantDescriptor::null()
}

/// Zero-width `undefined`.
#[must_use]
pub fn undefined() -> ConstantDescriptor {
    ConstantDescriptor::undefined()
}

/// Zero-width descriptor accepting exactly `value`.
#[must_use]
pub fn constant(name: impl Into<String>, value: impl Into<Value>) -> ConstantDescriptor {
    ConstantDescriptor::new(name, value.into())
}

/// One-byte boolean.
#[must_use]
pub const fn boolean() -> BoolDescriptor {
    BoolDescriptor
}

/// Zero-width descriptor that drops its value.
#[must_use]
pub const fn ignore() -> IgnoreDescriptor {
    IgnoreDescriptor
}

/// Text with a 1-byte length prefix.
#[must_use]
pub fn string8() -> LengthPrefixedText {
    LengthPrefixedText::new(IntWidth::U8)
}

/// Text with a 2-byte length prefix.
#[must_use]
pub fn string16() -> LengthPrefixedText {
    LengthPrefixedText::new(IntWidth::U16)
}

/// Text with a 4-byte length prefix.
#[must_use]
pub fn string32() -> LengthPrefixedText {
    LengthPrefixedText::new(IntWidth::U32)
}

/// NUL-terminated text.
#[must_use]
pub fn cstring() -> NulTerminatedText {
    NulTerminatedText::new()
}

/// Untyped array.
#[must_use]
pub const fn array() -> SequenceDescriptor {
    SequenceDescriptor::new(SequenceKind::Array, IntWidth::U32)
}

/// Untyped set.
#[must_use]
pub const fn set() -> SequenceDescriptor {
    SequenceDescriptor::new(SequenceKind::Set, IntWidth::U32)
}

/// Fixed-arity tuple.
#[must_use]
pub fn tuple<I, D>(elements: I) -> TupleDescriptor
where
    I: IntoIterator<Item = D>,
    D: IntoDescriptor,
{
    TupleDescriptor::new(elements)
}

/// Typed numeric array of `kind`.
#[must_use]
pub const fn typed_array(kind: TypedArrayKind) -> TypedArrayDescriptor {
    TypedArrayDescriptor::new(kind, IntWidth::U32)
}

/// Raw byte buffer.
#[must_use]
pub const fn buffer() -> BufferDescriptor {
    BufferDescriptor::new(IntWidth::U32)
}

/// Keyed record with fixed fields, written in sorted key order.
#[must_use]
pub fn struct_of<I, K, D>(fields: I) -> StructDescriptor
where
    I: IntoIterator<Item = (K, D)>,
    K: Into<String>,
    D: IntoDescriptor,
{
    StructDescriptor::new(fields)
}

/// Record with arbitrary keys.
#[must_use]
pub fn object() -> ObjectDescriptor {
    ObjectDescriptor::new(IntWidth::U32)
}

/// Associative collection.
#[must_use]
pub const fn map() -> MapDescriptor {
    MapDescriptor::new(IntWidth::U32)
}

/// Instance of a class registered with the codec.
#[must_use]
pub fn class_instance() -> ClassInstanceDescriptor {
    ClassInstanceDescriptor::new(IntWidth::U32)
}

/// Tagged union; the first accepting candidate wins.
///
/// # Errors
///
/// Returns [`CodecError::TooManyCandidates`](crate::CodecError::TooManyCandidates)
/// for more than 255 candidates.
pub fn any_of<I, D>(candidates: I) -> CodecResult<AnyOfDescriptor>
where
    I: IntoIterator<Item = D>,
    D: IntoDescriptor,
{
    AnyOfDescriptor::new(candidates)
}

/// Union of literal values, written as the value's position.
#[must_use]
pub fn any_of_values<I, V>(values: I) -> ValueEnumDescriptor
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    ValueEnumDescriptor::new(values)
}

/// Self-describing value.
#[must_use]
pub const fn any() -> AnyDescriptor {
    AnyDescriptor
}

/// Self-describing number.
#[must_use]
pub const fn number() -> NumberDescriptor {
    NumberDescriptor::new()
}

/// Millisecond timestamp.
#[must_use]
pub const fn date() -> DateDescriptor {
    DateDescriptor
}

/// Regular expression source.
#[must_use]
pub const fn regexp() -> RegExpDescriptor {
    RegExpDescriptor
}
