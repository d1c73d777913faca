//! Tag registry and runtime classification.
//!
//! Built-in descriptors occupy tags `1..=48` in the order of [`Builtin`];
//! user registrations take the following tags up to 255. Tag 0 is never
//! assigned.

use malachite::Integer;
use tracing::debug;

use crate::config::{CodecConfig, IntWidth};
use crate::descriptors::{
    fits_f32, BigIntDescriptor, BigIntSign, BoolDescriptor, BufferDescriptor, ClassInstanceDescriptor,
    ClassTable, ConstantDescriptor, DateDescriptor, FloatDescriptor, IgnoreDescriptor, IntDescriptor, IntKind,
    LengthPrefixedText, MapDescriptor, NulTerminatedText, NumberDescriptor, ObjectDescriptor, RegExpDescriptor,
    SequenceDescriptor, SequenceKind, TypedArrayDescriptor,
};
use crate::encoding::{DescriptorRef, IntoDescriptor};
use crate::error::{CodecError, CodecResult};
use crate::types::{TypedArrayKind, Value};

/// Highest assignable tag.
pub const MAX_TAGS: usize = u8::MAX as usize;

/// Built-in wire types, in tag order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Builtin {
    Zero = 1,
    BigZero,
    NaN,
    Infinity,
    NegativeInfinity,
    Null,
    Undefined,
    True,
    False,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    UBigInt,
    NegBigInt,
    BigInt,
    String8,
    String16,
    String32,
    CString,
    Bool,
    Array,
    Set,
    Bytes,
    U8Array,
    U8ClampedArray,
    U16Array,
    U32Array,
    U64Array,
    I8Array,
    I16Array,
    I32Array,
    I64Array,
    F32Array,
    F64Array,
    Object,
    Map,
    Class,
    Date,
    RegExp,
    Number,
    Ignore,
}

impl Builtin {
    /// Every built-in, in tag order.
    pub const ALL: [Self; 48] = [
        Self::Zero,
        Self::BigZero,
        Self::NaN,
        Self::Infinity,
        Self::NegativeInfinity,
        Self::Null,
        Self::Undefined,
        Self::True,
        Self::False,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::F32,
        Self::F64,
        Self::UBigInt,
        Self::NegBigInt,
        Self::BigInt,
        Self::String8,
        Self::String16,
        Self::String32,
        Self::CString,
        Self::Bool,
        Self::Array,
        Self::Set,
        Self::Bytes,
        Self::U8Array,
        Self::U8ClampedArray,
        Self::U16Array,
        Self::U32Array,
        Self::U64Array,
        Self::I8Array,
        Self::I16Array,
        Self::I32Array,
        Self::I64Array,
        Self::F32Array,
        Self::F64Array,
        Self::Object,
        Self::Map,
        Self::Class,
        Self::Date,
        Self::RegExp,
        Self::Number,
        Self::Ignore,
    ];

    /// Wire tag.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// The built-in assigned to `tag`, if any.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag).checked_sub(1)?).copied()
    }

    const fn typed_array(kind: TypedArrayKind) -> Self {
        match kind {
            TypedArrayKind::U8 => Self::U8Array,
            TypedArrayKind::U8Clamped => Self::U8ClampedArray,
            TypedArrayKind::U16 => Self::U16Array,
            TypedArrayKind::U32 => Self::U32Array,
            TypedArrayKind::U64 => Self::U64Array,
            TypedArrayKind::I8 => Self::I8Array,
            TypedArrayKind::I16 => Self::I16Array,
            TypedArrayKind::I32 => Self::I32Array,
            TypedArrayKind::I64 => Self::I64Array,
            TypedArrayKind::F32 => Self::F32Array,
            TypedArrayKind::F64 => Self::F64Array,
        }
    }

    /// Builds the descriptor for this built-in.
    #[must_use]
    pub fn descriptor(self, config: &CodecConfig) -> DescriptorRef {
        let width = config.default_length_width;
        let typed = |kind| TypedArrayDescriptor::new(kind, width).into_descriptor();
        match self {
            Self::Zero => ConstantDescriptor::zero().into_descriptor(),
            Self::BigZero => ConstantDescriptor::big_zero().into_descriptor(),
            Self::NaN => ConstantDescriptor::nan().into_descriptor(),
            Self::Infinity => ConstantDescriptor::infinity(false).into_descriptor(),
            Self::NegativeInfinity => ConstantDescriptor::infinity(true).into_descriptor(),
            Self::Null => ConstantDescriptor::null().into_descriptor(),
            Self::Undefined => ConstantDescriptor::undefined().into_descriptor(),
            Self::True => ConstantDescriptor::boolean(true).into_descriptor(),
            Self::False => ConstantDescriptor::boolean(false).into_descriptor(),
            Self::U8 => IntDescriptor::new(IntKind::U8).into_descriptor(),
            Self::U16 => IntDescriptor::new(IntKind::U16).into_descriptor(),
            Self::U32 => IntDescriptor::new(IntKind::U32).into_descriptor(),
            Self::U64 => IntDescriptor::new(IntKind::U64).into_descriptor(),
            Self::I8 => IntDescriptor::new(IntKind::I8).into_descriptor(),
            Self::I16 => IntDescriptor::new(IntKind::I16).into_descriptor(),
            Self::I32 => IntDescriptor::new(IntKind::I32).into_descriptor(),
            Self::I64 => IntDescriptor::new(IntKind::I64).into_descriptor(),
            Self::F32 => FloatDescriptor::F32.into_descriptor(),
            Self::F64 => FloatDescriptor::F64.into_descriptor(),
            Self::UBigInt => BigIntDescriptor::new(BigIntSign::Unsigned).into_descriptor(),
            Self::NegBigInt => BigIntDescriptor::new(BigIntSign::Negative).into_descriptor(),
            Self::BigInt => BigIntDescriptor::new(BigIntSign::Signed).into_descriptor(),
            Self::String8 => LengthPrefixedText::new(IntWidth::U8).into_descriptor(),
            Self::String16 => LengthPrefixedText::new(IntWidth::U16).into_descriptor(),
            Self::String32 => LengthPrefixedText::new(IntWidth::U32).into_descriptor(),
            Self::CString => NulTerminatedText::new().into_descriptor(),
            Self::Bool => BoolDescriptor.into_descriptor(),
            Self::Array => SequenceDescriptor::new(SequenceKind::Array, width).into_descriptor(),
            Self::Set => SequenceDescriptor::new(SequenceKind::Set, width).into_descriptor(),
            Self::Bytes => BufferDescriptor::new(width).into_descriptor(),
            Self::U8Array => typed(TypedArrayKind::U8),
            Self::U8ClampedArray => typed(TypedArrayKind::U8Clamped),
            Self::U16Array => typed(TypedArrayKind::U16),
            Self::U32Array => typed(TypedArrayKind::U32),
            Self::U64Array => typed(TypedArrayKind::U64),
            Self::I8Array => typed(TypedArrayKind::I8),
            Self::I16Array => typed(TypedArrayKind::I16),
            Self::I32Array => typed(TypedArrayKind::I32),
            Self::I64Array => typed(TypedArrayKind::I64),
            Self::F32Array => typed(TypedArrayKind::F32),
            Self::F64Array => typed(TypedArrayKind::F64),
            Self::Object => ObjectDescriptor::new(width).into_descriptor(),
            Self::Map => MapDescriptor::new(width).into_descriptor(),
            Self::Class => ClassInstanceDescriptor::new(width).into_descriptor(),
            Self::Date => DateDescriptor.into_descriptor(),
            Self::RegExp => RegExpDescriptor.into_descriptor(),
            Self::Number => NumberDescriptor::new().into_descriptor(),
            Self::Ignore => IgnoreDescriptor.into_descriptor(),
        }
    }
}

/// Maps one-byte tags to descriptors.
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: Vec<DescriptorRef>,
}

impl Registry {
    /// A registry holding every built-in at its fixed tag.
    #[must_use]
    pub fn with_builtins(config: &CodecConfig) -> Self {
        let descriptors = Builtin::ALL.iter().map(|b| b.descriptor(config)).collect();
        Self { descriptors }
    }

    /// Assigns the next free tag to `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::RegistryFull`] once all 255 tags are taken.
    pub fn register(&mut self, descriptor: impl IntoDescriptor) -> CodecResult<u8> {
        if self.descriptors.len() >= MAX_TAGS {
            return Err(CodecError::RegistryFull);
        }
        let descriptor = descriptor.into_descriptor();
        let tag = (self.descriptors.len() + 1) as u8;
        debug!(tag, name = %descriptor.name(), "registered descriptor");
        self.descriptors.push(descriptor);
        Ok(tag)
    }

    /// Descriptor assigned to `tag`.
    #[must_use]
    pub fn get(&self, tag: u8) -> Option<&DescriptorRef> {
        self.descriptors.get(usize::from(tag).checked_sub(1)?)
    }

    /// Descriptor of a built-in.
    #[must_use]
    pub fn builtin(&self, builtin: Builtin) -> &DescriptorRef {
        &self.descriptors[usize::from(builtin.tag()) - 1]
    }

    /// Number of assigned tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always `false`: the built-ins are registered on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

const F32_MIN_MAGNITUDE: f64 = 1.4e-45;
const F32_MAX_MAGNITUDE: f64 = 3.402_823_5e38;

/// Picks the narrowest built-in for `value`.
///
/// Returns `None` for values the self-describing path cannot write, such as
/// instances of classes missing from `classes`.
#[must_use]
pub fn classify(value: &Value, config: &CodecConfig, classes: &ClassTable) -> Option<Builtin> {
    let builtin = match value {
        Value::Undefined => Builtin::Undefined,
        Value::Null => Builtin::Null,
        Value::Bool(true) => Builtin::True,
        Value::Bool(false) => Builtin::False,
        Value::Number(n) => classify_number(*n, config),
        Value::BigInt(i) => classify_bigint(i),
        Value::String(s) => match s.len() {
            len if IntWidth::U8.fits(len) => Builtin::String8,
            len if IntWidth::U16.fits(len) => Builtin::String16,
            len if IntWidth::U32.fits(len) => Builtin::String32,
            _ => Builtin::CString,
        },
        Value::Bytes(_) => Builtin::Bytes,
        Value::Array(_) => Builtin::Array,
        Value::Set(_) => Builtin::Set,
        Value::TypedArray(array) => Builtin::typed_array(array.kind()),
        Value::Date(_) => Builtin::Date,
        Value::RegExp(_) => Builtin::RegExp,
        Value::Object(_) => Builtin::Object,
        Value::Map(_) => Builtin::Map,
        Value::Instance(instance) => {
            classes.index_of(&instance.class)?;
            Builtin::Class
        }
    };
    Some(builtin)
}

fn classify_number(n: f64, config: &CodecConfig) -> Builtin {
    if n.is_nan() {
        return Builtin::NaN;
    }
    if n.is_infinite() {
        return if n > 0.0 { Builtin::Infinity } else { Builtin::NegativeInfinity };
    }
    if n == 0.0 {
        return Builtin::Zero;
    }
    if n.fract() == 0.0 {
        let narrowest = if n > 0.0 {
            [(127.0, Builtin::U8), (32_767.0, Builtin::U16), (2_147_483_647.0, Builtin::U32)]
                .into_iter()
                .find(|&(max, _)| n <= max)
        } else {
            [(-128.0, Builtin::I8), (-32_768.0, Builtin::I16), (-2_147_483_648.0, Builtin::I32)]
                .into_iter()
                .find(|&(min, _)| n >= min)
        };
        if let Some((_, builtin)) = narrowest {
            return builtin;
        }
    }
    let magnitude = n.abs();
    if config.narrow_floats && (F32_MIN_MAGNITUDE..=F32_MAX_MAGNITUDE).contains(&magnitude) && fits_f32(n) {
        Builtin::F32
    } else {
        Builtin::F64
    }
}

fn classify_bigint(i: &Integer) -> Builtin {
    let zero = Integer::from(0);
    if *i == zero {
        Builtin::BigZero
    } else if *i > zero {
        if u64::try_from(i).is_ok() { Builtin::U64 } else { Builtin::UBigInt }
    } else if i64::try_from(i).is_ok() {
        Builtin::I64
    } else {
        Builtin::NegBigInt
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::ClassEntry;
    use crate::types::{Instance, Record};

    fn classify_default(value: impl Into<Value>) -> Option<Builtin> {
        classify(&value.into(), &CodecConfig::default(), &ClassTable::new())
    }

    #[test]
    fn tags_are_dense_and_stable() {
        for (i, builtin) in Builtin::ALL.iter().enumerate() {
            assert_eq!(usize::from(builtin.tag()), i + 1);
            assert_eq!(Builtin::from_tag(builtin.tag()), Some(*builtin));
        }
        assert_eq!(Builtin::from_tag(0), None);
        assert_eq!(Builtin::from_tag(49), None);
    }

    #[test]
    fn integer_thresholds() {
        assert_eq!(classify_default(127), Some(Builtin::U8));
        assert_eq!(classify_default(128), Some(Builtin::U16));
        assert_eq!(classify_default(32_767), Some(Builtin::U16));
        assert_eq!(classify_default(32_768), Some(Builtin::U32));
        assert_eq!(classify_default(-128), Some(Builtin::I8));
        assert_eq!(classify_default(-129), Some(Builtin::I16));
        assert_eq!(classify_default(-32_769), Some(Builtin::I32));
        assert_eq!(classify_default(4_294_967_296.0), Some(Builtin::F64));
    }

    #[test]
    fn singletons() {
        assert_eq!(classify_default(0), Some(Builtin::Zero));
        assert_eq!(classify_default(Integer::from(0)), Some(Builtin::BigZero));
        assert_eq!(classify_default(f64::NAN), Some(Builtin::NaN));
        assert_eq!(classify_default(f64::NEG_INFINITY), Some(Builtin::NegativeInfinity));
        assert_eq!(classify_default(Value::Undefined), Some(Builtin::Undefined));
    }

    #[test]
    fn floats_narrow_only_when_enabled() {
        let narrow = CodecConfig::new().narrow_floats(true);
        let classes = ClassTable::new();
        assert_eq!(classify(&Value::from(0.5), &narrow, &classes), Some(Builtin::F32));
        assert_eq!(classify(&Value::from(0.1), &narrow, &classes), Some(Builtin::F64));
        assert_eq!(classify(&Value::from(1e300), &narrow, &classes), Some(Builtin::F64));
        assert_eq!(classify_default(0.5), Some(Builtin::F64));
    }

    #[test]
    fn bigints_by_magnitude() {
        assert_eq!(classify_default(u64::MAX), Some(Builtin::U64));
        assert_eq!(classify_default(u128::from(u64::MAX) + 1), Some(Builtin::UBigInt));
        assert_eq!(classify_default(i64::MIN), Some(Builtin::I64));
        assert_eq!(classify_default(i128::from(i64::MIN) - 1), Some(Builtin::NegBigInt));
    }

    #[test]
    fn strings_by_byte_length() {
        assert_eq!(classify_default("x".repeat(255)), Some(Builtin::String8));
        assert_eq!(classify_default("x".repeat(256)), Some(Builtin::String16));
        assert_eq!(classify_default("é".repeat(128)), Some(Builtin::String16));
    }

    #[test]
    fn instances_need_a_registered_class() {
        let value = Value::Instance(Instance::new("Point", Record::new()));
        let mut classes = ClassTable::new();
        assert_eq!(classify(&value, &CodecConfig::default(), &classes), None);
        classes.register(ClassEntry::new("Point"));
        assert_eq!(classify(&value, &CodecConfig::default(), &classes), Some(Builtin::Class));
    }

    #[test]
    fn registry_fills_up_at_255() {
        let config = CodecConfig::default();
        let mut registry = Registry::with_builtins(&config);
        assert_eq!(registry.len(), Builtin::ALL.len());
        let first = registry.register(BoolDescriptor).unwrap();
        assert_eq!(usize::from(first), Builtin::ALL.len() + 1);
        while registry.len() < MAX_TAGS {
            registry.register(BoolDescriptor).unwrap();
        }
        assert_eq!(registry.get(255).unwrap().name(), "bool");
        assert_eq!(registry.register(BoolDescriptor).unwrap_err(), CodecError::RegistryFull);
        assert!(registry.get(0).is_none());
    }
}
