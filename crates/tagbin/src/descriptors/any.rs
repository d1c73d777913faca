//! The self-describing path.
//!
//! Every value is written as `[tag:1][payload]`. The tag is picked by the
//! codec's classifier on write and looked up in its registry on read, so no
//! schema is needed to decode.

use std::borrow::Cow;

use tracing::warn;

use crate::codec::Codec;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

/// Accepts every value the classifier supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnyDescriptor;

impl AnyDescriptor {
    fn classified<'a>(cx: &'a Codec, value: &Value) -> CodecResult<(u8, &'a dyn Descriptor)> {
        let builtin = cx.classify(value).ok_or_else(|| CodecError::unsupported(value))?;
        Ok((builtin.tag(), cx.registry().builtin(builtin).as_ref()))
    }
}

impl Descriptor for AnyDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("any")
    }

    fn read(&self, cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let offset = cursor.position();
        let tag = cursor.shift()?;
        match cx.registry().get(tag) {
            Some(descriptor) => descriptor.read(cx, cursor),
            None => {
                warn!(tag, offset, "unknown type tag in self-describing payload");
                Err(CodecError::UnknownTag(tag))
            }
        }
    }

    fn write_raw(&self, cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let (tag, descriptor) = Self::classified(cx, value)?;
        cursor.push(tag)?;
        descriptor.write_raw(cx, cursor, value)
    }

    fn size_raw(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        let (_, descriptor) = Self::classified(cx, value)?;
        Ok(1 + descriptor.size_raw(cx, value)?)
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        match Self::classified(cx, value) {
            Ok((_, descriptor)) => descriptor.find_problem(cx, value),
            Err(_) => Some(self.problem("Unsupported value")),
        }
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::Undefined)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::ClassEntry;
    use crate::encoding::DescriptorExt;
    use crate::registry::Builtin;
    use crate::types::{Instance, Record};

    #[test]
    fn zero_width_singletons() {
        let cx = Codec::default();
        assert_eq!(AnyDescriptor.serialize(&cx, &Value::Null).unwrap(), [Builtin::Null.tag()]);
        assert_eq!(AnyDescriptor.serialize(&cx, &Value::Bool(false)).unwrap(), [Builtin::False.tag()]);
        let bytes = AnyDescriptor.serialize(&cx, &Value::Number(f64::NAN)).unwrap();
        assert_eq!(bytes, [Builtin::NaN.tag()]);
        assert!(AnyDescriptor.deserialize(&cx, &bytes).unwrap().same_value(&Value::Number(f64::NAN)));
    }

    #[test]
    fn unknown_and_reserved_tags_fail() {
        let cx = Codec::default();
        assert_eq!(AnyDescriptor.deserialize(&cx, &[0]).unwrap_err(), CodecError::UnknownTag(0));
        assert_eq!(AnyDescriptor.deserialize(&cx, &[0xFF]).unwrap_err(), CodecError::UnknownTag(0xFF));
        assert!(matches!(AnyDescriptor.deserialize(&cx, &[]), Err(CodecError::UnexpectedEnd { .. })));
    }

    #[test]
    fn instances_need_a_registered_class() {
        let mut cx = Codec::default();
        let value = Value::Instance(Instance::new("Point", Record::new().with("x", 1)));
        assert_eq!(AnyDescriptor.find_problem(&cx, &value).unwrap().message(), "Unsupported value");
        cx.register_class(ClassEntry::new("Point"));
        let bytes = AnyDescriptor.serialize(&cx, &value).unwrap();
        assert_eq!(bytes[0], Builtin::Class.tag());
        assert_eq!(AnyDescriptor.deserialize(&cx, &bytes).unwrap(), value);
    }

    #[test]
    fn nested_problem_carries_the_path() {
        let cx = Codec::default();
        let stranger = Value::Instance(Instance::new("Stranger", Record::new()));
        let value = Value::Array(vec![Value::from(1), stranger]);
        let problem = AnyDescriptor.find_problem(&cx, &value).unwrap();
        assert_eq!(problem.path(), "[1]");
        assert_eq!(problem.site(), "any[]");
        assert_eq!(problem.message(), "Unsupported value");
    }
}
