//! Records with asynchronous fields.
//!
//! A [`DeferredDescriptor`] produces or consumes its bytes asynchronously, for
//! example after fetching data. Its size is still known synchronously, so a
//! [`DeferredStruct`] computes the exact output size, allocates the buffer,
//! writes every synchronous field in place and then joins all pending
//! sub-writes. The buffer is returned only once every one of them resolved.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use tracing::{trace, warn};

use crate::codec::Codec;
use crate::encoding::{Descriptor, DescriptorRef, IntoDescriptor, ReadCursor, WriteCursor};
use crate::error::{key_segment, CodecError, CodecResult, Problem};
use crate::types::{Record, Value};

/// A field whose bytes are produced or consumed asynchronously.
pub trait DeferredDescriptor: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> Cow<'_, str>;

    /// Returns the first reason `value` cannot be encoded, if any.
    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem>;

    /// Exact number of bytes [`write`](Self::write) will produce for `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    fn size(&self, cx: &Codec, value: &Value) -> CodecResult<usize>;

    /// Produces the encoded bytes of `value`.
    fn write<'a>(&'a self, cx: &'a Codec, value: &'a Value) -> BoxFuture<'a, CodecResult<Vec<u8>>>;

    /// Length of the encoded field at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is too short to tell.
    fn encoded_len(&self, cx: &Codec, bytes: &[u8]) -> CodecResult<usize>;

    /// Decodes the field from exactly its encoded bytes.
    fn read<'a>(&'a self, cx: &'a Codec, bytes: &'a [u8]) -> BoxFuture<'a, CodecResult<Value>>;
}

/// One field of a [`DeferredStruct`].
#[derive(Clone)]
pub enum Segment {
    /// Written in place while the buffer is being filled.
    Sync(DescriptorRef),
    /// Written once its future resolves.
    Deferred(Arc<dyn DeferredDescriptor>),
}

impl Segment {
    /// Wraps a synchronous descriptor.
    pub fn sync(descriptor: impl IntoDescriptor) -> Self {
        Self::Sync(descriptor.into_descriptor())
    }

    /// Wraps a deferred descriptor.
    pub fn deferred(descriptor: impl DeferredDescriptor + 'static) -> Self {
        Self::Deferred(Arc::new(descriptor))
    }

    fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Sync(d) => d.name(),
            Self::Deferred(d) => d.name(),
        }
    }

    fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        match self {
            Self::Sync(d) => d.find_problem(cx, value),
            Self::Deferred(d) => d.find_problem(cx, value),
        }
    }

    fn size(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        match self {
            Self::Sync(d) => d.size_raw(cx, value),
            Self::Deferred(d) => d.size(cx, value),
        }
    }
}

/// A keyed record, fields in sorted key order with no keys on the wire,
/// whose fields may be deferred.
#[derive(Clone)]
pub struct DeferredStruct {
    fields: Vec<(String, Segment)>,
}

impl std::fmt::Debug for DeferredStruct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredStruct").field("name", &self.name()).finish()
    }
}

impl DeferredStruct {
    /// Creates a record from `(key, segment)` pairs; later duplicates win.
    #[must_use]
    pub fn new<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Segment)>,
        K: Into<String>,
    {
        let sorted: BTreeMap<String, Segment> = fields.into_iter().map(|(k, s)| (k.into(), s)).collect();
        Self { fields: sorted.into_iter().collect() }
    }

    /// Diagnostic name, e.g. `{ id: u32, payload: lookup }`.
    #[must_use]
    pub fn name(&self) -> String {
        let fields: Vec<_> = self.fields.iter().map(|(key, s)| format!("{key}: {}", s.name())).collect();
        format!("{{ {} }}", fields.join(", "))
    }

    /// Returns the first reason `value` cannot be encoded, if any.
    #[must_use]
    pub fn find_problem(&self, cx: &Codec, value: &Value) -> Option<Problem> {
        let Some(record) = value.fields() else {
            return Some(Problem::new("Expected an object", self.name()));
        };
        self.fields.iter().find_map(|(key, segment)| {
            segment
                .find_problem(cx, record.get(key).unwrap_or(&Value::Undefined))
                .map(|problem| problem.shifted(key_segment(key), self.name()))
        })
    }

    /// Validates `value` and returns its exact encoded size.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value is rejected.
    pub fn get_size(&self, cx: &Codec, value: &Value) -> CodecResult<usize> {
        let record = self.validated(cx, value)?;
        self.sizes(cx, record).map(|sizes| sizes.iter().sum())
    }

    /// Encodes `value`, resolving every deferred field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value is rejected, the first
    /// error of any deferred write, or [`CodecError::Deferred`] if a deferred
    /// write produced a different number of bytes than it announced.
    pub async fn serialize(&self, cx: &Codec, value: &Value) -> CodecResult<Vec<u8>> {
        let record = self.validated(cx, value)?;
        let sizes = self.sizes(cx, record)?;
        let mut buf = vec![0u8; sizes.iter().sum()];

        let mut pending = Vec::new();
        {
            let mut cursor = WriteCursor::new(&mut buf);
            for ((key, segment), &size) in self.fields.iter().zip(&sizes) {
                let field = record.get(key).unwrap_or(&Value::Undefined);
                match segment {
                    Segment::Sync(d) => d.write_raw(cx, &mut cursor, field)?,
                    Segment::Deferred(d) => {
                        let offset = cursor.skip(size)?;
                        pending.push(async move { d.write(cx, field).await.map(|bytes| (key, offset, size, bytes)) });
                    }
                }
            }
        }

        trace!(deferred = pending.len(), size = buf.len(), "awaiting deferred writes");
        for (key, offset, size, bytes) in try_join_all(pending).await? {
            if bytes.len() != size {
                warn!(field = %key, expected = size, actual = bytes.len(), "deferred write size mismatch");
                return Err(CodecError::Deferred(format!(
                    "field {key:?} produced {} bytes, expected {size}",
                    bytes.len()
                )));
            }
            buf[offset..offset + size].copy_from_slice(&bytes);
        }
        Ok(buf)
    }

    /// Decodes a record, resolving every deferred field.
    ///
    /// # Errors
    ///
    /// Returns a decode error for truncated or malformed input, or the first
    /// error of any deferred read.
    pub async fn deserialize(&self, cx: &Codec, bytes: &[u8]) -> CodecResult<Value> {
        let mut record = Record::with_capacity(self.fields.len());
        let mut pending = Vec::new();
        let mut cursor = ReadCursor::new(bytes);
        for (key, segment) in &self.fields {
            match segment {
                Segment::Sync(d) => {
                    record.insert(key.clone(), d.read(cx, &mut cursor)?);
                }
                Segment::Deferred(d) => {
                    let start = cursor.position();
                    let len = d.encoded_len(cx, &bytes[start..])?;
                    let slice = cursor.take(len)?;
                    pending.push(async move { d.read(cx, slice).await.map(|value| (key, value)) });
                }
            }
        }
        for (key, value) in try_join_all(pending).await? {
            record.insert(key.clone(), value);
        }
        Ok(Value::Object(record))
    }

    fn validated<'v>(&self, cx: &Codec, value: &'v Value) -> CodecResult<&'v Record> {
        if let Some(problem) = self.find_problem(cx, value) {
            return Err(CodecError::Validation(problem));
        }
        value.fields().ok_or_else(|| CodecError::unsupported(value))
    }

    fn sizes(&self, cx: &Codec, record: &Record) -> CodecResult<Vec<usize>> {
        self.fields
            .iter()
            .map(|(key, segment)| segment.size(cx, record.get(key).unwrap_or(&Value::Undefined)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptors::u8;
    use futures::executor::block_on;
    use futures::FutureExt;

    /// Writes a string as four upper-cased ASCII bytes, asynchronously.
    #[derive(Debug)]
    struct Upper4 {
        lie_about_size: bool,
    }

    impl DeferredDescriptor for Upper4 {
        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed("upper4")
        }

        fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
            match value.as_str() {
                Some(s) if s.len() == 4 && s.is_ascii() => None,
                _ => Some(Problem::new("Expected four ASCII characters", "upper4")),
            }
        }

        fn size(&self, _cx: &Codec, _value: &Value) -> CodecResult<usize> {
            Ok(4)
        }

        fn write<'a>(&'a self, _cx: &'a Codec, value: &'a Value) -> BoxFuture<'a, CodecResult<Vec<u8>>> {
            async move {
                let mut bytes = value.as_str().unwrap_or_default().to_ascii_uppercase().into_bytes();
                if self.lie_about_size {
                    bytes.push(b'!');
                }
                Ok(bytes)
            }
            .boxed()
        }

        fn encoded_len(&self, _cx: &Codec, _bytes: &[u8]) -> CodecResult<usize> {
            Ok(4)
        }

        fn read<'a>(&'a self, _cx: &'a Codec, bytes: &'a [u8]) -> BoxFuture<'a, CodecResult<Value>> {
            async move { Ok(Value::String(String::from_utf8_lossy(bytes).to_ascii_lowercase())) }.boxed()
        }
    }

    fn record() -> DeferredStruct {
        DeferredStruct::new([
            ("code", Segment::deferred(Upper4 { lie_about_size: false })),
            ("a", Segment::sync(u8())),
            ("z", Segment::sync(u8())),
        ])
    }

    fn value() -> Value {
        Value::Object(Record::new().with("z", 9).with("code", "abcd").with("a", 1))
    }

    #[test]
    fn deferred_bytes_land_in_their_slot() {
        let cx = Codec::default();
        let d = record();
        assert_eq!(d.name(), "{ a: u8, code: upper4, z: u8 }");
        assert_eq!(d.get_size(&cx, &value()).unwrap(), 6);
        let bytes = block_on(d.serialize(&cx, &value())).unwrap();
        assert_eq!(bytes, [1, b'A', b'B', b'C', b'D', 9]);
        assert_eq!(block_on(d.deserialize(&cx, &bytes)).unwrap(), value());
    }

    #[test]
    fn validation_happens_before_any_write() {
        let cx = Codec::default();
        let bad = Value::Object(Record::new().with("z", 9).with("code", "toolong").with("a", 1));
        let err = block_on(record().serialize(&cx, &bad)).unwrap_err();
        assert_eq!(err.problem().unwrap().path(), "[\"code\"]");
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let cx = Codec::default();
        let d = DeferredStruct::new([("code", Segment::deferred(Upper4 { lie_about_size: true }))]);
        let value = Value::Object(Record::new().with("code", "abcd"));
        assert!(matches!(block_on(d.serialize(&cx, &value)), Err(CodecError::Deferred(_))));
    }

    #[test]
    fn truncated_input_fails_before_deferred_reads() {
        let cx = Codec::default();
        assert!(matches!(block_on(record().deserialize(&cx, &[1, b'A'])), Err(CodecError::UnexpectedEnd { .. })));
    }
}
