//! The codec context.

use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::descriptors::{AnyDescriptor, ClassEntry, ClassTable};
use crate::encoding::{Descriptor, DescriptorExt, IntoDescriptor, WriteCursor};
use crate::error::{CodecError, CodecResult};
use crate::registry::{classify, Builtin, Registry};
use crate::types::Value;

/// Owns the tag registry and the class table, and is passed to every
/// descriptor operation.
///
/// Configure it (register descriptors and classes) before sharing it; all
/// encode and decode operations take `&self`.
///
/// # Example
///
/// ```
/// use tagbin::{Codec, Record, Value};
///
/// let codec = Codec::default();
/// let value = Value::Object(Record::new().with("name", "ada").with("age", 36));
///
/// let bytes = codec.serialize(&value).unwrap();
/// assert_eq!(bytes.len(), codec.get_size(&value).unwrap());
/// assert_eq!(codec.deserialize(&bytes).unwrap(), value);
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    config: CodecConfig,
    registry: Registry,
    classes: ClassTable,
    any: AnyDescriptor,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl Codec {
    /// Creates a codec with every built-in registered.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        let registry = Registry::with_builtins(&config);
        debug!(
            builtins = registry.len(),
            narrow_floats = config.narrow_floats,
            length_width = ?config.default_length_width,
            "codec initialized"
        );
        Self { config, registry, classes: ClassTable::new(), any: AnyDescriptor }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The self-describing descriptor.
    #[must_use]
    pub const fn any(&self) -> &AnyDescriptor {
        &self.any
    }

    /// Tag registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Class table used by class-instance descriptors without their own.
    #[must_use]
    pub const fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// Assigns the next free tag to `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::RegistryFull`] once all 255 tags are taken.
    pub fn register_descriptor(&mut self, descriptor: impl IntoDescriptor) -> CodecResult<u8> {
        self.registry.register(descriptor)
    }

    /// Adds a class to the table, replacing one with the same name.
    ///
    /// Indices of classes sorting after it shift, so encoder and decoder must
    /// register the same set.
    pub fn register_class(&mut self, entry: ClassEntry) {
        debug!(class = entry.name(), "registered class");
        self.classes.register(entry);
    }

    /// Replaces the whole class table.
    pub fn set_classes(&mut self, entries: impl IntoIterator<Item = ClassEntry>) {
        self.classes.set(entries);
        debug!(classes = self.classes.len(), "replaced class table");
    }

    /// Picks the built-in the self-describing path uses for `value`.
    #[must_use]
    pub fn classify(&self, value: &Value) -> Option<Builtin> {
        let builtin = classify(value, &self.config, &self.classes);
        trace!(kind = value.type_name(), ?builtin, "classified value");
        builtin
    }

    /// Exact self-describing size of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value cannot be written.
    pub fn get_size(&self, value: &Value) -> CodecResult<usize> {
        self.any.get_size(self, value)
    }

    /// Encodes `value` self-describing, as `[tag][payload]`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] if the value cannot be written.
    pub fn serialize(&self, value: &Value) -> CodecResult<Vec<u8>> {
        self.any.serialize(self, value)
    }

    /// Decodes one self-describing value from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownTag`] for an unregistered tag and a
    /// decode error for truncated or malformed payloads.
    pub fn deserialize(&self, bytes: &[u8]) -> CodecResult<Value> {
        self.any.deserialize(self, bytes)
    }

    /// Encodes `value` with the descriptor registered at `tag`, prefixed by
    /// that tag, so [`deserialize`](Self::deserialize) can read it back.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownTag`] if nothing is registered at `tag`,
    /// or [`CodecError::Validation`] if the descriptor rejects the value.
    pub fn serialize_tagged(&self, tag: u8, value: &Value) -> CodecResult<Vec<u8>> {
        let descriptor = self.registry.get(tag).ok_or(CodecError::UnknownTag(tag))?;
        let size = 1 + descriptor.get_size(self, value)?;
        let mut buf = vec![0u8; size];
        let mut cursor = WriteCursor::new(&mut buf);
        cursor.push(tag)?;
        descriptor.write_raw(self, &mut cursor, value)?;
        debug_assert_eq!(cursor.position(), size);
        Ok(buf)
    }
}
