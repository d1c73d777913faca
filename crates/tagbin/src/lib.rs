//! `tagbin`
//!
//! A compact binary value codec built around type descriptors.
//!
//! # Overview
//!
//! Every encodable type is described by a [`Descriptor`]: how to validate a
//! [`Value`], compute its exact encoded size, write it, and read it back.
//! Descriptors compose into arrays, tuples, keyed records, maps, registered
//! class instances and tagged unions.
//!
//! Two modes share the same descriptors:
//!
//! - **Schema-first**: both sides agree on a descriptor, and the wire carries
//!   no type information at all.
//! - **Self-describing**: [`Codec::serialize`] prefixes every value with a
//!   one-byte tag chosen by a runtime classifier, so decoding needs no schema.
//!
//! # Example
//!
//! ```
//! use tagbin::descriptors::{struct_of, u8};
//! use tagbin::{Codec, DescriptorExt, Record, Value};
//!
//! let codec = Codec::default();
//!
//! // Schema-first: fields are written in sorted key order, without keys.
//! let point = struct_of([("y", u8()), ("x", u8())]);
//! let value = Value::Object(Record::new().with("x", 10).with("y", 20));
//! assert_eq!(point.serialize(&codec, &value).unwrap(), [0x0A, 0x14]);
//!
//! // Self-describing: the bytes carry their own type tags.
//! let bytes = codec.serialize(&value).unwrap();
//! assert_eq!(codec.deserialize(&bytes).unwrap(), value);
//! ```
//!
//! # Modules
//!
//! - [`descriptors`] - Built-in descriptors and their constructors
//! - [`encoding`] - The descriptor contract and byte cursors
//! - [`registry`] - Tag registry and runtime classification
//! - [`deferred`] - Records with asynchronously produced fields
//! - [`types`] - The [`Value`] model
//! - [`error`] - Error types ([`CodecError`], [`Problem`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod codec;
pub mod config;
pub mod deferred;
pub mod descriptors;
pub mod encoding;
pub mod error;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use codec::Codec;
pub use config::{CodecConfig, IntWidth};
pub use encoding::{Descriptor, DescriptorExt, DescriptorRef, IntoDescriptor};
pub use error::{CodecError, CodecResult, Problem};
pub use registry::Builtin;
pub use types::{Instance, Record, TypedArray, TypedArrayKind, Value};
