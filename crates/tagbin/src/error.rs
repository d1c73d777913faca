//! Error types for the codec.
//!
//! Validation failures travel through the descriptor tree as [`Problem`]
//! values. They only become a [`CodecError`] at the public entry points
//! (`validate`, `get_size`, `write`, `serialize`). Decode failures are always
//! fatal and are reported directly as [`CodecError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length for value display in error messages.
const MAX_VALUE_DISPLAY_LEN: usize = 100;

/// Result alias used throughout the crate.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A value does not match the shape, range, or pattern of a descriptor.
    #[error("{0}")]
    Validation(Problem),

    /// The input ended before a read completed.
    #[error("unexpected end of input: needed {needed} bytes, {available} available")]
    UnexpectedEnd {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// A write went past the pre-computed capacity of the output buffer.
    #[error("buffer overflow: needed {needed} bytes, {available} available")]
    Overflow {
        /// Bytes the write required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// A self-describing payload started with a tag that is not registered.
    #[error("unknown type tag: {0:#04x}")]
    UnknownTag(u8),

    /// A class instance payload referenced a class index outside the table.
    #[error("unknown class index {index} (table holds {classes} classes)")]
    UnknownClassIndex {
        /// The decoded index.
        index: usize,
        /// Number of classes in the table.
        classes: usize,
    },

    /// A tagged union payload referenced a candidate that does not exist.
    #[error("unknown union candidate {index} (union has {candidates} candidates)")]
    UnknownCandidate {
        /// The decoded candidate index.
        index: usize,
        /// Number of candidates in the union.
        candidates: usize,
    },

    /// The tag registry already holds 255 descriptors.
    #[error("tag registry is full: at most 255 descriptors can be registered")]
    RegistryFull,

    /// A tagged union was built with more candidates than one index byte can address.
    #[error("too many union candidates: {0} (at most 255)")]
    TooManyCandidates(usize),

    /// Decoded text was not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// A decoded length header exceeds the configured element limit.
    #[error("decoded length {length} exceeds the limit of {limit} elements")]
    LengthLimit {
        /// The decoded length.
        length: u64,
        /// The configured limit.
        limit: usize,
    },

    /// The descriptor cannot produce a sample value.
    #[error("cannot make a sample for {0}")]
    NoSample(String),

    /// A value reached a raw operation that cannot represent it.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    /// A deferred sub-write or sub-read failed.
    #[error("deferred operation failed: {0}")]
    Deferred(String),
}

impl CodecError {
    /// Creates an unsupported value error, truncating the rendered value.
    #[must_use]
    pub fn unsupported(value: impl fmt::Display) -> Self {
        let value_str = value.to_string();
        let truncated = if value_str.len() > MAX_VALUE_DISPLAY_LEN {
            let mut end = MAX_VALUE_DISPLAY_LEN;
            while !value_str.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &value_str[..end])
        } else {
            value_str
        };
        Self::UnsupportedValue(truncated)
    }

    /// Returns the validation problem, if this is a validation failure.
    #[must_use]
    pub const fn problem(&self) -> Option<&Problem> {
        match self {
            Self::Validation(problem) => Some(problem),
            _ => None,
        }
    }
}

impl From<Problem> for CodecError {
    fn from(problem: Problem) -> Self {
        Self::Validation(problem)
    }
}

/// A path-annotated validation failure.
///
/// A problem is created by the descriptor that rejected a value (the
/// *origin*). As it propagates outward through composite descriptors each
/// level prepends its own path segment and becomes the new *site*, so the
/// final path reads from the outermost descriptor inward.
///
/// # Example
///
/// ```
/// use tagbin::Problem;
///
/// let problem = Problem::new("Expected an integer", "u8")
///     .shifted("[2]", "u8[]")
///     .shifted("[\"items\"]", "record");
///
/// assert_eq!(problem.path(), "[\"items\"][2]");
/// assert_eq!(problem.to_string(), "record[\"items\"][2] -> u8: Expected an integer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    message: String,
    origin: String,
    site: String,
    path: String,
}

impl Problem {
    /// Creates a problem raised by the descriptor named `origin`.
    #[must_use]
    pub fn new(message: impl Into<String>, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self { message: message.into(), site: origin.clone(), origin, path: String::new() }
    }

    /// Appends a path segment inside the originating descriptor.
    #[must_use]
    pub fn at(mut self, segment: impl AsRef<str>) -> Self {
        self.path.push_str(segment.as_ref());
        self
    }

    /// Prepends a path segment and moves the call site outward to `site`.
    #[must_use]
    pub fn shifted(mut self, segment: impl AsRef<str>, site: impl Into<String>) -> Self {
        self.path.insert_str(0, segment.as_ref());
        self.site = site.into();
        self
    }

    /// Moves the call site outward without adding a path segment.
    #[must_use]
    pub fn owned_by(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// The human-readable reason.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the descriptor that rejected the value.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Name of the outermost descriptor the problem propagated to.
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Accumulated location path, outer to inner.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.site, self.path)?;
        if self.site != self.origin {
            write!(f, " -> {}", self.origin)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Renders a record key as a path segment, e.g. `["name"]`.
pub(crate) fn key_segment(key: &str) -> String {
    format!("[{key:?}]")
}

/// Renders a sequence position as a path segment, e.g. `[2]`.
pub(crate) fn index_segment(index: usize) -> String {
    format!("[{index}]")
}
