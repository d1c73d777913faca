//! Text descriptors: length-prefixed and NUL-terminated UTF-8.

use std::borrow::Cow;

use regex::Regex;

use crate::codec::Codec;
use crate::config::IntWidth;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{index_segment, CodecError, CodecResult, Problem};
use crate::types::Value;

/// Pattern and length rules shared by every text descriptor.
///
/// Lengths count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextConstraints {
    pattern: Option<Regex>,
    min_chars: usize,
    max_chars: Option<usize>,
}

impl TextConstraints {
    fn check(&self, value: &Value) -> Result<(), String> {
        let Value::String(s) = value else {
            return Err("Expected a string".to_owned());
        };
        if let Some(re) = &self.pattern {
            if !re.is_match(s) {
                return Err(format!("Expected a string matching the regex: /{}/", re.as_str()));
            }
        }
        let chars = s.chars().count();
        if chars < self.min_chars {
            return Err(format!("Expected a string of at least {} characters", self.min_chars));
        }
        if let Some(max) = self.max_chars {
            if chars > max {
                return Err(format!("Expected a string of at most {max} characters"));
            }
        }
        Ok(())
    }
}

/// Builder methods shared by the text descriptors.
macro_rules! constraint_builders {
    () => {
        /// Requires the text to match `pattern`.
        #[must_use]
        pub fn pattern(mut self, pattern: Regex) -> Self {
            self.constraints.pattern = Some(pattern);
            self
        }

        /// Requires at least `len` characters.
        #[must_use]
        pub fn min_len(mut self, len: usize) -> Self {
            self.constraints.min_chars = len;
            self
        }

        /// Allows at most `len` characters.
        #[must_use]
        pub fn max_len(mut self, len: usize) -> Self {
            self.constraints.max_chars = Some(len);
            self
        }

        /// Requires exactly `len` characters.
        #[must_use]
        pub fn exact_len(self, len: usize) -> Self {
            self.min_len(len).max_len(len)
        }
    };
}

/// Text written as `[byte_len][utf8...]` with a 1, 2 or 4 byte length.
#[derive(Debug, Clone)]
pub struct LengthPrefixedText {
    width: IntWidth,
    constraints: TextConstraints,
}

impl LengthPrefixedText {
    /// Creates a text descriptor whose byte length is written at `width`.
    #[must_use]
    pub fn new(width: IntWidth) -> Self {
        Self { width, constraints: TextConstraints::default() }
    }

    /// Width of the length prefix.
    #[must_use]
    pub const fn width(&self) -> IntWidth {
        self.width
    }

    constraint_builders!();
}

impl Descriptor for LengthPrefixedText {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self.width {
            IntWidth::U8 => "string8",
            IntWidth::U16 => "string16",
            IntWidth::U32 => "string32",
            IntWidth::U64 => "string64",
        })
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let len = self.width.read(cursor)?;
        Ok(Value::String(cursor.read_str(len)?))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let s = value.as_str().ok_or_else(|| CodecError::unsupported(value))?;
        self.width.write(cursor, s.len())?;
        cursor.write_str(s)
    }

    fn size_raw(&self, _cx: &Codec, value: &Value) -> CodecResult<usize> {
        let s = value.as_str().ok_or_else(|| CodecError::unsupported(value))?;
        Ok(self.width.size() + s.len())
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        if let Err(message) = self.constraints.check(value) {
            return Some(self.problem(message));
        }
        let len = value.as_str().map_or(0, str::len);
        if !self.width.fits(len) {
            return Some(self.problem(format!("Expected a string of at most {} bytes", self.width.max())));
        }
        None
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::String(" ".repeat(self.constraints.min_chars)))
    }

    fn adapt(&self, value: Value) -> Value {
        let mut s = match value {
            Value::String(s) => s,
            Value::Undefined | Value::Null => String::new(),
            other => other.to_string(),
        };
        if let Some(max) = self.constraints.max_chars {
            truncate_chars(&mut s, max);
        }
        let max_bytes = usize::try_from(self.width.max()).unwrap_or(usize::MAX);
        truncate_bytes(&mut s, max_bytes);
        Value::String(s)
    }
}

/// Text written as raw UTF-8 followed by a single `0x00`.
///
/// Embedded NUL characters are rejected at validation time.
#[derive(Debug, Clone, Default)]
pub struct NulTerminatedText {
    constraints: TextConstraints,
}

impl NulTerminatedText {
    /// Creates an unconstrained NUL-terminated text descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    constraint_builders!();
}

impl Descriptor for NulTerminatedText {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("string")
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        Ok(Value::String(cursor.read_until_nul()?))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let s = value.as_str().ok_or_else(|| CodecError::unsupported(value))?;
        cursor.write_str(s)?;
        cursor.push(0)
    }

    fn size_raw(&self, _cx: &Codec, value: &Value) -> CodecResult<usize> {
        let s = value.as_str().ok_or_else(|| CodecError::unsupported(value))?;
        Ok(s.len() + 1)
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        if let Err(message) = self.constraints.check(value) {
            return Some(self.problem(message));
        }
        let bytes = value.as_str().map_or(&[][..], str::as_bytes);
        bytes
            .iter()
            .position(|&b| b == 0)
            .map(|i| self.problem("Unexpected null byte").at(index_segment(i)))
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::String(" ".repeat(self.constraints.min_chars)))
    }

    fn adapt(&self, value: Value) -> Value {
        let mut s = match value {
            Value::String(s) => s,
            Value::Undefined | Value::Null => String::new(),
            other => other.to_string(),
        };
        s.retain(|c| c != '\0');
        if let Some(max) = self.constraints.max_chars {
            truncate_chars(&mut s, max);
        }
        Value::String(s)
    }
}

fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

fn truncate_bytes(s: &mut String, max: usize) {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
}
