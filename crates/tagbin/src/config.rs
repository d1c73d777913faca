//! Codec configuration.

use serde::{Deserialize, Serialize};

use crate::encoding::{ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult};

/// Width of an unsigned count or index written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntWidth {
    /// 1 byte.
    U8,
    /// 2 bytes.
    U16,
    /// 4 bytes.
    U32,
    /// 8 bytes.
    U64,
}

impl IntWidth {
    /// Encoded size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    /// Largest value the width can hold.
    #[must_use]
    pub const fn max(self) -> u64 {
        match self {
            Self::U8 => u8::MAX as u64,
            Self::U16 => u16::MAX as u64,
            Self::U32 => u32::MAX as u64,
            Self::U64 => u64::MAX,
        }
    }

    /// Narrowest width able to hold `value`.
    #[must_use]
    pub const fn for_max(value: u64) -> Self {
        if value <= Self::U8.max() {
            Self::U8
        } else if value <= Self::U16.max() {
            Self::U16
        } else if value <= Self::U32.max() {
            Self::U32
        } else {
            Self::U64
        }
    }

    /// Returns `true` if a count of `n` fits in this width.
    #[must_use]
    pub const fn fits(self, n: usize) -> bool {
        n as u64 <= self.max()
    }

    /// Writes `n` at this width.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedValue`] if `n` does not fit, or
    /// [`CodecError::Overflow`] if the buffer is full.
    pub fn write(self, cursor: &mut WriteCursor<'_>, n: usize) -> CodecResult<()> {
        if !self.fits(n) {
            return Err(CodecError::unsupported(format_args!("count {n} does not fit in {self:?}")));
        }
        match self {
            Self::U8 => cursor.write_u8(n as u8),
            Self::U16 => cursor.write_u16(n as u16),
            Self::U32 => cursor.write_u32(n as u32),
            Self::U64 => cursor.write_u64(n as u64),
        }
    }

    /// Reads a count written at this width.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] if the input is too short, or
    /// [`CodecError::LengthLimit`] if the count does not fit in `usize`.
    pub fn read(self, cursor: &mut ReadCursor<'_>) -> CodecResult<usize> {
        self.read_count(cursor, usize::MAX)
    }

    /// Reads a collection count and checks it against `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] if the input is too short, or
    /// [`CodecError::LengthLimit`] if the count exceeds `limit`.
    pub fn read_count(self, cursor: &mut ReadCursor<'_>, limit: usize) -> CodecResult<usize> {
        let n = match self {
            Self::U8 => u64::from(cursor.read_u8()?),
            Self::U16 => u64::from(cursor.read_u16()?),
            Self::U32 => u64::from(cursor.read_u32()?),
            Self::U64 => cursor.read_u64()?,
        };
        match usize::try_from(n) {
            Ok(len) if len <= limit => Ok(len),
            _ => Err(CodecError::LengthLimit { length: n, limit }),
        }
    }
}

/// Configuration for a [`Codec`](crate::Codec).
///
/// # Example
///
/// ```
/// use tagbin::{CodecConfig, IntWidth};
///
/// let config = CodecConfig::new()
///     .narrow_floats(true)
///     .default_length_width(IntWidth::U16)
///     .max_decode_elements(1024);
///
/// assert!(config.narrow_floats);
/// assert_eq!(config.default_length_width, IntWidth::U16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Classify non-integral numbers that survive an `f32` round trip as
    /// 32-bit floats (default: false).
    pub narrow_floats: bool,

    /// Width of the count prefix used by the built-in collection
    /// descriptors (default: `U32`).
    pub default_length_width: IntWidth,

    /// Largest collection length accepted while decoding (default: 2^24).
    pub max_decode_elements: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { narrow_floats: false, default_length_width: IntWidth::U32, max_decode_elements: 1 << 24 }
    }
}

impl CodecConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable 32-bit float narrowing in the classifier.
    #[must_use]
    pub const fn narrow_floats(mut self, enabled: bool) -> Self {
        self.narrow_floats = enabled;
        self
    }

    /// Set the count prefix width of the built-in collection descriptors.
    #[must_use]
    pub const fn default_length_width(mut self, width: IntWidth) -> Self {
        self.default_length_width = width;
        self
    }

    /// Set the largest collection length accepted while decoding.
    #[must_use]
    pub const fn max_decode_elements(mut self, limit: usize) -> Self {
        self.max_decode_elements = limit;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn width_for_max_picks_narrowest() {
        assert_eq!(IntWidth::for_max(0), IntWidth::U8);
        assert_eq!(IntWidth::for_max(255), IntWidth::U8);
        assert_eq!(IntWidth::for_max(256), IntWidth::U16);
        assert_eq!(IntWidth::for_max(65_536), IntWidth::U32);
        assert_eq!(IntWidth::for_max(u64::from(u32::MAX) + 1), IntWidth::U64);
    }

    #[test]
    fn width_write_read() {
        let mut buf = [0u8; 3];
        let mut cursor = WriteCursor::new(&mut buf);
        IntWidth::U16.write(&mut cursor, 513).unwrap();
        assert!(IntWidth::U8.write(&mut cursor, 256).is_err());
        IntWidth::U8.write(&mut cursor, 5).unwrap();
        assert_eq!(buf, [0x01, 0x02, 5]);

        let mut cursor = ReadCursor::new(&buf);
        assert_eq!(IntWidth::U16.read(&mut cursor).unwrap(), 513);
        assert_eq!(IntWidth::U8.read(&mut cursor).unwrap(), 5);
    }

    #[test]
    fn count_limit_reports_decoded_length() {
        let buf = (1u64 << 40).to_le_bytes();
        let err = IntWidth::U64.read_count(&mut ReadCursor::new(&buf), 4).unwrap_err();
        assert_eq!(err, CodecError::LengthLimit { length: 1 << 40, limit: 4 });
        assert_eq!(IntWidth::U64.read_count(&mut ReadCursor::new(&4u64.to_le_bytes()), 4).unwrap(), 4);
    }

    #[test]
    fn config_defaults() {
        let config = CodecConfig::default();
        assert!(!config.narrow_floats);
        assert_eq!(config.default_length_width, IntWidth::U32);
        assert_eq!(config.max_decode_elements, 1 << 24);
    }
}
