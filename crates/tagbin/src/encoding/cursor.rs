//! Position-tracking cursors over fixed-size byte regions.
//!
//! All fixed-width primitives are little-endian. Every operation advances the
//! offset by exactly the number of bytes it consumed or produced. Reads past
//! the end report [`CodecError::UnexpectedEnd`]; writes past the pre-computed
//! capacity report [`CodecError::Overflow`].

use crate::error::{CodecError, CodecResult};

macro_rules! read_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads a little-endian `", stringify!($ty), "`.")]
            ///
            /// # Errors
            ///
            /// Returns [`CodecError::UnexpectedEnd`] if the input is too short.
            #[inline]
            pub fn $name(&mut self) -> CodecResult<$ty> {
                Ok(<$ty>::from_le_bytes(self.take_array()?))
            }
        )*
    };
}

macro_rules! write_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a little-endian `", stringify!($ty), "`.")]
            ///
            /// # Errors
            ///
            /// Returns [`CodecError::Overflow`] if the buffer is full.
            #[inline]
            pub fn $name(&mut self, value: $ty) -> CodecResult<()> {
                self.write_bytes(&value.to_le_bytes())
            }
        )*
    };
}

/// Reading cursor over an immutable byte slice.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    /// Creates a cursor positioned at the start of `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns the next byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Consumes `n` bytes and returns them.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] if fewer than `n` bytes remain.
    pub fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(CodecError::UnexpectedEnd { needed: n, available });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consumes exactly `N` bytes into an array.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] if fewer than `N` bytes remain.
    pub fn take_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Consumes a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] at the end of input.
    #[inline]
    pub fn shift(&mut self) -> CodecResult<u8> {
        let byte = self.peek().ok_or(CodecError::UnexpectedEnd { needed: 1, available: 0 })?;
        self.pos += 1;
        Ok(byte)
    }

    read_le! {
        read_u16 => u16,
        read_u32 => u32,
        read_u64 => u64,
        read_i8 => i8,
        read_i16 => i16,
        read_i32 => i32,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
    }

    /// Reads an unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] at the end of input.
    #[inline]
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        self.shift()
    }

    /// Decodes the next `len` bytes as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] if the input is too short, or
    /// [`CodecError::InvalidUtf8`] if the bytes are not valid UTF-8.
    pub fn read_str(&mut self, len: usize) -> CodecResult<String> {
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| CodecError::InvalidUtf8(e.to_string()))
    }

    /// Decodes UTF-8 text up to the next `0x00` byte, consuming the terminator.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEnd`] if no terminator is found, or
    /// [`CodecError::InvalidUtf8`] if the bytes are not valid UTF-8.
    pub fn read_until_nul(&mut self) -> CodecResult<String> {
        let rest = &self.buf[self.pos..];
        let len = rest.iter().position(|&b| b == 0).ok_or(CodecError::UnexpectedEnd {
            needed: rest.len() + 1,
            available: rest.len(),
        })?;
        let text = self.read_str(len)?;
        self.pos += 1;
        Ok(text)
    }
}

/// Writing cursor over a pre-sized mutable byte slice.
#[derive(Debug)]
pub struct WriteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    /// Creates a cursor positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Capacity left to write.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Copies raw bytes into the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Overflow`] if the bytes do not fit.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let available = self.remaining();
        if bytes.len() > available {
            return Err(CodecError::Overflow { needed: bytes.len(), available });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Writes a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Overflow`] if the buffer is full.
    #[inline]
    pub fn push(&mut self, byte: u8) -> CodecResult<()> {
        let slot = self.buf.get_mut(self.pos).ok_or(CodecError::Overflow { needed: 1, available: 0 })?;
        *slot = byte;
        self.pos += 1;
        Ok(())
    }

    /// Reserves `n` bytes, leaving them untouched, and returns their offset.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Overflow`] if the bytes do not fit.
    pub fn skip(&mut self, n: usize) -> CodecResult<usize> {
        let available = self.remaining();
        if n > available {
            return Err(CodecError::Overflow { needed: n, available });
        }
        let start = self.pos;
        self.pos += n;
        Ok(start)
    }

    write_le! {
        write_u16 => u16,
        write_u32 => u32,
        write_u64 => u64,
        write_i8 => i8,
        write_i16 => i16,
        write_i32 => i32,
        write_i64 => i64,
        write_f32 => f32,
        write_f64 => f64,
    }

    /// Writes an unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Overflow`] if the buffer is full.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> CodecResult<()> {
        self.push(value)
    }

    /// Writes the UTF-8 bytes of `text` with no length or terminator.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Overflow`] if the text does not fit.
    pub fn write_str(&mut self, text: &str) -> CodecResult<()> {
        self.write_bytes(text.as_bytes())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        let mut buf = [0u8; 15];
        let mut cursor = WriteCursor::new(&mut buf);
        cursor.write_u16(0x0102).unwrap();
        cursor.write_i32(-2).unwrap();
        cursor.write_f64(1.5).unwrap();
        cursor.push(7).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(&buf[..6], &[0x02, 0x01, 0xFE, 0xFF, 0xFF, 0xFF]);

        let mut cursor = ReadCursor::new(&buf);
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert_eq!(cursor.read_i32().unwrap(), -2);
        assert_eq!(cursor.read_f64().unwrap(), 1.5);
        assert_eq!(cursor.shift().unwrap(), 7);
        assert_eq!(cursor.position(), 15);
    }

    #[test]
    fn write_past_capacity_overflows() {
        let mut buf = [0u8; 3];
        let mut cursor = WriteCursor::new(&mut buf);
        let err = cursor.write_u32(1).unwrap_err();
        assert_eq!(err, CodecError::Overflow { needed: 4, available: 3 });
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn read_past_end_is_unexpected_end() {
        let mut cursor = ReadCursor::new(&[1, 2]);
        assert_eq!(cursor.read_u32().unwrap_err(), CodecError::UnexpectedEnd { needed: 4, available: 2 });
        assert_eq!(cursor.take(2).unwrap(), &[1, 2]);
        assert!(cursor.shift().is_err());
    }

    #[test]
    fn nul_terminated_text() {
        let mut cursor = ReadCursor::new(b"hi\0rest");
        assert_eq!(cursor.read_until_nul().unwrap(), "hi");
        assert_eq!(cursor.position(), 3);

        let mut cursor = ReadCursor::new(b"open");
        assert!(matches!(cursor.read_until_nul(), Err(CodecError::UnexpectedEnd { .. })));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut cursor = ReadCursor::new(&[0xFF, 0xFE]);
        assert!(matches!(cursor.read_str(2), Err(CodecError::InvalidUtf8(_))));
    }

    #[test]
    fn skip_reserves_space() {
        let mut buf = [0u8; 4];
        let mut cursor = WriteCursor::new(&mut buf);
        cursor.push(1).unwrap();
        assert_eq!(cursor.skip(2).unwrap(), 1);
        cursor.push(9).unwrap();
        assert_eq!(buf, [1, 0, 0, 9]);
    }
}
