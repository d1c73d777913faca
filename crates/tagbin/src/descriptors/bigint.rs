//! Variable-length arbitrary-precision integers.
//!
//! Magnitudes are written as `[len:u16][big-endian bytes]`. Zero is a single
//! `0x00` byte, so the size of a magnitude is always `ceil(hex_digits / 2) + 2`.

use std::borrow::Cow;

use malachite::base::num::arithmetic::traits::UnsignedAbs;
use malachite::base::num::conversion::traits::PowerOf2Digits;
use malachite::base::num::logic::traits::SignificantBits;
use malachite::{Integer, Natural};

use crate::codec::Codec;
use crate::encoding::{Descriptor, ReadCursor, WriteCursor};
use crate::error::{CodecError, CodecResult, Problem};
use crate::types::Value;

/// Largest magnitude the 16-bit length prefix can describe.
const MAX_MAGNITUDE_BYTES: usize = u16::MAX as usize;

/// Which sign range a big integer descriptor covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BigIntSign {
    /// Non-negative values, magnitude only.
    Unsigned,
    /// Non-positive values, written as the magnitude of the negation.
    Negative,
    /// Any value, with a leading sign byte (0 = non-negative, 1 = negative).
    Signed,
}

/// An arbitrary-precision integer with a 16-bit byte-length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigIntDescriptor {
    sign: BigIntSign,
}

impl BigIntDescriptor {
    /// Creates a descriptor covering `sign`.
    #[must_use]
    pub const fn new(sign: BigIntSign) -> Self {
        Self { sign }
    }

    fn integer<'v>(&self, value: &'v Value) -> CodecResult<&'v Integer> {
        value.as_bigint().ok_or_else(|| CodecError::unsupported(value))
    }
}

/// Big-endian magnitude bytes of `|value|`; zero encodes as `[0]`.
pub(crate) fn magnitude_bytes(value: &Integer) -> Vec<u8> {
    let bytes: Vec<u8> = value.unsigned_abs().to_power_of_2_digits_desc(8);
    if bytes.is_empty() {
        vec![0]
    } else {
        bytes
    }
}

/// Rebuilds a non-negative integer from big-endian bytes.
pub(crate) fn from_magnitude_bytes(bytes: &[u8]) -> Integer {
    Integer::from(Natural::from_power_of_2_digits_desc(8, bytes.iter().copied()).unwrap_or_default())
}

/// Number of magnitude bytes, computed from the bit length alone.
fn magnitude_len(value: &Integer) -> usize {
    let bits = usize::try_from(value.significant_bits()).unwrap_or(usize::MAX);
    bits.div_ceil(8).max(1)
}

fn write_magnitude(cursor: &mut WriteCursor<'_>, value: &Integer) -> CodecResult<()> {
    let len = u16::try_from(magnitude_len(value)).map_err(|_| CodecError::unsupported(value))?;
    cursor.write_u16(len)?;
    cursor.write_bytes(&magnitude_bytes(value))
}

fn read_magnitude(cursor: &mut ReadCursor<'_>) -> CodecResult<Integer> {
    let len = usize::from(cursor.read_u16()?);
    Ok(from_magnitude_bytes(cursor.take(len)?))
}

fn magnitude_size(value: &Integer) -> usize {
    magnitude_len(value) + 2
}

impl Descriptor for BigIntDescriptor {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self.sign {
            BigIntSign::Unsigned => "ubigint",
            BigIntSign::Negative => "negbigint",
            BigIntSign::Signed => "bigint",
        })
    }

    fn read(&self, _cx: &Codec, cursor: &mut ReadCursor<'_>) -> CodecResult<Value> {
        let value = match self.sign {
            BigIntSign::Unsigned => read_magnitude(cursor)?,
            BigIntSign::Negative => -read_magnitude(cursor)?,
            BigIntSign::Signed => {
                let negative = cursor.shift()? != 0;
                let magnitude = read_magnitude(cursor)?;
                if negative {
                    -magnitude
                } else {
                    magnitude
                }
            }
        };
        Ok(Value::BigInt(value))
    }

    fn write_raw(&self, _cx: &Codec, cursor: &mut WriteCursor<'_>, value: &Value) -> CodecResult<()> {
        let i = self.integer(value)?;
        if self.sign == BigIntSign::Signed {
            cursor.push(u8::from(*i < Integer::from(0)))?;
        }
        write_magnitude(cursor, i)
    }

    fn size_raw(&self, _cx: &Codec, value: &Value) -> CodecResult<usize> {
        let i = self.integer(value)?;
        Ok(magnitude_size(i) + usize::from(self.sign == BigIntSign::Signed))
    }

    fn find_problem(&self, _cx: &Codec, value: &Value) -> Option<Problem> {
        let Value::BigInt(i) = value else {
            return Some(self.problem("Expected a big integer"));
        };
        let zero = Integer::from(0);
        match self.sign {
            BigIntSign::Unsigned if *i < zero => {
                return Some(self.problem("Expected a non-negative big integer"));
            }
            BigIntSign::Negative if *i > zero => {
                return Some(self.problem("Expected a non-positive big integer"));
            }
            _ => {}
        }
        if magnitude_len(i) > MAX_MAGNITUDE_BYTES {
            return Some(self.problem(format!("Expected a big integer of at most {MAX_MAGNITUDE_BYTES} bytes")));
        }
        None
    }

    fn sample(&self) -> CodecResult<Value> {
        Ok(Value::BigInt(Integer::from(if self.sign == BigIntSign::Negative { -1 } else { 0 })))
    }

    fn adapt(&self, value: Value) -> Value {
        let i = match value {
            Value::BigInt(i) => i,
            Value::Number(n) if n.is_finite() => Integer::from(n.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64),
            other => return other,
        };
        let zero = Integer::from(0);
        Value::BigInt(match self.sign {
            BigIntSign::Unsigned if i < zero => -i,
            BigIntSign::Negative if i > zero => -i,
            _ => i,
        })
    }
}
