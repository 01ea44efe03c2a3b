//! MSB-first bit cursors over a single slot buffer.
//!
//! Fields are written most-significant bit first, so a slot read as one
//! big-endian integer yields the fields concatenated in schema order.
//! [`SlotWriter::write`]/[`SlotReader::read`] move at most 128 bits per call;
//! the `_value` variants stream a [`Value`] of any width as big-endian bytes.

use crate::error::{EffiError, Result};
use crate::value::Value;

const BYTE_BITS: usize = 8;
const MAX_RUN_BITS: usize = u128::BITS as usize;

#[inline]
fn mask(bits: usize) -> u128 {
    if bits >= MAX_RUN_BITS { u128::MAX } else { (1u128 << bits) - 1 }
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Writes bit runs into a zero-initialised byte slice.
#[derive(Debug)]
pub struct SlotWriter<'a> {
    buff: &'a mut [u8],
    pos:  usize,
}

impl<'a> SlotWriter<'a> {
    /// `buff` must be zeroed; bits are OR-ed in.
    pub fn new(buff: &'a mut [u8]) -> Self {
        Self { buff, pos: 0 }
    }

    /// Bits written (or skipped) so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn available(&self) -> usize {
        self.buff.len() * BYTE_BITS - self.pos
    }

    fn check(&self, bits: usize) -> Result<()> {
        if bits > MAX_RUN_BITS {
            return Err(EffiError::Schema(format!("bit run of {bits} exceeds {MAX_RUN_BITS}")));
        }
        if bits > self.available() {
            return Err(EffiError::SlotOverflow { attempted: bits, available: self.available() });
        }
        Ok(())
    }

    /// Advance over `bits` zero bits (row padding).
    pub fn skip(&mut self, bits: usize) -> Result<()> {
        if bits > self.available() {
            return Err(EffiError::SlotOverflow { attempted: bits, available: self.available() });
        }
        self.pos += bits;
        Ok(())
    }

    /// Write the low `bits` bits of `value`, most significant first.
    pub fn write(&mut self, value: u128, bits: usize) -> Result<()> {
        self.check(bits)?;
        let value = value & mask(bits);
        let mut left = bits;

        while left > 0 {
            let cursor = self.pos / BYTE_BITS;
            let space  = BYTE_BITS - self.pos % BYTE_BITS;
            let take   = space.min(left);

            let chunk = ((value >> (left - take)) & mask(take)) as u8;
            self.buff[cursor] |= chunk << (space - take);

            self.pos += take;
            left     -= take;
        }
        Ok(())
    }

    /// Write `value` as a `bits`-wide field.  The caller has checked that
    /// the value fits; excess high bits are dropped.
    pub fn write_value(&mut self, value: &Value, bits: usize) -> Result<()> {
        if let Some(v) = value.as_u128() {
            if bits <= MAX_RUN_BITS {
                return self.write(v, bits);
            }
        }
        if bits > self.available() {
            return Err(EffiError::SlotOverflow { attempted: bits, available: self.available() });
        }

        let bytes = value.to_bytes_be();
        let have  = bytes.len() * BYTE_BITS;
        if have <= bits {
            self.skip(bits - have)?;
            for &b in &bytes {
                self.write(b as u128, BYTE_BITS)?;
            }
        } else {
            let drop  = have - bits;
            let first = drop / BYTE_BITS;
            let head  = BYTE_BITS - drop % BYTE_BITS;
            self.write(bytes[first] as u128, head)?;
            for &b in &bytes[first + 1..] {
                self.write(b as u128, BYTE_BITS)?;
            }
        }
        Ok(())
    }
}

// ── Reader ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SlotReader<'a> {
    buff: &'a [u8],
    pos:  usize,
}

impl<'a> SlotReader<'a> {
    pub fn new(buff: &'a [u8]) -> Self {
        Self { buff, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn available(&self) -> usize {
        self.buff.len() * BYTE_BITS - self.pos
    }

    pub fn skip(&mut self, bits: usize) -> Result<()> {
        if bits > self.available() {
            return Err(EffiError::SlotOverflow { attempted: bits, available: self.available() });
        }
        self.pos += bits;
        Ok(())
    }

    /// Read `bits` bits as an unsigned big-endian integer.
    pub fn read(&mut self, bits: usize) -> Result<u128> {
        if bits > MAX_RUN_BITS {
            return Err(EffiError::Schema(format!("bit run of {bits} exceeds {MAX_RUN_BITS}")));
        }
        if bits > self.available() {
            return Err(EffiError::SlotOverflow { attempted: bits, available: self.available() });
        }

        let mut output = 0u128;
        let mut left   = bits;

        while left > 0 {
            let cursor = self.pos / BYTE_BITS;
            let space  = BYTE_BITS - self.pos % BYTE_BITS;
            let take   = space.min(left);

            let chunk = (self.buff[cursor] >> (space - take)) as u128 & mask(take);
            output = (output << take) | chunk;

            self.pos += take;
            left     -= take;
        }
        Ok(output)
    }

    /// Read a `bits`-wide field of any width.
    pub fn read_value(&mut self, bits: usize) -> Result<Value> {
        if bits <= MAX_RUN_BITS {
            return self.read(bits).map(Value::Int);
        }
        if bits > self.available() {
            return Err(EffiError::SlotOverflow { attempted: bits, available: self.available() });
        }

        let head = bits % BYTE_BITS;
        let mut bytes = Vec::with_capacity(bits.div_ceil(BYTE_BITS));
        if head > 0 {
            bytes.push(self.read(head)? as u8);
        }
        for _ in 0..bits / BYTE_BITS {
            bytes.push(self.read(BYTE_BITS)? as u8);
        }
        Ok(Value::from_bytes_be(&bytes))
    }
}
