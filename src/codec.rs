//! Row codec: packs a tuple of field values into one fixed-size slot and back.
//!
//! # Slot layout
//! A row's fields are concatenated MSB-first in schema order (`sum_bits`
//! bits), then left-padded with zero bits up to `slot_bits`, where
//!
//! ```text
//! slot_bits = 2 ^ ceil(log2(sum_bits + 1))
//! ```
//!
//! The padded bit string is stored as one unsigned big-endian integer of
//! `slot_bits / 8` bytes.  There is no header, no length prefix and no
//! checksum: a file is a flat run of slots.
//!
//! # Caching
//! [`RowLayout`] holds the resolved widths and the slot size.  Build it once
//! per open file and reuse it for every row; the free [`encode`] / [`decode`]
//! functions rebuild it on each call.
//!
//! # Fast path
//! Slots of up to 16 bytes are packed into a single `u128` accumulator and
//! serialised with `byteorder`; every value in such a slot is a
//! [`Value::Int`].  Wider slots, including any field over 128 bits, go
//! through [`SlotWriter`]/[`SlotReader`].

use byteorder::{BigEndian, ByteOrder};

use crate::bitpack::{SlotReader, SlotWriter};
use crate::bits::slot_bits;
use crate::error::{EffiError, Result};
use crate::resolve::{resolve, ResolvedWidths};
use crate::schema::Schema;
use crate::value::Value;

/// One value per schema field, in schema order.
pub type Row = Vec<Value>;

/// Widest slot handled by the single-accumulator path.
const FAST_SLOT_BYTES: usize = 16;

// ── RowLayout ────────────────────────────────────────────────────────────────

/// Resolved widths plus the derived slot size for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    widths:     ResolvedWidths,
    sum_bits:   u64,
    slot_bits:  u64,
    slot_bytes: usize,
}

impl RowLayout {
    /// Resolve `schema` and derive its slot size.
    pub fn new(schema: &Schema) -> Result<Self> {
        Self::from_widths(resolve(schema)?)
    }

    pub fn from_widths(widths: ResolvedWidths) -> Result<Self> {
        let sum_bits  = widths.sum_bits();
        let slot_bits = slot_bits(sum_bits)?;
        let slot_bytes = usize::try_from(slot_bits / 8)
            .map_err(|_| EffiError::Schema(format!("{slot_bits}-bit slot is too large")))?;
        Ok(Self { widths, sum_bits, slot_bits, slot_bytes })
    }

    pub fn widths(&self) -> &ResolvedWidths {
        &self.widths
    }

    pub fn field_count(&self) -> usize {
        self.widths.len()
    }

    /// Total field bits per row, excluding padding.
    pub fn sum_bits(&self) -> u64 {
        self.sum_bits
    }

    pub fn slot_bits(&self) -> u64 {
        self.slot_bits
    }

    pub fn slot_bytes(&self) -> usize {
        self.slot_bytes
    }

    /// Leading zero bits in every slot.
    pub fn padding_bits(&self) -> u64 {
        self.slot_bits - self.sum_bits
    }

    /// Byte offset of row `index` within a file.
    pub fn offset_of(&self, index: u64) -> u64 {
        index * self.slot_bytes as u64
    }

    /// Number of whole slots in `len` bytes.
    ///
    /// Fails with [`EffiError::TruncatedRecord`] if `len` is not an exact
    /// multiple of the slot size.
    pub fn row_count(&self, len: u64) -> Result<u64> {
        let slot = self.slot_bytes as u64;
        if len % slot != 0 {
            return Err(EffiError::TruncatedRecord { len, slot_bytes: self.slot_bytes });
        }
        Ok(len / slot)
    }

    // ── Encode ───────────────────────────────────────────────────────────────

    /// Validate arity and per-field ranges without touching any buffer.
    pub fn check_row(&self, row: &[Value]) -> Result<()> {
        if row.len() != self.widths.len() {
            return Err(EffiError::RowShape { expected: self.widths.len(), actual: row.len() });
        }
        for (field, (value, &width)) in row.iter().zip(self.widths.as_slice()).enumerate() {
            if !value.fits(width) {
                return Err(EffiError::FieldOverflow { field, value: value.clone(), width });
            }
        }
        Ok(())
    }

    /// Encode one row into a freshly allocated slot.
    pub fn encode(&self, row: &[Value]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.slot_bytes);
        self.encode_into(row, &mut out)?;
        Ok(out)
    }

    /// Append one encoded slot to `out`.  On error `out` is left unchanged.
    pub fn encode_into(&self, row: &[Value], out: &mut Vec<u8>) -> Result<()> {
        self.check_row(row)?;

        let start = out.len();
        out.resize(start + self.slot_bytes, 0);
        let slot = &mut out[start..];

        let packed = if self.slot_bytes <= FAST_SLOT_BYTES {
            self.pack_fast(row, slot)
        } else {
            self.pack_wide(row, slot)
        };

        if let Err(e) = packed {
            out.truncate(start);
            return Err(e);
        }
        Ok(())
    }

    fn pack_fast(&self, row: &[Value], slot: &mut [u8]) -> Result<()> {
        // sum_bits < slot_bits <= 128 here, so no shift reaches 128.
        let mut acc = 0u128;
        for (field, (value, &width)) in row.iter().zip(self.widths.as_slice()).enumerate() {
            let v = value
                .as_u128()
                .ok_or_else(|| EffiError::FieldOverflow { field, value: value.clone(), width })?;
            acc = (acc << width) | v;
        }
        BigEndian::write_uint128(slot, acc, self.slot_bytes);
        Ok(())
    }

    fn pack_wide(&self, row: &[Value], slot: &mut [u8]) -> Result<()> {
        let mut writer = SlotWriter::new(slot);
        writer.skip(self.padding_bits() as usize)?;
        for (value, &width) in row.iter().zip(self.widths.as_slice()) {
            writer.write_value(value, width as usize)?;
        }
        Ok(())
    }

    // ── Decode ───────────────────────────────────────────────────────────────

    /// Decode exactly one slot.  Padding bits are ignored.
    pub fn decode_slot(&self, slot: &[u8]) -> Result<Row> {
        if slot.len() != self.slot_bytes {
            return Err(EffiError::TruncatedRecord {
                len:        slot.len() as u64,
                slot_bytes: self.slot_bytes,
            });
        }

        if self.slot_bytes <= FAST_SLOT_BYTES {
            Ok(self.unpack_fast(slot))
        } else {
            self.unpack_wide(slot)
        }
    }

    /// Decode a concatenation of slots.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<Row>> {
        self.row_count(bytes.len() as u64)?;
        bytes
            .chunks_exact(self.slot_bytes)
            .map(|slot| self.decode_slot(slot))
            .collect()
    }

    fn unpack_fast(&self, slot: &[u8]) -> Row {
        let mut acc = BigEndian::read_uint128(slot, self.slot_bytes);
        let mut row = vec![Value::default(); self.widths.len()];
        for (value, &width) in row.iter_mut().zip(self.widths.as_slice()).rev() {
            *value = Value::Int(acc & ((1u128 << width) - 1));
            acc >>= width;
        }
        row
    }

    fn unpack_wide(&self, slot: &[u8]) -> Result<Row> {
        let mut reader = SlotReader::new(slot);
        reader.skip(self.padding_bits() as usize)?;
        self.widths
            .as_slice()
            .iter()
            .map(|&width| reader.read_value(width as usize))
            .collect()
    }
}

// ── Free functions ───────────────────────────────────────────────────────────

/// Encode a single row under `widths`.  Prefer a cached [`RowLayout`].
pub fn encode(row: &[Value], widths: &ResolvedWidths) -> Result<Vec<u8>> {
    RowLayout::from_widths(widths.clone())?.encode(row)
}

/// Decode a run of `num_bits`-bit slots under `widths`.
///
/// Fails with [`EffiError::Schema`] if `num_bits` is not the slot size the
/// widths imply.
pub fn decode(bytes: &[u8], widths: &ResolvedWidths, num_bits: u64) -> Result<Vec<Row>> {
    let layout = RowLayout::from_widths(widths.clone())?;
    if layout.slot_bits != num_bits {
        return Err(EffiError::Schema(format!(
            "slot size {num_bits} bits does not match the {}-bit slot of these widths",
            layout.slot_bits
        )));
    }
    layout.decode(bytes)
}
