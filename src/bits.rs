//! Bit-width helpers shared by schema authors and the row codec.

use crate::error::{EffiError, Result};

/// Bits budgeted per text character.
pub const TEXT_CHAR_BITS: u32 = 7;

/// Minimum number of bits needed for any integer in `[0, max]`,
/// i.e. `ceil(log2(max + 1))`.
///
/// `bits_for_max_decimal(200) == 8`, `bits_for_max_decimal(1_000_000) == 20`.
#[inline]
pub fn bits_for_max_decimal(max: u128) -> u32 {
    u128::BITS - max.leading_zeros()
}

/// Bits needed for a text field of up to `max_chars` characters.
#[inline]
pub fn bits_for_max_text(max_chars: u32) -> u64 {
    max_chars as u64 * TEXT_CHAR_BITS as u64
}

/// Slot size in bits for a row whose fields sum to `sum_bits`.
///
/// This is `2^ceil(log2(sum_bits + 1))`: the number of bits needed to write
/// `sum_bits` itself, used as an exponent.  It is *not* the next power of two
/// above `sum_bits` (`64 -> 128`, not `64`).
///
/// Fails for an empty row and for sums under 4, whose slot would be
/// narrower than one byte.
pub fn slot_bits(sum_bits: u64) -> Result<u64> {
    if sum_bits == 0 {
        return Err(EffiError::Schema("total field width is zero".into()));
    }
    let exponent = u64::BITS - sum_bits.leading_zeros();
    let bits = 1u64
        .checked_shl(exponent)
        .filter(|&b| b != 0)
        .ok_or_else(|| EffiError::Schema(format!("total width {sum_bits} bits is too large")))?;
    if bits < 8 {
        return Err(EffiError::Schema(format!(
            "total width {sum_bits} bits gives a {bits}-bit slot, narrower than one byte"
        )));
    }
    Ok(bits)
}
