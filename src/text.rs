//! 7-bit text packing for `Text` fields.
//!
//! A text field of `n` characters is one `n * 7`-bit integer: the first
//! character sits in the most significant 7 bits, and unused trailing
//! positions are NUL.  Only the 7-bit ASCII range is representable.
//! Fields of up to 18 characters pack into a `u128`; longer ones into a
//! [`BigUint`].

use num_bigint::BigUint;

use crate::bits::{bits_for_max_text, TEXT_CHAR_BITS};
use crate::error::{EffiError, Result};
use crate::value::Value;

/// Longest text field that still packs into a [`Value::Int`].
pub const WORD_TEXT_CHARS: u32 = u128::BITS / TEXT_CHAR_BITS;

const CHAR_MASK: u128 = (1 << TEXT_CHAR_BITS) - 1;

fn check_capacity(max_chars: u32) -> Result<()> {
    if max_chars == 0 {
        return Err(EffiError::Text("text fields hold at least one character".into()));
    }
    Ok(())
}

fn codes(s: &str, max_chars: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(max_chars as usize);
    for c in s.chars() {
        if !c.is_ascii() {
            return Err(EffiError::Text(format!("character {c:?} is outside 7-bit ASCII")));
        }
        if c == '\0' {
            return Err(EffiError::Text("NUL is reserved for padding".into()));
        }
        if out.len() as u32 == max_chars {
            return Err(EffiError::Text(format!(
                "'{s}' is longer than {max_chars} characters"
            )));
        }
        out.push(c as u8);
    }
    Ok(out)
}

/// Pack `s` into a `max_chars`-character field value.
pub fn pack(s: &str, max_chars: u32) -> Result<Value> {
    check_capacity(max_chars)?;
    let codes = codes(s, max_chars)?;
    // Right-fill with NUL so the first character stays most significant.
    let pad = (max_chars as usize - codes.len()) * TEXT_CHAR_BITS as usize;

    if max_chars <= WORD_TEXT_CHARS {
        let value = codes.iter().fold(0u128, |acc, &c| (acc << TEXT_CHAR_BITS) | c as u128);
        return Ok(Value::Int(value << pad));
    }

    let value = codes
        .iter()
        .fold(BigUint::default(), |acc, &c| (acc << TEXT_CHAR_BITS as usize) | BigUint::from(c));
    Ok(Value::from(value << pad))
}

/// Unpack a `max_chars`-character field value, dropping trailing NULs.
pub fn unpack(value: &Value, max_chars: u32) -> Result<String> {
    check_capacity(max_chars)?;
    if value.bits() > bits_for_max_text(max_chars) {
        return Err(EffiError::Text(format!("value does not fit in {max_chars} characters")));
    }

    let mut out = String::with_capacity(max_chars as usize);
    match value {
        Value::Int(v) => {
            for i in (0..max_chars as u64).rev() {
                let shift = i * TEXT_CHAR_BITS as u64;
                let code  = if shift >= u128::BITS as u64 { 0 } else { (v >> shift) & CHAR_MASK };
                out.push(code as u8 as char);
            }
        }
        Value::Big(b) => {
            let mask     = BigUint::from(CHAR_MASK);
            let mut rest = b.clone();
            let mut rev  = Vec::with_capacity(max_chars as usize);
            for _ in 0..max_chars {
                let code = (&rest & &mask).to_u32_digits().first().copied().unwrap_or(0);
                rev.push(code as u8 as char);
                rest >>= TEXT_CHAR_BITS as usize;
            }
            out.extend(rev.into_iter().rev());
        }
    }
    let trimmed = out.trim_end_matches('\0').len();
    out.truncate(trimmed);
    Ok(out)
}
