//! Field values of unbounded width.
//!
//! Most fields fit a machine word and travel as [`Value::Int`].  A field wider
//! than 128 bits (a long text field, a large decimal) carries a
//! [`BigUint`](num_bigint::BigUint) instead.  The representation is canonical:
//! anything that fits in a `u128` is always `Int`, so derived equality is
//! numeric equality.

use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use num_bigint::{BigUint, ParseBigIntError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(u128),
    /// Strictly greater than `u128::MAX`.
    Big(BigUint),
}

impl Value {
    /// Number of significant bits; `0` for zero.
    pub fn bits(&self) -> u64 {
        match self {
            Value::Int(v) => (u128::BITS - v.leading_zeros()) as u64,
            Value::Big(b) => b.bits(),
        }
    }

    /// `true` if the value is representable in `width` bits.
    #[inline]
    pub fn fits(&self, width: u32) -> bool {
        self.bits() <= width as u64
    }

    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Big(_) => None,
        }
    }

    pub fn to_biguint(&self) -> BigUint {
        match self {
            Value::Int(v) => BigUint::from(*v),
            Value::Big(b) => b.clone(),
        }
    }

    /// Big-endian magnitude.  May carry leading zero bytes.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        match self {
            Value::Int(v) => v.to_be_bytes().to_vec(),
            Value::Big(b) => b.to_bytes_be(),
        }
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        BigUint::from_bytes_be(bytes).into()
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl From<BigUint> for Value {
    fn from(b: BigUint) -> Self {
        if b.bits() <= u128::BITS as u64 {
            let bytes = b.to_bytes_be();
            Value::Int(BigEndian::read_uint128(&bytes, bytes.len()))
        } else {
            Value::Big(b)
        }
    }
}

impl From<u128> for Value {
    fn from(v: u128) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v as u128)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as u128)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Big(b) => write!(f, "{b}"),
        }
    }
}

impl FromStr for Value {
    type Err = ParseBigIntError;

    /// Unsigned decimal digits of any length.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u128>() {
            Ok(v)  => Ok(Value::Int(v)),
            Err(_) => s.parse::<BigUint>().map(Value::from),
        }
    }
}

/// Build a row from word-sized values.
pub fn row_of(values: &[u128]) -> Vec<Value> {
    values.iter().map(|&v| Value::Int(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form() {
        let small = Value::from(BigUint::from(u128::MAX));
        assert_eq!(small, Value::Int(u128::MAX));
        assert_eq!(Value::from(BigUint::from(0u8)), Value::Int(0));

        let big = Value::from(BigUint::from(u128::MAX) + 1u8);
        assert!(matches!(big, Value::Big(_)));
        assert_eq!(big.bits(), 129);
        assert!(!big.fits(128));
        assert!(big.fits(129));
    }

    #[test]
    fn test_bits_and_fits() {
        assert_eq!(Value::Int(0).bits(), 0);
        assert_eq!(Value::Int(255).bits(), 8);
        assert!(Value::Int(255).fits(8));
        assert!(!Value::Int(256).fits(8));
        assert!(Value::Int(u128::MAX).fits(128));
        assert!(Value::Int(0).fits(1));
    }

    #[test]
    fn test_decimal_text() {
        let digits = "1606938044258990275541962092341162602522202993782792835301375"; // 2^200 - 1
        let v: Value = digits.parse().unwrap();
        assert_eq!(v.bits(), 200);
        assert_eq!(v.to_string(), digits);
        assert_eq!("42".parse::<Value>().unwrap(), Value::Int(42));
        assert!("-1".parse::<Value>().is_err());
        assert!("x1".parse::<Value>().is_err());
    }

    #[test]
    fn test_bytes_be() {
        let v = Value::from_bytes_be(&[0, 0, 1, 2]);
        assert_eq!(v, Value::Int(0x0102));
        let wide = Value::from_bytes_be(&[0xFF; 20]);
        assert_eq!(wide.bits(), 160);
        assert_eq!(Value::from_bytes_be(&wide.to_bytes_be()), wide);
    }
}
