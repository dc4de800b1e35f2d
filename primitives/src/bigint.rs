//! Minimal big-endian integer encoding.
//!
//! Values are non-negative domain quantities (balances, block numbers,
//! difficulty), so only the magnitude is carried. Zero is the empty byte
//! string.

use crate::messages::BigInt;

impl BigInt {
    /// Build from big-endian bytes, stripping leading zero bytes.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self {
            value: bytes[first..].to_vec(),
        }
    }

    /// Build from a `u64`.
    pub fn from_u64(v: u64) -> Self {
        Self::from_be_bytes(&v.to_be_bytes())
    }

    /// Returns the value as a `u64`, or `None` if it does not fit.
    pub fn to_u64(&self) -> Option<u64> {
        let digits = self.significant();
        if digits.len() > 8 {
            return None;
        }
        Some(digits.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// Magnitude with any leading zeros a foreign encoder may have left.
    fn significant(&self) -> &[u8] {
        let first = self
            .value
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(self.value.len());
        &self.value[first..]
    }
}
