#![forbid(unsafe_code)]

//! 20-byte account addresses and the L1→L2 address alias.
//!
//! When a message is relayed from L1 to L2 the transport rewrites its apparent
//! sender to `alias(sender)`, where
//! `alias(a) = (a + 0x1111000000000000000000000000000000001111) mod 2^160`.
//! The recorder on L2 therefore trusts the aliased address of its L1
//! counterpart, never the raw one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address offset applied by the transport when relaying L1 → L2.
pub const L1_TO_L2_ALIAS_OFFSET: Address = Address([
    0x11, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x11, 0x11,
]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// 20-byte account identifier encoded as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address whose low 8 bytes hold `v` big-endian. Handy for fixtures.
    pub fn from_low_u64(v: u64) -> Self {
        let mut out = [0u8; 20];
        out[12..].copy_from_slice(&v.to_be_bytes());
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let raw = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        if raw.len() != 20 {
            return Err(AddressError::InvalidLength(raw.len()));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&raw);
        Ok(Self(out))
    }

    /// Apparent L2 sender of a message relayed from this L1 address.
    pub fn alias(&self) -> Address {
        Address(wrapping_add(&self.0, &L1_TO_L2_ALIAS_OFFSET.0))
    }

    /// Inverse of [`Address::alias`].
    pub fn dealias(&self) -> Address {
        Address(wrapping_sub(&self.0, &L1_TO_L2_ALIAS_OFFSET.0))
    }
}

fn wrapping_add(a: &[u8; 20], b: &[u8; 20]) -> [u8; 20] {
    let mut out = [0u8; 20];
    let mut carry = 0u8;
    for i in (0..20).rev() {
        let (s1, c1) = a[i].overflowing_add(b[i]);
        let (s2, c2) = s1.overflowing_add(carry);
        out[i] = s2;
        carry = u8::from(c1 || c2);
    }
    out
}

fn wrapping_sub(a: &[u8; 20], b: &[u8; 20]) -> [u8; 20] {
    let mut out = [0u8; 20];
    let mut borrow = 0u8;
    for i in (0..20).rev() {
        let (d1, b1) = a[i].overflowing_sub(b[i]);
        let (d2, b2) = d1.overflowing_sub(borrow);
        out[i] = d2;
        borrow = u8::from(b1 || b2);
    }
    out
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
