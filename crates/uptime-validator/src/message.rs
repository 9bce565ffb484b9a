#![forbid(unsafe_code)]

//! Calldata for the recorder's `updateStatus(bool,uint64)` entry point.
//!
//! Layout: 4-byte selector followed by two 32-byte big-endian words.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;
use uptime_core::Timestamp;

pub const UPDATE_STATUS_SIGNATURE: &str = "updateStatus(bool,uint64)";
pub const SELECTOR_LEN: usize = 4;
pub const WORD_LEN: usize = 32;
pub const ENCODED_LEN: usize = SELECTOR_LEN + 2 * WORD_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("bad calldata length: expected {expected}, got {found}")]
    Length { expected: usize, found: usize },
    #[error("unknown selector 0x{found}")]
    Selector { found: String },
    #[error("status word is not a boolean")]
    InvalidBool,
    #[error("timestamp word does not fit in uint64")]
    TimestampOverflow,
}

/// First four bytes of Keccak-256 over a function signature.
pub fn selector(signature: &str) -> [u8; SELECTOR_LEN] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; SELECTOR_LEN];
    out.copy_from_slice(&digest[..SELECTOR_LEN]);
    out
}

pub fn update_status_selector() -> [u8; SELECTOR_LEN] {
    selector(UPDATE_STATUS_SIGNATURE)
}

/// A status report as carried across domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReportMessage {
    pub status: bool,
    pub timestamp: Timestamp,
}

impl StatusReportMessage {
    pub fn new(status: bool, timestamp: Timestamp) -> Self {
        Self { status, timestamp }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_LEN);
        out.extend_from_slice(&update_status_selector());
        out.extend_from_slice(&word(u64::from(self.status)));
        out.extend_from_slice(&word(self.timestamp));
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, MessageError> {
        if data.len() != ENCODED_LEN {
            return Err(MessageError::Length {
                expected: ENCODED_LEN,
                found: data.len(),
            });
        }
        let (sel, rest) = data.split_at(SELECTOR_LEN);
        if sel != update_status_selector() {
            return Err(MessageError::Selector {
                found: hex::encode(sel),
            });
        }
        let (status_word, ts_word) = rest.split_at(WORD_LEN);

        let status = match read_u64(status_word) {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(MessageError::InvalidBool),
        };
        let timestamp = read_u64(ts_word).ok_or(MessageError::TimestampOverflow)?;
        Ok(Self { status, timestamp })
    }
}

fn word(v: u64) -> [u8; WORD_LEN] {
    let mut w = [0u8; WORD_LEN];
    w[WORD_LEN - 8..].copy_from_slice(&v.to_be_bytes());
    w
}

/// `None` when any of the high 24 bytes is set.
fn read_u64(w: &[u8]) -> Option<u64> {
    let (high, low) = w.split_at(WORD_LEN - 8);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    Some(u64::from_be_bytes(buf))
}
