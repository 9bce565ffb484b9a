#![forbid(unsafe_code)]

//! Status rounds and their aggregator-feed projection.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Monotonic round identifier. Round 0 is the seeded initial status.
pub type RoundId = u64;

/// Feed answer published while the monitored domain is down.
pub const ANSWER_SEQ_OFFLINE: i64 = 1;
/// Feed answer published while the monitored domain is up.
pub const ANSWER_SEQ_ONLINE: i64 = 0;

/// Numeric feed encoding of a status flag: `true` → 1, `false` → 0.
pub const fn answer_from_status(status: bool) -> i64 {
    if status {
        ANSWER_SEQ_OFFLINE
    } else {
        ANSWER_SEQ_ONLINE
    }
}

/// One recorded, distinct status observation. Immutable once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub round_id: RoundId,
    pub status: bool,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Round {
    /// Create a round that is started and finalized at the same instant.
    pub fn new(round_id: RoundId, status: bool, observed_at: Timestamp) -> Self {
        Self {
            round_id,
            status,
            started_at: observed_at,
            updated_at: observed_at,
        }
    }

    pub fn answer(&self) -> i64 {
        answer_from_status(self.status)
    }

    pub fn to_round_data(&self) -> RoundData {
        RoundData {
            round_id: self.round_id,
            answer: self.answer(),
            started_at: self.started_at,
            updated_at: self.updated_at,
            answered_in_round: self.round_id,
        }
    }
}

/// `(roundId, answer, startedAt, updatedAt, answeredInRound)` tuple returned by
/// aggregator-style reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_id: RoundId,
    pub answer: i64,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
    pub answered_in_round: RoundId,
}

impl From<Round> for RoundData {
    fn from(round: Round) -> Self {
        round.to_round_data()
    }
}
