#![forbid(unsafe_code)]

use crate::{ensure_next, RoundBackend, StoreError};
use std::collections::BTreeMap;
use uptime_core::{Address, Round, RoundId};

/// Ordered in-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    rounds: BTreeMap<RoundId, Round>,
    latest: Option<RoundId>,
    trusted_sender: Option<Address>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

impl RoundBackend for MemoryBackend {
    fn latest_round_id(&self) -> Result<Option<RoundId>, StoreError> {
        Ok(self.latest)
    }

    fn load_round(&self, round_id: RoundId) -> Result<Option<Round>, StoreError> {
        Ok(self.rounds.get(&round_id).copied())
    }

    fn append_round(&mut self, round: &Round) -> Result<(), StoreError> {
        ensure_next(round.round_id, self.latest)?;
        self.rounds.insert(round.round_id, *round);
        self.latest = Some(round.round_id);
        Ok(())
    }

    fn trusted_sender(&self) -> Result<Option<Address>, StoreError> {
        Ok(self.trusted_sender)
    }

    fn set_trusted_sender(&mut self, sender: Address) -> Result<(), StoreError> {
        self.trusted_sender = Some(sender);
        Ok(())
    }
}
