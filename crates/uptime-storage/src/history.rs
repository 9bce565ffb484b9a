#![forbid(unsafe_code)]

//! Ledger rules for the status round history.
//!
//! A round exists iff its status differs from the round before it. Round ids
//! start at 0 (the seeded status) and grow by exactly one per change. A
//! redundant observation writes nothing, not even a fresher timestamp.

use crate::{RoundBackend, StoreError};
use tracing::{debug, info};
use uptime_core::{Address, Round, RoundId, Timestamp};

/// Result of [`RoundHistoryStore::record_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub changed: bool,
    /// The new round when `changed`, otherwise the unchanged latest round.
    pub round_id: RoundId,
}

#[derive(Debug, Clone)]
pub struct RoundHistoryStore<B> {
    backend: B,
}

impl<B: RoundBackend> RoundHistoryStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Bind the trusted sender on first use; afterwards the binding may only
    /// be confirmed, never changed.
    pub fn bind_trusted_sender(&mut self, sender: Address) -> Result<(), StoreError> {
        if sender.is_zero() {
            return Err(StoreError::InvalidConfiguration(
                "trusted sender is the zero address".to_string(),
            ));
        }
        match self.backend.trusted_sender()? {
            Some(existing) if existing == sender => Ok(()),
            Some(existing) => Err(StoreError::InvalidConfiguration(format!(
                "store is bound to trusted sender {existing}, refusing {sender}"
            ))),
            None => {
                self.backend.set_trusted_sender(sender)?;
                info!(trusted_sender = %sender, "bound trusted sender");
                Ok(())
            }
        }
    }

    pub fn trusted_sender(&self) -> Result<Option<Address>, StoreError> {
        self.backend.trusted_sender()
    }

    pub fn is_initialized(&self) -> Result<bool, StoreError> {
        Ok(self.backend.latest_round_id()?.is_some())
    }

    /// Write round 0.
    pub fn seed(&mut self, status: bool, observed_at: Timestamp) -> Result<Round, StoreError> {
        if self.is_initialized()? {
            return Err(StoreError::AlreadyInitialized);
        }
        let round = Round::new(0, status, observed_at);
        self.backend.append_round(&round)?;
        info!(status, observed_at, "seeded round 0");
        Ok(round)
    }

    pub fn record_if_changed(
        &mut self,
        new_status: bool,
        observed_at: Timestamp,
    ) -> Result<RecordOutcome, StoreError> {
        let latest = self.latest()?;
        if latest.status == new_status {
            debug!(
                round_id = latest.round_id,
                status = new_status,
                observed_at,
                "status unchanged, no new round"
            );
            return Ok(RecordOutcome {
                changed: false,
                round_id: latest.round_id,
            });
        }

        let round_id = latest
            .round_id
            .checked_add(1)
            .ok_or(StoreError::RoundIdOverflow(latest.round_id))?;
        let round = Round::new(round_id, new_status, observed_at);
        self.backend.append_round(&round)?;
        info!(round_id, status = new_status, observed_at, "recorded new round");
        Ok(RecordOutcome {
            changed: true,
            round_id,
        })
    }

    pub fn latest_round_id(&self) -> Result<RoundId, StoreError> {
        self.backend
            .latest_round_id()?
            .ok_or(StoreError::NotInitialized)
    }

    pub fn get(&self, round_id: RoundId) -> Result<Round, StoreError> {
        self.backend
            .load_round(round_id)?
            .ok_or(StoreError::RoundNotFound(round_id))
    }

    pub fn latest(&self) -> Result<Round, StoreError> {
        let round_id = self.latest_round_id()?;
        self.get(round_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;
    use proptest::prelude::*;

    fn seeded() -> RoundHistoryStore<MemoryBackend> {
        let mut store = RoundHistoryStore::new(MemoryBackend::new());
        store.seed(false, 1_000).unwrap();
        store
    }

    #[test]
    fn seed_writes_round_zero_once() {
        let mut store = seeded();
        let round = store.get(0).unwrap();
        assert_eq!(round, Round::new(0, false, 1_000));
        assert_eq!(round.started_at, round.updated_at);
        assert!(matches!(
            store.seed(true, 2_000),
            Err(StoreError::AlreadyInitialized)
        ));
        assert_eq!(store.latest().unwrap(), round);
    }

    #[test]
    fn unseeded_store_has_no_latest() {
        let mut store = RoundHistoryStore::new(MemoryBackend::new());
        assert!(matches!(store.latest(), Err(StoreError::NotInitialized)));
        assert!(matches!(
            store.record_if_changed(true, 1),
            Err(StoreError::NotInitialized)
        ));
        assert!(!store.is_initialized().unwrap());
    }

    #[test]
    fn records_only_changes() {
        let mut store = seeded();

        let out = store.record_if_changed(true, 1_100).unwrap();
        assert_eq!(
            out,
            RecordOutcome {
                changed: true,
                round_id: 1
            }
        );

        let out = store.record_if_changed(true, 1_200).unwrap();
        assert_eq!(
            out,
            RecordOutcome {
                changed: false,
                round_id: 1
            }
        );
        // Redundant observation does not refresh the latest round.
        assert_eq!(store.latest().unwrap(), Round::new(1, true, 1_100));

        let out = store.record_if_changed(false, 1_300).unwrap();
        assert_eq!(out.round_id, 2);
        assert!(out.changed);
        assert_eq!(store.get(1).unwrap(), Round::new(1, true, 1_100));
    }

    #[test]
    fn unknown_rounds_are_not_found() {
        let mut store = seeded();
        store.record_if_changed(true, 1).unwrap();
        store.record_if_changed(false, 2).unwrap();

        assert!(matches!(store.get(99), Err(StoreError::RoundNotFound(99))));
        assert!(matches!(
            store.get(RoundId::MAX),
            Err(StoreError::RoundNotFound(RoundId::MAX))
        ));
        assert!(matches!(store.get(3), Err(StoreError::RoundNotFound(3))));
    }

    #[test]
    fn accepts_non_monotonic_timestamps() {
        let mut store = seeded();
        store.record_if_changed(true, 5_000).unwrap();
        let out = store.record_if_changed(false, 10).unwrap();
        assert!(out.changed);
        assert_eq!(store.latest().unwrap().updated_at, 10);
    }

    #[test]
    fn trusted_sender_is_write_once() {
        let mut store = RoundHistoryStore::new(MemoryBackend::new());
        let a = Address::from_low_u64(1);
        let b = Address::from_low_u64(2);

        assert!(matches!(
            store.bind_trusted_sender(Address::ZERO),
            Err(StoreError::InvalidConfiguration(_))
        ));
        store.bind_trusted_sender(a).unwrap();
        store.bind_trusted_sender(a).unwrap();
        assert!(matches!(
            store.bind_trusted_sender(b),
            Err(StoreError::InvalidConfiguration(_))
        ));
        assert_eq!(store.trusted_sender().unwrap(), Some(a));
    }

    proptest! {
        #[test]
        fn round_ids_track_status_changes(
            reports in proptest::collection::vec((any::<bool>(), any::<u64>()), 0..64)
        ) {
            let mut store = seeded();
            let mut status = false;
            let mut expected_id: RoundId = 0;
            let mut snapshot = vec![store.get(0).unwrap()];

            for (s, t) in reports {
                let before = store.latest_round_id().unwrap();
                let out = store.record_if_changed(s, t).unwrap();
                let after = store.latest_round_id().unwrap();

                if s == status {
                    prop_assert!(!out.changed);
                    prop_assert_eq!(after, before);
                } else {
                    expected_id += 1;
                    status = s;
                    prop_assert!(out.changed);
                    prop_assert_eq!(after, before + 1);
                    snapshot.push(store.get(after).unwrap());
                }
                prop_assert_eq!(out.round_id, expected_id);
            }

            // Earlier rounds never change.
            for round in snapshot {
                prop_assert_eq!(store.get(round.round_id).unwrap(), round);
            }
        }
    }
}
