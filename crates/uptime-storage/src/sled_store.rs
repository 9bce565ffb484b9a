#![forbid(unsafe_code)]

//! Persistent backend on sled.
//!
//! Layout:
//! - tree `rounds`: big-endian round id → JSON [`Round`]
//! - tree `meta`: `latest_round_id` (8 bytes BE), `trusted_sender` (20 bytes),
//!   `schema_version` (utf8)

use crate::{ensure_next, RoundBackend, StoreError};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{IVec, Transactional, Tree};
use std::path::Path;
use tracing::{debug, info};
use uptime_core::{Address, Round, RoundId};

pub const SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone)]
pub struct SledBackend {
    db: sled::Db,
    rounds: Tree,
    meta: Tree,
}

impl SledBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open the backend's trees inside an existing database.
    pub fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let rounds = db.open_tree("rounds")?;
        let meta = db.open_tree("meta")?;
        let backend = Self { db, rounds, meta };
        backend.init_schema()?;
        Ok(backend)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        match self.meta.get(keys::SCHEMA_VERSION)? {
            Some(val) => {
                let current = String::from_utf8_lossy(&val).to_string();
                if current != SCHEMA_VERSION {
                    return Err(StoreError::SchemaMismatch {
                        expected: SCHEMA_VERSION.to_string(),
                        found: Some(current),
                    });
                }
            }
            None => {
                self.meta
                    .insert(keys::SCHEMA_VERSION, SCHEMA_VERSION.as_bytes())?;
                info!(schema = SCHEMA_VERSION, "initialized round store schema");
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn meta(&self) -> &Tree {
        &self.meta
    }

    #[cfg(test)]
    pub(crate) fn rounds(&self) -> &Tree {
        &self.rounds
    }
}

impl RoundBackend for SledBackend {
    fn latest_round_id(&self) -> Result<Option<RoundId>, StoreError> {
        let Some(v) = self.meta.get(keys::LATEST_ROUND_ID)? else {
            return Ok(None);
        };
        decode_u64_be(&v).map(Some).map_err(StoreError::Decode)
    }

    fn load_round(&self, round_id: RoundId) -> Result<Option<Round>, StoreError> {
        let Some(v) = self.rounds.get(keys::round(round_id))? else {
            return Ok(None);
        };
        let round: Round = serde_json::from_slice(&v)
            .map_err(|e| StoreError::Decode(format!("failed decoding round json: {e}")))?;
        if round.round_id != round_id {
            return Err(StoreError::Decode(format!(
                "round stored under id {round_id} carries id {}",
                round.round_id
            )));
        }
        Ok(Some(round))
    }

    fn append_round(&mut self, round: &Round) -> Result<(), StoreError> {
        let key = keys::round(round.round_id);
        let value = serde_json::to_vec(round)
            .map_err(|e| StoreError::Decode(format!("failed encoding round json: {e}")))?;
        let latest = round.round_id.to_be_bytes();

        // Handles sharing the db must not both write the same round id.
        (&self.rounds, &self.meta)
            .transaction(|(rounds, meta)| -> ConflictableTransactionResult<(), StoreError> {
                let current = match meta.get(keys::LATEST_ROUND_ID)? {
                    Some(v) => Some(decode_u64_be(&v).map_err(|e| {
                        ConflictableTransactionError::Abort(StoreError::Decode(e))
                    })?),
                    None => None,
                };
                ensure_next(round.round_id, current)
                    .map_err(ConflictableTransactionError::Abort)?;
                rounds.insert(&key[..], &value[..])?;
                meta.insert(keys::LATEST_ROUND_ID, &latest[..])?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => StoreError::Sled(e),
            })?;

        debug!(round_id = round.round_id, "round persisted");
        Ok(())
    }

    fn trusted_sender(&self) -> Result<Option<Address>, StoreError> {
        let Some(v) = self.meta.get(keys::TRUSTED_SENDER)? else {
            return Ok(None);
        };
        if v.len() != 20 {
            return Err(StoreError::Decode(format!(
                "expected 20 bytes for trusted_sender, got {}",
                v.len()
            )));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(v.as_ref());
        Ok(Some(Address(out)))
    }

    fn set_trusted_sender(&mut self, sender: Address) -> Result<(), StoreError> {
        self.meta
            .insert(keys::TRUSTED_SENDER, &sender.as_bytes()[..])?;
        Ok(())
    }
}

pub mod keys {
    use uptime_core::RoundId;

    pub const LATEST_ROUND_ID: &[u8] = b"latest_round_id";
    pub const TRUSTED_SENDER: &[u8] = b"trusted_sender";
    pub const SCHEMA_VERSION: &[u8] = b"schema_version";

    pub fn round(round_id: RoundId) -> [u8; 8] {
        round_id.to_be_bytes()
    }
}

fn decode_u64_be(v: &IVec) -> Result<u64, String> {
    if v.len() != 8 {
        return Err(format!("expected 8 bytes for u64, got {}", v.len()));
    }
    let mut b = [0u8; 8];
    b.copy_from_slice(v.as_ref());
    Ok(u64::from_be_bytes(b))
}
