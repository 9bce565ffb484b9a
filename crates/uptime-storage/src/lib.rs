#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]
#![deny(clippy::disallowed_types)]

//! Round history storage for the uptime status feed.
//!
//! [`RoundHistoryStore`] owns the ledger rules (seeding, dedup, monotonic round
//! ids) and is written once over the [`RoundBackend`] trait. Two backends are
//! provided: [`MemoryBackend`] and the persistent [`SledBackend`];
//! [`AnyBackend`] picks one at runtime.

use std::path::Path;
use thiserror::Error;
use uptime_core::{Address, Round, RoundId};

pub mod history;
pub mod memory;
pub mod sled_store;

pub use history::{RecordOutcome, RoundHistoryStore};
pub use memory::MemoryBackend;
pub use sled_store::{SledBackend, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("schema mismatch: expected {expected}, found {found:?}")]
    SchemaMismatch {
        expected: String,
        found: Option<String>,
    },
    #[error("round history already initialized")]
    AlreadyInitialized,
    #[error("round history not initialized")]
    NotInitialized,
    #[error("No data present for round {0}")]
    RoundNotFound(RoundId),
    #[error("round {round_id} does not follow latest round {latest:?}")]
    AppendConflict {
        round_id: RoundId,
        latest: Option<RoundId>,
    },
    #[error("round id overflow after {0}")]
    RoundIdOverflow(RoundId),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Raw persistence for rounds and the two scalar pointers.
///
/// Backends do not enforce ledger rules; [`RoundHistoryStore`] does.
pub trait RoundBackend {
    /// `None` until round 0 has been written.
    fn latest_round_id(&self) -> Result<Option<RoundId>, StoreError>;

    fn load_round(&self, round_id: RoundId) -> Result<Option<Round>, StoreError>;

    /// Persist `round` and make it the latest, atomically.
    ///
    /// Fails with [`StoreError::AppendConflict`] unless `round` directly
    /// follows the latest stored round (or is round 0 of an empty store).
    fn append_round(&mut self, round: &Round) -> Result<(), StoreError>;

    fn trusted_sender(&self) -> Result<Option<Address>, StoreError>;

    fn set_trusted_sender(&mut self, sender: Address) -> Result<(), StoreError>;
}

/// Backend selected at runtime, typically from configuration.
#[derive(Debug, Clone)]
pub enum AnyBackend {
    Memory(MemoryBackend),
    Sled(SledBackend),
}

impl AnyBackend {
    /// Sled at `path` when given, otherwise in-memory.
    pub fn open(path: Option<&Path>) -> Result<Self, StoreError> {
        match path {
            Some(p) => Ok(AnyBackend::Sled(SledBackend::open(p)?)),
            None => Ok(AnyBackend::Memory(MemoryBackend::new())),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, AnyBackend::Sled(_))
    }

    /// No-op for the in-memory backend.
    pub fn flush(&self) -> Result<(), StoreError> {
        match self {
            AnyBackend::Memory(_) => Ok(()),
            AnyBackend::Sled(b) => b.flush(),
        }
    }
}

impl RoundBackend for AnyBackend {
    fn latest_round_id(&self) -> Result<Option<RoundId>, StoreError> {
        match self {
            AnyBackend::Memory(b) => b.latest_round_id(),
            AnyBackend::Sled(b) => b.latest_round_id(),
        }
    }

    fn load_round(&self, round_id: RoundId) -> Result<Option<Round>, StoreError> {
        match self {
            AnyBackend::Memory(b) => b.load_round(round_id),
            AnyBackend::Sled(b) => b.load_round(round_id),
        }
    }

    fn append_round(&mut self, round: &Round) -> Result<(), StoreError> {
        match self {
            AnyBackend::Memory(b) => b.append_round(round),
            AnyBackend::Sled(b) => b.append_round(round),
        }
    }

    fn trusted_sender(&self) -> Result<Option<Address>, StoreError> {
        match self {
            AnyBackend::Memory(b) => b.trusted_sender(),
            AnyBackend::Sled(b) => b.trusted_sender(),
        }
    }

    fn set_trusted_sender(&mut self, sender: Address) -> Result<(), StoreError> {
        match self {
            AnyBackend::Memory(b) => b.set_trusted_sender(sender),
            AnyBackend::Sled(b) => b.set_trusted_sender(sender),
        }
    }
}

/// Checks that `round_id` directly follows `latest`.
pub(crate) fn ensure_next(round_id: RoundId, latest: Option<RoundId>) -> Result<(), StoreError> {
    if latest == round_id.checked_sub(1) {
        Ok(())
    } else {
        Err(StoreError::AppendConflict { round_id, latest })
    }
}
