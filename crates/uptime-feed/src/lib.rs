#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]
#![deny(clippy::disallowed_types)]

//! L2 uptime status feed.
//!
//! The [`StatusRecorder`] lives on L2 and accepts status reports only from the
//! aliased address of its L1 counterpart. Reports that do not change the status
//! are dropped without touching state; every change opens a new round. Reads
//! follow the aggregator interface and are gated on every call.
//! Attached to a flag registry, the recorder also mirrors each change into the
//! L2 sequencer offline flag.

use thiserror::Error;
use uptime_core::{AccessError, Address, RoundId};
use uptime_storage::StoreError;

pub mod config;
pub mod events;
pub mod recorder;

pub use config::RecorderConfig;
pub use events::{EventLog, EventSink, FeedEvent, NoopSink};
pub use recorder::{StatusRecorder, UpdateOutcome, FEED_DESCRIPTION, FEED_VERSION};
pub use uptime_core::Aggregator;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("No access: {caller}")]
    NoAccess { caller: Address },
    #[error("Sender is not the L2 messenger: {sender}")]
    UnauthorizedSender { sender: Address },
    #[error("feed already initialized")]
    AlreadyInitialized,
    #[error("feed not initialized")]
    NotInitialized,
    #[error("No data present for round {0}")]
    RoundNotFound(RoundId),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl FeedError {
    /// Gate denial on a read/admin call or sender mismatch on a write.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            FeedError::NoAccess { .. } | FeedError::UnauthorizedSender { .. }
        )
    }
}

impl From<StoreError> for FeedError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyInitialized => FeedError::AlreadyInitialized,
            StoreError::NotInitialized => FeedError::NotInitialized,
            StoreError::RoundNotFound(id) => FeedError::RoundNotFound(id),
            StoreError::InvalidConfiguration(s) => FeedError::InvalidConfiguration(s),
            other => FeedError::Store(other),
        }
    }
}

impl From<AccessError> for FeedError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::NoAccess { caller } => FeedError::NoAccess { caller },
            other => FeedError::InvalidConfiguration(other.to_string()),
        }
    }
}
