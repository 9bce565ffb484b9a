#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]
#![deny(clippy::disallowed_types)]

//! Core types shared by the L2 uptime status oracle.
//!
//! This crate defines the vocabulary every other component speaks:
//! 20-byte addresses and the L1→L2 aliasing transform, the call context a
//! component sees when it is invoked, status rounds and their aggregator-style
//! projection, the access gates that guard reads and administration, and the
//! flag registry the feed mirrors its status into.

pub mod access;
pub mod address;
pub mod aggregator;
pub mod config;
pub mod context;
pub mod flags;
pub mod round;

pub use access::{
    AccessAdmin, AccessError, AccessGate, AllowAll, DenyAll, QuorumGate, ReadAccessController,
    SimpleAccessController,
};
pub use address::{Address, AddressError, L1_TO_L2_ALIAS_OFFSET};
pub use aggregator::{Aggregator, FixedAggregator, FixedAggregatorError};
pub use context::CallContext;
pub use flags::{FlagRegistry, Flags, NoFlags, L2_SEQ_OFFLINE_FLAG};
pub use round::{
    answer_from_status, Round, RoundData, RoundId, ANSWER_SEQ_OFFLINE, ANSWER_SEQ_ONLINE,
};

/// Seconds since the Unix epoch, as seen by the executing domain.
pub type Timestamp = u64;
