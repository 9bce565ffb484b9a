#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]
#![deny(clippy::disallowed_types)]

//! L1-side validator for the L2 uptime status feed.
//!
//! The validator watches an upstream signal, encodes status changes as
//! `updateStatus(bool,uint64)` calldata and submits them through a
//! [`CrossDomainInbox`] as prepaid retryable tickets. On the L2 side the call
//! arrives from the validator's aliased address, which is the only sender the
//! recorder trusts. [`relay`] emulates that delivery for tests and offline
//! harnesses.

pub mod condition;
pub mod config;
pub mod fees;
pub mod message;
pub mod relay;
pub mod transport;
pub mod validator;

pub use condition::{ManualFlag, StalenessCondition, UpstreamCondition};
pub use config::ValidatorConfig;
pub use fees::{GasConfig, PaymentStrategy, TicketCost, Wei};
pub use message::{MessageError, StatusReportMessage, UPDATE_STATUS_SIGNATURE};
pub use relay::{relay_all, relay_submission, RelayError};
pub use transport::{CrossDomainInbox, MockInbox, RetryableTicket, Submission, TransportError};
pub use validator::{
    ConfigGate, CrossDomainValidator, SentReport, ValidatorError, ValidatorParams, Withdrawal,
};
