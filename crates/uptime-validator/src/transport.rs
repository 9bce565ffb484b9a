#![forbid(unsafe_code)]

//! Cross-domain message transport.
//!
//! The validator only sees [`CrossDomainInbox`]; delivery on the other side is
//! somebody else's job. [`MockInbox`] keeps every submission in memory so a
//! test (or an offline harness) can inspect and relay it.

use crate::fees::Wei;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use uptime_core::Address;

/// An L2 call created from L1 with a prepaid fee budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryableTicket {
    pub target: Address,
    pub l2_call_value: Wei,
    pub max_submission_cost: Wei,
    pub excess_fee_refund_address: Address,
    pub call_value_refund_address: Address,
    pub max_gas: u64,
    pub gas_price_bid: Wei,
    pub data: Vec<u8>,
}

/// A ticket as accepted by an inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub message_number: u64,
    /// L1 account that created the ticket; the L2 call arrives from its alias.
    pub from: Address,
    pub value: Wei,
    pub ticket: RetryableTicket,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("inbox rejected ticket: {0}")]
    Rejected(String),
    #[error("inbox unavailable: {0}")]
    Unavailable(String),
}

pub trait CrossDomainInbox {
    /// Submit a ticket carrying `value` wei and return its message number.
    fn create_retryable_ticket(
        &self,
        from: Address,
        value: Wei,
        ticket: RetryableTicket,
    ) -> Result<u64, TransportError>;
}

impl<I: CrossDomainInbox + ?Sized> CrossDomainInbox for Arc<I> {
    fn create_retryable_ticket(
        &self,
        from: Address,
        value: Wei,
        ticket: RetryableTicket,
    ) -> Result<u64, TransportError> {
        (**self).create_retryable_ticket(from, value, ticket)
    }
}

impl<I: CrossDomainInbox + ?Sized> CrossDomainInbox for &I {
    fn create_retryable_ticket(
        &self,
        from: Address,
        value: Wei,
        ticket: RetryableTicket,
    ) -> Result<u64, TransportError> {
        (**self).create_retryable_ticket(from, value, ticket)
    }
}

#[derive(Debug, Default)]
struct InboxState {
    next_message_number: u64,
    submitted: Vec<Submission>,
    fail_next: Option<TransportError>,
}

/// Deterministic in-memory inbox.
#[derive(Debug, Default)]
pub struct MockInbox {
    state: Mutex<InboxState>,
}

impl MockInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Fail the next submission with `err`.
    pub fn fail_next(&self, err: TransportError) {
        self.lock().fail_next = Some(err);
    }

    pub fn submitted(&self) -> Vec<Submission> {
        self.lock().submitted.clone()
    }

    /// Remove and return every submission not yet taken.
    pub fn drain(&self) -> Vec<Submission> {
        std::mem::take(&mut self.lock().submitted)
    }

    pub fn len(&self) -> usize {
        self.lock().submitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().submitted.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CrossDomainInbox for MockInbox {
    fn create_retryable_ticket(
        &self,
        from: Address,
        value: Wei,
        ticket: RetryableTicket,
    ) -> Result<u64, TransportError> {
        let mut state = self.lock();
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        let message_number = state.next_message_number;
        state.next_message_number = message_number.saturating_add(1);
        state.submitted.push(Submission {
            message_number,
            from,
            value,
            ticket,
        });
        Ok(message_number)
    }
}
