#![forbid(unsafe_code)]

//! Delivery of submitted tickets to a recorder.
//!
//! Emulates the bridge: the L2 call is made by the alias of the L1 account that
//! created the ticket, at the L2's own clock.

use crate::message::{MessageError, StatusReportMessage};
use crate::transport::Submission;
use thiserror::Error;
use tracing::debug;
use uptime_core::{AccessGate, Address, CallContext, FlagRegistry, Timestamp};
use uptime_feed::{EventSink, FeedError, StatusRecorder, UpdateOutcome};
use uptime_storage::RoundBackend;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("ticket targets {found}, expected recorder {expected}")]
    WrongTarget { expected: Address, found: Address },
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Deliver one submission to `recorder`, which lives at `recorder_address`.
pub fn relay_submission<G, B, E, F>(
    submission: &Submission,
    recorder_address: Address,
    recorder: &mut StatusRecorder<G, B, E, F>,
    l2_now: Timestamp,
) -> Result<UpdateOutcome, RelayError>
where
    G: AccessGate,
    B: RoundBackend,
    E: EventSink,
    F: FlagRegistry,
{
    let ticket = &submission.ticket;
    if ticket.target != recorder_address {
        return Err(RelayError::WrongTarget {
            expected: recorder_address,
            found: ticket.target,
        });
    }
    let msg = StatusReportMessage::decode(&ticket.data)?;
    let ctx = CallContext::direct(submission.from.alias(), l2_now);
    debug!(
        message_number = submission.message_number,
        status = msg.status,
        timestamp = msg.timestamp,
        "relaying status report"
    );
    Ok(recorder.update_status(&ctx, msg.status, msg.timestamp)?)
}

/// Deliver submissions in order; one result per submission.
pub fn relay_all<G, B, E, F>(
    submissions: &[Submission],
    recorder_address: Address,
    recorder: &mut StatusRecorder<G, B, E, F>,
    l2_now: Timestamp,
) -> Vec<Result<UpdateOutcome, RelayError>>
where
    G: AccessGate,
    B: RoundBackend,
    E: EventSink,
    F: FlagRegistry,
{
    submissions
        .iter()
        .map(|s| relay_submission(s, recorder_address, recorder, l2_now))
        .collect()
}
