#![forbid(unsafe_code)]

use crate::events::{EventSink, FeedEvent};
use crate::FeedError;
use tracing::{debug, info, warn};
use uptime_core::{
    AccessAdmin, AccessGate, Address, Aggregator, CallContext, FlagRegistry, NoFlags, Round,
    RoundData, RoundId, Timestamp, L2_SEQ_OFFLINE_FLAG,
};
use uptime_storage::{RoundBackend, RoundHistoryStore};

pub const FEED_DESCRIPTION: &str = "L2 Sequencer Uptime Status Feed";
pub const FEED_VERSION: u64 = 1;
const TYPE_AND_VERSION: &str = "L2SequencerUptimeFeed 1.0.0";

/// Result of an accepted status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Status changed and a new round was written.
    Recorded { round_id: RoundId },
    /// Status matched the latest round; nothing was written.
    Ignored { latest_round_id: RoundId },
}

impl UpdateOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, UpdateOutcome::Recorded { .. })
    }

    pub fn round_id(&self) -> RoundId {
        match self {
            UpdateOutcome::Recorded { round_id } => *round_id,
            UpdateOutcome::Ignored { latest_round_id } => *latest_round_id,
        }
    }
}

/// L2 status feed authenticated against a single aliased L1 sender.
///
/// With a flag registry attached (see [`StatusRecorder::with_flags`]) every
/// status change also raises or lowers [`L2_SEQ_OFFLINE_FLAG`].
pub struct StatusRecorder<G, B, E, F = NoFlags> {
    trusted_sender: Address,
    gate: G,
    history: RoundHistoryStore<B>,
    events: E,
    flags: F,
    /// Caller identity used for flag writes.
    address: Address,
    description: String,
}

impl<G, B, E> StatusRecorder<G, B, E>
where
    G: AccessGate,
    B: RoundBackend,
    E: EventSink,
{
    /// Create a feed that trusts `trusted_sender`, which must already be the
    /// L2 alias of the L1 reporter.
    pub fn new(
        trusted_sender: Address,
        gate: G,
        backend: B,
        events: E,
    ) -> Result<Self, FeedError> {
        if trusted_sender.is_zero() {
            return Err(FeedError::InvalidConfiguration(
                "trusted sender is the zero address".to_string(),
            ));
        }
        let mut history = RoundHistoryStore::new(backend);
        history.bind_trusted_sender(trusted_sender)?;
        Ok(Self {
            trusted_sender,
            gate,
            history,
            events,
            flags: NoFlags,
            address: Address::ZERO,
            description: FEED_DESCRIPTION.to_string(),
        })
    }

    /// Create a feed for reports sent by `l1_sender`; the trusted sender is its alias.
    pub fn for_l1_sender(
        l1_sender: Address,
        gate: G,
        backend: B,
        events: E,
    ) -> Result<Self, FeedError> {
        if l1_sender.is_zero() {
            return Err(FeedError::InvalidConfiguration(
                "l1 sender is the zero address".to_string(),
            ));
        }
        Self::new(l1_sender.alias(), gate, backend, events)
    }
}

impl<G, B, E, F> StatusRecorder<G, B, E, F>
where
    G: AccessGate,
    B: RoundBackend,
    E: EventSink,
    F: FlagRegistry,
{
    /// Mirror status changes into `flags`, writing as `address`.
    ///
    /// `address` needs write access on the registry.
    pub fn with_flags<R: FlagRegistry>(
        self,
        address: Address,
        flags: R,
    ) -> Result<StatusRecorder<G, B, E, R>, FeedError> {
        if address.is_zero() {
            return Err(FeedError::InvalidConfiguration(
                "feed address is the zero address".to_string(),
            ));
        }
        Ok(StatusRecorder {
            trusted_sender: self.trusted_sender,
            gate: self.gate,
            history: self.history,
            events: self.events,
            flags,
            address,
            description: self.description,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn trusted_sender(&self) -> Address {
        self.trusted_sender
    }

    /// The L1 address whose alias is trusted.
    pub fn l1_sender(&self) -> Address {
        self.trusted_sender.dealias()
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn history(&self) -> &RoundHistoryStore<B> {
        &self.history
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn flags(&self) -> &F {
        &self.flags
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_initialized(&self) -> Result<bool, FeedError> {
        Ok(self.history.is_initialized()?)
    }

    pub fn type_and_version(&self) -> &'static str {
        TYPE_AND_VERSION
    }

    pub fn has_access(&self, subject: &Address, ctx: &CallContext) -> bool {
        self.gate.has_access(subject, ctx)
    }

    pub fn check_enabled(&self) -> bool {
        self.gate.check_enabled()
    }

    /// Seed round 0 with status `false` at the caller's timestamp.
    pub fn initialize(&mut self, ctx: &CallContext) -> Result<Round, FeedError> {
        self.require_access(ctx)?;
        let round = self.history.seed(false, ctx.timestamp)?;
        info!(by = %ctx.sender, at = ctx.timestamp, "feed initialized");
        self.events.emit(FeedEvent::Initialized { at: ctx.timestamp });
        Ok(round)
    }

    /// Record a status report relayed from L1.
    pub fn update_status(
        &mut self,
        ctx: &CallContext,
        status: bool,
        timestamp: Timestamp,
    ) -> Result<UpdateOutcome, FeedError> {
        if ctx.sender != self.trusted_sender {
            warn!(
                sender = %ctx.sender,
                trusted = %self.trusted_sender,
                "rejected status report from untrusted sender"
            );
            return Err(FeedError::UnauthorizedSender { sender: ctx.sender });
        }

        // Flag first: a denied flag write leaves the history untouched.
        if self.history.latest()?.status != status {
            self.sync_flag(ctx, status)?;
        }
        let outcome = self.history.record_if_changed(status, timestamp)?;
        if !outcome.changed {
            debug!(
                status,
                timestamp,
                latest_round_id = outcome.round_id,
                "ignored redundant status report"
            );
            return Ok(UpdateOutcome::Ignored {
                latest_round_id: outcome.round_id,
            });
        }

        let round_id = outcome.round_id;
        self.events.emit(FeedEvent::NewRound {
            round_id,
            started_by: ctx.sender,
            started_at: timestamp,
        });
        self.events.emit(FeedEvent::AnswerUpdated {
            answer: uptime_core::answer_from_status(status),
            round_id,
            updated_at: timestamp,
        });
        info!(round_id, status, timestamp, "status updated");
        Ok(UpdateOutcome::Recorded { round_id })
    }

    fn sync_flag(&self, ctx: &CallContext, status: bool) -> Result<(), FeedError> {
        let caller = CallContext::proxied(self.address, ctx.origin, ctx.timestamp);
        let changed = if status {
            self.flags.raise_flag(&caller, L2_SEQ_OFFLINE_FLAG)?
        } else {
            self.flags.lower_flag(&caller, L2_SEQ_OFFLINE_FLAG)?
        };
        if changed {
            debug!(status, flag = %L2_SEQ_OFFLINE_FLAG, "offline flag synced");
        }
        Ok(())
    }

    fn require_access(&self, ctx: &CallContext) -> Result<(), FeedError> {
        if self.gate.has_access(&ctx.sender, ctx) {
            Ok(())
        } else {
            Err(FeedError::NoAccess { caller: ctx.sender })
        }
    }

    fn read_latest(&self, ctx: &CallContext) -> Result<Round, FeedError> {
        self.require_access(ctx)?;
        Ok(self.history.latest()?)
    }

    /// Round lookup for v2-style reads: `None` instead of an error.
    fn find_round(
        &self,
        ctx: &CallContext,
        round_id: RoundId,
    ) -> Result<Option<Round>, FeedError> {
        self.require_access(ctx)?;
        match self.history.get(round_id) {
            Ok(round) => Ok(Some(round)),
            Err(uptime_storage::StoreError::RoundNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl<G, B, E, F> StatusRecorder<G, B, E, F>
where
    G: AccessAdmin,
    B: RoundBackend,
    E: EventSink,
    F: FlagRegistry,
{
    pub fn add_access(&mut self, ctx: &CallContext, subject: Address) -> Result<bool, FeedError> {
        let added = self.gate.add_access(ctx, subject)?;
        if added {
            self.events.emit(FeedEvent::AddedAccess { subject });
        }
        Ok(added)
    }

    pub fn remove_access(
        &mut self,
        ctx: &CallContext,
        subject: Address,
    ) -> Result<bool, FeedError> {
        let removed = self.gate.remove_access(ctx, subject)?;
        if removed {
            self.events.emit(FeedEvent::RemovedAccess { subject });
        }
        Ok(removed)
    }

    pub fn enable_access_check(&mut self, ctx: &CallContext) -> Result<bool, FeedError> {
        let changed = self.gate.enable_access_check(ctx)?;
        if changed {
            self.events.emit(FeedEvent::CheckAccessEnabled);
        }
        Ok(changed)
    }

    pub fn disable_access_check(&mut self, ctx: &CallContext) -> Result<bool, FeedError> {
        let changed = self.gate.disable_access_check(ctx)?;
        if changed {
            self.events.emit(FeedEvent::CheckAccessDisabled);
        }
        Ok(changed)
    }
}

impl<G, B, E, F> Aggregator for StatusRecorder<G, B, E, F>
where
    G: AccessGate,
    B: RoundBackend,
    E: EventSink,
    F: FlagRegistry,
{
    type Error = FeedError;

    fn decimals(&self) -> u8 {
        0
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn version(&self) -> u64 {
        FEED_VERSION
    }

    fn latest_answer(&self, ctx: &CallContext) -> Result<i64, FeedError> {
        Ok(self.read_latest(ctx)?.answer())
    }

    fn latest_timestamp(&self, ctx: &CallContext) -> Result<Timestamp, FeedError> {
        Ok(self.read_latest(ctx)?.updated_at)
    }

    fn latest_round(&self, ctx: &CallContext) -> Result<RoundId, FeedError> {
        self.require_access(ctx)?;
        Ok(self.history.latest_round_id()?)
    }

    fn get_answer(&self, ctx: &CallContext, round_id: RoundId) -> Result<i64, FeedError> {
        Ok(self
            .find_round(ctx, round_id)?
            .map(|r| r.answer())
            .unwrap_or(0))
    }

    fn get_timestamp(&self, ctx: &CallContext, round_id: RoundId) -> Result<Timestamp, FeedError> {
        Ok(self
            .find_round(ctx, round_id)?
            .map(|r| r.updated_at)
            .unwrap_or(0))
    }

    fn get_round_data(&self, ctx: &CallContext, round_id: RoundId) -> Result<RoundData, FeedError> {
        self.require_access(ctx)?;
        Ok(self.history.get(round_id)?.to_round_data())
    }

    fn latest_round_data(&self, ctx: &CallContext) -> Result<RoundData, FeedError> {
        Ok(self.read_latest(ctx)?.to_round_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use std::sync::Arc;
    use uptime_core::{AllowAll, DenyAll, Flags, SimpleAccessController};
    use uptime_storage::MemoryBackend;

    type Feed = StatusRecorder<SimpleAccessController, MemoryBackend, Arc<EventLog>>;

    const T0: Timestamp = 1_700_000_000;

    fn deployer() -> Address {
        Address::from_low_u64(0xd00d)
    }

    fn l1_sender() -> Address {
        Address::from_low_u64(0x1)
    }

    fn messenger(ts: Timestamp) -> CallContext {
        CallContext::direct(l1_sender().alias(), ts)
    }

    fn feed() -> (Feed, Arc<EventLog>) {
        let log = EventLog::shared();
        let mut feed = StatusRecorder::for_l1_sender(
            l1_sender(),
            SimpleAccessController::new(deployer()),
            MemoryBackend::new(),
            log.clone(),
        )
        .unwrap();
        feed.initialize(&CallContext::direct(deployer(), T0)).unwrap();
        (feed, log)
    }

    #[test]
    fn rejects_zero_senders() {
        let err =
            StatusRecorder::new(Address::ZERO, AllowAll, MemoryBackend::new(), EventLog::new())
                .err()
                .unwrap();
        assert!(matches!(err, FeedError::InvalidConfiguration(_)));

        let err = StatusRecorder::for_l1_sender(
            Address::ZERO,
            AllowAll,
            MemoryBackend::new(),
            EventLog::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, FeedError::InvalidConfiguration(_)));
    }

    #[test]
    fn trusts_alias_not_raw_l1_address() {
        let (mut feed, _) = feed();
        assert_eq!(feed.trusted_sender(), l1_sender().alias());
        assert_eq!(feed.l1_sender(), l1_sender());

        let raw = CallContext::direct(l1_sender(), T0 + 1);
        let err = feed.update_status(&raw, true, T0 + 1).unwrap_err();
        assert!(matches!(err, FeedError::UnauthorizedSender { sender } if sender == l1_sender()));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn initialize_is_gated_and_one_time() {
        let log = EventLog::shared();
        let mut feed = StatusRecorder::for_l1_sender(
            l1_sender(),
            SimpleAccessController::new(deployer()),
            MemoryBackend::new(),
            log.clone(),
        )
        .unwrap();

        let stranger = CallContext::direct(Address::from_low_u64(77), T0);
        assert!(matches!(
            feed.initialize(&stranger),
            Err(FeedError::NoAccess { .. })
        ));
        assert!(!feed.is_initialized().unwrap());

        let round = feed.initialize(&CallContext::direct(deployer(), T0)).unwrap();
        assert_eq!(round, Round::new(0, false, T0));
        assert_eq!(log.events(), vec![FeedEvent::Initialized { at: T0 }]);

        assert!(matches!(
            feed.initialize(&CallContext::direct(deployer(), T0 + 5)),
            Err(FeedError::AlreadyInitialized)
        ));
    }

    #[test]
    fn update_before_initialize_fails() {
        let mut feed = StatusRecorder::for_l1_sender(
            l1_sender(),
            AllowAll,
            MemoryBackend::new(),
            EventLog::new(),
        )
        .unwrap();
        assert!(matches!(
            feed.update_status(&messenger(T0), true, T0),
            Err(FeedError::NotInitialized)
        ));
    }

    #[test]
    fn emits_new_round_and_answer_updated_on_change() {
        let (mut feed, log) = feed();
        log.drain();

        let outcome = feed.update_status(&messenger(T0 + 10), true, T0 + 10).unwrap();
        assert_eq!(outcome, UpdateOutcome::Recorded { round_id: 1 });
        assert_eq!(
            log.drain(),
            vec![
                FeedEvent::NewRound {
                    round_id: 1,
                    started_by: l1_sender().alias(),
                    started_at: T0 + 10,
                },
                FeedEvent::AnswerUpdated {
                    answer: 1,
                    round_id: 1,
                    updated_at: T0 + 10,
                },
            ]
        );

        let outcome = feed.update_status(&messenger(T0 + 20), true, T0 + 20).unwrap();
        assert_eq!(outcome, UpdateOutcome::Ignored { latest_round_id: 1 });
        assert!(!outcome.changed());
        assert!(log.is_empty());
    }

    #[test]
    fn v2_reads_return_zero_for_unknown_rounds() {
        let (mut feed, _) = feed();
        feed.update_status(&messenger(T0 + 10), true, T0 + 10).unwrap();
        let reader = CallContext::direct(deployer(), T0 + 11);

        assert_eq!(feed.get_answer(&reader, 1).unwrap(), 1);
        assert_eq!(feed.get_timestamp(&reader, 1).unwrap(), T0 + 10);
        assert_eq!(feed.get_answer(&reader, 42).unwrap(), 0);
        assert_eq!(feed.get_timestamp(&reader, 42).unwrap(), 0);
        assert_eq!(feed.latest_round(&reader).unwrap(), 1);
    }

    #[test]
    fn metadata() {
        let (feed, _) = feed();
        assert_eq!(feed.decimals(), 0);
        assert_eq!(feed.version(), 1);
        assert_eq!(feed.description(), FEED_DESCRIPTION);
        assert_eq!(feed.type_and_version(), "L2SequencerUptimeFeed 1.0.0");

        let feed = feed.with_description("Arbitrum One uptime");
        assert_eq!(feed.description(), "Arbitrum One uptime");
    }

    #[test]
    fn deny_all_gate_blocks_every_read() {
        let mut feed = StatusRecorder::for_l1_sender(
            l1_sender(),
            DenyAll,
            MemoryBackend::new(),
            EventLog::new(),
        )
        .unwrap();
        let ctx = CallContext::direct(deployer(), T0);
        assert!(feed.initialize(&ctx).unwrap_err().is_unauthorized());
        assert!(feed.latest_answer(&ctx).unwrap_err().is_unauthorized());
        assert!(feed.get_answer(&ctx, 0).unwrap_err().is_unauthorized());
    }

    #[test]
    fn admin_forwarding_emits_access_events() {
        let (mut feed, log) = feed();
        log.drain();
        let admin = CallContext::direct(deployer(), T0);
        let consumer = Address::from_low_u64(0xc0);

        assert!(feed.add_access(&admin, consumer).unwrap());
        assert!(!feed.add_access(&admin, consumer).unwrap());
        assert!(feed.remove_access(&admin, consumer).unwrap());
        assert!(feed.disable_access_check(&admin).unwrap());
        assert!(!feed.check_enabled());
        assert!(feed.enable_access_check(&admin).unwrap());

        assert_eq!(
            log.drain(),
            vec![
                FeedEvent::AddedAccess { subject: consumer },
                FeedEvent::RemovedAccess { subject: consumer },
                FeedEvent::CheckAccessDisabled,
                FeedEvent::CheckAccessEnabled,
            ]
        );

        let stranger = CallContext::direct(consumer, T0);
        assert!(matches!(
            feed.add_access(&stranger, consumer),
            Err(FeedError::NoAccess { .. })
        ));
    }

    fn feed_address() -> Address {
        Address::from_low_u64(0xfeed)
    }

    type SharedFlags = Arc<Flags<SimpleAccessController>>;
    type FlaggedFeed =
        StatusRecorder<SimpleAccessController, MemoryBackend, Arc<EventLog>, SharedFlags>;

    fn flagged_feed() -> (FlaggedFeed, SharedFlags) {
        let flags = Flags::shared(
            SimpleAccessController::new(deployer()),
            SimpleAccessController::with_holders([deployer(), feed_address()]),
        );
        let (feed, _) = feed();
        let feed = feed.with_flags(feed_address(), flags.clone()).unwrap();
        (feed, flags)
    }

    #[test]
    fn status_changes_raise_and_lower_the_offline_flag() {
        let (mut feed, flags) = flagged_feed();
        let reader = CallContext::direct(deployer(), T0);
        assert!(!flags.get_flag(&reader, &L2_SEQ_OFFLINE_FLAG).unwrap());

        feed.update_status(&messenger(T0 + 10), true, T0 + 10).unwrap();
        assert!(flags.get_flag(&reader, &L2_SEQ_OFFLINE_FLAG).unwrap());

        feed.update_status(&messenger(T0 + 20), false, T0 + 20).unwrap();
        assert!(!flags.get_flag(&reader, &L2_SEQ_OFFLINE_FLAG).unwrap());
    }

    #[test]
    fn redundant_report_does_not_touch_the_flag() {
        let (mut feed, flags) = flagged_feed();
        let reader = CallContext::direct(deployer(), T0);
        feed.update_status(&messenger(T0 + 10), true, T0 + 10).unwrap();

        // Lowered out of band; a repeated `true` report must not re-raise it.
        flags.lower_flag(&reader, L2_SEQ_OFFLINE_FLAG).unwrap();
        let outcome = feed.update_status(&messenger(T0 + 20), true, T0 + 20).unwrap();
        assert_eq!(outcome, UpdateOutcome::Ignored { latest_round_id: 1 });
        assert!(!flags.get_flag(&reader, &L2_SEQ_OFFLINE_FLAG).unwrap());
    }

    #[test]
    fn denied_flag_write_records_nothing() {
        let flags = Flags::shared(
            SimpleAccessController::new(deployer()),
            SimpleAccessController::new(deployer()),
        );
        let (feed, log) = feed();
        let mut feed = feed.with_flags(feed_address(), flags.clone()).unwrap();
        log.drain();

        let err = feed.update_status(&messenger(T0 + 10), true, T0 + 10).unwrap_err();
        assert!(matches!(err, FeedError::NoAccess { caller } if caller == feed_address()));
        let reader = CallContext::direct(deployer(), T0 + 11);
        assert_eq!(feed.latest_round(&reader).unwrap(), 0);
        assert!(log.is_empty());

        flags.add_writer(&reader, feed_address()).unwrap();
        assert_eq!(
            feed.update_status(&messenger(T0 + 12), true, T0 + 12).unwrap(),
            UpdateOutcome::Recorded { round_id: 1 }
        );
        assert!(flags.get_flag(&reader, &L2_SEQ_OFFLINE_FLAG).unwrap());
    }

    #[test]
    fn with_flags_rejects_zero_address() {
        let (feed, _) = feed();
        assert!(matches!(
            feed.with_flags(Address::ZERO, uptime_core::NoFlags),
            Err(FeedError::InvalidConfiguration(_))
        ));
    }
}
