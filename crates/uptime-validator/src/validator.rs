#![forbid(unsafe_code)]

//! L1-side reporter.
//!
//! The validator turns an upstream signal into a status report and ships it to
//! the recorder's domain as a prepaid ticket. It never waits for delivery; the
//! recorder's dedup rule absorbs duplicates and reordering.

use crate::condition::UpstreamCondition;
use crate::fees::{self, GasConfig, PaymentStrategy, TicketCost, Wei};
use crate::message::StatusReportMessage;
use crate::transport::{CrossDomainInbox, RetryableTicket, TransportError};
use thiserror::Error;
use tracing::{debug, info, warn};
use uptime_core::{AccessAdmin, AccessError, AccessGate, Address, Aggregator, CallContext};
use uptime_core::{RoundId, Timestamp, ANSWER_SEQ_OFFLINE};

pub type ConfigGate = Box<dyn AccessGate + Send + Sync>;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("No access: {caller}")]
    NoAccess { caller: Address },
    #[error("only callable by owner, got {caller}")]
    OnlyOwner { caller: Address },
    #[error("only callable by owner or config access holder, got {caller}")]
    OnlyOwnerOrConfigAccess { caller: Address },
    #[error("must be proposed owner, got {caller}")]
    NotPendingOwner { caller: Address },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("insufficient funds: need {required} wei, have {available}")]
    InsufficientFunds { required: Wei, available: Wei },
    #[error("invalid L1 gas price answer {0}")]
    InvalidGasPrice(i64),
    #[error("fee arithmetic overflow")]
    FeeOverflow,
    #[error("balance overflow")]
    BalanceOverflow,
    #[error("upstream read failed: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<AccessError> for ValidatorError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::NoAccess { caller } => ValidatorError::NoAccess { caller },
            other => ValidatorError::InvalidConfiguration(other.to_string()),
        }
    }
}

/// Fixed deployment parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorParams {
    /// This validator's own L1 address.
    pub address: Address,
    pub owner: Address,
    /// Recorder contract on the destination domain.
    pub recorder: Address,
    pub gas: GasConfig,
    pub payment: PaymentStrategy,
}

/// One ticket handed to the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentReport {
    pub message_number: u64,
    pub status: bool,
    pub timestamp: Timestamp,
    pub cost: TicketCost,
    /// Wei attached to the ticket (zero under [`PaymentStrategy::L2`]).
    pub value: Wei,
}

/// Funds released by a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub to: Address,
    pub amount: Wei,
}

pub struct CrossDomainValidator<W, I, P> {
    address: Address,
    owner: Address,
    pending_owner: Option<Address>,
    recorder: Address,
    write_gate: W,
    config_gate: Option<ConfigGate>,
    inbox: I,
    gas_price_feed: P,
    gas: GasConfig,
    payment: PaymentStrategy,
    balance: Wei,
    /// Last status handed to the inbox; the recorder starts from `false`.
    last_reported: bool,
}

impl<W, I, P> CrossDomainValidator<W, I, P>
where
    W: AccessGate,
    I: CrossDomainInbox,
    P: Aggregator,
{
    pub fn new(
        params: ValidatorParams,
        write_gate: W,
        inbox: I,
        gas_price_feed: P,
    ) -> Result<Self, ValidatorError> {
        for (name, addr) in [
            ("address", params.address),
            ("owner", params.owner),
            ("recorder", params.recorder),
        ] {
            if addr.is_zero() {
                return Err(ValidatorError::InvalidConfiguration(format!(
                    "{name} is the zero address"
                )));
            }
        }
        params
            .gas
            .validate()
            .map_err(ValidatorError::InvalidConfiguration)?;
        Ok(Self {
            address: params.address,
            owner: params.owner,
            pending_owner: None,
            recorder: params.recorder,
            write_gate,
            config_gate: None,
            inbox,
            gas_price_feed,
            gas: params.gas,
            payment: params.payment,
            balance: 0,
            last_reported: false,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The account the recorder must trust.
    pub fn l2_alias(&self) -> Address {
        self.address.alias()
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    pub fn recorder(&self) -> Address {
        self.recorder
    }

    pub fn gas_config(&self) -> GasConfig {
        self.gas
    }

    pub fn payment_strategy(&self) -> PaymentStrategy {
        self.payment
    }

    pub fn balance(&self) -> Wei {
        self.balance
    }

    pub fn last_reported(&self) -> bool {
        self.last_reported
    }

    pub fn write_gate(&self) -> &W {
        &self.write_gate
    }

    pub fn inbox(&self) -> &I {
        &self.inbox
    }

    pub fn gas_price_feed(&self) -> &P {
        &self.gas_price_feed
    }

    pub fn has_config_gate(&self) -> bool {
        self.config_gate.is_some()
    }

    /// Aggregator hook: report when the answer changed between two rounds.
    ///
    /// `current_answer == 1` means offline. Returns `true` whether or not a
    /// ticket was sent.
    pub fn validate(
        &mut self,
        ctx: &CallContext,
        previous_round_id: RoundId,
        previous_answer: i64,
        current_round_id: RoundId,
        current_answer: i64,
    ) -> Result<bool, ValidatorError> {
        self.require_writer(ctx)?;
        if previous_answer == current_answer {
            debug!(
                previous_round_id,
                current_round_id, current_answer, "answer unchanged, nothing sent"
            );
            return Ok(true);
        }
        let status = current_answer == ANSWER_SEQ_OFFLINE;
        self.send_status(ctx, status)?;
        Ok(true)
    }

    /// Evaluate `condition` and send a report if it disagrees with the last
    /// status sent.
    pub fn check_and_report<C: UpstreamCondition>(
        &mut self,
        ctx: &CallContext,
        condition: &C,
    ) -> Result<Option<SentReport>, ValidatorError> {
        self.require_writer(ctx)?;
        let down = condition
            .is_down(&self.as_caller(ctx))
            .map_err(|e| ValidatorError::Upstream(Box::new(e)))?;
        if down == self.last_reported {
            debug!(down, "upstream status unchanged, nothing sent");
            return Ok(None);
        }
        self.send_status(ctx, down).map(Some)
    }

    /// Quote the cost of one status ticket at the current L1 gas price.
    pub fn quote(&self, ctx: &CallContext) -> Result<TicketCost, ValidatorError> {
        let calldata_len = StatusReportMessage::new(false, ctx.timestamp).encode().len();
        self.ticket_cost(ctx, calldata_len)
    }

    fn send_status(
        &mut self,
        ctx: &CallContext,
        status: bool,
    ) -> Result<SentReport, ValidatorError> {
        let data = StatusReportMessage::new(status, ctx.timestamp).encode();
        let cost = self.ticket_cost(ctx, data.len())?;
        let value = cost.attached_value(self.payment);
        if value > self.balance {
            warn!(
                required = value,
                available = self.balance,
                "cannot fund status ticket"
            );
            return Err(ValidatorError::InsufficientFunds {
                required: value,
                available: self.balance,
            });
        }

        let refund = self.l2_alias();
        let ticket = RetryableTicket {
            target: self.recorder,
            l2_call_value: 0,
            max_submission_cost: cost.max_submission_cost,
            excess_fee_refund_address: refund,
            call_value_refund_address: refund,
            max_gas: self.gas.max_gas,
            gas_price_bid: self.gas.gas_price_bid,
            data,
        };
        let message_number = self
            .inbox
            .create_retryable_ticket(self.address, value, ticket)?;

        self.balance -= value;
        self.last_reported = status;
        info!(
            message_number,
            status,
            timestamp = ctx.timestamp,
            value,
            "status report sent"
        );
        Ok(SentReport {
            message_number,
            status,
            timestamp: ctx.timestamp,
            cost,
            value,
        })
    }

    fn ticket_cost(
        &self,
        ctx: &CallContext,
        calldata_len: usize,
    ) -> Result<TicketCost, ValidatorError> {
        let answer = self
            .gas_price_feed
            .latest_answer(&self.as_caller(ctx))
            .map_err(|e| ValidatorError::Upstream(Box::new(e)))?;
        let l1_gas_price =
            Wei::try_from(answer).map_err(|_| ValidatorError::InvalidGasPrice(answer))?;
        fees::ticket_cost(&self.gas, l1_gas_price, calldata_len)
            .ok_or(ValidatorError::FeeOverflow)
    }

    /// Context for calls the validator itself makes.
    fn as_caller(&self, ctx: &CallContext) -> CallContext {
        CallContext::proxied(self.address, ctx.origin, ctx.timestamp)
    }

    fn require_writer(&self, ctx: &CallContext) -> Result<(), ValidatorError> {
        if self.write_gate.has_access(&ctx.sender, ctx) {
            Ok(())
        } else {
            Err(ValidatorError::NoAccess { caller: ctx.sender })
        }
    }

    fn require_owner(&self, ctx: &CallContext) -> Result<(), ValidatorError> {
        if ctx.sender == self.owner {
            Ok(())
        } else {
            Err(ValidatorError::OnlyOwner { caller: ctx.sender })
        }
    }

    fn require_owner_or_config_access(&self, ctx: &CallContext) -> Result<(), ValidatorError> {
        let allowed = ctx.sender == self.owner
            || self
                .config_gate
                .as_ref()
                .is_some_and(|g| g.has_access(&ctx.sender, ctx));
        if allowed {
            Ok(())
        } else {
            Err(ValidatorError::OnlyOwnerOrConfigAccess { caller: ctx.sender })
        }
    }

    // ========== Administration ==========

    pub fn set_gas_config(
        &mut self,
        ctx: &CallContext,
        gas: GasConfig,
    ) -> Result<(), ValidatorError> {
        self.require_owner_or_config_access(ctx)?;
        gas.validate().map_err(ValidatorError::InvalidConfiguration)?;
        self.gas = gas;
        info!(
            max_gas = gas.max_gas,
            gas_price_bid = gas.gas_price_bid,
            by = %ctx.sender,
            "gas config set"
        );
        Ok(())
    }

    pub fn set_payment_strategy(
        &mut self,
        ctx: &CallContext,
        payment: PaymentStrategy,
    ) -> Result<(), ValidatorError> {
        self.require_owner_or_config_access(ctx)?;
        self.payment = payment;
        info!(?payment, by = %ctx.sender, "payment strategy set");
        Ok(())
    }

    /// Replace (or clear) the gate consulted by config setters.
    pub fn set_config_access_controller(
        &mut self,
        ctx: &CallContext,
        gate: Option<ConfigGate>,
    ) -> Result<(), ValidatorError> {
        self.require_owner(ctx)?;
        let set = gate.is_some();
        self.config_gate = gate;
        info!(set, by = %ctx.sender, "config access controller set");
        Ok(())
    }

    /// Credit the validator's balance.
    pub fn fund(&mut self, amount: Wei) -> Result<Wei, ValidatorError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(ValidatorError::BalanceOverflow)?;
        debug!(amount, balance = self.balance, "validator funded");
        Ok(self.balance)
    }

    /// Release the whole balance to the owner.
    pub fn withdraw_funds(&mut self, ctx: &CallContext) -> Result<Withdrawal, ValidatorError> {
        let owner = self.owner;
        self.withdraw_funds_to(ctx, owner)
    }

    /// Release the whole balance to `recipient`.
    pub fn withdraw_funds_to(
        &mut self,
        ctx: &CallContext,
        recipient: Address,
    ) -> Result<Withdrawal, ValidatorError> {
        self.require_owner(ctx)?;
        if recipient.is_zero() {
            return Err(ValidatorError::InvalidConfiguration(
                "withdrawal recipient is the zero address".to_string(),
            ));
        }
        let amount = std::mem::take(&mut self.balance);
        info!(to = %recipient, amount, "funds withdrawn");
        Ok(Withdrawal {
            to: recipient,
            amount,
        })
    }

    /// Propose a new owner; takes effect once they accept.
    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        to: Address,
    ) -> Result<(), ValidatorError> {
        self.require_owner(ctx)?;
        if to == ctx.sender {
            return Err(ValidatorError::InvalidConfiguration(
                "cannot transfer ownership to self".to_string(),
            ));
        }
        if to.is_zero() {
            return Err(ValidatorError::InvalidConfiguration(
                "cannot transfer ownership to the zero address".to_string(),
            ));
        }
        self.pending_owner = Some(to);
        info!(from = %self.owner, to = %to, "ownership transfer requested");
        Ok(())
    }

    pub fn accept_ownership(&mut self, ctx: &CallContext) -> Result<(), ValidatorError> {
        if self.pending_owner != Some(ctx.sender) {
            return Err(ValidatorError::NotPendingOwner { caller: ctx.sender });
        }
        let previous = std::mem::replace(&mut self.owner, ctx.sender);
        self.pending_owner = None;
        info!(from = %previous, to = %ctx.sender, "ownership transferred");
        Ok(())
    }
}

impl<W, I, P> CrossDomainValidator<W, I, P>
where
    W: AccessAdmin,
    I: CrossDomainInbox,
    P: Aggregator,
{
    /// Grant write access (the right to call `validate`/`check_and_report`).
    pub fn add_access(
        &mut self,
        ctx: &CallContext,
        subject: Address,
    ) -> Result<bool, ValidatorError> {
        Ok(self.write_gate.add_access(ctx, subject)?)
    }

    pub fn remove_access(
        &mut self,
        ctx: &CallContext,
        subject: Address,
    ) -> Result<bool, ValidatorError> {
        Ok(self.write_gate.remove_access(ctx, subject)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ManualFlag;
    use crate::transport::MockInbox;
    use proptest::prelude::*;
    use std::sync::Arc;
    use uptime_core::{FixedAggregator, SimpleAccessController};

    type Validator = CrossDomainValidator<SimpleAccessController, Arc<MockInbox>, FixedAggregator>;

    const T0: Timestamp = 1_700_000_000;
    const MAX_GAS: u64 = 1_000_000;
    const GAS_PRICE_BID: Wei = 1_000_000;

    fn owner() -> Address {
        Address::from_low_u64(0xd00d)
    }

    fn writer() -> Address {
        Address::from_low_u64(0xaaaa)
    }

    fn params() -> ValidatorParams {
        ValidatorParams {
            address: Address::from_low_u64(0x7a1),
            owner: owner(),
            recorder: Address::from_low_u64(0xfeed),
            gas: GasConfig::new(MAX_GAS, GAS_PRICE_BID),
            payment: PaymentStrategy::L1,
        }
    }

    fn validator() -> (Validator, Arc<MockInbox>) {
        let inbox = MockInbox::shared();
        let mut v = CrossDomainValidator::new(
            params(),
            SimpleAccessController::new(owner()),
            inbox.clone(),
            FixedAggregator::with_answer(10, T0),
        )
        .unwrap();
        v.add_access(&CallContext::direct(owner(), T0), writer()).unwrap();
        v.fund(10u128.pow(18)).unwrap();
        (v, inbox)
    }

    fn as_writer(ts: Timestamp) -> CallContext {
        CallContext::direct(writer(), ts)
    }

    #[test]
    fn new_rejects_zero_addresses_and_gas() {
        let breakages: [fn(&mut ValidatorParams); 5] = [
            |p| p.address = Address::ZERO,
            |p| p.owner = Address::ZERO,
            |p| p.recorder = Address::ZERO,
            |p| p.gas.max_gas = 0,
            |p| p.gas.gas_price_bid = 0,
        ];
        for f in breakages {
            let mut p = params();
            f(&mut p);
            let err = CrossDomainValidator::new(
                p,
                SimpleAccessController::new(owner()),
                MockInbox::new(),
                FixedAggregator::with_answer(10, T0),
            )
            .err()
            .unwrap();
            assert!(matches!(err, ValidatorError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn validate_sends_offline_ticket_on_change() {
        let (mut v, inbox) = validator();
        let balance = v.balance();

        assert!(v.validate(&as_writer(T0 + 5), 0, 0, 1, 1).unwrap());
        let subs = inbox.submitted();
        assert_eq!(subs.len(), 1);
        let sub = &subs[0];

        let data = StatusReportMessage::new(true, T0 + 5).encode();
        let expected_cost =
            fees::ticket_cost(&GasConfig::new(MAX_GAS, GAS_PRICE_BID), 10, data.len()).unwrap();
        assert_eq!(sub.from, v.address());
        assert_eq!(sub.value, expected_cost.total);
        assert_eq!(
            sub.ticket,
            RetryableTicket {
                target: Address::from_low_u64(0xfeed),
                l2_call_value: 0,
                max_submission_cost: expected_cost.max_submission_cost,
                excess_fee_refund_address: v.l2_alias(),
                call_value_refund_address: v.l2_alias(),
                max_gas: MAX_GAS,
                gas_price_bid: GAS_PRICE_BID,
                data,
            }
        );
        assert_eq!(v.balance(), balance - expected_cost.total);
        assert!(v.last_reported());
    }

    #[test]
    fn validate_sends_nothing_when_answers_equal() {
        let (mut v, inbox) = validator();
        assert!(v.validate(&as_writer(T0), 3, 1, 4, 1).unwrap());
        assert!(v.validate(&as_writer(T0), 3, 0, 4, 0).unwrap());
        assert!(inbox.is_empty());
    }

    #[test]
    fn validate_maps_any_non_offline_answer_to_online() {
        let (mut v, inbox) = validator();
        v.validate(&as_writer(T0), 0, 1, 1, 7).unwrap();
        let msg = StatusReportMessage::decode(&inbox.submitted()[0].ticket.data).unwrap();
        assert_eq!(msg, StatusReportMessage::new(false, T0));
    }

    #[test]
    fn validate_requires_write_access() {
        let (mut v, inbox) = validator();
        let stranger = CallContext::direct(Address::from_low_u64(0xbad), T0);
        assert!(matches!(
            v.validate(&stranger, 0, 0, 1, 1),
            Err(ValidatorError::NoAccess { .. })
        ));
        assert!(inbox.is_empty());
    }

    #[test]
    fn l1_payment_requires_balance() {
        let inbox = MockInbox::shared();
        let mut v = CrossDomainValidator::new(
            params(),
            SimpleAccessController::new(owner()),
            inbox.clone(),
            FixedAggregator::with_answer(10, T0),
        )
        .unwrap();
        v.fund(5).unwrap();

        let err = v
            .validate(&CallContext::direct(owner(), T0), 0, 0, 1, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidatorError::InsufficientFunds { available: 5, .. }
        ));
        assert!(inbox.is_empty());
        assert_eq!(v.balance(), 5);
        assert!(!v.last_reported());
    }

    #[test]
    fn l2_payment_attaches_nothing() {
        let (mut v, inbox) = validator();
        v.set_payment_strategy(&CallContext::direct(owner(), T0), PaymentStrategy::L2)
            .unwrap();
        v.withdraw_funds(&CallContext::direct(owner(), T0)).unwrap();

        let sent = v.check_and_report(&as_writer(T0), &ManualFlag::new(true)).unwrap().unwrap();
        assert_eq!(sent.value, 0);
        assert!(sent.cost.max_submission_cost > 0);
        assert_eq!(inbox.submitted()[0].value, 0);
    }

    #[test]
    fn check_and_report_sends_only_on_change() {
        let (mut v, inbox) = validator();
        let flag = ManualFlag::new(false);

        assert_eq!(v.check_and_report(&as_writer(T0), &flag).unwrap(), None);
        flag.set(true);
        let sent = v.check_and_report(&as_writer(T0 + 1), &flag).unwrap().unwrap();
        assert!(sent.status);
        assert_eq!(sent.message_number, 0);
        assert_eq!(v.check_and_report(&as_writer(T0 + 2), &flag).unwrap(), None);
        flag.set(false);
        let sent = v.check_and_report(&as_writer(T0 + 3), &flag).unwrap().unwrap();
        assert!(!sent.status);
        assert_eq!(sent.message_number, 1);
        assert_eq!(inbox.len(), 2);
    }

    #[test]
    fn transport_failure_keeps_state() {
        let (mut v, inbox) = validator();
        let balance = v.balance();
        inbox.fail_next(TransportError::Unavailable("offline".into()));
        assert!(matches!(
            v.check_and_report(&as_writer(T0), &ManualFlag::new(true)),
            Err(ValidatorError::Transport(_))
        ));
        assert_eq!(v.balance(), balance);
        assert!(!v.last_reported());

        // Retry by the caller succeeds.
        assert!(v
            .check_and_report(&as_writer(T0 + 1), &ManualFlag::new(true))
            .unwrap()
            .is_some());
    }

    #[test]
    fn negative_gas_price_is_rejected() {
        let (mut v, _) = validator();
        v.gas_price_feed().push_answer(-1, T0);
        assert!(matches!(
            v.validate(&as_writer(T0), 0, 0, 1, 1),
            Err(ValidatorError::InvalidGasPrice(-1))
        ));
    }

    #[test]
    fn gas_config_admin() {
        let (mut v, _) = validator();
        let admin = CallContext::direct(owner(), T0);
        let configurer = CallContext::direct(Address::from_low_u64(0xc0f), T0);

        assert!(matches!(
            v.set_gas_config(&configurer, GasConfig::new(1, 1)),
            Err(ValidatorError::OnlyOwnerOrConfigAccess { .. })
        ));
        assert!(matches!(
            v.set_gas_config(&admin, GasConfig::new(0, 1)),
            Err(ValidatorError::InvalidConfiguration(_))
        ));

        assert!(matches!(
            v.set_config_access_controller(&configurer, None),
            Err(ValidatorError::OnlyOwner { .. })
        ));
        v.set_config_access_controller(
            &admin,
            Some(Box::new(SimpleAccessController::new(configurer.sender))),
        )
        .unwrap();
        assert!(v.has_config_gate());

        v.set_gas_config(&configurer, GasConfig::new(2, 3)).unwrap();
        assert_eq!(v.gas_config(), GasConfig::new(2, 3));
        v.set_payment_strategy(&configurer, PaymentStrategy::L2).unwrap();
        assert_eq!(v.payment_strategy(), PaymentStrategy::L2);

        v.set_config_access_controller(&admin, None).unwrap();
        assert!(v.set_gas_config(&configurer, GasConfig::new(4, 4)).is_err());
    }

    #[test]
    fn quote_matches_sent_cost() {
        let (mut v, _) = validator();
        let quote = v.quote(&as_writer(T0)).unwrap();
        let sent = v
            .check_and_report(&as_writer(T0), &ManualFlag::new(true))
            .unwrap()
            .unwrap();
        assert_eq!(sent.cost, quote);
    }

    #[test]
    fn withdrawals_are_owner_only() {
        let (mut v, _) = validator();
        let recipient = Address::from_low_u64(0x5e);
        assert!(matches!(
            v.withdraw_funds(&as_writer(T0)),
            Err(ValidatorError::OnlyOwner { .. })
        ));
        let w = v
            .withdraw_funds_to(&CallContext::direct(owner(), T0), recipient)
            .unwrap();
        assert_eq!(
            w,
            Withdrawal {
                to: recipient,
                amount: 10u128.pow(18)
            }
        );
        assert_eq!(v.balance(), 0);

        v.fund(7).unwrap();
        let w = v.withdraw_funds(&CallContext::direct(owner(), T0)).unwrap();
        assert_eq!(w, Withdrawal { to: owner(), amount: 7 });
    }

    #[test]
    fn fund_overflow_is_rejected() {
        let (mut v, _) = validator();
        assert!(matches!(v.fund(Wei::MAX), Err(ValidatorError::BalanceOverflow)));
    }

    #[test]
    fn ownership_is_two_step() {
        let (mut v, _) = validator();
        let next = Address::from_low_u64(0x0e2);
        let admin = CallContext::direct(owner(), T0);

        assert!(v.transfer_ownership(&admin, owner()).is_err());
        assert!(matches!(
            v.transfer_ownership(&as_writer(T0), next),
            Err(ValidatorError::OnlyOwner { .. })
        ));
        v.transfer_ownership(&admin, next).unwrap();
        assert_eq!(v.pending_owner(), Some(next));
        assert_eq!(v.owner(), owner());

        assert!(matches!(
            v.accept_ownership(&as_writer(T0)),
            Err(ValidatorError::NotPendingOwner { .. })
        ));
        v.accept_ownership(&CallContext::direct(next, T0)).unwrap();
        assert_eq!(v.owner(), next);
        assert_eq!(v.pending_owner(), None);
        assert!(v.withdraw_funds(&admin).is_err());
    }

    proptest! {
        #[test]
        fn one_ticket_per_status_change(flags in proptest::collection::vec(any::<bool>(), 0..32)) {
            let (mut v, inbox) = validator();
            let flag = ManualFlag::default();
            let mut last = false;
            let mut expected = 0usize;
            for (ts, down) in (T0..).zip(flags) {
                flag.set(down);
                let sent = v.check_and_report(&as_writer(ts), &flag).unwrap();
                prop_assert_eq!(sent.is_some(), down != last);
                if down != last {
                    expected += 1;
                    last = down;
                }
            }
            prop_assert_eq!(inbox.len(), expected);
            prop_assert_eq!(v.last_reported(), last);
        }
    }
}
