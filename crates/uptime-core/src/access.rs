#![forbid(unsafe_code)]

//! Access gates.
//!
//! A gate answers one question: may `subject` proceed in this call context?
//! Components receive a gate at construction and never depend on a concrete
//! policy. Gates that can be administered at runtime additionally implement
//! [`AccessAdmin`]; every admin call must come from an account that already
//! holds access, so the first holder is seeded at construction.

use crate::{Address, CallContext};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("No access: {caller}")]
    NoAccess { caller: Address },
    #[error("invalid quorum: threshold {threshold} with {members} member gates")]
    InvalidQuorum { threshold: usize, members: usize },
}

/// Capability check consumed by every gated component.
pub trait AccessGate {
    fn has_access(&self, subject: &Address, ctx: &CallContext) -> bool;

    /// Whether the gate currently enforces anything at all.
    fn check_enabled(&self) -> bool;
}

/// Runtime administration of a gate.
///
/// Mutators return `Ok(true)` when state changed and `Ok(false)` for a no-op.
pub trait AccessAdmin: AccessGate {
    fn add_access(&mut self, caller: &CallContext, subject: Address) -> Result<bool, AccessError>;
    fn remove_access(
        &mut self,
        caller: &CallContext,
        subject: Address,
    ) -> Result<bool, AccessError>;
    fn enable_access_check(&mut self, caller: &CallContext) -> Result<bool, AccessError>;
    fn disable_access_check(&mut self, caller: &CallContext) -> Result<bool, AccessError>;
}

impl<G: AccessGate + ?Sized> AccessGate for Box<G> {
    fn has_access(&self, subject: &Address, ctx: &CallContext) -> bool {
        (**self).has_access(subject, ctx)
    }

    fn check_enabled(&self) -> bool {
        (**self).check_enabled()
    }
}

impl<G: AccessGate + ?Sized> AccessGate for Arc<G> {
    fn has_access(&self, subject: &Address, ctx: &CallContext) -> bool {
        (**self).has_access(subject, ctx)
    }

    fn check_enabled(&self) -> bool {
        (**self).check_enabled()
    }
}

/// Allow-list gate with a global on/off switch.
///
/// `has_access` is true iff the check is disabled or the subject is listed.
/// Administration always requires the caller to be listed, even while the
/// check is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleAccessController {
    enabled: bool,
    access_list: BTreeSet<Address>,
}

impl SimpleAccessController {
    /// Enabled gate whose only holder is `deployer`.
    pub fn new(deployer: Address) -> Self {
        let mut access_list = BTreeSet::new();
        access_list.insert(deployer);
        Self {
            enabled: true,
            access_list,
        }
    }

    pub fn with_holders(holders: impl IntoIterator<Item = Address>) -> Self {
        Self {
            enabled: true,
            access_list: holders.into_iter().collect(),
        }
    }

    /// Builder used at construction time only; runtime toggling goes through
    /// [`AccessAdmin`].
    pub fn with_check(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_listed(&self, subject: &Address) -> bool {
        self.access_list.contains(subject)
    }

    pub fn holders(&self) -> impl Iterator<Item = &Address> {
        self.access_list.iter()
    }

    fn require_holder(&self, caller: &CallContext) -> Result<(), AccessError> {
        if self.is_listed(&caller.sender) {
            Ok(())
        } else {
            Err(AccessError::NoAccess {
                caller: caller.sender,
            })
        }
    }
}

impl AccessGate for SimpleAccessController {
    fn has_access(&self, subject: &Address, _ctx: &CallContext) -> bool {
        !self.enabled || self.is_listed(subject)
    }

    fn check_enabled(&self) -> bool {
        self.enabled
    }
}

impl AccessAdmin for SimpleAccessController {
    fn add_access(&mut self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        self.require_holder(caller)?;
        let added = self.access_list.insert(subject);
        if added {
            info!(subject = %subject, by = %caller.sender, "access granted");
        }
        Ok(added)
    }

    fn remove_access(
        &mut self,
        caller: &CallContext,
        subject: Address,
    ) -> Result<bool, AccessError> {
        self.require_holder(caller)?;
        let removed = self.access_list.remove(&subject);
        if removed {
            info!(subject = %subject, by = %caller.sender, "access revoked");
        }
        Ok(removed)
    }

    fn enable_access_check(&mut self, caller: &CallContext) -> Result<bool, AccessError> {
        self.require_holder(caller)?;
        if self.enabled {
            return Ok(false);
        }
        self.enabled = true;
        info!(by = %caller.sender, "access check enabled");
        Ok(true)
    }

    fn disable_access_check(&mut self, caller: &CallContext) -> Result<bool, AccessError> {
        self.require_holder(caller)?;
        if !self.enabled {
            return Ok(false);
        }
        self.enabled = false;
        info!(by = %caller.sender, "access check disabled");
        Ok(true)
    }
}

/// Read gate: like its inner gate, but a direct call from the transaction
/// origin is always allowed. Contracts proxying a read are still checked by
/// their own address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAccessController<G> {
    inner: G,
}

impl<G> ReadAccessController<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: AccessGate> AccessGate for ReadAccessController<G> {
    fn has_access(&self, subject: &Address, ctx: &CallContext) -> bool {
        self.inner.has_access(subject, ctx) || *subject == ctx.origin
    }

    fn check_enabled(&self) -> bool {
        self.inner.check_enabled()
    }
}

impl<G: AccessAdmin> AccessAdmin for ReadAccessController<G> {
    fn add_access(&mut self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        self.inner.add_access(caller, subject)
    }

    fn remove_access(
        &mut self,
        caller: &CallContext,
        subject: Address,
    ) -> Result<bool, AccessError> {
        self.inner.remove_access(caller, subject)
    }

    fn enable_access_check(&mut self, caller: &CallContext) -> Result<bool, AccessError> {
        self.inner.enable_access_check(caller)
    }

    fn disable_access_check(&mut self, caller: &CallContext) -> Result<bool, AccessError> {
        self.inner.disable_access_check(caller)
    }
}

/// Gate that lets everyone through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowAll;

impl AccessGate for AllowAll {
    fn has_access(&self, _subject: &Address, _ctx: &CallContext) -> bool {
        true
    }

    fn check_enabled(&self) -> bool {
        false
    }
}

/// Gate that lets nobody through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DenyAll;

impl AccessGate for DenyAll {
    fn has_access(&self, _subject: &Address, _ctx: &CallContext) -> bool {
        false
    }

    fn check_enabled(&self) -> bool {
        true
    }
}

/// Grants access when at least `threshold` member gates grant it.
pub struct QuorumGate {
    members: Vec<Box<dyn AccessGate + Send + Sync>>,
    threshold: usize,
}

impl QuorumGate {
    pub fn new(
        members: Vec<Box<dyn AccessGate + Send + Sync>>,
        threshold: usize,
    ) -> Result<Self, AccessError> {
        if threshold == 0 || threshold > members.len() {
            return Err(AccessError::InvalidQuorum {
                threshold,
                members: members.len(),
            });
        }
        Ok(Self { members, threshold })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl std::fmt::Debug for QuorumGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuorumGate")
            .field("members", &self.members.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl AccessGate for QuorumGate {
    fn has_access(&self, subject: &Address, ctx: &CallContext) -> bool {
        let grants = self
            .members
            .iter()
            .filter(|g| g.has_access(subject, ctx))
            .count();
        grants >= self.threshold
    }

    fn check_enabled(&self) -> bool {
        self.members.iter().any(|g| g.check_enabled())
    }
}
