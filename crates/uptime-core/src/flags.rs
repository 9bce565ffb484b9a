#![forbid(unsafe_code)]

//! Boolean flags keyed by address.
//!
//! A flag is raised or lowered by accounts holding write access and read by
//! accounts holding read access. The status feed mirrors its latest status
//! into a registry so that consumers can poll one flag instead of the feed.

use crate::{AccessAdmin, AccessError, AccessGate, Address, CallContext};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Flag subject for "L2 sequencer offline".
///
/// First 20 bytes of `keccak256("chainlink.flags.arbitrum-seq-offline") - 1`.
pub const L2_SEQ_OFFLINE_FLAG: Address = Address([
    0xa4, 0x38, 0x45, 0x1d, 0x64, 0x58, 0x04, 0x4c, 0x3c, 0x8c, 0xd2, 0xf6, 0xf3, 0x1c, 0x91, 0xac,
    0x88, 0x2a, 0x6d, 0x91,
]);

/// Registry of raised flags.
///
/// Methods take `&self`: one registry is shared between the writer and its
/// readers. Mutators return `Ok(true)` when the flag changed.
pub trait FlagRegistry {
    fn get_flag(&self, caller: &CallContext, subject: &Address) -> Result<bool, AccessError>;
    fn raise_flag(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError>;
    fn lower_flag(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError>;
}

impl<F: FlagRegistry + ?Sized> FlagRegistry for Arc<F> {
    fn get_flag(&self, caller: &CallContext, subject: &Address) -> Result<bool, AccessError> {
        (**self).get_flag(caller, subject)
    }

    fn raise_flag(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        (**self).raise_flag(caller, subject)
    }

    fn lower_flag(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        (**self).lower_flag(caller, subject)
    }
}

/// No registry attached: every flag reads lowered and writes are no-ops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFlags;

impl FlagRegistry for NoFlags {
    fn get_flag(&self, _caller: &CallContext, _subject: &Address) -> Result<bool, AccessError> {
        Ok(false)
    }

    fn raise_flag(&self, _caller: &CallContext, _subject: Address) -> Result<bool, AccessError> {
        Ok(false)
    }

    fn lower_flag(&self, _caller: &CallContext, _subject: Address) -> Result<bool, AccessError> {
        Ok(false)
    }
}

#[derive(Debug)]
struct FlagsState<G> {
    read_gate: G,
    write_gate: G,
    raised: BTreeSet<Address>,
}

/// In-memory registry with separate read and write gates.
#[derive(Debug)]
pub struct Flags<G> {
    state: Mutex<FlagsState<G>>,
}

impl<G: AccessGate> Flags<G> {
    pub fn new(read_gate: G, write_gate: G) -> Self {
        Self {
            state: Mutex::new(FlagsState {
                read_gate,
                write_gate,
                raised: BTreeSet::new(),
            }),
        }
    }

    pub fn shared(read_gate: G, write_gate: G) -> Arc<Self> {
        Arc::new(Self::new(read_gate, write_gate))
    }

    fn lock(&self) -> MutexGuard<'_, FlagsState<G>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(
        &self,
        caller: &CallContext,
        subject: Address,
        raise: bool,
    ) -> Result<bool, AccessError> {
        let mut state = self.lock();
        if !state.write_gate.has_access(&caller.sender, caller) {
            return Err(AccessError::NoAccess {
                caller: caller.sender,
            });
        }
        let changed = if raise {
            state.raised.insert(subject)
        } else {
            state.raised.remove(&subject)
        };
        if changed {
            info!(subject = %subject, raised = raise, by = %caller.sender, "flag changed");
        }
        Ok(changed)
    }
}

impl<G: AccessAdmin> Flags<G> {
    /// Grant read access; the caller must hold read-gate admin rights.
    pub fn add_reader(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        self.lock().read_gate.add_access(caller, subject)
    }

    pub fn remove_reader(
        &self,
        caller: &CallContext,
        subject: Address,
    ) -> Result<bool, AccessError> {
        self.lock().read_gate.remove_access(caller, subject)
    }

    /// Grant the right to raise and lower flags.
    pub fn add_writer(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        self.lock().write_gate.add_access(caller, subject)
    }

    pub fn remove_writer(
        &self,
        caller: &CallContext,
        subject: Address,
    ) -> Result<bool, AccessError> {
        self.lock().write_gate.remove_access(caller, subject)
    }
}

impl<G: AccessGate> FlagRegistry for Flags<G> {
    fn get_flag(&self, caller: &CallContext, subject: &Address) -> Result<bool, AccessError> {
        let state = self.lock();
        if !state.read_gate.has_access(&caller.sender, caller) {
            return Err(AccessError::NoAccess {
                caller: caller.sender,
            });
        }
        Ok(state.raised.contains(subject))
    }

    fn raise_flag(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        self.set(caller, subject, true)
    }

    fn lower_flag(&self, caller: &CallContext, subject: Address) -> Result<bool, AccessError> {
        self.set(caller, subject, false)
    }
}
