#![forbid(unsafe_code)]

use crate::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// Execution context of a single call into a component.
///
/// `sender` is the immediate caller (a consumer contract when a read is proxied),
/// `origin` is the externally-owned account that started the transaction and
/// `timestamp` is the executing domain's current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub sender: Address,
    pub origin: Address,
    pub timestamp: Timestamp,
}

impl CallContext {
    /// A call made directly by an externally-owned account.
    pub fn direct(account: Address, timestamp: Timestamp) -> Self {
        Self {
            sender: account,
            origin: account,
            timestamp,
        }
    }

    /// A call made by `contract` on behalf of a transaction started by `origin`.
    pub fn proxied(contract: Address, origin: Address, timestamp: Timestamp) -> Self {
        Self {
            sender: contract,
            origin,
            timestamp,
        }
    }

    /// Same caller, later point in time.
    pub fn at(self, timestamp: Timestamp) -> Self {
        Self { timestamp, ..self }
    }

    pub fn is_direct(&self) -> bool {
        self.sender == self.origin
    }
}
