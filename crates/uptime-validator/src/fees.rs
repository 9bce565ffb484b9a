#![forbid(unsafe_code)]

//! Retryable-ticket fee budget.
//!
//! All amounts are integer wei. Arithmetic is checked; `None` means overflow.

use serde::{Deserialize, Serialize};

pub type Wei = u128;

/// L1 gas price estimates are tripled (200% buffer).
pub const L1_GAS_PRICE_MULTIPLIER: Wei = 3;
/// Submission cost scales per 256 bytes of calldata.
pub const CALLDATA_COST_DIVISOR: Wei = 256;

/// Execution budget for the L2 leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasConfig {
    pub max_gas: u64,
    pub gas_price_bid: Wei,
}

impl GasConfig {
    pub fn new(max_gas: u64, gas_price_bid: Wei) -> Self {
        Self {
            max_gas,
            gas_price_bid,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_gas == 0 {
            return Err("max_gas must be non-zero".to_string());
        }
        if self.gas_price_bid == 0 {
            return Err("gas_price_bid must be non-zero".to_string());
        }
        Ok(())
    }

    /// `max_gas * gas_price_bid`.
    pub fn execution_cost(&self) -> Option<Wei> {
        Wei::from(self.max_gas).checked_mul(self.gas_price_bid)
    }
}

/// Who pays for the ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStrategy {
    /// The validator attaches the full cost from its own balance.
    #[default]
    L1,
    /// The validator's aliased L2 account pays; nothing is attached.
    L2,
}

/// Breakdown of one ticket's cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketCost {
    pub max_submission_cost: Wei,
    /// `max_submission_cost + max_gas * gas_price_bid`.
    pub total: Wei,
}

impl TicketCost {
    /// Value to attach to the ticket under `strategy`.
    pub fn attached_value(&self, strategy: PaymentStrategy) -> Wei {
        match strategy {
            PaymentStrategy::L1 => self.total,
            PaymentStrategy::L2 => 0,
        }
    }
}

pub fn l1_gas_estimate(l1_gas_price: Wei) -> Option<Wei> {
    l1_gas_price.checked_mul(L1_GAS_PRICE_MULTIPLIER)
}

/// `estimate * calldata_len / 256 + estimate`, with `estimate = 3 * l1_gas_price`.
pub fn max_submission_cost(l1_gas_price: Wei, calldata_len: usize) -> Option<Wei> {
    let estimate = l1_gas_estimate(l1_gas_price)?;
    let len = Wei::try_from(calldata_len).ok()?;
    estimate
        .checked_mul(len)?
        .checked_div(CALLDATA_COST_DIVISOR)?
        .checked_add(estimate)
}

pub fn ticket_cost(gas: &GasConfig, l1_gas_price: Wei, calldata_len: usize) -> Option<TicketCost> {
    let max_submission_cost = max_submission_cost(l1_gas_price, calldata_len)?;
    let total = max_submission_cost.checked_add(gas.execution_cost()?)?;
    Some(TicketCost {
        max_submission_cost,
        total,
    })
}
