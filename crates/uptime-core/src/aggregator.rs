#![forbid(unsafe_code)]

//! Aggregator-style read interface and a fixed in-memory feed.
//!
//! The trait mirrors the generic price/data-feed reads consumers already
//! understand. Reads take the caller's [`CallContext`] so implementations can
//! gate them.

use crate::{CallContext, RoundData, RoundId, Timestamp};
use std::sync::{Mutex, MutexGuard};

pub trait Aggregator {
    type Error: std::error::Error + Send + Sync + 'static;

    fn decimals(&self) -> u8;
    fn description(&self) -> String;
    fn version(&self) -> u64;

    fn latest_answer(&self, ctx: &CallContext) -> Result<i64, Self::Error>;
    fn latest_timestamp(&self, ctx: &CallContext) -> Result<Timestamp, Self::Error>;
    fn latest_round(&self, ctx: &CallContext) -> Result<RoundId, Self::Error>;

    /// Answer of `round_id`, or 0 for an unknown round.
    fn get_answer(&self, ctx: &CallContext, round_id: RoundId) -> Result<i64, Self::Error>;
    /// Update time of `round_id`, or 0 for an unknown round.
    fn get_timestamp(&self, ctx: &CallContext, round_id: RoundId)
        -> Result<Timestamp, Self::Error>;

    fn get_round_data(&self, ctx: &CallContext, round_id: RoundId)
        -> Result<RoundData, Self::Error>;
    fn latest_round_data(&self, ctx: &CallContext) -> Result<RoundData, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedAggregatorError {
    #[error("No data present")]
    NoData,
    #[error("No data present for round {0}")]
    RoundNotFound(RoundId),
}

/// Ungated in-memory feed whose answers are pushed by the owner of the value.
///
/// Used wherever a component consumes an external feed (gas price, upstream
/// heartbeat) and the real feed lives elsewhere.
#[derive(Debug)]
pub struct FixedAggregator {
    decimals: u8,
    description: String,
    rounds: Mutex<Vec<RoundData>>,
}

impl FixedAggregator {
    pub fn new(decimals: u8, description: impl Into<String>) -> Self {
        Self {
            decimals,
            description: description.into(),
            rounds: Mutex::new(Vec::new()),
        }
    }

    /// Feed with a single round already published.
    pub fn with_answer(answer: i64, updated_at: Timestamp) -> Self {
        let feed = Self::new(0, "fixed feed");
        feed.push_answer(answer, updated_at);
        feed
    }

    /// Publish a new round and return its id. Ids start at 1.
    pub fn push_answer(&self, answer: i64, updated_at: Timestamp) -> RoundId {
        let mut rounds = self.lock();
        let round_id = RoundId::try_from(rounds.len())
            .unwrap_or(RoundId::MAX)
            .saturating_add(1);
        rounds.push(RoundData {
            round_id,
            answer,
            started_at: updated_at,
            updated_at,
            answered_in_round: round_id,
        });
        round_id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RoundData>> {
        self.rounds.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn find(&self, round_id: RoundId) -> Option<RoundData> {
        let idx = usize::try_from(round_id.checked_sub(1)?).ok()?;
        self.lock().get(idx).copied()
    }

    fn latest(&self) -> Result<RoundData, FixedAggregatorError> {
        self.lock()
            .last()
            .copied()
            .ok_or(FixedAggregatorError::NoData)
    }
}

impl Aggregator for FixedAggregator {
    type Error = FixedAggregatorError;

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn version(&self) -> u64 {
        1
    }

    fn latest_answer(&self, _ctx: &CallContext) -> Result<i64, Self::Error> {
        Ok(self.latest()?.answer)
    }

    fn latest_timestamp(&self, _ctx: &CallContext) -> Result<Timestamp, Self::Error> {
        Ok(self.latest()?.updated_at)
    }

    fn latest_round(&self, _ctx: &CallContext) -> Result<RoundId, Self::Error> {
        Ok(self.latest()?.round_id)
    }

    fn get_answer(&self, _ctx: &CallContext, round_id: RoundId) -> Result<i64, Self::Error> {
        Ok(self.find(round_id).map(|r| r.answer).unwrap_or(0))
    }

    fn get_timestamp(
        &self,
        _ctx: &CallContext,
        round_id: RoundId,
    ) -> Result<Timestamp, Self::Error> {
        Ok(self.find(round_id).map(|r| r.updated_at).unwrap_or(0))
    }

    fn get_round_data(
        &self,
        _ctx: &CallContext,
        round_id: RoundId,
    ) -> Result<RoundData, Self::Error> {
        self.find(round_id)
            .ok_or(FixedAggregatorError::RoundNotFound(round_id))
    }

    fn latest_round_data(&self, _ctx: &CallContext) -> Result<RoundData, Self::Error> {
        self.latest()
    }
}
