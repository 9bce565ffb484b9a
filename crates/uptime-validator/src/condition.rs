#![forbid(unsafe_code)]

//! Upstream signals deciding whether the monitored domain is down.

use std::sync::{Arc, Mutex};
use uptime_core::{Aggregator, CallContext};

pub trait UpstreamCondition {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `Ok(true)` when the monitored domain should be reported offline.
    fn is_down(&self, ctx: &CallContext) -> Result<bool, Self::Error>;
}

impl<C: UpstreamCondition + ?Sized> UpstreamCondition for Arc<C> {
    type Error = C::Error;

    fn is_down(&self, ctx: &CallContext) -> Result<bool, Self::Error> {
        (**self).is_down(ctx)
    }
}

/// Down when the watched feed has not updated for more than `threshold` seconds.
#[derive(Debug)]
pub struct StalenessCondition<F> {
    feed: F,
    threshold: u64,
}

impl<F: Aggregator> StalenessCondition<F> {
    pub fn new(feed: F, threshold: u64) -> Self {
        Self { feed, threshold }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

impl<F: Aggregator> UpstreamCondition for StalenessCondition<F> {
    type Error = F::Error;

    fn is_down(&self, ctx: &CallContext) -> Result<bool, F::Error> {
        let last = self.feed.latest_timestamp(ctx)?;
        // A feed timestamp ahead of the local clock counts as fresh.
        Ok(ctx.timestamp.saturating_sub(last) > self.threshold)
    }
}

/// Operator-controlled switch.
#[derive(Debug, Default)]
pub struct ManualFlag {
    down: Mutex<bool>,
}

impl ManualFlag {
    pub fn new(down: bool) -> Self {
        Self {
            down: Mutex::new(down),
        }
    }

    pub fn set(&self, down: bool) {
        *self.down.lock().unwrap_or_else(|e| e.into_inner()) = down;
    }

    pub fn get(&self) -> bool {
        *self.down.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl UpstreamCondition for ManualFlag {
    type Error = std::convert::Infallible;

    fn is_down(&self, _ctx: &CallContext) -> Result<bool, Self::Error> {
        Ok(self.get())
    }
}
