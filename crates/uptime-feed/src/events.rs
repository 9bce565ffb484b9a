#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use uptime_core::{Address, RoundId, Timestamp};

/// Notifications emitted by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    Initialized {
        at: Timestamp,
    },
    NewRound {
        round_id: RoundId,
        started_by: Address,
        started_at: Timestamp,
    },
    AnswerUpdated {
        answer: i64,
        round_id: RoundId,
        updated_at: Timestamp,
    },
    AddedAccess {
        subject: Address,
    },
    RemovedAccess {
        subject: Address,
    },
    CheckAccessEnabled,
    CheckAccessDisabled,
}

pub trait EventSink {
    fn emit(&self, event: FeedEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: FeedEvent) {
        (**self).emit(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: FeedEvent) {}
}

/// Records events in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<FeedEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn events(&self) -> Vec<FeedEvent> {
        self.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<FeedEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn answer_updates(&self) -> Vec<FeedEvent> {
        self.lock()
            .iter()
            .filter(|e| matches!(e, FeedEvent::AnswerUpdated { .. }))
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FeedEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: FeedEvent) {
        self.lock().push(event);
    }
}
