//! In-process event channel
//!
//! The engine publishes to an [`EventBus`] handle it was constructed with.
//! Subscribers receive events in publish order. Publishing never blocks;
//! a subscriber that falls more than the channel capacity behind loses
//! the oldest events.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::exercise::Exercise;
use crate::phase::PhaseStatus;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// An event published by the phase engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TrainerEvent {
    /// A submission was checked.
    ExecutionStatus {
        /// The status returned to the caller
        status: PhaseStatus,
    },

    /// An exercise became the one being worked on.
    ExerciseSelected {
        /// The exercise content learners continue from
        exercise: Exercise,
    },
}

/// Cloneable publish/subscribe handle.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TrainerEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Registers a new subscriber. It sees only events published after
    /// this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TrainerEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to every current subscriber.
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: TrainerEvent) {
        match self.tx.send(event) {
            Ok(receivers) => trace!(receivers, "event published"),
            Err(_) => trace!("event published with no subscribers"),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
