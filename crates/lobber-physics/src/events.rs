//! Event bus for reporting object lifecycles to the rest of the game.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use lobber_common::{ActorId, ItemTypeId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lifecycle::Fate;
use crate::pool::ObjectHandle;

/// Events published by the physics world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhysicsEvent {
    /// Object put into flight
    Launched {
        /// Object handle
        handle: ObjectHandle,
        /// Carried item
        item: ItemTypeId,
        /// Launching actor
        owner: Option<ActorId>,
    },
    /// Object finished its flight
    Finished {
        /// Object handle (already released)
        handle: ObjectHandle,
        /// Carried item
        item: ItemTypeId,
        /// How the flight ended
        fate: Fate,
    },
    /// Objects removed without finishing, e.g. on level unload
    Cleared {
        /// Number of objects removed
        count: usize,
    },
    /// Object table replaced from a snapshot
    Restored {
        /// Number of objects restored
        count: usize,
    },
}

/// Bounded queue between the physics world and whoever drains it.
///
/// Publishing never blocks: once `capacity` events are waiting, further
/// events are dropped and logged.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<PhysicsEvent>,
    receiver: Receiver<PhysicsEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Queues an event, dropping it if the bus is full.
    pub fn publish(&self, event: PhysicsEvent) {
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            warn!(capacity = self.capacity, ?event, "physics event bus full, dropping event");
        }
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<PhysicsEvent> {
        self.receiver.try_iter().collect()
    }
}
