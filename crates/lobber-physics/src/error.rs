//! Error types for the physics core.

use lobber_common::{ActorId, ItemTypeId};
use thiserror::Error;

/// Errors that can occur in the physics system.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Every object slot is in use. Callers must treat this as fatal.
    #[error("out of physics object slots (capacity {capacity})")]
    PoolExhausted {
        /// Pool capacity
        capacity: usize,
    },

    /// Actor is unknown to the registry
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    /// Item type is unknown to the catalog
    #[error("unknown item type {}", .0.raw())]
    UnknownItem(ItemTypeId),

    /// Snapshot save/restore error
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Errors raised while saving or restoring the object table.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Magic bytes do not match
    #[error("not a physics snapshot")]
    InvalidFormat,

    /// Snapshot written by an incompatible version
    #[error("incompatible snapshot version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes
        expected: String,
        /// Version found in the data
        found: String,
    },

    /// Record addresses a slot outside the pool
    #[error("slot {slot} out of range for capacity {capacity}")]
    SlotOutOfRange {
        /// Slot index in the record
        slot: u16,
        /// Pool capacity
        capacity: usize,
    },

    /// Two records claim the same slot
    #[error("slot {0} appears twice")]
    DuplicateSlot(u16),
}

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

impl From<bincode::Error> for SnapshotError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PhysicsError::PoolExhausted { capacity: 50 };
        assert_eq!(err.to_string(), "out of physics object slots (capacity 50)");

        let err: PhysicsError = SnapshotError::DuplicateSlot(3).into();
        assert!(matches!(err, PhysicsError::Snapshot(SnapshotError::DuplicateSlot(3))));
        assert_eq!(err.to_string(), "snapshot error: slot 3 appears twice");
    }
}
