//! Save/restore of the object table.
//!
//! A snapshot is the magic bytes followed by a bincode-encoded
//! [`PhysicsSnapshot`]. Every allocated slot is recorded with its index, and
//! the generation of every slot is kept, so handles that were live before
//! the save resolve after a restore, handles that were already stale stay
//! stale, and in-flight objects resume exactly where they stopped.

use std::fs;
use std::path::Path;

use lobber_common::{MagicBytes, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SnapshotError, SnapshotResult};
use crate::object::PhysicalObject;
use crate::pool::ObjectPool;

/// One allocated slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Slot index
    pub slot: u16,
    /// Slot generation
    pub generation: u32,
    /// Object state
    pub object: PhysicalObject,
}

/// Persisted object table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSnapshot {
    /// Format version
    pub version: SchemaVersion,
    /// Generation of every slot, occupied or not
    pub generations: Vec<u32>,
    /// Allocated slots in slot order
    pub records: Vec<SnapshotRecord>,
}

impl PhysicsSnapshot {
    /// Captures every allocated slot of a pool.
    #[must_use]
    pub fn capture(pool: &ObjectPool) -> Self {
        let records = pool
            .iter()
            .map(|(handle, object)| SnapshotRecord {
                slot: handle.index(),
                generation: handle.generation(),
                object: object.clone(),
            })
            .collect();
        Self {
            version: SchemaVersion::PHYSICS_SNAPSHOT,
            generations: pool.generations(),
            records,
        }
    }

    /// Number of recorded objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no object was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds a pool of the given capacity holding the recorded objects.
    pub fn restore(&self, capacity: usize) -> SnapshotResult<ObjectPool> {
        let mut pool = ObjectPool::new(capacity);
        pool.set_generations(&self.generations);
        for record in &self.records {
            if usize::from(record.slot) >= pool.capacity() {
                return Err(SnapshotError::SlotOutOfRange {
                    slot: record.slot,
                    capacity: pool.capacity(),
                });
            }
            if pool
                .insert_at(record.slot, record.generation, record.object.clone())
                .is_none()
            {
                return Err(SnapshotError::DuplicateSlot(record.slot));
            }
        }
        Ok(pool)
    }

    /// Serializes to binary format.
    pub fn to_bytes(&self) -> SnapshotResult<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&MagicBytes::PHYSICS_SNAPSHOT.0);
        buffer.extend(bincode::serialize(self)?);
        Ok(buffer)
    }

    /// Deserializes from binary format.
    pub fn from_bytes(bytes: &[u8]) -> SnapshotResult<Self> {
        let magic = MagicBytes::PHYSICS_SNAPSHOT.0;
        if bytes.len() < magic.len() || bytes[..magic.len()] != magic {
            return Err(SnapshotError::InvalidFormat);
        }

        let snapshot: Self = bincode::deserialize(&bytes[magic.len()..])?;
        if !SchemaVersion::PHYSICS_SNAPSHOT.can_read(&snapshot.version) {
            return Err(SnapshotError::VersionMismatch {
                expected: SchemaVersion::PHYSICS_SNAPSHOT.to_string(),
                found: snapshot.version.to_string(),
            });
        }
        Ok(snapshot)
    }

    /// Writes the snapshot to a file.
    pub fn save_to_file(&self, path: &Path) -> SnapshotResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes()?)?;
        info!(path = %path.display(), objects = self.len(), "saved physics snapshot");
        Ok(())
    }

    /// Reads a snapshot from a file.
    pub fn load_from_file(path: &Path) -> SnapshotResult<Self> {
        let snapshot = Self::from_bytes(&fs::read(path)?)?;
        info!(path = %path.display(), objects = snapshot.len(), "loaded physics snapshot");
        Ok(snapshot)
    }
}
