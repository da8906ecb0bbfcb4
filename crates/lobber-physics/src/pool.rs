//! Fixed-capacity object pool with generation-checked handles.
//!
//! Slots are reused lowest-first. `count` is one past the highest occupied
//! slot, so iteration never walks the empty tail of the table.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{PhysicsError, PhysicsResult};
use crate::object::PhysicalObject;

/// Stable reference to a pooled object.
///
/// A handle outlives its object harmlessly: once the slot is released its
/// generation moves on and lookups through the old handle return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle {
    index: u16,
    generation: u32,
}

impl ObjectHandle {
    /// Creates a handle from its parts.
    #[must_use]
    pub const fn new(index: u16, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "object#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    object: Option<PhysicalObject>,
}

/// Arena of physical objects.
#[derive(Debug, Clone)]
pub struct ObjectPool {
    slots: Vec<Slot>,
    count: usize,
}

impl ObjectPool {
    /// Creates an empty pool with a fixed number of slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(usize::from(u16::MAX));
        Self {
            slots: vec![Slot::default(); capacity],
            count: 0,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// One past the highest occupied slot.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots[..self.count]
            .iter()
            .filter(|slot| slot.object.is_some())
            .count()
    }

    /// Returns true if no slot is occupied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Stores an object in the lowest free slot.
    pub fn allocate(&mut self, object: PhysicalObject) -> PhysicsResult<ObjectHandle> {
        let gap = self.slots[..self.count]
            .iter()
            .position(|slot| slot.object.is_none());
        let index = match gap {
            Some(gap) => gap,
            None if self.count < self.slots.len() => {
                self.count += 1;
                self.count - 1
            },
            None => {
                error!(
                    capacity = self.slots.len(),
                    "physics object pool exhausted"
                );
                return Err(PhysicsError::PoolExhausted {
                    capacity: self.slots.len(),
                });
            },
        };

        let slot = &mut self.slots[index];
        slot.object = Some(object);
        Ok(ObjectHandle::new(index as u16, slot.generation))
    }

    /// Removes an object and returns it.
    pub fn release(&mut self, handle: ObjectHandle) -> Option<PhysicalObject> {
        let slot = self.slot_mut(handle)?;
        let object = slot.object.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.shrink();
        object
    }

    fn shrink(&mut self) {
        while self.count > 0 && self.slots[self.count - 1].object.is_none() {
            self.count -= 1;
        }
    }

    fn slot_mut(&mut self, handle: ObjectHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(usize::from(handle.index))
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
    }

    /// Looks an object up.
    #[must_use]
    pub fn get(&self, handle: ObjectHandle) -> Option<&PhysicalObject> {
        self.slots
            .get(usize::from(handle.index))
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    /// Looks an object up for modification.
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut PhysicalObject> {
        self.slot_mut(handle)
            .and_then(|slot| slot.object.as_mut())
    }

    /// Returns true if the handle still refers to a live slot.
    #[must_use]
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Handles of all occupied slots, lowest slot first.
    #[must_use]
    pub fn handles(&self) -> Vec<ObjectHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Iterates occupied slots, lowest slot first.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &PhysicalObject)> + '_ {
        self.slots[..self.count]
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.object
                    .as_ref()
                    .map(|object| (ObjectHandle::new(index as u16, slot.generation), object))
            })
    }

    /// Removes every object, bumping the generation of each occupied slot.
    pub fn clear(&mut self) -> Vec<PhysicalObject> {
        let mut removed = Vec::new();
        for slot in &mut self.slots[..self.count] {
            if let Some(object) = slot.object.take() {
                slot.generation = slot.generation.wrapping_add(1);
                removed.push(object);
            }
        }
        self.count = 0;
        removed
    }

    /// Generation of every slot, occupied or not.
    #[must_use]
    pub fn generations(&self) -> Vec<u32> {
        self.slots.iter().map(|slot| slot.generation).collect()
    }

    /// Overwrites slot generations from a snapshot. Entries past the pool
    /// capacity are ignored.
    pub(crate) fn set_generations(&mut self, generations: &[u32]) {
        for (slot, generation) in self.slots.iter_mut().zip(generations) {
            slot.generation = *generation;
        }
    }

    /// Places an object in a specific slot, as recorded in a snapshot.
    ///
    /// Only valid on an empty slot; the slot takes the recorded generation
    /// so handles issued before the save keep working after a load.
    pub(crate) fn insert_at(
        &mut self,
        index: u16,
        generation: u32,
        object: PhysicalObject,
    ) -> Option<ObjectHandle> {
        let slot = self.slots.get_mut(usize::from(index))?;
        if slot.object.is_some() {
            return None;
        }
        slot.generation = generation;
        slot.object = Some(object);
        self.count = self.count.max(usize::from(index) + 1);
        Some(ObjectHandle::new(index, generation))
    }
}
