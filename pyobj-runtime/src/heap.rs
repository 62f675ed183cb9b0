//! Object heap - slot arena with explicit reference counts
//!
//! Design: objects are addressed by `(slot, generation, epoch)` triples instead of raw
//! pointers, so every reference handed to the heap is validated:
//! - Freed slots are recycled through a free list; a per-slot generation
//!   tells a recycled slot apart from the object that used to live there
//! - A reference from an older runtime epoch is rejected
//! - Dropping the last reference frees children iteratively (no recursion)
//! - Cycles are reclaimed by an explicit trial-deletion pass

use crate::error::{RtResult, RuntimeError};
use crate::logging::{debug, trace};
use crate::object::Object;

/// Raw reference to one runtime object
///
/// An `ObjRef` is plain data: copying it does not touch the refcount.
/// Ownership is tracked by whoever called `incref`/`decref` on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: u32,
    generation: u32,
    epoch: u32,
}

impl ObjRef {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub fn epoch(self) -> u32 {
        self.epoch
    }
}

struct Slot {
    refcount: usize,
    generation: u32,
    object: Option<Object>,
}

pub(crate) struct Heap {
    epoch: u32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    allocations: u64,
    since_collection: usize,
}

impl Heap {
    /// Allocations between automatic cycle collections
    pub const COLLECTION_THRESHOLD: usize = 700;

    pub fn new(epoch: u32) -> Self {
        Self {
            epoch,
            slots: Vec::with_capacity(256),
            free: Vec::new(),
            live: 0,
            allocations: 0,
            since_collection: 0,
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Allocate a new object with refcount 1
    pub fn alloc(&mut self, object: Object) -> ObjRef {
        self.allocations += 1;
        self.since_collection += 1;
        self.live += 1;

        let (index, generation) = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.refcount = 1;
                slot.object = Some(object);
                (index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    refcount: 1,
                    generation: 0,
                    object: Some(object),
                });
                ((self.slots.len() - 1) as u32, 0)
            }
        };

        trace!(event = "alloc", index, generation, live = self.live);
        ObjRef {
            index,
            generation,
            epoch: self.epoch,
        }
    }

    /// Empty a slot and queue it for reuse
    fn release_slot(&mut self, index: u32) -> Option<Object> {
        let slot = self.slots.get_mut(index as usize)?;
        let object = slot.object.take()?;
        slot.refcount = 0;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
        Some(object)
    }

    fn slot(&self, r: ObjRef) -> RtResult<&Slot> {
        if r.epoch != self.epoch {
            return Err(RuntimeError::stale_reference(r.index));
        }
        self.slots
            .get(r.index as usize)
            .filter(|slot| slot.object.is_some() && slot.generation == r.generation)
            .ok_or_else(|| RuntimeError::stale_reference(r.index))
    }

    fn slot_mut(&mut self, r: ObjRef) -> RtResult<&mut Slot> {
        if r.epoch != self.epoch {
            return Err(RuntimeError::stale_reference(r.index));
        }
        self.slots
            .get_mut(r.index as usize)
            .filter(|slot| slot.object.is_some() && slot.generation == r.generation)
            .ok_or_else(|| RuntimeError::stale_reference(r.index))
    }

    pub fn get(&self, r: ObjRef) -> RtResult<&Object> {
        let slot = self.slot(r)?;
        slot.object
            .as_ref()
            .ok_or_else(|| RuntimeError::stale_reference(r.index))
    }

    pub fn get_mut(&mut self, r: ObjRef) -> RtResult<&mut Object> {
        let index = r.index;
        let slot = self.slot_mut(r)?;
        slot.object
            .as_mut()
            .ok_or_else(|| RuntimeError::stale_reference(index))
    }

    pub fn incref(&mut self, r: ObjRef) -> RtResult<()> {
        let slot = self.slot_mut(r)?;
        slot.refcount += 1;
        Ok(())
    }

    /// Decrement refcount, freeing the object (and orphaned children) at zero
    pub fn decref(&mut self, r: ObjRef) -> RtResult<()> {
        let slot = self.slot_mut(r)?;
        debug_assert!(slot.refcount > 0, "refcount underflow");
        slot.refcount = slot.refcount.saturating_sub(1);
        if slot.refcount > 0 {
            return Ok(());
        }

        let mut pending = vec![r.index];
        while let Some(index) = pending.pop() {
            let Some(object) = self.release_slot(index) else {
                continue;
            };
            trace!(event = "free", index, live = self.live);

            for child in object.into_children() {
                if child.epoch != self.epoch {
                    continue;
                }
                if let Some(slot) = self.slots.get_mut(child.index as usize) {
                    if slot.object.is_some() && slot.generation == child.generation {
                        slot.refcount = slot.refcount.saturating_sub(1);
                        if slot.refcount == 0 {
                            pending.push(child.index);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Current refcount, 0 for an invalid reference
    pub fn refcount(&self, r: ObjRef) -> usize {
        self.slot(r).map(|slot| slot.refcount).unwrap_or(0)
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn collection_due(&self) -> bool {
        self.since_collection >= Self::COLLECTION_THRESHOLD
    }

    /// Reclaim unreachable reference cycles (trial deletion)
    ///
    /// An object is externally referenced when its refcount exceeds the
    /// number of references held by other heap objects. Everything not
    /// reachable from an externally referenced object is garbage.
    pub fn collect_cycles(&mut self) -> usize {
        self.since_collection = 0;
        let count = self.slots.len();
        let epoch = self.epoch;

        let mut gc_refs: Vec<isize> = self
            .slots
            .iter()
            .map(|slot| match slot.object {
                Some(_) => slot.refcount as isize,
                None => 0,
            })
            .collect();

        for slot in &self.slots {
            if let Some(object) = &slot.object {
                object.for_each_child(|child| {
                    if child.epoch == epoch {
                        if let Some(refs) = gc_refs.get_mut(child.index as usize) {
                            *refs -= 1;
                        }
                    }
                });
            }
        }

        let mut reachable = vec![false; count];
        let mut stack: Vec<usize> = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.object.is_some() && gc_refs[index] > 0 {
                reachable[index] = true;
                stack.push(index);
            }
        }

        while let Some(index) = stack.pop() {
            if let Some(object) = &self.slots[index].object {
                object.for_each_child(|child| {
                    let child_index = child.index as usize;
                    let live = self
                        .slots
                        .get(child_index)
                        .map_or(false, |slot| slot.object.is_some());
                    if child.epoch == epoch && live && !reachable[child_index] {
                        reachable[child_index] = true;
                        stack.push(child_index);
                    }
                });
            }
        }

        let garbage: Vec<usize> = (0..count)
            .filter(|&index| self.slots[index].object.is_some() && !reachable[index])
            .collect();
        if garbage.is_empty() {
            return 0;
        }

        let mut released = Vec::new();
        for &index in &garbage {
            if let Some(object) = self.release_slot(index as u32) {
                for child in object.into_children() {
                    let child_index = child.index as usize;
                    let is_garbage = child.epoch == epoch
                        && child_index < count
                        && !reachable[child_index];
                    if !is_garbage {
                        released.push(child);
                    }
                }
            }
        }
        for child in released {
            // Children outside the garbage set are still live
            let _ = self.decref(child);
        }

        debug!(event = "gc_complete", collected = garbage.len(), live = self.live);
        garbage.len()
    }
}
