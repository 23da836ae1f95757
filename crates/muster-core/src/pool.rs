// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generational agent pool and bump-allocated barrack pool.
//!
//! The agent pool is a dense slot vector with an intrusive free list: each
//! inactive slot stores the index of the next free slot. Allocation pops the
//! free head and bumps the slot's generation; lookups validate index range,
//! generation, and the active flag, so stale ids fail cleanly. This is the
//! only lifetime mechanism inside the simulation — no pointers, ever.

use crate::agent::AgentSlot;
use crate::axial::Axial;
use crate::ident::{AgentId, BarrackId};

/// Dense generational slot allocator for agents.
#[derive(Debug)]
pub(crate) struct AgentPool {
    slots: Vec<AgentSlot>,
    free_head: u16,
    active: u32,
}

impl AgentPool {
    /// Creates a pool with `capacity` slots, all free.
    pub fn new(capacity: u16) -> Self {
        let mut slots = Vec::with_capacity(usize::from(capacity));
        for i in 0..capacity {
            let next = if i + 1 == capacity {
                AgentId::INVALID.index()
            } else {
                i + 1
            };
            slots.push(AgentSlot::default_with_link(next));
        }
        Self {
            slots,
            free_head: if capacity == 0 { AgentId::INVALID.index() } else { 0 },
            active: 0,
        }
    }

    /// Number of slots, live or free.
    pub fn capacity(&self) -> u16 {
        self.slots.len() as u16
    }

    /// Number of live agents.
    pub fn active_count(&self) -> u32 {
        self.active
    }

    /// Allocates a slot and mints a fresh id, or `None` when full.
    pub fn allocate(&mut self) -> Option<AgentId> {
        let index = self.free_head;
        if index == AgentId::INVALID.index() {
            return None;
        }
        let slot = &mut self.slots[usize::from(index)];
        self.free_head = slot.next_free;
        slot.generation = slot.generation.wrapping_add(1);
        slot.active = true;
        slot.id = AgentId::from_parts(index, slot.generation);
        self.active += 1;
        Some(slot.id)
    }

    /// Frees a live slot; stale or invalid ids are ignored.
    ///
    /// Returns `true` when the slot was actually freed.
    pub fn free(&mut self, id: AgentId) -> bool {
        let index = id.index();
        if self.get(id).is_none() {
            return false;
        }
        let free_head = self.free_head;
        let slot = &mut self.slots[usize::from(index)];
        slot.active = false;
        slot.pending = None;
        slot.next_free = free_head;
        self.free_head = index;
        self.active -= 1;
        true
    }

    /// Looks up a live slot by id, validating range, generation, and the
    /// active flag.
    pub fn get(&self, id: AgentId) -> Option<&AgentSlot> {
        let index = usize::from(id.index());
        let slot = self.slots.get(index)?;
        (slot.active && slot.generation == id.generation()).then_some(slot)
    }

    /// Mutable variant of [`AgentPool::get`].
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut AgentSlot> {
        let index = usize::from(id.index());
        let slot = self.slots.get_mut(index)?;
        (slot.active && slot.generation == id.generation()).then_some(slot)
    }

    /// Raw slot access by index for the tick's slot-order walk.
    ///
    /// Callers must check `active` themselves; the tick loop visits every
    /// slot, live or not.
    pub fn slot(&self, index: u16) -> &AgentSlot {
        &self.slots[usize::from(index)]
    }

    /// Mutable raw slot access by index.
    pub fn slot_mut(&mut self, index: u16) -> &mut AgentSlot {
        &mut self.slots[usize::from(index)]
    }

    /// Live slot at `index`, or `None` when the slot is free.
    pub fn live_at(&self, index: u16) -> Option<&AgentSlot> {
        let slot = self.slots.get(usize::from(index))?;
        slot.active.then_some(slot)
    }
}

/// One barrack slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct BarrackSlot {
    /// Assigned id; equal to the slot index.
    pub id: BarrackId,
    /// Live flag.
    pub active: bool,
    /// Faction identifier.
    pub faction: u8,
    /// Team/side identifier.
    pub side: u8,
    /// State byte (opaque to the core).
    pub state: u8,
    /// Behavior byte (opaque to the core).
    pub behavior: u8,
    /// Patrol leash radius for bound agents.
    pub patrol_radius: u8,
    /// Barrack cell.
    pub pos: Axial,
    /// Maximum agents managed.
    pub max_agents: u16,
    /// Currently bound agents.
    pub agent_count: u16,
}

/// Bump allocator over a dense barrack array.
///
/// Barracks are never freed in this version; the allocator only grows up to
/// its fixed capacity.
#[derive(Debug)]
pub(crate) struct BarrackPool {
    slots: Vec<BarrackSlot>,
    next: u16,
}

impl BarrackPool {
    /// Creates a pool with `capacity` slots.
    pub fn new(capacity: u16) -> Self {
        Self {
            slots: vec![BarrackSlot::default(); usize::from(capacity)],
            next: 0,
        }
    }

    /// Number of slots handed out so far.
    pub fn allocated(&self) -> u16 {
        self.next
    }

    /// Allocates the next sequential slot, or `None` when full.
    pub fn allocate(&mut self) -> Option<BarrackId> {
        if usize::from(self.next) >= self.slots.len() {
            return None;
        }
        let id = BarrackId::from_raw(self.next);
        let slot = &mut self.slots[usize::from(self.next)];
        slot.id = id;
        slot.active = true;
        self.next += 1;
        Some(id)
    }

    /// Looks up a live barrack by id.
    pub fn get(&self, id: BarrackId) -> Option<&BarrackSlot> {
        let slot = self.slots.get(usize::from(id.raw()))?;
        slot.active.then_some(slot)
    }

    /// Mutable variant of [`BarrackPool::get`].
    pub fn get_mut(&mut self, id: BarrackId) -> Option<&mut BarrackSlot> {
        let slot = self.slots.get_mut(usize::from(id.raw()))?;
        slot.active.then_some(slot)
    }

    /// Raw slot access by index for the snapshot walk.
    pub fn slot(&self, index: u16) -> &BarrackSlot {
        &self.slots[usize::from(index)]
    }
}
