// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Double-buffered world snapshots.
//!
//! Two buffers alternate: the tick rebuilds the unpublished buffer from the
//! pools, stamps a monotonically increasing version, and publishes the
//! buffer index. Readers take a guard that pins the published buffer with a
//! per-buffer reader count; the writer never mutates a buffer that a guard
//! still pins. This is a latest-wins publisher — a reader that needs data
//! beyond the next tick must copy it out.
//!
//! The index and reader counts use `SeqCst`: the reader's
//! increment-then-recheck dance and the writer's count check must agree on
//! a single total order, or a reader could pin a buffer an instant after
//! the writer decided it was free. Plain release/acquire is enough for the
//! buffer contents themselves, which are published by the index store.
#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::hint;
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use tracing::warn;

use crate::agent::{AgentState, BehaviorKind};
use crate::axial::Axial;
use crate::ident::{AgentId, BarrackId};
use crate::pool::{AgentPool, BarrackPool};

/// Per-agent snapshot record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentView {
    /// Stable agent id (with generation).
    pub id: AgentId,
    /// Low-level state at the tick boundary.
    pub state: AgentState,
    /// High-level behavior kind.
    pub behavior: BehaviorKind,
    /// Faction identifier.
    pub faction: u8,
    /// Team/side identifier.
    pub side: u8,
    /// Owning barrack, or [`BarrackId::INVALID`].
    pub parent_barrack: BarrackId,
    /// Current cell.
    pub pos: Axial,
    /// Reserved next cell (meaningful while Moving).
    pub next: Axial,
    /// Goal cell.
    pub target: Axial,
}

/// Per-barrack snapshot record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BarrackView {
    /// Barrack id.
    pub id: BarrackId,
    /// Faction identifier.
    pub faction: u8,
    /// Team/side identifier.
    pub side: u8,
    /// State byte (opaque to the core).
    pub state: u8,
    /// Barrack cell.
    pub pos: Axial,
    /// Patrol leash radius.
    pub patrol_radius: u8,
    /// Currently bound agents.
    pub agent_count: u16,
}

/// One consistent view of all live agents and barracks at a tick boundary.
#[derive(Debug)]
pub struct WorldSnapshot {
    agents: Vec<AgentView>,
    barracks: Vec<BarrackView>,
    version: u64,
}

impl WorldSnapshot {
    fn with_capacity(agent_cap: usize, barrack_cap: usize) -> Self {
        Self {
            agents: Vec::with_capacity(agent_cap),
            barracks: Vec::with_capacity(barrack_cap),
            version: 0,
        }
    }

    /// Live agents in slot-index order.
    #[must_use]
    pub fn agents(&self) -> &[AgentView] {
        &self.agents
    }

    /// Live barracks in allocation order.
    #[must_use]
    pub fn barracks(&self) -> &[BarrackView] {
        &self.barracks
    }

    /// Monotonic snapshot sequence number (first published tick is 1).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn rebuild(&mut self, agents: &AgentPool, barracks: &BarrackPool, version: u64) {
        // Buffers were sized to pool capacities up front, so these pushes
        // never allocate during a tick.
        self.agents.clear();
        for index in 0..agents.capacity() {
            let Some(slot) = agents.live_at(index) else {
                continue;
            };
            self.agents.push(AgentView {
                id: slot.id,
                state: slot.state,
                behavior: slot.behavior.kind(),
                faction: slot.faction,
                side: slot.side,
                parent_barrack: slot.parent_barrack,
                pos: slot.pos,
                next: slot.next,
                target: slot.target,
            });
        }

        self.barracks.clear();
        for index in 0..barracks.allocated() {
            let slot = barracks.slot(index);
            if !slot.active {
                continue;
            }
            self.barracks.push(BarrackView {
                id: slot.id,
                faction: slot.faction,
                side: slot.side,
                state: slot.state,
                pos: slot.pos,
                patrol_radius: slot.patrol_radius,
                agent_count: slot.agent_count,
            });
        }

        self.version = version;
    }
}

/// The two alternating buffers plus publication state.
pub(crate) struct SnapshotPair {
    buffers: [UnsafeCell<WorldSnapshot>; 2],
    readers: [AtomicU32; 2],
    published: AtomicUsize,
    version: AtomicU64,
}

// SAFETY: the writer only mutates the unpublished buffer after observing a
// zero reader count for it; readers only dereference a buffer their guard
// has pinned while it was published. See the module docs for the ordering
// argument.
unsafe impl Sync for SnapshotPair {}

impl SnapshotPair {
    pub fn new(agent_cap: usize, barrack_cap: usize) -> Self {
        Self {
            buffers: [
                UnsafeCell::new(WorldSnapshot::with_capacity(agent_cap, barrack_cap)),
                UnsafeCell::new(WorldSnapshot::with_capacity(agent_cap, barrack_cap)),
            ],
            readers: [AtomicU32::new(0), AtomicU32::new(0)],
            published: AtomicUsize::new(0),
            version: AtomicU64::new(0),
        }
    }

    /// Latest published version without pinning a buffer.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Rebuilds and publishes the unpublished buffer. Writer-only (the tick).
    pub fn publish(&self, agents: &AgentPool, barracks: &BarrackPool) {
        let back = 1 - self.published.load(Ordering::SeqCst);

        let mut warned = false;
        while self.readers[back].load(Ordering::SeqCst) != 0 {
            if !warned {
                warn!("snapshot reader held a guard across two ticks; tick is waiting");
                warned = true;
            }
            hint::spin_loop();
        }

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        // SAFETY: `back` is unpublished, and the loop above saw its reader
        // count at zero; no new guard can pin it because guards recheck the
        // published index after incrementing.
        unsafe {
            (*self.buffers[back].get()).rebuild(agents, barracks, version);
        }
        self.published.store(back, Ordering::SeqCst);
    }

    /// Pins and returns the currently published buffer.
    pub fn read(&self) -> SnapshotGuard<'_> {
        loop {
            let index = self.published.load(Ordering::SeqCst);
            self.readers[index].fetch_add(1, Ordering::SeqCst);
            if self.published.load(Ordering::SeqCst) == index {
                return SnapshotGuard { pair: self, index };
            }
            // The buffer flipped away between the load and the pin; release
            // and chase the new index.
            self.readers[index].fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Read guard pinning one published snapshot buffer.
///
/// Holding a guard across a tick boundary stalls the *second* publish after
/// it; treat the view as short-lived and copy anything long-lived.
pub struct SnapshotGuard<'a> {
    pair: &'a SnapshotPair,
    index: usize,
}

impl Deref for SnapshotGuard<'_> {
    type Target = WorldSnapshot;

    fn deref(&self) -> &WorldSnapshot {
        // SAFETY: this guard's increment is visible to the writer, which
        // never mutates a buffer whose reader count is nonzero.
        unsafe { &*self.pair.buffers[self.index].get() }
    }
}

impl Drop for SnapshotGuard<'_> {
    fn drop(&mut self) {
        self.pair.readers[self.index].fetch_sub(1, Ordering::SeqCst);
    }
}
