// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The tagged command carrier.
//!
//! Commands are a discriminated union: small payloads live inline in the
//! enum, large ones are boxed so the carrier stays queue-slot sized.
//! Ownership moves into the queue on push and out on pop — there are no
//! borrowed payloads and therefore no lifetime hazards between producers
//! and the tick that consumes them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::agent::{CollisionProfile, ExploreMode, DEFAULT_SPEED, DEFAULT_VIEW_RADIUS};
use crate::axial::Axial;
use crate::ident::{AgentId, BarrackId};

/// Write-back cell for an agent id minted during a later tick.
///
/// The caller keeps a clone, the command carries the other, and the command
/// processor stores the freshly minted id. Empty until the command's tick
/// completes; stays empty if the spawn soft-fails.
#[derive(Debug, Clone)]
pub struct AgentIdCell(Arc<AtomicU32>);

impl AgentIdCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicU32::new(AgentId::INVALID.raw())))
    }

    /// Returns the minted id once the spawning tick has run.
    #[must_use]
    pub fn get(&self) -> Option<AgentId> {
        let raw = self.0.load(Ordering::Acquire);
        let id = AgentId::from_raw(raw);
        id.is_valid().then_some(id)
    }

    pub(crate) fn set(&self, id: AgentId) {
        self.0.store(id.raw(), Ordering::Release);
    }
}

impl Default for AgentIdCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Write-back cell for a barrack id minted during a later tick.
#[derive(Debug, Clone)]
pub struct BarrackIdCell(Arc<AtomicU32>);

impl BarrackIdCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicU32::new(u32::from(BarrackId::INVALID.raw()))))
    }

    /// Returns the minted id once the spawning tick has run.
    #[must_use]
    pub fn get(&self) -> Option<BarrackId> {
        let raw = self.0.load(Ordering::Acquire);
        let id = BarrackId::from_raw((raw & 0xFFFF) as u16);
        id.is_valid().then_some(id)
    }

    pub(crate) fn set(&self, id: BarrackId) {
        self.0.store(u32::from(id.raw()), Ordering::Release);
    }
}

impl Default for BarrackIdCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn-time behavior selection for [`Command::AddAgentWithBehavior`] and
/// [`Command::SetBehavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BehaviorSpec {
    /// No standing orders.
    #[default]
    Idle,
    /// Wander inside a leash around `center`.
    Patrol {
        /// Patrol anchor cell.
        center: Axial,
        /// Leash radius in cells.
        radius: u8,
    },
    /// Roam toward unvisited territory.
    Explore {
        /// Strategy selector.
        mode: ExploreMode,
    },
    /// Hold guard tiles (assigned separately). Scheduling not implemented.
    Guard,
    /// Retreat from aggressors. Scheduling not implemented.
    Flee,
}

/// Building kinds for the reserved [`Command::AddBuilding`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingKind {
    /// Ranged defense emplacement.
    Tower,
    /// Agent spawn/command post.
    Barrack,
    /// Area denial aura.
    Immunity,
    /// Static obstacle.
    Wall,
    /// Triggered hazard.
    Trap,
}

/// Payload for [`Command::AddAgent`].
#[derive(Debug, Clone, Default)]
pub struct AddAgent {
    /// Spawn cell.
    pub at: Axial,
    /// Faction identifier.
    pub faction: u8,
    /// Team/side identifier.
    pub side: u8,
    /// Owning barrack, or [`BarrackId::INVALID`].
    pub parent_barrack: BarrackId,
    /// Collision triple.
    pub collision: CollisionProfile,
    /// Movement speed in progress units per tick.
    pub speed: u16,
    /// View radius in cells.
    pub view_radius: u8,
    /// Optional id write-back cell.
    pub id_cell: Option<AgentIdCell>,
}

impl AddAgent {
    /// Payload with defaults for everything but the spawn cell.
    #[must_use]
    pub fn at(at: Axial) -> Self {
        Self {
            at,
            speed: DEFAULT_SPEED,
            view_radius: DEFAULT_VIEW_RADIUS,
            ..Self::default()
        }
    }
}

/// Payload for [`Command::AddAgentWithBehavior`].
#[derive(Debug, Clone, Default)]
pub struct AddAgentWithBehavior {
    /// Base spawn payload.
    pub agent: AddAgent,
    /// Initial behavior.
    pub behavior: BehaviorSpec,
}

/// Payload for [`Command::AddBarrack`].
#[derive(Debug, Clone, Default)]
pub struct AddBarrack {
    /// Barrack cell.
    pub at: Axial,
    /// Faction identifier.
    pub faction: u8,
    /// Team/side identifier.
    pub side: u8,
    /// Patrol leash radius for bound agents.
    pub patrol_radius: u8,
    /// Maximum agents this barrack manages.
    pub max_agents: u16,
    /// Barrack behavior byte (opaque to the core).
    pub behavior: u8,
    /// Optional id write-back cell.
    pub id_cell: Option<BarrackIdCell>,
}

/// Payload for the reserved [`Command::AddGuardTiles`] variant.
#[derive(Debug, Clone)]
pub struct GuardTiles {
    /// Agent to assign the tiles to.
    pub agent: AgentId,
    /// Tiles, in assignment order.
    pub tiles: Vec<Axial>,
}

/// A command submitted by producers and consumed by the tick.
///
/// Dispatch is total: reserved variants are logged as unimplemented and
/// counted as processed, never rejected at submission time.
#[derive(Debug)]
pub enum Command {
    /// Allocate a new agent at a start cell.
    AddAgent(Box<AddAgent>),
    /// Allocate a new agent with an initial behavior.
    AddAgentWithBehavior(Box<AddAgentWithBehavior>),
    /// Remove an agent from the pool.
    RemoveAgent {
        /// Agent to remove.
        agent: AgentId,
    },
    /// Set an agent's target cell and schedule pathfinding.
    SetGoal {
        /// Agent to retarget.
        agent: AgentId,
        /// New goal cell.
        goal: Axial,
    },
    /// Switch a live agent's behavior at runtime.
    SetBehavior {
        /// Agent to re-task.
        agent: AgentId,
        /// New behavior.
        behavior: BehaviorSpec,
    },
    /// Create a new barrack.
    AddBarrack(Box<AddBarrack>),
    /// Write a map tile's state byte.
    SetTileState {
        /// Target cell.
        at: Axial,
        /// New state; `0` walkable, nonzero blocked.
        state: u8,
    },
    /// Attach an agent to a barrack. Reserved.
    BindBarrack {
        /// Agent to bind.
        agent: AgentId,
        /// Barrack to bind to.
        barrack: BarrackId,
    },
    /// Remove a barrack. Reserved; pools are grow-only this version.
    RemoveBarrack {
        /// Barrack to remove.
        barrack: BarrackId,
    },
    /// Assign one guard tile. Reserved.
    AddGuardTile {
        /// Agent to assign to.
        agent: AgentId,
        /// Tile to guard.
        at: Axial,
    },
    /// Assign a batch of guard tiles. Reserved.
    AddGuardTiles(Box<GuardTiles>),
    /// Unassign one guard tile. Reserved.
    RemoveGuardTile {
        /// Agent to unassign from.
        agent: AgentId,
        /// Tile to release.
        at: Axial,
    },
    /// Clear an agent's guard tiles. Reserved.
    ClearGuardTiles {
        /// Agent to clear.
        agent: AgentId,
    },
    /// Place a building. Reserved.
    AddBuilding {
        /// Building cell.
        at: Axial,
        /// Building kind.
        kind: BuildingKind,
    },
    /// Request an immediate next-step computation. Reserved.
    ComputeNext {
        /// Agent to compute for.
        agent: AgentId,
    },
    /// Dump internal state to the log. Reserved.
    DebugDumpState,
}

impl Command {
    /// Stable name for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddAgent(_) => "ADD_AGENT",
            Self::AddAgentWithBehavior(_) => "ADD_AGENT_WITH_BEHAVIOR",
            Self::RemoveAgent { .. } => "REMOVE_AGENT",
            Self::SetGoal { .. } => "SET_GOAL",
            Self::SetBehavior { .. } => "SET_BEHAVIOR",
            Self::AddBarrack(_) => "ADD_BARRACK",
            Self::SetTileState { .. } => "SET_TILE_STATE",
            Self::BindBarrack { .. } => "BIND_BARRACK",
            Self::RemoveBarrack { .. } => "REMOVE_BARRACK",
            Self::AddGuardTile { .. } => "ADD_GUARD_TILE",
            Self::AddGuardTiles(_) => "ADD_GUARD_TILES",
            Self::RemoveGuardTile { .. } => "REMOVE_GUARD_TILE",
            Self::ClearGuardTiles { .. } => "CLEAR_GUARD_TILES",
            Self::AddBuilding { .. } => "ADD_BUILDING",
            Self::ComputeNext { .. } => "COMPUTE_NEXT",
            Self::DebugDumpState => "DEBUG_DUMP_STATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_cells_start_empty_and_read_after_set() {
        let cell = AgentIdCell::new();
        assert_eq!(cell.get(), None);
        let id = AgentId::from_parts(7, 3);
        cell.set(id);
        assert_eq!(cell.get(), Some(id));
        // Clones share the same cell.
        let clone = cell.clone();
        assert_eq!(clone.get(), Some(id));
    }

    #[test]
    fn barrack_cell_round_trips() {
        let cell = BarrackIdCell::new();
        assert_eq!(cell.get(), None);
        cell.set(BarrackId::from_raw(12));
        assert_eq!(cell.get(), Some(BarrackId::from_raw(12)));
    }
}
