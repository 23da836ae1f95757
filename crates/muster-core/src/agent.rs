// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Agent state-machine data: behaviors, low-level states, collision profile.

use crate::axial::Axial;
use crate::ident::{AgentId, BarrackId};

/// Sub-tile progress at which an agent arrives at its next cell.
pub const MAX_PROGRESS: u32 = 10_000;

/// Default movement speed in progress units per tick (four ticks per tile).
pub const DEFAULT_SPEED: u16 = 2_500;

/// Default view radius in cells.
pub const DEFAULT_VIEW_RADIUS: u8 = 4;

/// Low-level agent state: *how* the agent is doing whatever it is doing.
///
/// Multi-step behavior is modeled by this explicit machine advanced one step
/// per tick; there are no coroutines anywhere in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentState {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// Waiting for the pathfinder to pick the next cell.
    Calculating,
    /// Accumulating progress toward the reserved next cell.
    Moving,
    /// Engaged in a pending interaction. Reserved; never entered yet.
    Interacting,
    /// Queued for removal (e.g. the owning barrack went stale).
    PendingRemoval,
}

/// High-level behavior kind: *what* the agent is doing.
///
/// This is the discriminant-only view copied into snapshots; the runtime
/// payload lives in [`Behavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BehaviorKind {
    /// No standing orders.
    #[default]
    Idle,
    /// Wander inside the owning barrack's patrol radius.
    Patrol,
    /// Roam toward unvisited territory.
    Explore,
    /// Hold a set of guard tiles.
    Guard,
    /// Retreat from aggressors.
    Flee,
}

/// Exploration strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExploreMode {
    /// Drift toward the nearest unvisited cell.
    #[default]
    Wander,
    /// Push toward the frontier of the visited region.
    Frontier,
}

/// Runtime data for patrol behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct PatrolState {
    /// Patrol anchor; seeded from the spawn payload.
    pub center: Axial,
    /// Leash radius in cells around the owning barrack.
    pub radius: u8,
    /// Current waypoint cursor. Reserved for waypoint patrols.
    pub waypoint: u16,
    /// Ticks spent idling between legs. Reserved.
    pub idle_timer: u32,
}

/// Runtime data for explore behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ExploreState {
    /// Strategy selector.
    pub mode: ExploreMode,
    /// Number of cells visited since spawn.
    pub visited: u32,
    /// Last explore target handed to the pathfinder.
    pub last_target: Axial,
}

/// Runtime data for guard behavior.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct GuardState {
    /// Tiles this agent is responsible for, in assignment order.
    pub tiles: Vec<Axial>,
}

/// High-level behavior with its per-behavior runtime payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Behavior {
    /// No standing orders.
    #[default]
    Idle,
    /// Wander inside the owning barrack's patrol radius.
    Patrol(PatrolState),
    /// Roam toward unvisited territory.
    Explore(ExploreState),
    /// Hold a set of guard tiles. Scheduling not implemented this version.
    Guard(GuardState),
    /// Retreat from aggressors. Scheduling not implemented this version.
    Flee,
}

impl Behavior {
    /// Discriminant-only view for snapshots and dispatch.
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Self::Idle => BehaviorKind::Idle,
            Self::Patrol(_) => BehaviorKind::Patrol,
            Self::Explore(_) => BehaviorKind::Explore,
            Self::Guard(_) => BehaviorKind::Guard,
            Self::Flee => BehaviorKind::Flee,
        }
    }
}

/// Collision triple tested by the entry and aggression rules.
///
/// `layer` is what the agent *is*; `collision_mask` is what it refuses to
/// share a tile with; `aggression_mask` is what it wants to attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionProfile {
    /// Layer bits this agent occupies.
    pub layer: u32,
    /// Layers this agent cannot enter a tile with.
    pub collision_mask: u32,
    /// Layers this agent attacks on contact (opposing side only).
    pub aggression_mask: u32,
}

impl Default for CollisionProfile {
    /// Ground units: occupy layer 1 and refuse to stack with it.
    fn default() -> Self {
        Self {
            layer: 1,
            collision_mask: 1,
            aggression_mask: 0,
        }
    }
}

/// A pending interaction stamped by the movement engine.
///
/// The core detects aggression and flags intent; resolution is the
/// embedder's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interaction {
    /// Attack the named agent.
    Attack {
        /// Target of the attack.
        target: AgentId,
    },
}

/// One agent pool slot.
///
/// Slot fields are only meaningful while `active` is set; the generation
/// stays behind after a free so stale ids keep failing lookups.
#[derive(Debug, Clone, Default)]
pub(crate) struct AgentSlot {
    /// Full id (index + generation) as last allocated.
    pub id: AgentId,
    /// Generation counter; bumped on every allocation of this slot.
    pub generation: u16,
    /// Live flag.
    pub active: bool,
    /// Low-level state machine position.
    pub state: AgentState,
    /// High-level behavior and its payload.
    pub behavior: Behavior,
    /// Faction identifier (opaque to the core).
    pub faction: u8,
    /// Team/side identifier; same-side agents never attack each other.
    pub side: u8,
    /// Owning barrack, or [`BarrackId::INVALID`].
    pub parent_barrack: BarrackId,
    /// Current cell.
    pub pos: Axial,
    /// Reserved next cell while Moving.
    pub next: Axial,
    /// Goal cell.
    pub target: Axial,
    /// Sub-tile progress, `0..=MAX_PROGRESS`.
    pub progress: u32,
    /// Progress units gained per Moving tick.
    pub speed: u16,
    /// View radius in cells.
    pub view_radius: u8,
    /// Collision triple.
    pub collision: CollisionProfile,
    /// Interaction stamped on contact, consumed by the embedder layer.
    pub pending: Option<Interaction>,
    /// Intrusive free-list link (next free slot index) while inactive.
    pub next_free: u16,
}

impl AgentSlot {
    pub fn default_with_link(next_free: u16) -> Self {
        Self {
            speed: DEFAULT_SPEED,
            view_radius: DEFAULT_VIEW_RADIUS,
            next_free,
            ..Self::default()
        }
    }
}
