// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event records emitted by the simulation.

use crate::axial::Axial;
use crate::ident::AgentId;

/// Event kinds published through the SPSC event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// An agent reached its target cell.
    ReachedGoal,
    /// An agent has no valid neighbor step toward its target.
    Stuck,
    /// A chosen step could not be reserved because a live agent blocks it.
    Blocked,
    /// A move was rolled back and the agent must re-plan.
    ReplanNeeded,
    /// An agent was removed from the pool.
    AgentRemoved,
}

/// One event record: what happened, to whom, where.
///
/// Events emitted during a tick become pollable only after that tick
/// returns. The record is plain `Copy` data so the queue never owns
/// anything that needs dropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Event kind.
    pub kind: EventKind,
    /// Related agent.
    pub agent: AgentId,
    /// Cell associated with the event.
    pub at: Axial,
}

impl Event {
    /// Creates an event record.
    #[must_use]
    pub const fn new(kind: EventKind, agent: AgentId, at: Axial) -> Self {
        Self { kind, agent, at }
    }
}
