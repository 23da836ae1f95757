// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Greedy one-hop pathfinder.
//!
//! Optimality is an explicit non-goal: the planner looks exactly one hex
//! ring ahead, scores candidates by squared axial distance to the target,
//! and breaks ties with the deterministic RNG. Multi-hop planning emerges
//! from running this every Calculating tick.

use tracing::warn;

use crate::agent::{AgentState, CollisionProfile};
use crate::axial::{Axial, HEX_DIRS};
use crate::collision::try_reserve;
use crate::engine::{Shared, SimState};
use crate::event::{Event, EventKind};
use crate::stats::SharedStats;

/// Picks the next cell for the agent at slot `index` (base variant).
///
/// Outcomes: already at the goal → Idle + `REACHED_GOAL`; a candidate
/// reserved → Moving; candidate blocked by a live occupant → stay
/// Calculating (`BLOCKED`, counted); no walkable candidate → Idle +
/// `STUCK`.
pub(crate) fn compute_next_step(state: &mut SimState, shared: &Shared, index: u16) {
    let slot = state.agents.slot(index);
    let (id, pos, target, profile) = (slot.id, slot.pos, slot.target, slot.collision);

    if pos == target {
        state.agents.slot_mut(index).state = AgentState::Idle;
        shared.emit(Event::new(EventKind::ReachedGoal, id, pos));
        return;
    }

    let mut best = i64::MAX;
    let mut candidates = [Axial::ZERO; 6];
    let mut count = 0;
    for dir in HEX_DIRS {
        let cell = pos + dir;
        if !state.map.is_walkable(cell) {
            continue;
        }
        let score = target.dist_sq(cell);
        if score < best {
            best = score;
            candidates[0] = cell;
            count = 1;
        } else if score == best {
            candidates[count] = cell;
            count += 1;
        }
    }

    if count == 0 {
        state.agents.slot_mut(index).state = AgentState::Idle;
        shared.emit(Event::new(EventKind::Stuck, id, pos));
        return;
    }

    let choice = candidates[state.rng.next_below(count as u32) as usize];
    settle_choice(state, shared, index, &profile, choice);
}

/// Patrol variant: wander uniformly inside the owning barrack's leash.
///
/// Candidates are walkable neighbors whose hex distance to the barrack stays
/// within its patrol radius; there is no target to converge on. A stale
/// barrack id marks the agent for removal.
pub(crate) fn compute_patrol(state: &mut SimState, shared: &Shared, index: u16) {
    let slot = state.agents.slot(index);
    let (id, pos, profile, parent) = (slot.id, slot.pos, slot.collision, slot.parent_barrack);

    let Some(barrack) = state.barracks.get(parent) else {
        warn!(agent = %id, barrack = %parent, "patrol agent lost its barrack, queueing removal");
        state.agents.slot_mut(index).state = AgentState::PendingRemoval;
        return;
    };
    let anchor = barrack.pos;
    let leash = i32::from(barrack.patrol_radius);

    let mut candidates = [Axial::ZERO; 6];
    let mut count = 0;
    for dir in HEX_DIRS {
        let cell = pos + dir;
        if !state.map.is_walkable(cell) {
            continue;
        }
        if anchor.hex_distance(cell) > leash {
            continue;
        }
        candidates[count] = cell;
        count += 1;
    }

    if count == 0 {
        // Boxed in for now; try again next tick.
        return;
    }

    let choice = candidates[state.rng.next_below(count as u32) as usize];
    settle_choice(state, shared, index, &profile, choice);
}

fn settle_choice(
    state: &mut SimState,
    shared: &Shared,
    index: u16,
    profile: &CollisionProfile,
    choice: Axial,
) {
    let outcome = try_reserve(&mut state.map, &state.agents, index, profile, choice);
    let slot = state.agents.slot_mut(index);
    if outcome.allows_move() {
        slot.next = choice;
        slot.state = AgentState::Moving;
    } else {
        SharedStats::bump(&shared.stats.blocked_moves);
        shared.emit(Event::new(EventKind::Blocked, slot.id, choice));
    }
}
