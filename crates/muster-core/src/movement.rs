// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sub-tile movement: progress accumulation and the arrival protocol.

use tracing::error;

use crate::agent::{AgentState, Interaction, MAX_PROGRESS};
use crate::collision::{can_enter, should_attack};
use crate::engine::{Shared, SimState};
use crate::event::{Event, EventKind};
use crate::map::CellWord;
use crate::stats::SharedStats;

/// Advances the Moving agent at slot `index` by one tick.
pub(crate) fn advance_moving(state: &mut SimState, shared: &Shared, index: u16) {
    let slot = state.agents.slot(index);
    if slot.progress < MAX_PROGRESS {
        let speed = u32::from(slot.speed);
        let slot = state.agents.slot_mut(index);
        slot.progress = slot.progress.saturating_add(speed);
        return;
    }
    arrive(state, shared, index);
}

/// Lands the agent on its reserved next cell.
///
/// The old position's word is cleared first; if the destination then turns
/// out to hold a live occupant that entry rules forbid, that is a protocol
/// violation (reservations should have prevented it) — the move rolls back,
/// the old word is restored, and the agent re-plans.
fn arrive(state: &mut SimState, shared: &Shared, index: u16) {
    let slot = state.agents.slot(index);
    let (id, pos, next, target) = (slot.id, slot.pos, slot.next, slot.target);
    let (profile, side) = (slot.collision, slot.side);

    if state.map.cell(pos).agent_index() == index {
        state.map.set_cell(pos, CellWord::EMPTY);
    }

    let word = state.map.cell(next);
    let occupant_index = word.agent_index();
    let mut pending = None;
    if !word.is_empty() && occupant_index != index {
        if let Some(occupant) = state.agents.live_at(occupant_index) {
            if !can_enter(&profile, &occupant.collision) {
                error!(
                    agent = %id,
                    cell = %next,
                    occupant = %occupant.id,
                    "arrival into a blocked cell, rolling the move back"
                );
                state.map.set_cell(pos, CellWord::occupied(index));
                let slot = state.agents.slot_mut(index);
                slot.progress = 0;
                slot.state = AgentState::Calculating;
                SharedStats::bump(&shared.stats.replan_count);
                shared.emit(Event::new(EventKind::ReplanNeeded, id, pos));
                return;
            }
            if should_attack(&profile, side, &occupant.collision, occupant.side) {
                pending = Some(Interaction::Attack { target: occupant.id });
            }
        }
    }

    state.map.set_cell(next, CellWord::occupied(index));
    let slot = state.agents.slot_mut(index);
    slot.pos = next;
    slot.progress = 0;
    if pending.is_some() {
        slot.pending = pending;
    }
    if next == target {
        slot.state = AgentState::Idle;
        shared.emit(Event::new(EventKind::ReachedGoal, id, next));
    } else {
        slot.state = AgentState::Calculating;
    }
}
