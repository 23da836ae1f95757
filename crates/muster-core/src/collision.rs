// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entry/aggression bit tests and the tile reservation protocol.

use tracing::warn;

use crate::agent::CollisionProfile;
use crate::axial::Axial;
use crate::ident::AgentId;
use crate::map::{CellWord, MapGrid};
use crate::pool::AgentPool;

/// True when `a` may enter a tile that `b` occupies.
pub(crate) fn can_enter(a: &CollisionProfile, b: &CollisionProfile) -> bool {
    a.collision_mask & b.layer == 0
}

/// True when `a` should attack `b` on contact.
pub(crate) fn should_attack(a: &CollisionProfile, a_side: u8, b: &CollisionProfile, b_side: u8) -> bool {
    a.aggression_mask & b.layer != 0 && a_side != b_side
}

/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReserveOutcome {
    /// The word now carries this agent's index with the RESERVED bit.
    Reserved,
    /// A live occupant permits entry; its word is left untouched and will
    /// be replaced when this agent lands.
    Entered,
    /// A live occupant blocks entry.
    Blocked,
    /// The cell is out of bounds or its static state is nonzero.
    Unwalkable,
}

impl ReserveOutcome {
    /// True for the two outcomes that allow the move to proceed.
    pub fn allows_move(self) -> bool {
        matches!(self, Self::Reserved | Self::Entered)
    }
}

/// Attempts to reserve `at` for the agent at slot `index`.
///
/// Stale words (occupant inactive, or the index is this agent's own leaked
/// reservation) are reclaimed rather than honored; the grid word carries no
/// generation, so the pool is the authority on liveness.
pub(crate) fn try_reserve(
    map: &mut MapGrid,
    agents: &AgentPool,
    index: u16,
    profile: &CollisionProfile,
    at: Axial,
) -> ReserveOutcome {
    if !map.is_walkable(at) {
        return ReserveOutcome::Unwalkable;
    }

    let word = map.cell(at);
    if word.is_empty() {
        map.set_cell(at, CellWord::reserved(index));
        return ReserveOutcome::Reserved;
    }

    let occupant_index = word.agent_index();
    if occupant_index == index {
        map.set_cell(at, CellWord::reserved(index));
        return ReserveOutcome::Reserved;
    }

    let Some(occupant) = agents.live_at(occupant_index) else {
        warn!(cell = %at, word = word.raw(), "stale reservation word, reclaiming");
        map.set_cell(at, CellWord::reserved(index));
        return ReserveOutcome::Reserved;
    };

    if can_enter(profile, &occupant.collision) {
        ReserveOutcome::Entered
    } else {
        ReserveOutcome::Blocked
    }
}

/// Clears the word at `at` iff it is a reservation held by slot `index`.
pub(crate) fn clear_reservation(map: &mut MapGrid, at: Axial, index: u16) {
    let word = map.cell(at);
    if word.is_reserved() && word.agent_index() == index && index != AgentId::INVALID.index() {
        map.set_cell(at, CellWord::EMPTY);
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::GridKind;

    fn arena() -> (MapGrid, AgentPool) {
        (MapGrid::new(GridKind::Hex, 4, 0), AgentPool::new(8))
    }

    #[test]
    fn entry_and_aggression_bit_tests() {
        let ground = CollisionProfile { layer: 1, collision_mask: 1, aggression_mask: 0 };
        let ghost = CollisionProfile { layer: 2, collision_mask: 0, aggression_mask: 0 };
        let raider = CollisionProfile { layer: 1, collision_mask: 1, aggression_mask: 1 };

        assert!(!can_enter(&ground, &ground));
        assert!(can_enter(&ghost, &ground));
        assert!(can_enter(&ground, &ghost));

        assert!(should_attack(&raider, 0, &ground, 1));
        assert!(!should_attack(&raider, 1, &ground, 1));
        assert!(!should_attack(&ground, 0, &raider, 1));
    }

    #[test]
    fn reserve_empty_then_block_same_layer() {
        let (mut map, mut agents) = arena();
        let a = agents.allocate().unwrap();
        let b = agents.allocate().unwrap();
        let at = Axial::new(1, 0);

        let profile = CollisionProfile::default();
        assert_eq!(
            try_reserve(&mut map, &agents, a.index(), &profile, at),
            ReserveOutcome::Reserved
        );
        assert!(map.cell(at).is_reserved());
        assert_eq!(map.cell(at).agent_index(), a.index());

        assert_eq!(
            try_reserve(&mut map, &agents, b.index(), &profile, at),
            ReserveOutcome::Blocked
        );
        // The holder's reservation survives the failed attempt.
        assert_eq!(map.cell(at).agent_index(), a.index());
    }

    #[test]
    fn stale_words_are_reclaimed() {
        let (mut map, mut agents) = arena();
        let a = agents.allocate().unwrap();
        let b = agents.allocate().unwrap();
        let at = Axial::new(0, 1);
        let profile = CollisionProfile::default();

        assert_eq!(
            try_reserve(&mut map, &agents, a.index(), &profile, at),
            ReserveOutcome::Reserved
        );
        agents.free(a);

        assert_eq!(
            try_reserve(&mut map, &agents, b.index(), &profile, at),
            ReserveOutcome::Reserved
        );
        assert_eq!(map.cell(at).agent_index(), b.index());
    }

    #[test]
    fn unwalkable_and_out_of_bounds_fail() {
        let (mut map, mut agents) = arena();
        let a = agents.allocate().unwrap();
        let profile = CollisionProfile::default();

        map.set_tile_state(Axial::new(1, 1), 1).unwrap();
        assert_eq!(
            try_reserve(&mut map, &agents, a.index(), &profile, Axial::new(1, 1)),
            ReserveOutcome::Unwalkable
        );
        assert_eq!(
            try_reserve(&mut map, &agents, a.index(), &profile, Axial::new(9, 9)),
            ReserveOutcome::Unwalkable
        );
    }

    #[test]
    fn clear_reservation_requires_holder_and_reserved_bit() {
        let (mut map, mut agents) = arena();
        let a = agents.allocate().unwrap();
        let at = Axial::new(-1, 0);

        map.set_cell(at, CellWord::occupied(a.index()));
        clear_reservation(&mut map, at, a.index());
        assert!(map.cell(at).is_occupied());

        map.set_cell(at, CellWord::reserved(a.index()));
        clear_reservation(&mut map, at, 3);
        assert!(map.cell(at).is_reserved());
        clear_reservation(&mut map, at, a.index());
        assert!(map.cell(at).is_empty());
    }
}
