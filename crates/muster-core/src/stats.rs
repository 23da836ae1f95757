// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime statistics counters.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// By-value statistics snapshot.
///
/// Counters accumulate from engine creation; `active_agents` and
/// `active_barracks` are gauges refreshed at every tick boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// Ticks executed.
    pub total_ticks: u64,
    /// Commands consumed from the queue (success or soft failure alike).
    pub commands_processed: u64,
    /// Events successfully pushed to the event queue.
    pub events_emitted: u64,
    /// Events dropped because the event queue was full.
    pub events_dropped: u64,
    /// Reservation attempts blocked by a live occupant.
    pub blocked_moves: u64,
    /// Moves rolled back into re-planning.
    pub replan_count: u64,
    /// Live agents after the last tick.
    pub active_agents: u32,
    /// Live barracks after the last tick.
    pub active_barracks: u32,
}

/// Shared counter block: written by the simulation thread, snapshotted by
/// any reader. Relaxed ordering everywhere — the counters are monotonic
/// telemetry, not synchronization.
#[derive(Debug, Default)]
pub(crate) struct SharedStats {
    pub total_ticks: AtomicU64,
    pub commands_processed: AtomicU64,
    pub events_emitted: AtomicU64,
    pub events_dropped: AtomicU64,
    pub blocked_moves: AtomicU64,
    pub replan_count: AtomicU64,
    pub active_agents: AtomicU32,
    pub active_barracks: AtomicU32,
}

impl SharedStats {
    /// By-value snapshot for readers.
    pub fn snapshot(&self) -> Stats {
        Stats {
            total_ticks: self.total_ticks.load(Ordering::Relaxed),
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            blocked_moves: self.blocked_moves.load(Ordering::Relaxed),
            replan_count: self.replan_count.load(Ordering::Relaxed),
            active_agents: self.active_agents.load(Ordering::Relaxed),
            active_barracks: self.active_barracks.load(Ordering::Relaxed),
        }
    }

    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
