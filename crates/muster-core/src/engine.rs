// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The public simulation context: engine, role handles, command dispatch,
//! and the tick orchestrator.
//!
//! Thread model: any number of producer threads hold [`CommandSender`]s;
//! exactly one simulation thread owns the [`Engine`] and calls
//! [`Engine::tick`]; any number of reader threads hold [`Observer`]s and at
//! most one thread holds the claimed [`EventReceiver`]. The engine is the
//! sole mutator of the pools, the map, the event-queue head, and the
//! snapshot buffers, so none of the simulation state needs a lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::agent::{AgentState, Behavior, BehaviorKind, ExploreState, GuardState, PatrolState};
use crate::axial::Axial;
use crate::collision::{clear_reservation, try_reserve, ReserveOutcome};
use crate::command::{AddAgent, BehaviorSpec, Command};
use crate::config::SimConfig;
use crate::error::{ConfigError, SimError, SubmitAllError, SubmitError};
use crate::event::{Event, EventKind};
use crate::ident::{AgentId, BarrackId};
use crate::map::{CellWord, MapGrid};
use crate::movement;
use crate::mpsc::MpscRing;
use crate::path;
use crate::pool::{AgentPool, BarrackPool};
use crate::rng::Pcg32;
use crate::snapshot::{SnapshotGuard, SnapshotPair};
use crate::spsc::SpscRing;
use crate::stats::{SharedStats, Stats};

/// State shared between the engine and its handles.
pub(crate) struct Shared {
    /// MPSC command queue: producers push, the tick drains.
    pub commands: MpscRing<Command>,
    /// SPSC event queue: the tick pushes, the claimed receiver pops.
    pub events: SpscRing<Event>,
    /// Double-buffered snapshot publisher.
    pub snapshots: SnapshotPair,
    /// Shared statistics counters.
    pub stats: SharedStats,
    events_claimed: AtomicBool,
}

impl Shared {
    /// Emits an event, accounting for overflow drops.
    pub fn emit(&self, event: Event) {
        if self.events.push(event).is_ok() {
            SharedStats::bump(&self.stats.events_emitted);
        } else {
            SharedStats::bump(&self.stats.events_dropped);
            warn!(kind = ?event.kind, agent = %event.agent, "event queue full, dropping event");
        }
    }
}

/// Simulation-thread-private state. Nothing here is shared, so nothing here
/// is locked.
pub(crate) struct SimState {
    pub agents: AgentPool,
    pub barracks: BarrackPool,
    pub map: MapGrid,
    pub rng: Pcg32,
}

/// The simulation context.
///
/// Owns the world state; hand out [`CommandSender`]s, the single
/// [`EventReceiver`], and [`Observer`]s to the other threads, then drive
/// [`Engine::tick`] from the simulation thread.
pub struct Engine {
    shared: Arc<Shared>,
    state: SimState,
    config: SimConfig,
}

impl Engine {
    /// Builds a context with the configured capacities and seed.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a capacity or dimension is degenerate.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            agents = config.max_agents,
            barracks = config.max_barracks,
            grid = ?config.grid,
            width = config.grid_width,
            height = config.grid_height,
            "creating simulation context"
        );
        let shared = Arc::new(Shared {
            commands: MpscRing::new(config.command_queue_capacity),
            events: SpscRing::new(config.event_queue_capacity),
            snapshots: SnapshotPair::new(
                config.max_agents as usize,
                usize::from(config.max_barracks),
            ),
            stats: SharedStats::default(),
            events_claimed: AtomicBool::new(false),
        });
        let state = SimState {
            agents: AgentPool::new(config.max_agents as u16),
            barracks: BarrackPool::new(config.max_barracks),
            map: MapGrid::new(config.grid, config.grid_width, config.grid_height),
            rng: Pcg32::from_seed(config.rng_seed),
        };
        Ok(Self { shared, state, config })
    }

    /// The configuration this context was built with.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Creates a producer handle. Any number may exist, on any thread.
    #[must_use]
    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Claims the single event consumer end.
    ///
    /// The first call returns the receiver; later calls return `None`. The
    /// claim is what makes the SPSC queue's single-consumer rule an API
    /// property instead of a convention.
    #[must_use]
    pub fn event_receiver(&self) -> Option<EventReceiver> {
        self.shared
            .events_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| EventReceiver {
                shared: Arc::clone(&self.shared),
            })
    }

    /// Creates a snapshot/stats reader handle. Any number may exist.
    #[must_use]
    pub fn observer(&self) -> Observer {
        Observer {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.shared.stats.snapshot()
    }

    /// Bulk-loads tile state bytes in backing index order.
    ///
    /// # Errors
    /// Returns [`SimError::SizeMismatch`] when the buffer does not cover the
    /// whole backing store.
    pub fn load_tile_states(&mut self, states: &[u8]) -> Result<(), SimError> {
        self.state.map.load_states(states)
    }

    /// Runs one tick: drain commands, advance agents, publish the snapshot.
    ///
    /// Synchronous and infallible; individual commands may soft-fail with a
    /// log line without affecting anything else. Commands submitted after
    /// the drain begins are seen by the next tick.
    pub fn tick(&mut self) {
        while let Some(cmd) = self.shared.commands.pop() {
            SharedStats::bump(&self.shared.stats.commands_processed);
            process_command(&mut self.state, &self.shared, cmd);
        }

        for index in 0..self.state.agents.capacity() {
            let slot = self.state.agents.slot(index);
            let (active, state, behavior) = (slot.active, slot.state, slot.behavior.kind());
            if !active {
                continue;
            }
            match state {
                AgentState::Calculating if behavior == BehaviorKind::Patrol => {
                    path::compute_patrol(&mut self.state, &self.shared, index);
                }
                AgentState::Calculating => {
                    path::compute_next_step(&mut self.state, &self.shared, index);
                }
                AgentState::Moving => movement::advance_moving(&mut self.state, &self.shared, index),
                AgentState::Idle | AgentState::Interacting | AgentState::PendingRemoval => {}
            }
        }

        self.shared
            .snapshots
            .publish(&self.state.agents, &self.state.barracks);

        SharedStats::bump(&self.shared.stats.total_ticks);
        self.shared
            .stats
            .active_agents
            .store(self.state.agents.active_count(), Ordering::Relaxed);
        self.shared
            .stats
            .active_barracks
            .store(u32::from(self.state.barracks.allocated()), Ordering::Relaxed);
    }
}

/// Cloneable producer handle for submitting commands from any thread.
#[derive(Clone)]
pub struct CommandSender {
    shared: Arc<Shared>,
}

impl CommandSender {
    /// Enqueues one command.
    ///
    /// # Errors
    /// [`SubmitError::QueueFull`] hands the command back for retry.
    pub fn submit(&self, cmd: Command) -> Result<(), SubmitError> {
        self.shared
            .commands
            .push(cmd)
            .map_err(|rejected| SubmitError::QueueFull { rejected })
    }

    /// Enqueues a batch of commands, stopping at the first full.
    ///
    /// Submission is partial on failure: the error reports how many were
    /// enqueued and returns the unsent suffix.
    ///
    /// # Errors
    /// [`SubmitAllError`] when the queue fills partway through.
    pub fn submit_all(
        &self,
        cmds: impl IntoIterator<Item = Command>,
    ) -> Result<usize, SubmitAllError> {
        let mut submitted = 0;
        let mut iter = cmds.into_iter();
        while let Some(cmd) = iter.next() {
            if let Err(rejected) = self.shared.commands.push(cmd) {
                let mut rest = vec![rejected];
                rest.extend(iter);
                return Err(SubmitAllError {
                    submitted,
                    rejected: rest,
                });
            }
            submitted += 1;
        }
        Ok(submitted)
    }

    /// Convenience spawn: builds an [`AddAgent`] payload with defaults and
    /// enqueues it, returning the id cell the processing tick writes into.
    ///
    /// # Errors
    /// [`SubmitError::QueueFull`] when the command queue has no room.
    pub fn add_agent(
        &self,
        at: Axial,
        faction: u8,
        side: u8,
        parent_barrack: BarrackId,
    ) -> Result<crate::command::AgentIdCell, SubmitError> {
        let cell = crate::command::AgentIdCell::new();
        let payload = AddAgent {
            faction,
            side,
            parent_barrack,
            id_cell: Some(cell.clone()),
            ..AddAgent::at(at)
        };
        self.submit(Command::AddAgent(Box::new(payload)))?;
        Ok(cell)
    }
}

/// The single event consumer end.
///
/// Not cloneable; obtained exactly once via [`Engine::event_receiver`].
pub struct EventReceiver {
    shared: Arc<Shared>,
}

impl EventReceiver {
    /// Pops one event if any is pollable.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.shared.events.pop()
    }

    /// Fills `out` with pollable events; returns how many were written.
    pub fn poll(&mut self, out: &mut [Event]) -> usize {
        let mut filled = 0;
        while filled < out.len() {
            match self.shared.events.pop() {
                Some(event) => {
                    out[filled] = event;
                    filled += 1;
                }
                None => break,
            }
        }
        filled
    }
}

/// Cloneable reader handle for snapshots and statistics.
#[derive(Clone)]
pub struct Observer {
    shared: Arc<Shared>,
}

impl Observer {
    /// Pins and returns the currently published snapshot.
    ///
    /// The guard is meant to be short-lived; copy anything that must
    /// outlive the next tick.
    #[must_use]
    pub fn snapshot(&self) -> SnapshotGuard<'_> {
        self.shared.snapshots.read()
    }

    /// Latest published snapshot version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.snapshots.version()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.shared.stats.snapshot()
    }
}

/// Dispatches one command. Total: every variant is handled, reserved ones
/// log and fall through; failures log and never propagate.
pub(crate) fn process_command(state: &mut SimState, shared: &Shared, cmd: Command) {
    match cmd {
        Command::AddAgent(payload) => {
            spawn_agent(state, shared, *payload, BehaviorSpec::Idle);
        }
        Command::AddAgentWithBehavior(payload) => {
            let boxed = *payload;
            spawn_agent(state, shared, boxed.agent, boxed.behavior);
        }
        Command::RemoveAgent { agent } => remove_agent(state, shared, agent),
        Command::SetGoal { agent, goal } => set_goal(state, agent, goal),
        Command::SetBehavior { agent, behavior } => set_behavior(state, agent, behavior),
        Command::AddBarrack(payload) => add_barrack(state, *payload),
        Command::SetTileState { at, state: tile_state } => {
            if let Err(err) = state.map.set_tile_state(at, tile_state) {
                error!(%at, %err, "SET_TILE_STATE rejected");
            }
        }
        cmd @ (Command::BindBarrack { .. }
        | Command::RemoveBarrack { .. }
        | Command::AddGuardTile { .. }
        | Command::AddGuardTiles(_)
        | Command::RemoveGuardTile { .. }
        | Command::ClearGuardTiles { .. }
        | Command::AddBuilding { .. }
        | Command::ComputeNext { .. }
        | Command::DebugDumpState) => {
            warn!(command = cmd.name(), "command not implemented, ignoring");
        }
    }
}

fn spawn_agent(state: &mut SimState, shared: &Shared, payload: AddAgent, behavior: BehaviorSpec) {
    let at = payload.at;
    if !state.map.is_walkable(at) {
        error!(cell = %at, "ADD_AGENT: spawn cell out of bounds or not walkable");
        return;
    }
    let Some(id) = state.agents.allocate() else {
        error!("ADD_AGENT: agent pool full");
        return;
    };
    // Spawn needs the tile exclusively; entering an occupied-but-permeable
    // tile is a move-time notion only.
    let outcome = try_reserve(&mut state.map, &state.agents, id.index(), &payload.collision, at);
    if outcome != ReserveOutcome::Reserved {
        state.agents.free(id);
        error!(cell = %at, "ADD_AGENT: spawn cell already claimed");
        return;
    }
    state.map.set_cell(at, CellWord::occupied(id.index()));

    let (behavior, agent_state) = build_behavior(behavior, at);
    if let Some(slot) = state.agents.get_mut(id) {
        slot.pos = at;
        slot.next = at;
        slot.target = at;
        slot.faction = payload.faction;
        slot.side = payload.side;
        slot.parent_barrack = payload.parent_barrack;
        slot.collision = payload.collision;
        slot.speed = payload.speed;
        slot.view_radius = payload.view_radius;
        slot.progress = 0;
        slot.pending = None;
        slot.behavior = behavior;
        slot.state = agent_state;
    }

    if let Some(cell) = payload.id_cell {
        cell.set(id);
    }
    shared.stats.active_agents.fetch_add(1, Ordering::Relaxed);
    debug!(agent = %id, cell = %at, "agent spawned");
}

/// Maps a spawn-time behavior spec to runtime behavior data plus the
/// initial state. Patrol and Explore go straight to Calculating so the same
/// tick's agent pass already advances them.
fn build_behavior(spec: BehaviorSpec, at: Axial) -> (Behavior, AgentState) {
    match spec {
        BehaviorSpec::Idle => (Behavior::Idle, AgentState::Idle),
        BehaviorSpec::Patrol { center, radius } => (
            Behavior::Patrol(PatrolState {
                center,
                radius,
                waypoint: 0,
                idle_timer: 0,
            }),
            AgentState::Calculating,
        ),
        BehaviorSpec::Explore { mode } => (
            Behavior::Explore(ExploreState {
                mode,
                visited: 0,
                last_target: at,
            }),
            AgentState::Calculating,
        ),
        BehaviorSpec::Guard => {
            warn!("guard scheduling not implemented; agent will hold position");
            (Behavior::Guard(GuardState::default()), AgentState::Idle)
        }
        BehaviorSpec::Flee => {
            warn!("flee scheduling not implemented; agent will hold position");
            (Behavior::Flee, AgentState::Idle)
        }
    }
}

fn remove_agent(state: &mut SimState, shared: &Shared, agent: AgentId) {
    let Some(slot) = state.agents.get(agent) else {
        warn!(%agent, "REMOVE_AGENT: agent not found or already inactive");
        return;
    };
    let (pos, next, moving) = (slot.pos, slot.next, slot.state == AgentState::Moving);
    let index = agent.index();

    if state.map.cell(pos).agent_index() == index {
        state.map.set_cell(pos, CellWord::EMPTY);
    }
    if moving {
        clear_reservation(&mut state.map, next, index);
    }
    state.agents.free(agent);
    shared.emit(Event::new(EventKind::AgentRemoved, agent, pos));
    shared.stats.active_agents.fetch_sub(1, Ordering::Relaxed);
    debug!(%agent, cell = %pos, "agent removed");
}

fn set_goal(state: &mut SimState, agent: AgentId, goal: Axial) {
    if !state.map.in_bounds(goal) {
        error!(cell = %goal, "SET_GOAL: goal out of bounds");
        return;
    }
    let Some(slot) = state.agents.get(agent) else {
        warn!(%agent, "SET_GOAL: agent not found");
        return;
    };
    let (next, moving) = (slot.next, slot.state == AgentState::Moving);
    if moving {
        // The in-flight reservation dies with the old plan.
        clear_reservation(&mut state.map, next, agent.index());
    }
    if let Some(slot) = state.agents.get_mut(agent) {
        slot.target = goal;
        slot.behavior = Behavior::Idle;
        slot.state = AgentState::Calculating;
        slot.progress = 0;
        debug!(%agent, cell = %goal, "goal set");
    }
}

fn set_behavior(state: &mut SimState, agent: AgentId, spec: BehaviorSpec) {
    let Some(slot) = state.agents.get(agent) else {
        warn!(%agent, "SET_BEHAVIOR: agent not found");
        return;
    };
    let (pos, next, moving) = (slot.pos, slot.next, slot.state == AgentState::Moving);
    if moving {
        clear_reservation(&mut state.map, next, agent.index());
    }
    let (behavior, agent_state) = build_behavior(spec, pos);
    if let Some(slot) = state.agents.get_mut(agent) {
        slot.behavior = behavior;
        slot.state = agent_state;
        slot.progress = 0;
        debug!(%agent, "behavior set");
    }
}

fn add_barrack(state: &mut SimState, payload: crate::command::AddBarrack) {
    if !state.map.in_bounds(payload.at) {
        error!(cell = %payload.at, "ADD_BARRACK: position out of bounds");
        return;
    }
    let Some(id) = state.barracks.allocate() else {
        error!("ADD_BARRACK: barrack pool full");
        return;
    };
    if let Some(slot) = state.barracks.get_mut(id) {
        slot.pos = payload.at;
        slot.faction = payload.faction;
        slot.side = payload.side;
        slot.patrol_radius = payload.patrol_radius;
        slot.max_agents = payload.max_agents;
        slot.behavior = payload.behavior;
        slot.agent_count = 0;
    }
    if let Some(cell) = payload.id_cell {
        cell.set(id);
    }
    debug!(barrack = %id, cell = %payload.at, "barrack created");
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::GridKind;

    fn rect_engine(width: u32, height: u32) -> Engine {
        let config = SimConfig {
            grid: GridKind::Rect,
            grid_width: width,
            grid_height: height,
            ..SimConfig::default()
        };
        Engine::new(config).unwrap()
    }

    #[test]
    fn event_receiver_can_only_be_claimed_once() {
        let engine = rect_engine(4, 4);
        assert!(engine.event_receiver().is_some());
        assert!(engine.event_receiver().is_none());
    }

    #[test]
    fn out_of_bounds_spawn_is_a_counted_soft_failure() {
        let mut engine = rect_engine(4, 4);
        let sender = engine.command_sender();
        sender
            .submit(Command::AddAgent(Box::new(AddAgent::at(Axial::new(9, 9)))))
            .unwrap();
        engine.tick();
        let stats = engine.stats();
        assert_eq!(stats.commands_processed, 1);
        assert_eq!(stats.active_agents, 0);
    }

    #[test]
    fn spawn_onto_occupied_cell_fails_and_frees_the_slot() {
        let mut engine = rect_engine(4, 4);
        let sender = engine.command_sender();
        let first = sender.add_agent(Axial::new(1, 1), 0, 0, BarrackId::INVALID).unwrap();
        let second = sender.add_agent(Axial::new(1, 1), 0, 0, BarrackId::INVALID).unwrap();
        engine.tick();
        assert!(first.get().is_some());
        assert!(second.get().is_none());
        assert_eq!(engine.stats().active_agents, 1);
    }

    #[test]
    fn reserved_commands_are_counted_noops() {
        let mut engine = rect_engine(4, 4);
        let sender = engine.command_sender();
        sender.submit(Command::DebugDumpState).unwrap();
        sender
            .submit(Command::BindBarrack {
                agent: AgentId::INVALID,
                barrack: BarrackId::INVALID,
            })
            .unwrap();
        engine.tick();
        assert_eq!(engine.stats().commands_processed, 2);
    }

    #[test]
    fn remove_agent_clears_its_cell_and_emits() {
        let mut engine = rect_engine(4, 4);
        let sender = engine.command_sender();
        let mut events = engine.event_receiver().unwrap();
        let cell = sender.add_agent(Axial::new(2, 2), 1, 1, BarrackId::INVALID).unwrap();
        engine.tick();
        let id = cell.get().unwrap();

        sender.submit(Command::RemoveAgent { agent: id }).unwrap();
        engine.tick();

        assert_eq!(engine.stats().active_agents, 0);
        let mut out = [Event::new(EventKind::Stuck, AgentId::INVALID, Axial::ZERO); 4];
        let n = events.poll(&mut out);
        assert_eq!(n, 1);
        assert_eq!(out[0].kind, EventKind::AgentRemoved);
        assert_eq!(out[0].agent, id);
        assert_eq!(out[0].at, Axial::new(2, 2));

        // Stale removal warns and changes nothing.
        sender.submit(Command::RemoveAgent { agent: id }).unwrap();
        engine.tick();
        assert_eq!(engine.stats().commands_processed, 3);
    }
}
