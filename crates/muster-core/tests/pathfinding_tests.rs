// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use muster_core::{
    AddAgent, AddAgentWithBehavior, AddBarrack, AgentIdCell, AgentState, Axial, BarrackIdCell,
    BehaviorKind, BehaviorSpec, Command, Engine, Event, EventKind, GridKind, SimConfig, HEX_DIRS,
};

fn hex_config(radius: u32) -> SimConfig {
    SimConfig {
        grid: GridKind::Hex,
        grid_width: radius,
        ..SimConfig::default()
    }
}

/// Spawns a full-speed agent and returns its id cell; caller must tick.
fn spawn_full_speed(engine: &Engine, at: Axial) -> AgentIdCell {
    let cell = AgentIdCell::new();
    let payload = AddAgent {
        speed: 10_000,
        id_cell: Some(cell.clone()),
        ..AddAgent::at(at)
    };
    engine
        .command_sender()
        .submit(Command::AddAgent(Box::new(payload)))
        .expect("submit");
    cell
}

fn drain(events: &mut muster_core::EventReceiver) -> Vec<Event> {
    let mut out = Vec::new();
    while let Some(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[test]
fn direct_neighbor_goal_reaches_in_three_ticks() {
    let mut engine = Engine::new(hex_config(5)).expect("config");
    let sender = engine.command_sender();
    let mut events = engine.event_receiver().expect("claim");
    let observer = engine.observer();

    let cell = spawn_full_speed(&engine, Axial::ZERO);
    engine.tick();
    let id = cell.get().expect("spawned");

    sender
        .submit(Command::SetGoal {
            agent: id,
            goal: Axial::new(1, 0),
        })
        .expect("submit");

    // Tick 1: goal lands, pathfinder picks the only minimizer and reserves it.
    engine.tick();
    {
        let snap = observer.snapshot();
        let agent = &snap.agents()[0];
        assert_eq!(agent.state, AgentState::Moving);
        assert_eq!(agent.next, Axial::new(1, 0));
        assert_eq!(agent.pos, Axial::ZERO);
    }

    // Tick 2: full-speed progress fills; tick 3: arrival.
    engine.tick();
    engine.tick();
    let snap = observer.snapshot();
    let agent = &snap.agents()[0];
    assert_eq!(agent.pos, Axial::new(1, 0));
    assert_eq!(agent.state, AgentState::Idle);

    let seen = drain(&mut events);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, EventKind::ReachedGoal);
    assert_eq!(seen[0].agent, id);
    assert_eq!(seen[0].at, Axial::new(1, 0));
}

#[test]
fn six_blocked_neighbors_stuck_in_the_same_tick() {
    let mut engine = Engine::new(hex_config(5)).expect("config");
    let sender = engine.command_sender();
    let mut events = engine.event_receiver().expect("claim");

    let cell = spawn_full_speed(&engine, Axial::ZERO);
    engine.tick();
    let id = cell.get().expect("spawned");

    for dir in HEX_DIRS {
        sender
            .submit(Command::SetTileState { at: dir, state: 1 })
            .expect("submit");
    }
    sender
        .submit(Command::SetGoal {
            agent: id,
            goal: Axial::new(3, 0),
        })
        .expect("submit");
    engine.tick();

    let observer = engine.observer();
    let snap = observer.snapshot();
    assert_eq!(snap.agents()[0].state, AgentState::Idle);

    let seen = drain(&mut events);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, EventKind::Stuck);
    assert_eq!(seen[0].agent, id);
    assert_eq!(seen[0].at, Axial::ZERO);
}

#[test]
fn live_occupant_blocks_and_is_reported() {
    // A 4×1 strip: the only neighbor of (0,0) is (1,0), which is taken.
    let config = SimConfig {
        grid: GridKind::Rect,
        grid_width: 4,
        grid_height: 1,
        ..SimConfig::default()
    };
    let mut engine = Engine::new(config).expect("config");
    let sender = engine.command_sender();
    let mut events = engine.event_receiver().expect("claim");

    let mover = spawn_full_speed(&engine, Axial::new(0, 0));
    let blocker = spawn_full_speed(&engine, Axial::new(1, 0));
    engine.tick();
    let mover = mover.get().expect("mover");
    blocker.get().expect("blocker");

    sender
        .submit(Command::SetGoal {
            agent: mover,
            goal: Axial::new(2, 0),
        })
        .expect("submit");
    engine.tick();

    let observer = engine.observer();
    let snap = observer.snapshot();
    assert_eq!(snap.agents()[0].state, AgentState::Calculating);
    assert_eq!(snap.agents()[0].pos, Axial::new(0, 0));

    assert!(engine.stats().blocked_moves >= 1);
    let seen = drain(&mut events);
    assert!(seen
        .iter()
        .any(|e| e.kind == EventKind::Blocked && e.agent == mover && e.at == Axial::new(1, 0)));
}

#[test]
fn patrol_agents_stay_inside_the_leash() {
    let mut engine = Engine::new(hex_config(4)).expect("config");
    let sender = engine.command_sender();

    let barrack_cell = BarrackIdCell::new();
    sender
        .submit(Command::AddBarrack(Box::new(AddBarrack {
            at: Axial::ZERO,
            patrol_radius: 1,
            id_cell: Some(barrack_cell.clone()),
            ..AddBarrack::default()
        })))
        .expect("submit");
    engine.tick();
    let barrack = barrack_cell.get().expect("barrack");

    let agent_cell = AgentIdCell::new();
    sender
        .submit(Command::AddAgentWithBehavior(Box::new(AddAgentWithBehavior {
            agent: AddAgent {
                speed: 10_000,
                parent_barrack: barrack,
                id_cell: Some(agent_cell.clone()),
                ..AddAgent::at(Axial::ZERO)
            },
            behavior: BehaviorSpec::Patrol {
                center: Axial::ZERO,
                radius: 1,
            },
        })))
        .expect("submit");

    let observer = engine.observer();
    for _ in 0..24 {
        engine.tick();
        let snap = observer.snapshot();
        let agent = &snap.agents()[0];
        assert_eq!(agent.behavior, BehaviorKind::Patrol);
        assert!(
            Axial::ZERO.hex_distance(agent.pos) <= 1,
            "agent escaped the leash at {}",
            agent.pos
        );
    }
    agent_cell.get().expect("agent");
}

#[test]
fn patrol_without_a_barrack_queues_removal() {
    let mut engine = Engine::new(hex_config(4)).expect("config");
    let sender = engine.command_sender();

    sender
        .submit(Command::AddAgentWithBehavior(Box::new(AddAgentWithBehavior {
            agent: AddAgent::at(Axial::ZERO),
            behavior: BehaviorSpec::Patrol {
                center: Axial::ZERO,
                radius: 2,
            },
        })))
        .expect("submit");
    engine.tick();

    let observer = engine.observer();
    let snap = observer.snapshot();
    assert_eq!(snap.agents()[0].state, AgentState::PendingRemoval);
    assert_eq!(snap.agents()[0].behavior, BehaviorKind::Patrol);
}

#[test]
fn set_behavior_retasks_a_live_agent() {
    let mut engine = Engine::new(hex_config(4)).expect("config");
    let sender = engine.command_sender();

    let cell = spawn_full_speed(&engine, Axial::ZERO);
    engine.tick();
    let id = cell.get().expect("spawned");

    sender
        .submit(Command::SetBehavior {
            agent: id,
            behavior: BehaviorSpec::Explore {
                mode: muster_core::ExploreMode::Wander,
            },
        })
        .expect("submit");
    engine.tick();

    let observer = engine.observer();
    let snap = observer.snapshot();
    assert_eq!(snap.agents()[0].behavior, BehaviorKind::Explore);
}
