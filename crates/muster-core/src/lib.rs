// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! muster-core: deterministic tick-driven agent simulation core.
//!
//! Producers submit commands from any thread through a lock-free MPSC
//! queue; a single simulation thread advances the world in discrete ticks,
//! emitting events through an SPSC queue and publishing double-buffered
//! read-only snapshots. Given the same seed and command sequence, two runs
//! are byte-identical.
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
// `unsafe_code` is deny (not forbid) at the workspace level so the two ring
// queues and the snapshot publisher can opt in locally with documented
// protocols; everything else stays safe.

mod agent;
mod axial;
mod collision;
mod command;
mod config;
mod engine;
mod error;
mod event;
mod ident;
mod map;
mod movement;
mod mpsc;
mod path;
mod pool;
mod rng;
mod snapshot;
mod spsc;
mod stats;

// Re-exports for a stable public API.
/// Agent state-machine vocabulary and tuning constants.
pub use agent::{
    AgentState, BehaviorKind, CollisionProfile, ExploreMode, DEFAULT_SPEED, DEFAULT_VIEW_RADIUS,
    MAX_PROGRESS,
};
/// Axial coordinates and the canonical neighbor order.
pub use axial::{Axial, HEX_DIRS};
/// Command carrier, payloads, and id write-back cells.
pub use command::{
    AddAgent, AddAgentWithBehavior, AddBarrack, AgentIdCell, BarrackIdCell, BehaviorSpec,
    BuildingKind, Command, GuardTiles,
};
/// Configuration types.
pub use config::{GridKind, SimConfig};
/// The simulation context and its role handles.
pub use engine::{CommandSender, Engine, EventReceiver, Observer};
/// Error taxonomy.
pub use error::{ConfigError, SimError, SubmitAllError, SubmitError};
/// Event records.
pub use event::{Event, EventKind};
/// Generational identifiers.
pub use ident::{AgentId, BarrackId};
/// Deterministic PRNG used for tie-breaking.
pub use rng::Pcg32;
/// Published snapshot views.
pub use snapshot::{AgentView, BarrackView, SnapshotGuard, WorldSnapshot};
/// By-value statistics snapshot.
pub use stats::Stats;
