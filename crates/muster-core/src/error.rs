// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types surfaced by the simulation core.
//!
//! Submission-time errors are returned to the caller; tick-time errors are
//! logged and, where relevant, manifested as events. `tick` itself never
//! fails as a whole.

use thiserror::Error;

use crate::axial::Axial;
use crate::command::Command;

/// Errors detected while validating a [`crate::SimConfig`] at engine
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The agent pool capacity is zero.
    #[error("agent capacity must be nonzero")]
    ZeroAgentCapacity,
    /// The agent pool capacity does not fit the 16-bit slot index space
    /// (the all-ones index is the reserved sentinel).
    #[error("agent capacity {0} exceeds the 16-bit index space")]
    AgentCapacityTooLarge(u32),
    /// The barrack pool capacity is zero.
    #[error("barrack capacity must be nonzero")]
    ZeroBarrackCapacity,
    /// A queue capacity is too small to hold even one item (rings keep one
    /// slot empty to distinguish full from empty).
    #[error("queue capacity must be at least 2")]
    QueueCapacityTooSmall,
    /// A grid dimension is zero.
    #[error("grid dimensions must be nonzero")]
    ZeroGridDimension,
}

/// Error returned when a single command cannot be enqueued.
///
/// Ownership of the rejected command returns to the caller, which may retry
/// at its discretion; the queue is drained once per tick.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The command queue is full. Transient; retry after a tick.
    #[error("command queue is full")]
    QueueFull {
        /// The command that could not be enqueued.
        rejected: Command,
    },
}

/// Error returned when a batch submission fills the queue partway through.
///
/// Submission stays partial: everything before `submitted` was enqueued and
/// will be processed. The unsent suffix comes back in `rejected` so nothing
/// is silently dropped.
#[derive(Debug, Error)]
#[error("command queue full after {submitted} commands")]
pub struct SubmitAllError {
    /// Number of commands successfully enqueued before the queue filled.
    pub submitted: usize,
    /// The commands that were not enqueued, in submission order.
    pub rejected: Vec<Command>,
}

/// Internal failure taxonomy used by tick-time mutators.
///
/// These never propagate out of `tick`; they are logged and, where relevant,
/// turned into events. The type is public so embedders can interpret
/// [`crate::Engine::load_tile_states`] and future validating entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// A referenced agent or barrack id is stale or out of range.
    #[error("invalid or stale id")]
    InvalidId,
    /// A coordinate lies outside the configured grid.
    #[error("coordinate {at} is out of bounds")]
    OutOfBounds {
        /// The offending cell.
        at: Axial,
    },
    /// A pool is full; nothing further can be allocated.
    #[error("pool capacity exhausted")]
    Capacity,
    /// A supplied buffer does not match the grid's backing size.
    #[error("buffer length {got} does not match backing size {expected}")]
    SizeMismatch {
        /// Backing array length the grid expects.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },
    /// Reserved; not currently emitted.
    #[error("resource busy")]
    Busy,
}
