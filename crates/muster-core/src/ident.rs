// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generational identifier types for agents and barracks.

use core::fmt;

/// Strongly typed agent identifier.
///
/// Packs a pool slot index into the low 16 bits and the slot's generation
/// into the high 16 bits (`gen << 16 | index`). The generation makes stale
/// ids fail-safe: after a slot is freed and reused, lookups with the old id
/// miss because the generations no longer match.
///
/// # Invariants
/// - `AgentId::INVALID` (all ones) never names a live agent.
/// - Ids are only minted by the agent pool; embedders treat them as opaque.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentId(u32);

impl AgentId {
    /// Sentinel id that never refers to a live agent.
    pub const INVALID: Self = Self(u32::MAX);

    /// Packs an index/generation pair into an id.
    #[must_use]
    pub const fn from_parts(index: u16, generation: u16) -> Self {
        Self((generation as u32) << 16 | index as u32)
    }

    /// Constructs an id from its raw `u32` representation.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` representation (`gen << 16 | index`).
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the pool slot index (low 16 bits).
    #[must_use]
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Returns the slot generation (high 16 bits).
    #[must_use]
    pub const fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns `true` unless this is the [`AgentId::INVALID`] sentinel.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for AgentId {
    /// Defaults to [`AgentId::INVALID`]; zero would alias a real slot.
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "agent#{}@{}", self.index(), self.generation())
        } else {
            f.write_str("agent#invalid")
        }
    }
}

/// Strongly typed barrack identifier.
///
/// Barracks use a sequential bump allocator, so the id is a plain index with
/// no generation; barracks are never freed in this version.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BarrackId(u16);

impl BarrackId {
    /// Sentinel id that never refers to a live barrack.
    pub const INVALID: Self = Self(u16::MAX);

    /// Constructs an id from its raw `u16` index.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw `u16` index.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns `true` unless this is the [`BarrackId::INVALID`] sentinel.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u16::MAX
    }
}

impl Default for BarrackId {
    /// Defaults to [`BarrackId::INVALID`]; zero would alias a real slot.
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for BarrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "barrack#{}", self.0)
        } else {
            f.write_str("barrack#invalid")
        }
    }
}
