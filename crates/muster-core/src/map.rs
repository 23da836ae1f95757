// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The spatial grid: tile states plus per-tile reservation words.
//!
//! Two parallel arrays back the grid. `tiles` holds static per-cell data;
//! `cells` holds one [`CellWord`] per tile recording which agent (if any)
//! has reserved or occupies it. Hexagonal maps use an inscribed-square
//! backing store with bounds-checked axial addressing; rectangular maps are
//! row-major.

use crate::axial::Axial;
use crate::config::GridKind;
use crate::error::SimError;
use crate::ident::AgentId;

/// Per-tile reservation word.
///
/// Bit layout (bit-exact, part of the public data contract):
/// - bit 31: RESERVED — an agent intends to arrive here.
/// - bit 30: OCCUPIED — an agent is standing here.
/// - bits 16..30: unused.
/// - bits 0..16: occupying agent's slot index; `0xFFFF` means empty.
///
/// Exactly one agent may hold the RESERVED bit of a tile at a time. The
/// word carries no generation; consumers validate the index against the
/// pool and treat stale entries as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellWord(u32);

impl CellWord {
    const RESERVED_BIT: u32 = 1 << 31;
    const OCCUPIED_BIT: u32 = 1 << 30;
    const INDEX_MASK: u32 = 0xFFFF;

    /// The empty word: no flags, sentinel index.
    pub const EMPTY: Self = Self(Self::INDEX_MASK);

    /// Word for a future reservation by the agent at `index`.
    pub fn reserved(index: u16) -> Self {
        Self(u32::from(index) | Self::RESERVED_BIT)
    }

    /// Word for actual occupation by the agent at `index`.
    pub fn occupied(index: u16) -> Self {
        Self(u32::from(index) | Self::OCCUPIED_BIT)
    }

    /// Raw value, for logging.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot index carried in the low bits.
    pub fn agent_index(self) -> u16 {
        (self.0 & Self::INDEX_MASK) as u16
    }

    /// True when no agent index is present.
    pub fn is_empty(self) -> bool {
        self.agent_index() == AgentId::INVALID.index()
    }

    /// True when the RESERVED bit is set.
    pub fn is_reserved(self) -> bool {
        self.0 & Self::RESERVED_BIT != 0
    }

    /// True when an agent index is present without the RESERVED bit.
    pub fn is_occupied(self) -> bool {
        !self.is_empty() && !self.is_reserved()
    }
}

/// Static per-tile data.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Tile {
    /// `0` walkable; nonzero blocked (meaning of nonzero values is the
    /// embedder's).
    pub state: u8,
    /// Occupancy counter. Reserved for future multi-occupancy.
    pub occupancy: u8,
    /// Sector assignment. Reserved; never set yet.
    pub sector: Option<u16>,
}

/// Tile grid with per-tile reservation words.
#[derive(Debug)]
pub(crate) struct MapGrid {
    kind: GridKind,
    width: i32,
    height: i32,
    /// Hex radius (equals `width` for hex maps, unused for rect).
    radius: i32,
    /// Row stride of the backing store.
    stride: i32,
    tiles: Vec<Tile>,
    cells: Vec<CellWord>,
}

impl MapGrid {
    /// Creates an all-walkable grid.
    ///
    /// For hex maps `width` is the radius and the backing store is the
    /// inscribed `(2·radius + 1)²` square; corner cells outside the hex are
    /// simply never addressable.
    pub fn new(kind: GridKind, width: u32, height: u32) -> Self {
        let (w, h, radius, stride, len) = match kind {
            GridKind::Hex => {
                let radius = width as i32;
                let stride = 2 * radius + 1;
                (radius, radius, radius, stride, (stride * stride) as usize)
            }
            GridKind::Rect => {
                let w = width as i32;
                let h = height as i32;
                (w, h, 0, w, (w * h) as usize)
            }
        };
        Self {
            kind,
            width: w,
            height: h,
            radius,
            stride,
            tiles: vec![Tile::default(); len],
            cells: vec![CellWord::EMPTY; len],
        }
    }

    /// Backing store length (includes unaddressable hex corners).
    pub fn backing_len(&self) -> usize {
        self.tiles.len()
    }

    /// True when `at` addresses a cell of this grid.
    pub fn in_bounds(&self, at: Axial) -> bool {
        match self.kind {
            GridKind::Hex => {
                at.q.abs() <= self.radius
                    && at.r.abs() <= self.radius
                    && (at.q + at.r).abs() <= self.radius
            }
            GridKind::Rect => {
                at.q >= 0 && at.q < self.width && at.r >= 0 && at.r < self.height
            }
        }
    }

    fn index_of(&self, at: Axial) -> Option<usize> {
        if !self.in_bounds(at) {
            return None;
        }
        let idx = match self.kind {
            GridKind::Hex => (at.r + self.radius) * self.stride + (at.q + self.radius),
            GridKind::Rect => at.r * self.stride + at.q,
        };
        Some(idx as usize)
    }

    /// Tile at `at`, or `None` out of bounds.
    pub fn tile(&self, at: Axial) -> Option<&Tile> {
        self.index_of(at).map(|i| &self.tiles[i])
    }

    /// True when `at` is in bounds and its state byte is zero.
    pub fn is_walkable(&self, at: Axial) -> bool {
        self.tile(at).is_some_and(|t| t.state == 0)
    }

    /// Writes a tile's state byte. Fails out of bounds.
    pub fn set_tile_state(&mut self, at: Axial, state: u8) -> Result<(), SimError> {
        let idx = self.index_of(at).ok_or(SimError::OutOfBounds { at })?;
        self.tiles[idx].state = state;
        Ok(())
    }

    /// Reservation word at `at`.
    ///
    /// Out-of-bounds reads answer [`CellWord::EMPTY`]; writers always bound-
    /// check first, so nothing is ever lost through this.
    pub fn cell(&self, at: Axial) -> CellWord {
        self.index_of(at)
            .map_or(CellWord::EMPTY, |i| self.cells[i])
    }

    /// Writes the reservation word at `at`. Silently ignores out-of-bounds
    /// (callers validate coordinates before mutating).
    pub fn set_cell(&mut self, at: Axial, word: CellWord) {
        if let Some(idx) = self.index_of(at) {
            self.cells[idx] = word;
        }
    }

    /// Bulk-loads tile state bytes in backing index order.
    ///
    /// The buffer must cover the whole backing store, hex corners included.
    pub fn load_states(&mut self, states: &[u8]) -> Result<(), SimError> {
        if states.len() != self.tiles.len() {
            return Err(SimError::SizeMismatch {
                expected: self.tiles.len(),
                got: states.len(),
            });
        }
        for (tile, &state) in self.tiles.iter_mut().zip(states) {
            tile.state = state;
        }
        Ok(())
    }
}
