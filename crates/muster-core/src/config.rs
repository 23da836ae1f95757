// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine configuration.

use crate::error::ConfigError;

/// Grid topology selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridKind {
    /// Hexagonal map addressed with axial coordinates; `grid_width` is the
    /// hex radius.
    #[default]
    Hex,
    /// Rectangular map; `(q, r)` are column and row.
    Rect,
}

/// Engine configuration fixed at creation time.
///
/// Capacities cannot change after [`crate::Engine::new`]; queue sizes define
/// the backpressure between producers and the simulation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Grid topology.
    pub grid: GridKind,
    /// Agent pool capacity. Must fit the 16-bit slot index space.
    pub max_agents: u32,
    /// Barrack pool capacity.
    pub max_barracks: u16,
    /// Map width in cells; the hex radius when `grid` is [`GridKind::Hex`].
    pub grid_width: u32,
    /// Map height in cells; unused for hex maps.
    pub grid_height: u32,
    /// Sector side length in cells. Reserved; sectors are not assigned yet.
    pub sector_size: u32,
    /// MPSC command queue capacity, in commands.
    pub command_queue_capacity: u32,
    /// SPSC event queue capacity, in events.
    pub event_queue_capacity: u32,
    /// Seed for the internal PCG32 generator.
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid: GridKind::Hex,
            max_agents: 1024,
            max_barracks: 64,
            grid_width: 32,
            grid_height: 32,
            sector_size: 0,
            command_queue_capacity: 1024,
            event_queue_capacity: 1024,
            rng_seed: 0x853c_49e6_748f_ea9b,
        }
    }
}

impl SimConfig {
    /// Validates capacities and dimensions.
    ///
    /// # Errors
    /// Returns the first violated constraint; see [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_agents == 0 {
            return Err(ConfigError::ZeroAgentCapacity);
        }
        // Index 0xFFFF is the sentinel, so at most 0xFFFF slots are usable.
        if self.max_agents > u32::from(u16::MAX) {
            return Err(ConfigError::AgentCapacityTooLarge(self.max_agents));
        }
        if self.max_barracks == 0 {
            return Err(ConfigError::ZeroBarrackCapacity);
        }
        if self.command_queue_capacity < 2 || self.event_queue_capacity < 2 {
            return Err(ConfigError::QueueCapacityTooSmall);
        }
        let height_ok = match self.grid {
            GridKind::Hex => true,
            GridKind::Rect => self.grid_height > 0,
        };
        if self.grid_width == 0 || !height_ok {
            return Err(ConfigError::ZeroGridDimension);
        }
        Ok(())
    }
}
