// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Axial grid coordinates and distance metrics.

use core::fmt;
use core::ops::{Add, Sub};

/// Axial coordinate pair `(q, r)`.
///
/// On hexagonal maps these are axial hex coordinates (the third cube
/// coordinate `s = −q − r` is implicit). On rectangular maps `q` is the
/// column and `r` the row; the same pair type is used for both so commands
/// and events are grid-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Axial {
    /// Column / hex q axis.
    pub q: i32,
    /// Row / hex r axis.
    pub r: i32,
}

/// The six axial hex neighbor offsets, in canonical scan order.
///
/// The order is load-bearing: the pathfinder scans candidates in this order
/// and breaks ties by index, so reordering changes every tie-broken run.
pub const HEX_DIRS: [Axial; 6] = [
    Axial::new(1, 0),
    Axial::new(1, -1),
    Axial::new(0, -1),
    Axial::new(-1, 0),
    Axial::new(-1, 1),
    Axial::new(0, 1),
];

impl Axial {
    /// Origin cell.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Hex distance between two cells: `(|dq| + |dq+dr| + |dr|) / 2`.
    #[must_use]
    pub fn hex_distance(self, other: Self) -> i32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + (dq + dr).abs() + dr.abs()) / 2
    }

    /// Squared axial distance `dq² + dr²`.
    ///
    /// Not a true hex metric; it is the pathfinder's tie-break score, widened
    /// to `i64` so extreme coordinates cannot overflow.
    #[must_use]
    pub fn dist_sq(self, other: Self) -> i64 {
        let dq = i64::from(self.q - other.q);
        let dr = i64::from(self.r - other.r);
        dq * dq + dr * dr
    }
}

impl Add for Axial {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Sub for Axial {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.q - rhs.q, self.r - rhs.r)
    }
}

impl fmt::Display for Axial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
