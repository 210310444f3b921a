//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Game turn counter (simulation time unit)
pub type Turn = u32;

/// Square-grid map coordinate
///
/// Distances use the king-move metric: a tile's eight neighbours are all at
/// distance 1, which is what sight radii and settlement rings are measured in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance in tile steps
    pub fn distance(&self, other: &TileCoord) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    /// All 8 adjacent coordinates (may fall outside the map)
    pub fn neighbors(&self) -> [TileCoord; 8] {
        [
            TileCoord::new(self.x - 1, self.y - 1),
            TileCoord::new(self.x, self.y - 1),
            TileCoord::new(self.x + 1, self.y - 1),
            TileCoord::new(self.x - 1, self.y),
            TileCoord::new(self.x + 1, self.y),
            TileCoord::new(self.x - 1, self.y + 1),
            TileCoord::new(self.x, self.y + 1),
            TileCoord::new(self.x + 1, self.y + 1),
        ]
    }

    pub fn is_adjacent(&self, other: &TileCoord) -> bool {
        self.distance(other) == 1
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
