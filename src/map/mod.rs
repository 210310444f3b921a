//! Square tile map with ownership and per-player explored flags

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::core::types::TileCoord;
use crate::registry::ObjectId;
use crate::rules::{RuleTable, TileTypeId};

/// Highest number of players the explored bitmask can track
pub const MAX_PLAYER_SLOTS: u8 = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: ObjectId,
    pub coord: TileCoord,
    pub tile_type: TileTypeId,
    /// Player claiming the land
    pub owner: Option<ObjectId>,
    /// Settlement using the land
    pub owning_settlement: Option<ObjectId>,
    /// Settlement standing on the tile
    pub settlement: Option<ObjectId>,
    pub resource: bool,
    pub lost_city_rumour: bool,
    /// Water steps to the high seas; None when unreachable
    pub high_seas_count: Option<u32>,
}

impl Tile {
    pub fn has_settlement(&self) -> bool {
        self.settlement.is_some()
    }
}

#[derive(Debug)]
pub struct Map {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    /// One bit per player slot per tile
    explored: Mutex<Vec<u64>>,
}

impl Map {
    /// Build a map filled with one tile type, drawing tile identities from `next_id`
    pub fn new(width: u32, height: u32, fill: TileTypeId, mut next_id: impl FnMut() -> ObjectId) -> Self {
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                tiles.push(Tile {
                    id: next_id(),
                    coord: TileCoord::new(x, y),
                    tile_type: fill,
                    owner: None,
                    owning_settlement: None,
                    settlement: None,
                    resource: false,
                    lost_city_rumour: false,
                    high_seas_count: None,
                });
            }
        }
        let explored = Mutex::new(vec![0; tiles.len()]);
        Self {
            width,
            height,
            tiles,
            explored,
        }
    }

    /// Rebuild from persisted tiles and explored bits
    pub fn from_parts(width: u32, height: u32, tiles: Vec<Tile>, explored: Vec<u64>) -> Option<Self> {
        if tiles.len() != (width * height) as usize || explored.len() != tiles.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            tiles,
            explored: Mutex::new(explored),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as u32) < self.width && (coord.y as u32) < self.height
    }

    pub fn index_of(&self, coord: TileCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| (coord.y as u32 * self.width + coord.x as u32) as usize)
    }

    pub fn coord_of(&self, index: usize) -> TileCoord {
        let w = self.width as usize;
        TileCoord::new((index % w) as i32, (index / w) as i32)
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index_of(coord).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index_of(coord).map(move |i| &mut self.tiles[i])
    }

    pub fn tile_at(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn set_tile_type(&mut self, coord: TileCoord, tile_type: TileTypeId) {
        if let Some(tile) = self.tile_mut(coord) {
            tile.tile_type = tile_type;
        }
    }

    /// On-map tiles within `radius`, center included
    pub fn within(&self, center: TileCoord, radius: u32) -> Vec<TileCoord> {
        let r = radius as i32;
        let mut out = Vec::new();
        for y in (center.y - r)..=(center.y + r) {
            for x in (center.x - r)..=(center.x + r) {
                let c = TileCoord::new(x, y);
                if self.contains(c) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// On-map tiles within `radius`, center excluded
    pub fn surrounding(&self, center: TileCoord, radius: u32) -> Vec<TileCoord> {
        self.within(center, radius)
            .into_iter()
            .filter(|c| *c != center)
            .collect()
    }

    /// On-map tiles at exactly `radius`
    pub fn ring(&self, center: TileCoord, radius: u32) -> Vec<TileCoord> {
        self.within(center, radius)
            .into_iter()
            .filter(|c| c.distance(&center) == radius)
            .collect()
    }

    /// Clear every claim and placement of `settlement`; returns tiles freed
    pub fn release_claims(&mut self, settlement: &ObjectId) -> usize {
        let mut freed = 0;
        for tile in &mut self.tiles {
            if tile.settlement.as_ref() == Some(settlement) {
                tile.settlement = None;
            }
            if tile.owning_settlement.as_ref() == Some(settlement) {
                tile.owning_settlement = None;
                tile.owner = None;
                freed += 1;
            }
        }
        freed
    }

    // === EXPLORED FLAGS ===

    pub fn is_explored(&self, coord: TileCoord, slot: u8) -> bool {
        let Some(i) = self.index_of(coord) else { return false };
        let explored = self.explored.lock().unwrap_or_else(PoisonError::into_inner);
        explored[i] & (1u64 << slot) != 0
    }

    /// Mark tiles explored for a player slot; returns newly explored count
    pub fn mark_explored(&self, slot: u8, coords: &[TileCoord]) -> usize {
        let bit = 1u64 << slot;
        let mut explored = self.explored.lock().unwrap_or_else(PoisonError::into_inner);
        let mut fresh = 0;
        for coord in coords {
            if let Some(i) = self.index_of(*coord) {
                if explored[i] & bit == 0 {
                    explored[i] |= bit;
                    fresh += 1;
                }
            }
        }
        fresh
    }

    /// Per-tile explored flags for one slot
    pub fn explored_grid(&self, slot: u8) -> Vec<bool> {
        let bit = 1u64 << slot;
        let explored = self.explored.lock().unwrap_or_else(PoisonError::into_inner);
        explored.iter().map(|bits| bits & bit != 0).collect()
    }

    pub fn explored_bits(&self) -> Vec<u64> {
        self.explored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // === HIGH SEAS ===

    /// Recompute water distances to the high seas
    ///
    /// High-seas tiles count 0, other water counts steps through water,
    /// land counts one more than its best adjacent water. Land or water
    /// with no water route stays `None`.
    pub fn compute_high_seas(&mut self, rules: &RuleTable) {
        let mut dist: Vec<Option<u32>> = vec![None; self.tiles.len()];
        let mut queue = VecDeque::new();
        for (i, tile) in self.tiles.iter().enumerate() {
            if rules.tile_type(tile.tile_type).high_seas {
                dist[i] = Some(0);
                queue.push_back(i);
            }
        }
        while let Some(i) = queue.pop_front() {
            let here = self.coord_of(i);
            let d = dist[i].unwrap_or(0);
            for n in here.neighbors() {
                let Some(j) = self.index_of(n) else { continue };
                if dist[j].is_some() || rules.tile_type(self.tiles[j].tile_type).land {
                    continue;
                }
                dist[j] = Some(d + 1);
                queue.push_back(j);
            }
        }
        for i in 0..self.tiles.len() {
            if rules.tile_type(self.tiles[i].tile_type).land {
                let here = self.coord_of(i);
                let best = here
                    .neighbors()
                    .iter()
                    .filter_map(|n| self.index_of(*n))
                    .filter(|j| !rules.tile_type(self.tiles[*j].tile_type).land)
                    .filter_map(|j| dist[j])
                    .min();
                dist[i] = best.map(|d| d + 1);
            }
        }
        for (tile, d) in self.tiles.iter_mut().zip(dist) {
            tile.high_seas_count = d;
        }
    }

    /// Land tile adjacent to water
    pub fn is_coastal(&self, coord: TileCoord, rules: &RuleTable) -> bool {
        coord
            .neighbors()
            .iter()
            .filter_map(|n| self.tile(*n))
            .any(|t| !rules.tile_type(t.tile_type).land)
    }
}
