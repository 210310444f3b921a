//! Visibility engine - which tiles each player currently perceives
//!
//! Grids are cached per player and rebuilt lazily after invalidation.
//! Callers making several sight-changing edits invalidate once at the end.

pub mod cache;

pub use cache::SightCache;

use std::sync::Arc;

use crate::core::types::TileCoord;
use crate::game::Game;
use crate::model::{Player, SettlementKind};
use crate::registry::ObjectId;
use crate::rules::Ability;

/// Can `player` see `coord` right now
pub fn can_see(game: &Game, player: &ObjectId, coord: TileCoord) -> bool {
    let Some(index) = game.map.index_of(coord) else { return false };
    let Ok(p) = game.player(player) else { return false };
    sight_grid(game, p)[index]
}

/// Mark one player's grid stale
pub fn invalidate(game: &Game, player: &ObjectId) {
    if let Ok(p) = game.player(player) {
        p.sight.invalidate();
    }
}

pub fn invalidate_all(game: &Game) {
    for p in game.players() {
        p.sight.invalidate();
    }
}

/// Every tile `player` can currently see, in map order
pub fn visible_tiles(game: &Game, player: &ObjectId) -> Vec<TileCoord> {
    let Ok(p) = game.player(player) else { return Vec::new() };
    sight_grid(game, p)
        .iter()
        .enumerate()
        .filter(|(_, seen)| **seen)
        .map(|(i, _)| game.map.coord_of(i))
        .collect()
}

fn sight_grid(game: &Game, player: &Player) -> Arc<Vec<bool>> {
    player.sight.get_or_compute(|| compute_grid(game, player))
}

/// Rebuild a grid from scratch
///
/// Without fog of war a player sees exactly what it has explored. With fog
/// the grid is the union of current sight ranges, and every tile in that
/// union becomes explored.
fn compute_grid(game: &Game, player: &Player) -> Vec<bool> {
    if !game.rules.options.fog_of_war {
        return game.map.explored_grid(player.slot);
    }
    let mut seen: Vec<TileCoord> = Vec::new();

    for id in player.units.snapshot() {
        let Ok(unit) = game.unit(&id) else { continue };
        if let Some(tile) = unit.location.map_tile() {
            let radius = game.rules.unit_type(unit.unit_type).line_of_sight;
            seen.extend(game.map.within(tile, radius));
        }
    }
    for id in player.settlements.snapshot() {
        if let Ok(colony) = game.colony(&id) {
            seen.extend(game.map.within(colony.tile, game.colony_line_of_sight(colony)));
        }
    }

    let see_all = player.has_ability(Ability::SeeAllColonies);
    let missions = game.rules.options.enhanced_missionaries;
    if see_all || missions {
        for other in game.players().filter(|o| o.id != player.id) {
            for id in other.settlements.snapshot() {
                let Ok(colony) = game.colony(&id) else { continue };
                let visible = match &colony.kind {
                    SettlementKind::NativeCamp { missionary: Some(m) } => {
                        missions && game.unit(m).is_ok_and(|u| u.owner == player.id)
                    }
                    SettlementKind::NativeCamp { missionary: None } => false,
                    SettlementKind::Colony => see_all && other.is_european(),
                };
                if visible {
                    seen.extend(game.map.within(colony.tile, game.colony_line_of_sight(colony)));
                }
            }
        }
    }

    game.map.mark_explored(player.slot, &seen);
    let mut grid = vec![false; game.map.len()];
    for coord in seen {
        if let Some(i) = game.map.index_of(coord) {
            grid[i] = true;
        }
    }
    grid
}
