//! Whether a player may claim a tile, and what it would cost

use crate::core::types::TileCoord;
use crate::diplomacy::Stance;
use crate::game::Game;
use crate::map::Tile;
use crate::model::Player;
use crate::rules::BuildOnNativeLand;

/// Why a tile cannot be claimed; `None` means it can
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoClaimReason {
    None,
    /// Terrain does not allow settlement
    Terrain,
    /// Europeans leave rumour tiles alone
    Rumour,
    /// Natives do not claim water
    Water,
    /// A hostile military unit holds the tile
    Occupied,
    Settlement,
    /// One of our settlements is working the tile
    Worked,
    /// Held by a European colony and not for sale
    Europeans,
    /// Native land that must be bought
    Natives,
}

/// Price for taking the tile from its owner
///
/// Zero when free, negative when not for sale.
pub fn land_price(game: &Game, player: &Player, tile: &Tile) -> i32 {
    let Some(owner_id) = &tile.owner else { return 0 };
    if *owner_id == player.id {
        return 0;
    }
    if tile.has_settlement() {
        return -1;
    }
    let Ok(owner) = game.player(owner_id) else { return 0 };
    if owner.is_european() {
        let nailed = tile
            .owning_settlement
            .as_ref()
            .and_then(|s| game.colony(s).ok())
            .is_some_and(|c| c.owner == *owner_id);
        return if nailed { -1 } else { 0 };
    }
    let rules = &game.rules;
    let food = rules.primary_food();
    let tile_type = rules.tile_type(tile.tile_type);
    let potential: u32 = rules
        .all_goods()
        .iter()
        .filter(|g| g.id != food)
        .map(|g| tile_type.potential(g.id))
        .sum();
    (potential * rules.tunables.land_price_factor + 100) as i32
}

/// Is some settlement's colonist working this tile
pub fn is_in_use(game: &Game, tile: &Tile) -> bool {
    tile.owning_settlement
        .as_ref()
        .and_then(|s| game.colony(s).ok())
        .and_then(|c| c.work_tile(tile.coord))
        .is_some_and(|w| w.unit.is_some())
}

/// Basic practicality of owning the tile at all
pub fn can_own_tile_reason(game: &Game, player: &Player, tile: &Tile) -> NoClaimReason {
    for unit_id in game.units_at(tile.coord) {
        let Ok(unit) = game.unit(&unit_id) else { continue };
        if unit.owner == player.id || !player.at_war_with(&unit.owner) {
            break;
        }
        if game.rules.unit_type(unit.unit_type).is_offensive() {
            return NoClaimReason::Occupied;
        }
    }
    let land = game.rules.tile_type(tile.tile_type).land;
    match (player.is_european(), tile.lost_city_rumour, land) {
        (true, true, _) => NoClaimReason::Rumour,
        (true, false, _) | (false, _, true) => NoClaimReason::None,
        (false, _, false) => NoClaimReason::Water,
    }
}

/// Can a settlement of ours use the tile without buying or stealing it
pub fn claim_for_settlement_reason(game: &Game, player: &Player, tile: &Tile) -> NoClaimReason {
    let reason = can_own_tile_reason(game, player, tile);
    if reason != NoClaimReason::None {
        return reason;
    }
    if tile.has_settlement() {
        return NoClaimReason::Settlement;
    }
    match &tile.owner {
        None => NoClaimReason::None,
        Some(owner) if *owner == player.id => {
            if is_in_use(game, tile) {
                NoClaimReason::Worked
            } else {
                NoClaimReason::None
            }
        }
        Some(_) => match land_price(game, player, tile) {
            p if p < 0 => NoClaimReason::Europeans,
            p if p > 0 => NoClaimReason::Natives,
            _ => NoClaimReason::None,
        },
    }
}

/// Can the player found a settlement on the tile
///
/// Like `claim_for_settlement_reason`, but the terrain must be settleable
/// and native land may be taken for free under the build-on-native-land
/// option.
pub fn claim_to_found_reason(game: &Game, player: &Player, coord: TileCoord) -> NoClaimReason {
    let Some(tile) = game.map.tile(coord) else { return NoClaimReason::Terrain };
    if !game.rules.tile_type(tile.tile_type).settleable {
        return NoClaimReason::Terrain;
    }
    match claim_for_settlement_reason(game, player, tile) {
        NoClaimReason::Natives if can_claim_free_center_tile(game, player, tile) => NoClaimReason::None,
        reason => reason,
    }
}

/// Native land granted for a colony center under the current option
pub fn can_claim_free_center_tile(game: &Game, player: &Player, tile: &Tile) -> bool {
    let Some(native) = tile.owner.as_ref().and_then(|o| game.player(o).ok()) else {
        return false;
    };
    if !player.is_european() || native.is_european() {
        return false;
    }
    match game.rules.options.build_on_native_land {
        BuildOnNativeLand::Never => false,
        BuildOnNativeLand::Always => true,
        BuildOnNativeLand::First => has_zero_settlements(game, player),
        BuildOnNativeLand::FirstAndUncontacted => {
            has_zero_settlements(game, player) && native.stance_toward(&player.id) == Stance::Uncontacted
        }
    }
}

/// No settlement on the map yet; one being placed does not count
fn has_zero_settlements(game: &Game, player: &Player) -> bool {
    let settlements = player.settlements.snapshot();
    match settlements.as_slice() {
        [] => true,
        [only] => game
            .colony(only)
            .ok()
            .and_then(|c| game.map.tile(c.tile))
            .map_or(true, |t| t.settlement.as_ref() != Some(only)),
        _ => false,
    }
}
