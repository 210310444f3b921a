//! Consistency check over the whole game, optionally repairing

use crate::model::UnitLocation;
use crate::registry::ObjectId;

use super::Game;

/// Outcome of an integrity pass; combine results with `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Integrity {
    Ok,
    Fixed,
    Broken,
}

impl Integrity {
    fn problem(fix: bool) -> Self {
        if fix {
            Integrity::Fixed
        } else {
            Integrity::Broken
        }
    }
}

enum Repair {
    Dispose(ObjectId),
    Reattach(ObjectId, ObjectId),
    Relocate(ObjectId, UnitLocation),
}

impl Game {
    /// Check registry entries, ownership lists and unit locations
    ///
    /// With `fix` set, decayed entries are swept, ownerless units disposed,
    /// stale list members dropped and stranded units relocated.
    pub fn check_integrity(&mut self, fix: bool) -> Integrity {
        let mut result = Integrity::Ok;

        let decayed = self.registry.decayed_ids(&self.entities);
        if !decayed.is_empty() {
            tracing::warn!("{} decayed registry entries", decayed.len());
            result = result.max(Integrity::problem(fix));
            if fix {
                self.registry.sweep(&self.entities);
            }
        }

        let mut repairs = Vec::new();
        for (_, unit) in self.entities.units.iter() {
            if self.player(&unit.owner).is_err() {
                tracing::warn!("unit {} has no owner {}", unit.id, unit.owner);
                repairs.push(Repair::Dispose(unit.id.clone()));
                continue;
            }
            match &unit.location {
                UnitLocation::Building(b) => match self.building(b) {
                    Ok(building) if !building.units.contains(&unit.id) => {
                        tracing::warn!("unit {} missing from building {}", unit.id, b);
                        repairs.push(Repair::Reattach(unit.id.clone(), b.clone()));
                    }
                    Ok(_) => {}
                    Err(_) => {
                        tracing::warn!("unit {} works in vanished building {}", unit.id, b);
                        repairs.push(Repair::Relocate(unit.id.clone(), UnitLocation::Europe));
                    }
                },
                UnitLocation::WorkTile { colony, tile } if self.colony(colony).is_err() => {
                    tracing::warn!("unit {} works land of vanished settlement {}", unit.id, colony);
                    repairs.push(Repair::Relocate(unit.id.clone(), UnitLocation::Tile(*tile)));
                }
                UnitLocation::Carrier(carrier) if self.unit(carrier).is_err() => {
                    tracing::warn!("unit {} aboard vanished carrier {}", unit.id, carrier);
                    repairs.push(Repair::Relocate(unit.id.clone(), UnitLocation::Europe));
                }
                _ => {}
            }
        }

        for player in self.players() {
            let stale_units = player
                .units
                .snapshot()
                .into_iter()
                .filter(|id| self.unit(id).is_err())
                .count();
            let stale_settlements = player
                .settlements
                .snapshot()
                .into_iter()
                .filter(|id| self.colony(id).is_err())
                .count();
            if stale_units + stale_settlements > 0 {
                tracing::warn!(
                    "player {} lists {} dead units and {} dead settlements",
                    player.name,
                    stale_units,
                    stale_settlements
                );
                result = result.max(Integrity::problem(fix));
                if fix {
                    player.units.retain(|id| self.unit(id).is_ok());
                    player.settlements.retain(|id| self.colony(id).is_ok());
                }
            }
        }

        if !repairs.is_empty() {
            result = result.max(Integrity::problem(fix));
        }
        if fix {
            for repair in repairs {
                let outcome = match repair {
                    Repair::Dispose(id) => self.dispose_unit(&id, "integrity").map(|_| ()),
                    Repair::Reattach(id, building) => self
                        .building_mut(&building)
                        .map(|b| b.units.push(id)),
                    Repair::Relocate(id, to) => self.unit_mut(&id).map(|u| u.location = to),
                };
                if let Err(e) = outcome {
                    tracing::warn!("integrity repair failed: {}", e);
                    result = Integrity::Broken;
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TileCoord;
    use crate::core::SimulationConfig;
    use crate::model::PlayerType;
    use crate::rules::RuleTable;
    use std::sync::Arc;

    fn game() -> (Game, ObjectId) {
        let rules = Arc::new(RuleTable::classic());
        let plains = rules.tile_type_by_key("plains").expect("plains");
        let mut game = Game::new(rules, SimulationConfig::default(), 6, 6, plains, 2).expect("game");
        let player = game.add_player("Dutch", PlayerType::Colonial).expect("player");
        (game, player)
    }

    #[test]
    fn test_fresh_game_is_ok() {
        let (mut game, player) = game();
        game.found_colony(&player, TileCoord::new(2, 2), None).expect("colony");
        assert_eq!(game.check_integrity(false), Integrity::Ok);
    }

    #[test]
    fn test_stranded_worker_relocated() {
        let (mut game, player) = game();
        let colony = game.found_colony(&player, TileCoord::new(2, 2), None).expect("colony");
        let worker = game
            .create_unit(
                &player,
                game.rules.default_unit_type(),
                UnitLocation::WorkTile {
                    colony: colony.clone(),
                    tile: TileCoord::new(3, 3),
                },
            )
            .expect("worker");
        // Drop the colony behind the game's back
        let key = game.registry.peek(&colony, &game.entities).expect("entry").key;
        game.entities.colonies.remove(key);

        assert_eq!(game.check_integrity(false), Integrity::Broken);
        assert_eq!(game.check_integrity(true), Integrity::Fixed);
        assert_eq!(
            game.unit(&worker).expect("worker").location,
            UnitLocation::Tile(TileCoord::new(3, 3))
        );
        assert_eq!(game.check_integrity(false), Integrity::Ok);
    }

    #[test]
    fn test_integrity_order() {
        assert!(Integrity::Ok < Integrity::Fixed);
        assert_eq!(Integrity::Fixed.max(Integrity::Broken), Integrity::Broken);
    }
}
