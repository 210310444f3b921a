//! Build-queue validation and completion of units and buildings

use rand::Rng;

use crate::core::error::Result;
use crate::game::Game;
use crate::model::{MessageType, ModelMessage, UnitLocation};
use crate::registry::ObjectId;
use crate::rules::{Ability, Buildable, BuildingTypeId, UnitLimit, UnitTypeId};
use crate::sync::ChangeSet;

use super::production::{Completion, ProductionReport, QueueKind};

/// Why a buildable cannot be built in a colony right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoBuildReason {
    None,
    /// Not the next step of the colony's upgrade chain
    WrongUpgrade,
    PopulationTooSmall,
    /// Colony lacks the ability a unit needs to be built
    MissingBuildAbility,
    /// Colony lacks the ability a building requires
    MissingAbility,
    /// Player already owns as many as allowed
    LimitExceeded,
}

pub fn no_build_reason(game: &Game, colony_id: &ObjectId, buildable: Buildable) -> NoBuildReason {
    let Ok(colony) = game.colony(colony_id) else { return NoBuildReason::MissingAbility };
    let rules = &game.rules;
    let population = game.colony_unit_count(colony_id) as u32;
    match buildable {
        Buildable::Unit(ut) => {
            let unit_type = rules.unit_type(ut);
            if let Some(ability) = unit_type.required_ability {
                if !game.colony_has_ability(colony, ability) {
                    return NoBuildReason::MissingBuildAbility;
                }
            }
            if population < unit_type.required_population {
                return NoBuildReason::PopulationTooSmall;
            }
            if unit_type.limit == Some(UnitLimit::PerColony) {
                let Ok(owner) = game.player(&colony.owner) else { return NoBuildReason::LimitExceeded };
                let owned = owner
                    .units
                    .snapshot()
                    .iter()
                    .filter(|u| game.unit(u).is_ok_and(|u| u.unit_type == ut))
                    .count();
                if owned >= owner.settlements.len() {
                    return NoBuildReason::LimitExceeded;
                }
            }
            NoBuildReason::None
        }
        Buildable::Building(bt) => {
            let building_type = rules.building_type(bt);
            let existing = game
                .colony_building_of_root(colony, rules.building_root(bt))
                .and_then(|b| game.building(&b).ok())
                .map(|b| b.building_type);
            let next_step = match existing {
                Some(current) => rules.upgrade_of(current) == Some(bt),
                None => building_type.upgrades_from.is_none(),
            };
            if !next_step {
                return NoBuildReason::WrongUpgrade;
            }
            if let Some(ability) = building_type.required_ability {
                if !game.colony_has_ability(colony, ability) {
                    return NoBuildReason::MissingAbility;
                }
            }
            if population < building_type.required_population {
                return NoBuildReason::PopulationTooSmall;
            }
            NoBuildReason::None
        }
    }
}

/// Evict unbuildable heads until a buildable one (or nothing) remains
///
/// Population shortfalls and other failures message the owner; a reached
/// unit limit is expected and silent.
pub fn next_buildable(game: &mut Game, colony_id: &ObjectId, kind: QueueKind, cs: &mut ChangeSet) -> Option<Buildable> {
    loop {
        let (owner, name, current) = {
            let colony = game.colony(colony_id).ok()?;
            let queue = match kind {
                QueueKind::Build => &colony.build_queue,
                QueueKind::Population => &colony.population_queue,
            };
            (colony.owner.clone(), colony.name.clone(), queue.current()?)
        };
        let reason = no_build_reason(game, colony_id, current);
        let label = game.rules.buildable_name(current).to_string();
        match reason {
            NoBuildReason::None => return Some(current),
            NoBuildReason::LimitExceeded => {}
            NoBuildReason::PopulationTooSmall => {
                cs.add_message(
                    &owner,
                    ModelMessage::new(MessageType::Warning, "model.colony.buildNeedPop", colony_id)
                        .with("colony", &name)
                        .with("building", &label),
                );
            }
            other => {
                tracing::warn!("unexpected build failure at {} for {}: {:?}", name, label, other);
                cs.add_message(
                    &owner,
                    ModelMessage::new(MessageType::Warning, "model.colony.unbuildable", colony_id)
                        .with("colony", &name)
                        .with("object", &label),
                );
            }
        }
        let colony = game.colony_mut(colony_id).ok()?;
        match kind {
            QueueKind::Build => colony.build_queue.remove_current(),
            QueueKind::Population => colony.population_queue.remove_current(),
        };
    }
}

/// Create a finished unit on the colony tile; returns whether it was born
pub fn build_unit(game: &mut Game, colony_id: &ObjectId, unit_type: UnitTypeId, cs: &mut ChangeSet) -> Result<bool> {
    let (owner, tile, name) = {
        let c = game.colony(colony_id)?;
        (c.owner.clone(), c.tile, c.name.clone())
    };
    let unit = game.create_unit(&owner, unit_type, UnitLocation::Tile(tile))?;
    let ut = game.rules.unit_type(unit_type);
    let born = ut.has_ability(Ability::BornInColony);
    let message = if born {
        ModelMessage::new(MessageType::UnitAdded, "model.colony.newColonist", colony_id).with("colony", &name)
    } else {
        let label = game.unit(&unit)?.display_name(&ut.name).to_string();
        ModelMessage::new(MessageType::UnitAdded, "model.colony.unitReady", colony_id)
            .with("colony", &name)
            .with("unit", label)
    };
    cs.add_message(&owner, message);
    tracing::info!("new unit in {}: {}", name, ut.key);
    Ok(born)
}

/// Add or upgrade a building; returns true when the colony tile changed
/// visibly (defence raised or workers ejected)
pub fn build_building(game: &mut Game, colony_id: &ObjectId, building_type: BuildingTypeId, cs: &mut ChangeSet) -> Result<bool> {
    let rules = std::sync::Arc::clone(&game.rules);
    let bt = rules.building_type(building_type);
    let (owner, name) = {
        let c = game.colony(colony_id)?;
        (c.owner.clone(), c.name.clone())
    };
    let mut ejected = false;
    match bt.upgrades_from {
        None => {
            game.add_building(colony_id, building_type)?;
        }
        Some(_) => {
            let existing = {
                let c = game.colony(colony_id)?;
                game.colony_building_of_root(c, rules.building_root(building_type))
            };
            let Some(building_id) = existing else {
                cs.add_message(
                    &owner,
                    ModelMessage::new(MessageType::Warning, "model.colony.unbuildable", colony_id)
                        .with("colony", &name)
                        .with("object", &bt.name),
                );
                return Ok(false);
            };
            let building = game.building_mut(&building_id)?;
            building.building_type = building_type;
            let workers = building.units.clone();
            let mut leaving = Vec::new();
            for (i, unit) in workers.iter().enumerate() {
                let skill = game.unit(unit).map(|u| rules.unit_type(u.unit_type).skill).unwrap_or(0);
                if i as u32 >= bt.workplaces || !bt.accepts_skill(skill) {
                    leaving.push(unit.clone());
                }
            }
            ejected = eject_units(game, colony_id, &building_id, &leaving)?;
        }
    }
    cs.add_message(
        &owner,
        ModelMessage::new(MessageType::BuildingCompleted, "model.colony.buildingReady", colony_id)
            .with("colony", &name)
            .with("building", &bt.name),
    );
    tracing::info!("new building in {}: {}", name, bt.key);
    Ok(ejected || bt.has_ability(Ability::Defence))
}

/// Move units out of `from` to the first work location that takes them,
/// falling back to the colony tile
pub fn eject_units(game: &mut Game, colony_id: &ObjectId, from: &ObjectId, units: &[ObjectId]) -> Result<bool> {
    if units.is_empty() {
        return Ok(false);
    }
    // Drop them from the building first so capacity checks see the new type
    if let Ok(b) = game.building_mut(from) {
        b.units.retain(|u| !units.contains(u));
    }
    for unit in units {
        let unit_type = game.unit(unit)?.unit_type;
        let (tile, candidates) = {
            let c = game.colony(colony_id)?;
            let mut candidates: Vec<UnitLocation> = c
                .buildings
                .iter()
                .filter(|b| *b != from)
                .map(|b| UnitLocation::Building(b.clone()))
                .collect();
            candidates.extend(
                c.work_tiles
                    .iter()
                    .filter(|t| t.unit.is_none())
                    .map(|t| UnitLocation::WorkTile {
                        colony: colony_id.clone(),
                        tile: t.coord,
                    }),
            );
            (c.tile, candidates)
        };
        let target = candidates
            .into_iter()
            .find(|loc| game.check_location(Some(unit), unit_type, loc).is_ok())
            .unwrap_or(UnitLocation::Tile(tile));
        // The unit no longer sits in `from`; point it there so move_unit detaches cleanly
        game.unit_mut(unit)?.location = UnitLocation::Tile(tile);
        game.move_unit(unit, target)?;
    }
    Ok(true)
}

/// Retire the finished head of a queue according to its policy
/// Warn about queue heads that cannot progress because an input is not
/// being produced; returns the number of warnings
pub fn check_stalled_queues(game: &Game, colony_id: &ObjectId, report: &ProductionReport, cs: &mut ChangeSet) -> usize {
    let Ok(colony) = game.colony(colony_id) else { return 0 };
    let mut warned = 0;
    for status in report.queues.iter().filter(|q| q.completion == Completion::Never) {
        let Some((goods, amount)) = status.missing else { continue };
        let buildable = game.rules.buildable_name(status.current);
        tracing::debug!("{} cannot progress on {}: no {}", colony.name, buildable, game.rules.goods(goods).key);
        cs.add_message(
            &colony.owner,
            ModelMessage::new(MessageType::MissingGoods, "model.colony.buildableNeedsGoods", colony_id)
                .with("colony", &colony.name)
                .with("buildable", buildable)
                .with("amount", amount)
                .with("goodsType", &game.rules.goods(goods).name),
        );
        warned += 1;
    }
    warned
}

pub fn complete_queue<R: Rng>(game: &mut Game, colony_id: &ObjectId, kind: QueueKind, rng: &mut R) -> Result<()> {
    let colony = game.colony_mut(colony_id)?;
    match kind {
        QueueKind::Build => colony.build_queue.complete_current(rng),
        QueueKind::Population => colony.population_queue.complete_current(rng),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TileCoord;
    use crate::core::SimulationConfig;
    use crate::model::PlayerType;
    use crate::rules::RuleTable;
    use std::sync::Arc;

    fn setup() -> (Game, ObjectId, ObjectId) {
        let rules = Arc::new(RuleTable::classic());
        let plains = rules.tile_type_by_key("plains").expect("plains");
        let mut game = Game::new(rules, SimulationConfig::default(), 8, 8, plains, 4).expect("game");
        let player = game.add_player("Dutch", PlayerType::Colonial).expect("player");
        let colony = game.found_colony(&player, TileCoord::new(3, 3), None).expect("colony");
        game.create_unit(
            &player,
            game.rules.default_unit_type(),
            UnitLocation::WorkTile {
                colony: colony.clone(),
                tile: TileCoord::new(4, 4),
            },
        )
        .expect("worker");
        (game, player, colony)
    }

    #[test]
    fn test_inland_colony_cannot_build_docks() {
        let (game, _, colony) = setup();
        let docks = game.rules.building_type_by_key("docks").expect("docks");
        assert_eq!(
            no_build_reason(&game, &colony, Buildable::Building(docks)),
            NoBuildReason::MissingAbility
        );
    }

    #[test]
    fn test_upgrade_requires_base() {
        let (game, _, colony) = setup();
        let college = game.rules.building_type_by_key("college").expect("college");
        let mill = game.rules.building_type_by_key("lumber_mill").expect("mill");
        assert_eq!(
            no_build_reason(&game, &colony, Buildable::Building(college)),
            NoBuildReason::WrongUpgrade
        );
        assert_eq!(
            no_build_reason(&game, &colony, Buildable::Building(mill)),
            NoBuildReason::PopulationTooSmall
        );
    }

    #[test]
    fn test_wagon_limit_per_colony() {
        let (mut game, player, colony) = setup();
        let wagon = game.rules.unit_type_by_key("wagon_train").expect("wagon");
        assert_eq!(no_build_reason(&game, &colony, Buildable::Unit(wagon)), NoBuildReason::None);
        game.create_unit(&player, wagon, UnitLocation::Tile(TileCoord::new(3, 3)))
            .expect("wagon");
        assert_eq!(
            no_build_reason(&game, &colony, Buildable::Unit(wagon)),
            NoBuildReason::LimitExceeded
        );
    }

    #[test]
    fn test_next_buildable_evicts_invalid_heads() {
        let (mut game, player, colony) = setup();
        let docks = game.rules.building_type_by_key("docks").expect("docks");
        let stockade = game.rules.building_type_by_key("stockade").expect("stockade");
        let armory = game.rules.building_type_by_key("armory").expect("armory");
        game.colony_mut(&colony).expect("colony").build_queue.set_items(vec![
            Buildable::Building(docks),
            Buildable::Building(stockade),
            Buildable::Building(armory),
        ]);
        let mut cs = ChangeSet::new();
        let next = next_buildable(&mut game, &colony, QueueKind::Build, &mut cs);
        assert_eq!(next, Some(Buildable::Building(armory)));
        assert_eq!(cs.messages_for(&player).count(), 2);
        assert_eq!(game.colony(&colony).expect("colony").build_queue.len(), 1);
    }

    #[test]
    fn test_upgrade_ejects_misfits() {
        let (mut game, player, colony) = setup();
        let schoolhouse = game.rules.building_type_by_key("schoolhouse").expect("school");
        let college = game.rules.building_type_by_key("college").expect("college");
        let farmer = game.rules.unit_type_by_key("expert_farmer").expect("farmer");
        let school = game.add_building(&colony, schoolhouse).expect("school");
        let teacher = game
            .create_unit(&player, farmer, UnitLocation::Building(school.clone()))
            .expect("teacher");
        let mut cs = ChangeSet::new();
        // College still takes skill 1 experts; nobody leaves
        assert!(!build_building(&mut game, &colony, college, &mut cs).expect("upgrade"));
        assert_eq!(game.building(&school).expect("school").building_type, college);
        assert_eq!(game.unit(&teacher).expect("teacher").location, UnitLocation::Building(school));
    }
}
