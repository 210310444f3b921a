//! Liberty, government and player-level progress

use crate::core::error::Result;
use crate::game::Game;
use crate::model::{MessageType, ModelMessage, UnitLocation};
use crate::registry::ObjectId;
use crate::sync::{ChangeSet, See};

use super::production::ProductionReport;

/// Government quality derived from rebel share and tory head count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Government {
    VeryBad,
    Bad,
    Normal,
    Good,
    VeryGood,
}

impl Government {
    pub fn production_bonus(self) -> i32 {
        match self {
            Government::VeryBad => -2,
            Government::Bad => -1,
            Government::Normal => 0,
            Government::Good => 1,
            Government::VeryGood => 2,
        }
    }

    fn from_bonus(bonus: i32) -> Self {
        match bonus {
            b if b >= 2 => Government::VeryGood,
            1 => Government::Good,
            0 => Government::Normal,
            -1 => Government::Bad,
            _ => Government::VeryBad,
        }
    }

    pub fn message_key(self) -> &'static str {
        match self {
            Government::VeryBad => "model.colony.veryBadGovernment",
            Government::Bad => "model.colony.badGovernment",
            Government::Normal => "model.colony.normalGovernment",
            Government::Good => "model.colony.goodGovernment",
            Government::VeryGood => "model.colony.veryGoodGovernment",
        }
    }
}

/// Sons of Liberty percentage for a liberty total and population
pub fn sons_of_liberty(liberty: u32, liberty_per_rebel: u32, population: u32) -> u32 {
    if population == 0 {
        return 0;
    }
    let rebels = liberty / liberty_per_rebel.max(1);
    (rebels * 100 / population).min(100)
}

/// Colonists not counted as rebels
pub fn tories(sol: u32, population: u32) -> u32 {
    population - (population * sol + 50) / 100
}

pub fn government(game: &Game, sol: u32, tories: u32) -> Government {
    let c = &game.config;
    if sol >= c.very_good_government_limit {
        Government::VeryGood
    } else if sol >= c.good_government_limit {
        Government::Good
    } else if tories > c.very_bad_government_limit {
        Government::VeryBad
    } else if tories > c.bad_government_limit {
        Government::Bad
    } else {
        Government::Normal
    }
}

/// Move this turn's liberty and immigration output to their accumulators
///
/// These goods are never stored; bells count for the colony and its owner,
/// crosses only for the owner.
pub fn accrue_progress(game: &mut Game, colony_id: &ObjectId, report: &ProductionReport) -> Result<()> {
    let (mut liberty, mut immigration) = (0u32, 0u32);
    for goods in game.rules.all_goods() {
        let net = report.net(goods.id).max(0) as u32;
        if goods.liberty {
            liberty += net;
        } else if goods.immigration {
            immigration += net;
        }
    }
    if liberty == 0 && immigration == 0 {
        return Ok(());
    }
    let owner = {
        let colony = game.colony_mut(colony_id)?;
        colony.liberty += liberty;
        colony.owner.clone()
    };
    let player = game.player_mut(&owner)?;
    player.liberty += liberty;
    player.immigration += immigration;
    Ok(())
}

/// Recompute the loyalty percentage and the production bonus it implies
///
/// Crossing a ten-percent bracket raises a message, and so does any change
/// in the resulting government.
pub fn update_sons_of_liberty(game: &mut Game, colony_id: &ObjectId, cs: &mut ChangeSet) -> Result<Government> {
    let population = game.colony_unit_count(colony_id) as u32;
    let per_rebel = game.config.liberty_per_rebel;
    let (old_sol, old_bonus, liberty) = {
        let c = game.colony(colony_id)?;
        (c.sons_of_liberty, c.production_bonus, c.liberty)
    };
    let sol = sons_of_liberty(liberty, per_rebel, population);
    let gov = government(game, sol, tories(sol, population));

    let colony = game.colony_mut(colony_id)?;
    colony.old_sons_of_liberty = old_sol;
    colony.sons_of_liberty = sol;
    colony.production_bonus = gov.production_bonus();
    let (owner, name) = (colony.owner.clone(), colony.name.clone());

    if sol / 10 != old_sol / 10 {
        let key = if sol > old_sol {
            "model.colony.soLIncrease"
        } else {
            "model.colony.soLDecrease"
        };
        cs.add_message(
            &owner,
            ModelMessage::new(MessageType::SonsOfLiberty, key, colony_id)
                .with("oldSoL", old_sol)
                .with("newSoL", sol)
                .with("colony", &name),
        );
    }
    if gov != Government::from_bonus(old_bonus) {
        tracing::debug!("{} government now {:?} (SoL {}%)", name, gov, sol);
        cs.add_message(
            &owner,
            ModelMessage::new(MessageType::Government, gov.message_key(), colony_id)
                .with("colony", &name)
                .with("sol", sol),
        );
    }
    Ok(gov)
}

/// Emigration and founding fathers for one player
///
/// At most one recruit and one father per turn.
pub fn player_progress(game: &mut Game, player_id: &ObjectId, cs: &mut ChangeSet) -> Result<()> {
    let tunables = game.rules.tunables.clone();
    let (recruit, father) = {
        let p = game.player(player_id)?;
        if !p.is_european() || p.dead {
            return Ok(());
        }
        let recruit = p.immigration_required > 0 && p.immigration >= p.immigration_required;
        let cost = p.founding_father_cost(tunables.founding_father_factor);
        (recruit, (p.liberty >= cost).then_some(cost))
    };

    if recruit {
        let unit_type = game.rules.default_unit_type();
        let unit = game.create_unit(player_id, unit_type, UnitLocation::Europe)?;
        let p = game.player_mut(player_id)?;
        p.immigration -= p.immigration_required;
        p.immigration_required += tunables.immigration_increment;
        tracing::info!("{} recruits a colonist in Europe", p.name);
        cs.add_message(
            player_id,
            ModelMessage::new(MessageType::UnitAdded, "model.europe.recruit", &unit)
                .with("unit", &game.rules.unit_type(unit_type).name),
        );
        cs.add(See::only(player_id), unit);
    }
    if let Some(cost) = father {
        let p = game.player_mut(player_id)?;
        p.liberty -= cost;
        p.father_count += 1;
        tracing::info!("{} gains founding father #{}", p.name, p.father_count);
        let count = p.father_count;
        cs.add_message(
            player_id,
            ModelMessage::new(MessageType::Default, "model.player.foundingFatherJoined", player_id)
                .with("count", count),
        );
    }
    cs.add_partial(
        See::only(player_id),
        player_id.clone(),
        &["immigration", "immigration_required", "liberty", "father_count"],
    );
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
        let mut game = Game::new(rules, SimulationConfig::default(), 8, 8, plains, 3).expect("game");
        let player = game.add_player("Dutch", PlayerType::Colonial).expect("player");
        let colony = game.found_colony(&player, TileCoord::new(3, 3), None).expect("colony");
        (game, player, colony)
    }

    #[test]
    fn test_sol_arithmetic() {
        assert_eq!(sons_of_liberty(0, 200, 4), 0);
        assert_eq!(sons_of_liberty(400, 200, 4), 50);
        assert_eq!(sons_of_liberty(10_000, 200, 4), 100);
        assert_eq!(sons_of_liberty(10_000, 200, 0), 0);
        assert_eq!(tories(50, 4), 2);
        assert_eq!(tories(0, 9), 9);
    }

    #[test]
    fn test_bracket_and_government_messages() {
        let (mut game, player, colony) = setup();
        for x in [2, 4] {
            game.create_unit(
                &player,
                game.rules.default_unit_type(),
                UnitLocation::WorkTile {
                    colony: colony.clone(),
                    tile: TileCoord::new(x, 2),
                },
            )
            .expect("worker");
        }
        game.colony_mut(&colony).expect("colony").liberty = 400;
        let mut cs = ChangeSet::new();
        let gov = update_sons_of_liberty(&mut game, &colony, &mut cs).expect("sol");
        assert_eq!(gov, Government::VeryGood);
        let c = game.colony(&colony).expect("colony");
        assert_eq!(c.sons_of_liberty, 100);
        assert_eq!(c.production_bonus, 2);
        let keys: Vec<_> = cs.messages().iter().map(|(_, m)| m.key.as_str()).collect();
        assert_eq!(keys, vec!["model.colony.soLIncrease", "model.colony.veryGoodGovernment"]);

        let mut quiet = ChangeSet::new();
        update_sons_of_liberty(&mut game, &colony, &mut quiet).expect("sol");
        assert!(quiet.messages().is_empty());
    }

    #[test]
    fn test_recruit_and_father() {
        let (mut game, player, _) = setup();
        {
            let p = game.player_mut(&player).expect("player");
            p.immigration = 20;
            p.liberty = 60;
        }
        let mut cs = ChangeSet::new();
        player_progress(&mut game, &player, &mut cs).expect("progress");
        let p = game.player(&player).expect("player");
        assert_eq!(p.immigration, 5);
        assert_eq!(p.immigration_required, 35);
        assert_eq!(p.liberty, 10);
        assert_eq!(p.father_count, 1);
        let in_europe = game
            .entities
            .units
            .iter()
            .filter(|(_, u)| u.location == UnitLocation::Europe)
            .count();
        assert_eq!(in_europe, 1);
    }
}
