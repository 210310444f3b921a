//! Settlement turn processing
//!
//! `process_colony` resolves one turn for one colony in a fixed stage
//! order; `run_turn` drives every live colonial player and then the
//! game-wide bookkeeping.

pub mod build;
pub mod liberty;
pub mod production;
pub mod storage;
pub mod workers;

pub use build::{check_stalled_queues, next_buildable, no_build_reason, NoBuildReason};
pub use liberty::Government;
pub use production::{colony_production, Completion, ProductionReport, QueueKind, QueueStatus, WorkSite};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::error::Result;
use crate::diplomacy;
use crate::game::Game;
use crate::model::{MessageType, ModelMessage};
use crate::registry::ObjectId;
use crate::rules::Buildable;
use crate::sync::{ChangeSet, See};
use crate::visibility;

/// How a colony left its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    /// Had no population at the start of the turn and was removed
    DisposedEmpty,
    /// Ran out of food with a single colonist and was removed
    Starved,
}

// ============================================================================
// COLONY TURN
// ============================================================================

/// Resolve one turn for one colony
///
/// Stage failures that are part of normal play (empty queues, missing
/// input, nothing to export) become messages for the owner. Only the two
/// disposal cases end processing early.
pub fn process_colony(game: &mut Game, colony_id: &ObjectId, cs: &mut ChangeSet) -> Result<TurnOutcome> {
    let (owner, name, tile) = {
        let c = game.colony(colony_id)?;
        (c.owner.clone(), c.name.clone(), c.tile)
    };
    if game.colony_unit_count(colony_id) == 0 {
        tracing::info!("{} has no colonists, disposing", name);
        game.dispose_colony(colony_id, cs)?;
        return Ok(TurnOutcome::DisposedEmpty);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(game.rng.gen());
    game.colony_mut(colony_id)?.goods.save_state();

    // Queue heads must be buildable before production charges them
    for kind in [QueueKind::Build, QueueKind::Population] {
        build::next_buildable(game, colony_id, kind, cs);
    }
    let report = {
        let c = game.colony(colony_id)?;
        colony_production(game, c)
    };

    workers::gain_experience(game, &report, &mut rng, cs)?;

    // === CONSTRUCTION ===
    let mut built = Vec::new();
    let mut unit_born = false;
    let mut tile_dirty = false;
    for status in report.queues.iter().filter(|q| q.is_ready()) {
        match status.current {
            Buildable::Unit(unit_type) => {
                unit_born |= build::build_unit(game, colony_id, unit_type, cs)?;
            }
            Buildable::Building(building_type) => {
                tile_dirty |= build::build_building(game, colony_id, building_type, cs)?;
            }
        }
        built.push(status.kind);
    }

    // === NET PRODUCTION ===
    let food = game.rules.primary_food();
    let mut starving = false;
    {
        let rules = std::sync::Arc::clone(&game.rules);
        let colony = game.colony_mut(colony_id)?;
        for (goods, net) in report.net_changes() {
            let gt = rules.goods(goods);
            if gt.liberty || gt.immigration {
                continue;
            }
            let negative = colony.goods.apply_net(goods, net);
            if negative && goods == food {
                starving = true;
            }
        }
    }

    if starving {
        let units = game.colony_units(colony_id);
        if units.len() > 1 {
            let victim = units[rng.gen_range(0..units.len())].clone();
            let unit = game.dispose_unit(&victim, "starved")?;
            let type_name = game.rules.unit_type(unit.unit_type).name.clone();
            tracing::info!("{} colonist starved in {}", type_name, name);
            cs.add_remove(See::only(&owner), victim.clone(), None);
            cs.add_message(
                &owner,
                ModelMessage::new(MessageType::UnitLost, "model.colony.colonistStarved", colony_id)
                    .with("colony", &name)
                    .with("unit", unit.display_name(&type_name)),
            );
        } else {
            tracing::info!("{} starved", name);
            cs.add_message(
                &owner,
                ModelMessage::new(MessageType::UnitLost, "model.colony.colonyStarved", colony_id)
                    .with("colony", &name),
            );
            game.dispose_colony(colony_id, cs)?;
            return Ok(TurnOutcome::Starved);
        }
    } else {
        let net = report.net(food);
        let stored = game.colony(colony_id)?.goods.amount(food) as i32;
        if net < 0 && !unit_born {
            let turns = stored / -net;
            if turns <= game.config.famine_turns as i32 {
                tracing::warn!("famine feared in {} within {} turns", name, turns);
                cs.add_message(
                    &owner,
                    ModelMessage::new(MessageType::Warning, "model.colony.famineFeared", colony_id)
                        .with("colony", &name)
                        .with("number", turns),
                );
            }
        }
    }

    // Only a colony that survived its turn credits its owner
    liberty::accrue_progress(game, colony_id, &report)?;

    // === QUEUE BOOKKEEPING ===
    build::check_stalled_queues(game, colony_id, &report, cs);
    for kind in &built {
        build::complete_queue(game, colony_id, *kind, &mut rng)?;
        build::next_buildable(game, colony_id, *kind, cs);
        tile_dirty = true;
    }

    storage::export_goods(game, colony_id, cs)?;
    storage::check_warehouse(game, colony_id, &report, unit_born, cs)?;
    if storage::add_automatic_buildings(game, colony_id)? > 0 {
        tile_dirty = true;
    }
    storage::check_not_building(game, colony_id, &report, cs);

    liberty::update_sons_of_liberty(game, colony_id, cs)?;
    workers::check_teaching(game, colony_id, cs)?;

    match game.map.tile(tile) {
        Some(t) if tile_dirty => cs.add(See::perhaps(), t.id.clone()),
        _ => cs.add(See::only(&owner), colony_id.clone()),
    }
    workers::check_missing_input(game, colony_id, &report, cs);
    Ok(TurnOutcome::Completed)
}

// ============================================================================
// GAME TURN
// ============================================================================

/// Advance the whole game by one turn
///
/// Colonies are processed player by player in roster order. A colony that
/// fails is logged and skipped; the rest of the turn still runs.
pub fn run_turn(game: &mut Game) -> ChangeSet {
    let mut cs = ChangeSet::new();
    for player in game.live_player_ids() {
        let settlements = match game.player(&player) {
            Ok(p) if p.is_european() => p.settlements.snapshot(),
            _ => continue,
        };
        for colony in settlements {
            if game.colony(&colony).is_err() {
                continue;
            }
            match process_colony(game, &colony, &mut cs) {
                Ok(TurnOutcome::Completed) => {}
                Ok(outcome) => tracing::debug!("{} ended turn {:?}", colony, outcome),
                Err(e) => tracing::warn!("turn for {} failed: {}", colony, e),
            }
        }
        if let Err(e) = liberty::player_progress(game, &player, &mut cs) {
            tracing::warn!("progress for {} failed: {}", player, e);
        }
    }
    let changed = diplomacy::apply_tension_stances(game, &mut cs);
    if changed > 0 {
        tracing::debug!("{} stance changes from tension", changed);
    }
    visibility::invalidate_all(game);
    game.turn += 1;
    tracing::info!("turn {} complete: {} changes, {} messages", game.turn, cs.changes().len(), cs.messages().len());
    cs
}
