//! Stored goods after production: customs sales, warehouse limits, idle queues

use std::sync::Arc;

use crate::core::error::Result;
use crate::game::Game;
use crate::model::{MessageType, ModelMessage};
use crate::registry::ObjectId;
use crate::rules::Ability;
use crate::sync::{ChangeSet, See};

use super::production::ProductionReport;

/// Sell everything flagged for export above its kept-back level
///
/// Only colonies with a custom house export. Returns the gold earned.
pub fn export_goods(game: &mut Game, colony_id: &ObjectId, cs: &mut ChangeSet) -> Result<i64> {
    let rules = Arc::clone(&game.rules);
    let (owner, name, sales) = {
        let colony = game.colony(colony_id)?;
        if !game.colony_has_ability(colony, Ability::Export) {
            return Ok(0);
        }
        let player = game.player(&colony.owner)?;
        let sales: Vec<_> = colony
            .goods
            .iter()
            .filter(|(g, _)| rules.goods(*g).storable)
            .filter_map(|(g, amount)| {
                let data = colony.export_data(g);
                let excess = amount.saturating_sub(data.export_level);
                (data.exported && excess > 0 && player.can_trade(g)).then_some((g, excess))
            })
            .collect();
        (colony.owner.clone(), colony.name.clone(), sales)
    };
    if sales.is_empty() {
        return Ok(0);
    }

    let mut total = 0;
    let mut data = Vec::with_capacity(sales.len());
    for (goods, amount) in sales {
        game.colony_mut(colony_id)?.goods.remove(goods, amount);
        let player = game.player_mut(&owner)?;
        let tax = player.tax;
        let gold = player.market.sell(&rules, goods, amount, tax);
        player.gold += gold;
        total += gold;
        data.push(format!("{} {} ({} gold)", amount, rules.goods(goods).name, gold));
    }
    tracing::debug!("{} exported {}", name, data.join(", "));
    cs.add_message(
        &owner,
        ModelMessage::new(MessageType::GoodsMovement, "model.colony.customs.sale", colony_id)
            .with("colony", &name)
            .with("data", data.join(", ")),
    );
    cs.add_partial(See::only(&owner), owner.clone(), &["gold"]);
    Ok(total)
}

/// Enforce warehouse capacity and report crossed watermarks
///
/// Goods above capacity are discarded. Low and high watermarks scale with
/// the capacity in cargo-sized steps.
pub fn check_warehouse(
    game: &mut Game,
    colony_id: &ObjectId,
    report: &ProductionReport,
    unit_born: bool,
    cs: &mut ChangeSet,
) -> Result<u32> {
    let rules = Arc::clone(&game.rules);
    let food = rules.primary_food();
    let cargo = game.config.cargo_size.max(1);
    let (owner, name, limit, exporting, stock) = {
        let colony = game.colony(colony_id)?;
        let can_export = game.colony_has_ability(colony, Ability::Export);
        let player = game.player(&colony.owner)?;
        let stock: Vec<_> = colony
            .goods
            .iter()
            .filter(|(g, _)| rules.goods(*g).storable)
            .map(|(g, amount)| (g, amount, colony.goods.old_amount(g), colony.export_data(g)))
            .collect();
        let exporting: Vec<_> = stock
            .iter()
            .filter(|(g, _, _, data)| can_export && data.exported && player.can_trade(*g))
            .map(|(g, ..)| *g)
            .collect();
        (
            colony.owner.clone(),
            colony.name.clone(),
            game.warehouse_capacity(colony),
            exporting,
            stock,
        )
    };
    let adjustment = limit / cargo;

    let mut wasted = 0;
    for (goods, amount, old, data) in stock {
        let goods_name = &rules.goods(goods).name;
        let low = data.low_level * adjustment;
        let high = data.high_level * adjustment;
        if amount < low && old >= low && !(goods == food && unit_born) {
            cs.add_message(
                &owner,
                ModelMessage::new(MessageType::WarehouseCapacity, "model.colony.warehouseEmpty", colony_id)
                    .with("goods", goods_name)
                    .with("level", low)
                    .with("colony", &name),
            );
            continue;
        }
        if rules.goods(goods).limit_ignored {
            continue;
        }

        let mut amount = amount;
        let mut waste = 0;
        let key = if amount > limit {
            waste = amount - limit;
            game.colony_mut(colony_id)?.goods.remove(goods, waste);
            amount = limit;
            wasted += waste;
            Some("model.colony.warehouseWaste")
        } else if amount == limit && old < limit {
            Some("model.colony.warehouseOverfull")
        } else if amount > high && old <= high {
            Some("model.colony.warehouseFull")
        } else {
            None
        };
        if let Some(key) = key {
            cs.add_message(
                &owner,
                ModelMessage::new(MessageType::WarehouseCapacity, key, colony_id)
                    .with("goods", goods_name)
                    .with("waste", waste)
                    .with("level", high)
                    .with("colony", &name),
            );
        }

        if !exporting.contains(&goods) {
            let loss = amount as i64 + report.net(goods) as i64 - limit as i64;
            if loss > 0 {
                cs.add_message(
                    &owner,
                    ModelMessage::new(MessageType::WarehouseCapacity, "model.colony.warehouseSoonFull", colony_id)
                        .with("goods", goods_name)
                        .with("colony", &name)
                        .with("amount", loss),
                );
            }
        }
    }
    if wasted > 0 {
        tracing::debug!("{} wasted {} goods over capacity {}", name, wasted, limit);
    }
    Ok(wasted)
}

/// Warn when a queue is empty while a finished building material is produced
///
/// Raw materials feeding other production are exempt, so tools are quiet
/// but hammers are not.
pub fn check_not_building(game: &Game, colony_id: &ObjectId, report: &ProductionReport, cs: &mut ChangeSet) -> bool {
    let Ok(colony) = game.colony(colony_id) else { return false };
    let rules = &game.rules;
    let idle_queue = colony.build_queue.is_empty() || colony.population_queue.is_empty();
    let wasted = rules.all_goods().iter().any(|g| {
        g.building_material
            && !rules.is_raw_material(g.id)
            && !g.breedable
            && report.net(g.id) > 0
            && rules.is_needed_for_building(g.id)
    });
    if idle_queue && wasted {
        cs.add_message(
            &colony.owner,
            ModelMessage::new(MessageType::BuildingCompleted, "model.colony.notBuildingAnything", colony_id)
                .with("colony", &colony.name),
        );
        return true;
    }
    false
}

/// Re-add any building every colony is entitled to
pub fn add_automatic_buildings(game: &mut Game, colony_id: &ObjectId) -> Result<usize> {
    let missing: Vec<_> = {
        let colony = game.colony(colony_id)?;
        game.rules
            .automatic_buildings()
            .filter(|bt| game.colony_building_of_root(colony, game.rules.building_root(bt.id)).is_none())
            .map(|bt| bt.id)
            .collect()
    };
    for building_type in &missing {
        game.add_building(colony_id, *building_type)?;
    }
    Ok(missing.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TileCoord;
    use crate::core::SimulationConfig;
    use crate::model::{ExportData, PlayerType};
    use crate::rules::RuleTable;

    fn setup() -> (Game, ObjectId, ObjectId) {
        let rules = Arc::new(RuleTable::classic());
        let plains = rules.tile_type_by_key("plains").expect("plains");
        let mut game = Game::new(rules, SimulationConfig::default(), 8, 8, plains, 11).expect("game");
        let player = game.add_player("Dutch", PlayerType::Colonial).expect("player");
        let colony = game.found_colony(&player, TileCoord::new(3, 3), None).expect("colony");
        (game, player, colony)
    }

    fn keys(cs: &ChangeSet) -> Vec<&str> {
        cs.messages().iter().map(|(_, m)| m.key.as_str()).collect()
    }

    #[test]
    fn test_waste_above_capacity() {
        let (mut game, _, colony) = setup();
        let ore = game.rules.goods_by_key("ore").expect("ore");
        game.colony_mut(&colony).expect("colony").goods.add(ore, 130);
        let mut cs = ChangeSet::new();
        let wasted = check_warehouse(&mut game, &colony, &ProductionReport::default(), false, &mut cs).expect("check");
        assert_eq!(wasted, 30);
        assert_eq!(game.colony(&colony).expect("colony").goods.amount(ore), 100);
        assert_eq!(keys(&cs), vec!["model.colony.warehouseWaste"]);
    }

    #[test]
    fn test_exact_capacity_and_high_watermark() {
        let (mut game, _, colony) = setup();
        let ore = game.rules.goods_by_key("ore").expect("ore");
        let furs = game.rules.goods_by_key("furs").expect("furs");
        {
            let c = game.colony_mut(&colony).expect("colony");
            c.goods.add(ore, 50);
            c.goods.add(furs, 80);
            c.goods.save_state();
            c.goods.add(ore, 50);
            c.goods.add(furs, 15);
        }
        let mut cs = ChangeSet::new();
        check_warehouse(&mut game, &colony, &ProductionReport::default(), false, &mut cs).expect("check");
        assert_eq!(
            keys(&cs),
            vec!["model.colony.warehouseFull", "model.colony.warehouseOverfull"]
        );
    }

    #[test]
    fn test_export_sells_excess() {
        let (mut game, player, colony) = setup();
        let custom_house = game.rules.building_type_by_key("custom_house").expect("custom house");
        let furs = game.rules.goods_by_key("furs").expect("furs");
        game.add_building(&colony, custom_house).expect("building");
        {
            let c = game.colony_mut(&colony).expect("colony");
            c.goods.add(furs, 70);
            c.set_export_data(
                furs,
                ExportData {
                    exported: true,
                    export_level: 20,
                    ..ExportData::default()
                },
            );
        }
        let mut cs = ChangeSet::new();
        let gold = export_goods(&mut game, &colony, &mut cs).expect("export");
        assert_eq!(gold, 200);
        assert_eq!(game.player(&player).expect("player").gold, 200);
        assert_eq!(game.colony(&colony).expect("colony").goods.amount(furs), 20);
        assert_eq!(keys(&cs), vec!["model.colony.customs.sale"]);
    }

    #[test]
    fn test_no_export_without_custom_house() {
        let (mut game, _, colony) = setup();
        let furs = game.rules.goods_by_key("furs").expect("furs");
        {
            let c = game.colony_mut(&colony).expect("colony");
            c.goods.add(furs, 70);
            c.set_export_data(furs, ExportData { exported: true, ..ExportData::default() });
        }
        let mut cs = ChangeSet::new();
        assert_eq!(export_goods(&mut game, &colony, &mut cs).expect("export"), 0);
        assert!(cs.messages().is_empty());
    }
}
