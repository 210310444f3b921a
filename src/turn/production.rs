//! Per-turn production of one colony
//!
//! Pure: reads the game and reports what every work location would make,
//! what the build queues would consume and what is left as net change.

use std::collections::BTreeMap;

use crate::core::types::TileCoord;
use crate::game::Game;
use crate::model::Colony;
use crate::registry::ObjectId;
use crate::rules::{Buildable, GoodsTypeId, RuleTable};

/// Where production happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkSite {
    /// The colony's own tile, worked without a colonist
    Center(TileCoord),
    Tile(TileCoord),
    Building(ObjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteOutput {
    pub site: WorkSite,
    pub units: Vec<ObjectId>,
    pub produced: Vec<(GoodsTypeId, u32)>,
    pub consumed: Vec<(GoodsTypeId, u32)>,
    /// Input goods and how much more would have been used
    pub shortfall: Option<(GoodsTypeId, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Build,
    Population,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Fully funded this turn
    Ready,
    Turns(u32),
    /// Some required goods is not being produced
    Never,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueStatus {
    pub kind: QueueKind,
    pub current: Buildable,
    pub completion: Completion,
    /// First required goods still short, with the amount missing
    pub missing: Option<(GoodsTypeId, u32)>,
}

impl QueueStatus {
    pub fn is_ready(&self) -> bool {
        self.completion == Completion::Ready
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionReport {
    pub sites: Vec<SiteOutput>,
    pub queues: Vec<QueueStatus>,
    net: BTreeMap<GoodsTypeId, i32>,
}

impl ProductionReport {
    /// Net change of one goods type this turn
    pub fn net(&self, goods: GoodsTypeId) -> i32 {
        self.net.get(&goods).copied().unwrap_or(0)
    }

    /// Every goods type with a non-zero net change, in goods order
    pub fn net_changes(&self) -> impl Iterator<Item = (GoodsTypeId, i32)> + '_ {
        self.net.iter().filter(|(_, n)| **n != 0).map(|(g, n)| (*g, *n))
    }

    pub fn queue(&self, kind: QueueKind) -> Option<&QueueStatus> {
        self.queues.iter().find(|q| q.kind == kind)
    }

    /// Total produced of `goods` before any consumption
    pub fn produced(&self, goods: GoodsTypeId) -> u32 {
        self.sites
            .iter()
            .flat_map(|s| s.produced.iter())
            .filter(|(g, _)| *g == goods)
            .map(|(_, n)| *n)
            .sum()
    }

    fn add(&mut self, goods: GoodsTypeId, delta: i32) {
        *self.net.entry(goods).or_insert(0) += delta;
    }
}

/// Manufacturing steps between a goods type and its raw material
fn depth(rules: &RuleTable, goods: GoodsTypeId) -> u32 {
    let mut steps = 0;
    let mut current = goods;
    while let Some(from) = rules.goods(current).made_from {
        steps += 1;
        current = from;
        if steps > 16 {
            break;
        }
    }
    steps
}

fn with_bonus(base: u32, bonus: i32) -> u32 {
    if base == 0 {
        0
    } else {
        (base as i32 + bonus).max(0) as u32
    }
}

/// Compute the colony's production for this turn
///
/// Order: the center tile, worked tiles, buildings (raw processing
/// before finishing), colonist food, breeding, then build queues in
/// build-then-population order. A queue is ready when stock plus net
/// production covers every required goods; a ready queue's requirements
/// are charged to net.
pub fn colony_production(game: &Game, colony: &Colony) -> ProductionReport {
    let rules = &game.rules;
    let bonus = colony.production_bonus;
    let food = rules.primary_food();
    let mut report = ProductionReport::default();

    if let Some(center) = game.map.tile(colony.tile) {
        let produced: Vec<(GoodsTypeId, u32)> = rules
            .tile_type(center.tile_type)
            .center_production
            .iter()
            .map(|(g, n)| (*g, with_bonus(*n, bonus)))
            .filter(|(_, n)| *n > 0)
            .collect();
        for (g, n) in &produced {
            report.add(*g, *n as i32);
        }
        report.sites.push(SiteOutput {
            site: WorkSite::Center(colony.tile),
            units: Vec::new(),
            produced,
            consumed: Vec::new(),
            shortfall: None,
        });
    }

    for work_tile in &colony.work_tiles {
        let Some(unit_id) = &work_tile.unit else { continue };
        let Ok(unit) = game.unit(unit_id) else { continue };
        let Some(tile) = game.map.tile(work_tile.coord) else { continue };
        if tile.owning_settlement.as_ref().is_some_and(|s| *s != colony.id) {
            continue;
        }
        let goods = unit.work_type.unwrap_or(food);
        let mut base = rules.tile_type(tile.tile_type).potential(goods);
        if rules.unit_type(unit.unit_type).is_expert_for(goods) {
            base *= 2;
        }
        let amount = with_bonus(base, bonus);
        report.add(goods, amount as i32);
        report.sites.push(SiteOutput {
            site: WorkSite::Tile(work_tile.coord),
            units: vec![unit_id.clone()],
            produced: vec![(goods, amount)],
            consumed: Vec::new(),
            shortfall: None,
        });
    }

    let mut buildings: Vec<_> = game
        .colony_buildings(colony)
        .filter(|b| !b.units.is_empty())
        .filter_map(|b| {
            let output = rules.building_type(b.building_type).output?;
            Some((depth(rules, output), b))
        })
        .collect();
    buildings.sort_by_key(|(d, b)| (*d, b.building_type));

    for (_, building) in buildings {
        let bt = rules.building_type(building.building_type);
        let Some(output) = bt.output else { continue };
        let potential: u32 = building
            .units
            .iter()
            .filter_map(|u| game.unit(u).ok())
            .map(|u| {
                let expert = rules.unit_type(u.unit_type).is_expert_for(output);
                with_bonus(bt.basic_production * if expert { 2 } else { 1 }, bonus)
            })
            .sum();
        let (produced, consumed, shortfall) = match bt.input {
            Some(input) => {
                let available = (colony.goods.amount(input) as i32 + report.net(input)).max(0) as u32;
                let made = potential.min(available);
                let short = (made < potential).then_some((input, potential - made));
                (made, vec![(input, made)], short)
            }
            None => (potential, Vec::new(), None),
        };
        for (g, n) in &consumed {
            report.add(*g, -(*n as i32));
        }
        report.add(output, produced as i32);
        report.sites.push(SiteOutput {
            site: WorkSite::Building(building.id.clone()),
            units: building.units.clone(),
            produced: vec![(output, produced)],
            consumed: consumed.into_iter().filter(|(_, n)| *n > 0).collect(),
            shortfall,
        });
    }

    let eaten: u32 = game
        .colony_units(&colony.id)
        .iter()
        .filter_map(|u| game.unit(u).ok())
        .map(|u| rules.unit_type(u.unit_type).food_consumption)
        .sum();
    report.add(food, -(eaten as i32));

    breed(rules, colony, &mut report);

    let queues = [
        (QueueKind::Build, &colony.build_queue, true),
        (QueueKind::Population, &colony.population_queue, colony.makes_new_colonists),
    ];
    for (kind, queue, active) in queues {
        if !active {
            continue;
        }
        let Some(current) = queue.current() else { continue };
        let status = queue_status(rules, colony, &report, kind, current);
        if status.is_ready() {
            for (g, n) in rules.required_goods(current) {
                report.add(*g, -(*n as i32));
            }
        }
        report.queues.push(status);
    }
    report
}

/// Breedable goods grow from their stock, eating food
fn breed(rules: &RuleTable, colony: &Colony, report: &mut ProductionReport) {
    let food = rules.primary_food();
    for goods in rules.all_goods().iter().filter(|g| g.breedable && g.breeding_number > 0) {
        let stock = colony.goods.amount(goods.id);
        if stock < goods.breeding_number {
            continue;
        }
        let data = colony.breeding_data(goods.id);
        let surplus = report.net(food);
        let usable = if data.consume_only_surplus {
            surplus.max(0)
        } else {
            (colony.goods.amount(food) as i32 + surplus).max(0)
        };
        let allowed = usable as u32 * data.consume_ratio / 100;
        let potential = (stock / goods.breeding_number).max(1);
        let bred = potential.min(allowed);
        if bred > 0 {
            report.add(goods.id, bred as i32);
            report.add(food, -(bred as i32));
        }
    }
}

fn queue_status(
    rules: &RuleTable,
    colony: &Colony,
    report: &ProductionReport,
    kind: QueueKind,
    current: Buildable,
) -> QueueStatus {
    let mut turns = 0;
    let mut never = false;
    let mut missing = None;
    for (g, needed) in rules.required_goods(current) {
        let have = colony.goods.amount(*g) as i32 + report.net(*g);
        let short = *needed as i32 - have;
        if short <= 0 {
            continue;
        }
        if missing.is_none() {
            missing = Some((*g, short as u32));
        }
        let rate = report.net(*g);
        if rate <= 0 {
            never = true;
        } else {
            turns = turns.max((short + rate - 1) / rate);
        }
    }
    let completion = match (missing, never) {
        (None, _) => Completion::Ready,
        (Some(_), true) => Completion::Never,
        (Some(_), false) => Completion::Turns(turns as u32),
    };
    QueueStatus {
        kind,
        current,
        completion,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimulationConfig;
    use crate::model::{PlayerType, UnitLocation};
    use std::sync::Arc;

    fn colony_game() -> (Game, ObjectId, ObjectId) {
        let rules = Arc::new(RuleTable::classic());
        let plains = rules.tile_type_by_key("plains").expect("plains");
        let mut game = Game::new(rules, SimulationConfig::default(), 8, 8, plains, 3).expect("game");
        let player = game.add_player("Dutch", PlayerType::Colonial).expect("player");
        let colony = game.found_colony(&player, TileCoord::new(3, 3), None).expect("colony");
        (game, player, colony)
    }

    #[test]
    fn test_farmer_feeds_itself() {
        let (mut game, player, colony) = colony_game();
        game.create_unit(
            &player,
            game.rules.default_unit_type(),
            UnitLocation::WorkTile {
                colony: colony.clone(),
                tile: TileCoord::new(4, 3),
            },
        )
        .expect("farmer");
        let c = game.colony(&colony).expect("colony");
        let report = colony_production(&game, c);
        let food = game.rules.primary_food();
        // center 5 + plains 5 - one colonist eating 2
        assert_eq!(report.net(food), 8);
        assert_eq!(report.sites.len(), 2);
    }

    #[test]
    fn test_building_limited_by_input() {
        let (mut game, player, colony) = colony_game();
        let lumber = game.rules.goods_by_key("lumber").expect("lumber");
        let hammers = game.rules.goods_by_key("hammers").expect("hammers");
        let house = game.rules.building_type_by_key("carpenter_house").expect("house");
        let building = {
            let c = game.colony(&colony).expect("colony");
            game.colony_building_of_root(c, house).expect("building")
        };
        game.create_unit(&player, game.rules.default_unit_type(), UnitLocation::Building(building.clone()))
            .expect("carpenter");
        game.colony_mut(&colony).expect("colony").goods.add(lumber, 2);

        let c = game.colony(&colony).expect("colony");
        let report = colony_production(&game, c);
        assert_eq!(report.net(hammers), 2);
        assert_eq!(report.net(lumber), -2);
        let site = report
            .sites
            .iter()
            .find(|s| s.site == WorkSite::Building(building.clone()))
            .expect("site");
        assert_eq!(site.shortfall, Some((lumber, 1)));
    }

    #[test]
    fn test_breeding_eats_only_surplus() {
        let (mut game, _, colony) = colony_game();
        let horses = game.rules.goods_by_key("horses").expect("horses");
        let food = game.rules.primary_food();
        game.colony_mut(&colony).expect("colony").goods.add(horses, 10);
        let c = game.colony(&colony).expect("colony");
        let report = colony_production(&game, c);
        // surplus 5, half of it usable, stock allows 5
        assert_eq!(report.net(horses), 2);
        assert_eq!(report.net(food), 3);
    }

    #[test]
    fn test_queue_completion_estimates() {
        let (mut game, _, colony) = colony_game();
        let food = game.rules.primary_food();
        {
            let c = game.colony_mut(&colony).expect("colony");
            c.goods.add(food, 190);
        }
        let c = game.colony(&colony).expect("colony");
        let report = colony_production(&game, c);
        let status = report.queue(QueueKind::Population).expect("population");
        assert_eq!(status.completion, Completion::Turns(1));
        assert_eq!(status.missing, Some((food, 5)));

        game.colony_mut(&colony).expect("colony").goods.add(food, 10);
        let c = game.colony(&colony).expect("colony");
        let report = colony_production(&game, c);
        assert!(report.queue(QueueKind::Population).expect("population").is_ready());
        assert_eq!(report.net(food), 5 - 200);
    }
}
