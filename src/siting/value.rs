//! Colony site scoring
//!
//! A site's value is the product of independent multiplicative factors,
//! one per category plus one per key goods. Disqualified sites carry a
//! negative sentinel in the override slot instead.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::core::types::TileCoord;
use crate::game::Game;
use crate::model::Player;
use crate::registry::ObjectId;
use crate::rules::GoodsTypeId;

use super::claim::{claim_to_found_reason, land_price, NoClaimReason};

/// Settlements wanted before taking risks
const LOW_SETTLEMENT_NUMBER: usize = 3;
/// Water steps to the high seas considered a long trip
const LONG_PATH_TILES: u32 = 12;

const MOD_HAS_RESOURCE: f64 = 0.75;
const MOD_FOOD_LOW: f64 = 0.75;
const MOD_STEAL: f64 = 0.5;
const MOD_INLAND: f64 = 0.5;

const MOD_OWNED_EUROPEAN: f64 = 0.67;
const MOD_OWNED_NATIVE: f64 = 0.8;

const MOD_HIGH_PRODUCTION: f64 = 1.2;
const MOD_GOOD_PRODUCTION: f64 = 1.1;

/// Indexed by distance from the site
const DISTANCE_MAX: u32 = 5;
const MOD_OWN_COLONY: [f64; 5] = [0.0, 0.0, 0.5, 1.50, 1.25];
const MOD_ENEMY_COLONY: [f64; 5] = [0.0, 0.0, 0.4, 0.50, 0.70];
const MOD_NEUTRAL_COLONY: [f64; 5] = [0.0, 0.0, 0.7, 0.80, 1.00];
const MOD_ENEMY_UNIT: [f64; 5] = [0.4, 0.5, 0.6, 0.75, 0.90];

const GOOD_PRODUCTION: u32 = 4;
const HIGH_PRODUCTION: u32 = 8;
const FOOD_LOW: u32 = 4;
const FOOD_VERY_LOW: u32 = 1;

/// Reasons a site is not worth considering at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoValueType {
    Bogus,
    Terrain,
    Rumour,
    Settled,
    Food,
    Inland,
    Polar,
}

impl NoValueType {
    pub fn value(self) -> i32 {
        match self {
            NoValueType::Bogus => -1,
            NoValueType::Terrain => -2,
            NoValueType::Rumour => -3,
            NoValueType::Settled => -4,
            NoValueType::Food => -5,
            NoValueType::Inland => -6,
            NoValueType::Polar => -7,
        }
    }

    pub fn from_value(value: i32) -> Self {
        match value {
            -2 => NoValueType::Terrain,
            -3 => NoValueType::Rumour,
            -4 => NoValueType::Settled,
            -5 => NoValueType::Food,
            -6 => NoValueType::Inland,
            -7 => NoValueType::Polar,
            _ => NoValueType::Bogus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColonyValueCategory {
    /// Holds a disqualifying sentinel, otherwise 1
    Override,
    /// General production level
    Production,
    /// Something odd about the tile itself
    Tile,
    /// Trip to the high seas
    Europe,
    /// Building over a resource
    Resource,
    /// Adjacent foreign land and hostile units
    Adjacent,
    Food,
    /// Distinct high-yield goods nearby
    Level,
    /// Settlements and hostile units within a few tiles
    Nearby,
}

impl ColonyValueCategory {
    pub const ALL: [ColonyValueCategory; 9] = [
        ColonyValueCategory::Override,
        ColonyValueCategory::Production,
        ColonyValueCategory::Tile,
        ColonyValueCategory::Europe,
        ColonyValueCategory::Resource,
        ColonyValueCategory::Adjacent,
        ColonyValueCategory::Food,
        ColonyValueCategory::Level,
        ColonyValueCategory::Nearby,
    ];
}

/// Per-category factors for one candidate site
#[derive(Debug, Clone, PartialEq)]
pub struct ColonyValue {
    categories: [f64; 9],
    /// Shortfall factor for each goods with a low-production threshold
    key_goods: Vec<(GoodsTypeId, f64)>,
}

impl Default for ColonyValue {
    fn default() -> Self {
        Self {
            categories: [1.0; 9],
            key_goods: Vec::new(),
        }
    }
}

impl ColonyValue {
    fn rejected(reason: NoValueType) -> Self {
        let mut value = Self::default();
        value.set(ColonyValueCategory::Override, reason.value() as f64);
        value
    }

    pub fn get(&self, category: ColonyValueCategory) -> f64 {
        self.categories[category as usize]
    }

    fn set(&mut self, category: ColonyValueCategory, value: f64) {
        self.categories[category as usize] = value;
    }

    fn add(&mut self, category: ColonyValueCategory, amount: f64) {
        self.categories[category as usize] += amount;
    }

    fn scale(&mut self, category: ColonyValueCategory, factor: f64) {
        self.categories[category as usize] *= factor;
    }

    pub fn key_goods(&self) -> &[(GoodsTypeId, f64)] {
        &self.key_goods
    }

    /// Why the site was disqualified, if it was
    pub fn rejection(&self) -> Option<NoValueType> {
        let v = self.get(ColonyValueCategory::Override);
        (v < 0.0).then(|| NoValueType::from_value(v.round() as i32))
    }

    /// The rounded product of every factor, or the rejection sentinel
    pub fn total(&self) -> i32 {
        if let Some(reason) = self.rejection() {
            return reason.value();
        }
        let product: f64 = self
            .categories
            .iter()
            .chain(self.key_goods.iter().map(|(_, f)| f))
            .product();
        product.round() as i32
    }
}

/// Every factor behind the value of founding a colony at `coord`
pub fn colony_values(game: &Game, player: &Player, coord: TileCoord) -> ColonyValue {
    let mut values = ColonyValue::default();
    let Some(tile) = game.map.tile(coord) else {
        return ColonyValue::rejected(NoValueType::Terrain);
    };
    let rules = &game.rules;
    let tile_type = rules.tile_type(tile.tile_type);
    let settlements = player.settlements.snapshot();
    let development = settlements.len().min(LOW_SETTLEMENT_NUMBER) as f64 / LOW_SETTLEMENT_NUMBER as f64;
    let port_count = settlements
        .iter()
        .filter_map(|s| game.colony(s).ok())
        .filter(|c| game.is_connected_port(c))
        .count();

    if tile_type.polar && settlements.len() < LOW_SETTLEMENT_NUMBER {
        return ColonyValue::rejected(NoValueType::Polar);
    }

    match claim_to_found_reason(game, player, coord) {
        NoClaimReason::None => {}
        NoClaimReason::Terrain | NoClaimReason::Water => return ColonyValue::rejected(NoValueType::Terrain),
        NoClaimReason::Rumour => {
            if settlements.is_empty() {
                return ColonyValue::rejected(NoValueType::Rumour);
            }
            values.set(ColonyValueCategory::Tile, development);
        }
        NoClaimReason::Occupied => values.set(ColonyValueCategory::Tile, MOD_ENEMY_UNIT[0]),
        NoClaimReason::Settlement | NoClaimReason::Worked | NoClaimReason::Europeans => {
            return ColonyValue::rejected(NoValueType::Settled);
        }
        NoClaimReason::Natives => {
            let adjacent_camp = tile
                .owning_settlement
                .as_ref()
                .and_then(|s| game.colony(s).ok())
                .is_some_and(|c| c.tile.is_adjacent(&coord));
            if adjacent_camp {
                return ColonyValue::rejected(NoValueType::Settled);
            }
            let price = land_price(game, player, tile);
            if price > 0 && player.gold < price as i64 && port_count > 0 {
                values.set(ColonyValueCategory::Tile, MOD_STEAL);
            }
        }
    }

    let food = rules.primary_food();
    let mut production: BTreeMap<GoodsTypeId, u32> = BTreeMap::new();
    let initial_food = rules
        .all_goods()
        .iter()
        .filter(|g| g.food)
        .map(|g| tile_type.potential(g.id))
        .max()
        .unwrap_or(0);
    if initial_food <= FOOD_VERY_LOW {
        return ColonyValue::rejected(NoValueType::Food);
    }
    *production.entry(food).or_default() += initial_food;
    values.set(
        ColonyValueCategory::Production,
        initial_food as f64 * rules.goods(food).production_weight,
    );

    match tile.high_seas_count {
        None => {
            if port_count < LOW_SETTLEMENT_NUMBER {
                return ColonyValue::rejected(NoValueType::Inland);
            }
            values.set(ColonyValueCategory::Europe, MOD_INLAND);
        }
        Some(steps) if steps >= LONG_PATH_TILES => {
            // Squared for the first colony, linear once established
            let trip = LONG_PATH_TILES as f64 / steps as f64;
            values.set(ColonyValueCategory::Europe, trip.powf(2.0 - development));
        }
        Some(steps) => {
            let closeness = LONG_PATH_TILES as f64 / (LONG_PATH_TILES - steps) as f64;
            values.set(ColonyValueCategory::Europe, 1.0 + 0.25 * closeness);
        }
    }

    values.set(
        ColonyValueCategory::Resource,
        if tile.resource { MOD_HAS_RESOURCE } else { 1.0 },
    );

    let mut high_production = Vec::new();
    let mut good_production = Vec::new();
    for c in game.map.surrounding(coord, 1) {
        let Some(t) = game.map.tile(c) else { continue };
        if t.has_settlement() {
            return ColonyValue::rejected(NoValueType::Settled);
        }

        let mut pf = 1.0;
        if let Some(owner) = t.owner.as_ref().filter(|o| **o != player.id) {
            let european = game.player(owner).is_ok_and(|p| p.is_european());
            if european {
                if port_count < LOW_SETTLEMENT_NUMBER {
                    return ColonyValue::rejected(NoValueType::Settled);
                }
                values.scale(ColonyValueCategory::Adjacent, MOD_OWNED_EUROPEAN * development);
                continue;
            }
            pf = MOD_OWNED_NATIVE;
            if port_count > 0 {
                pf *= development;
            }
        }

        let tt = rules.tile_type(t.tile_type);
        for (goods, amount) in tt.sorted_potential() {
            let goods = if rules.goods(goods).food { food } else { goods };
            let amount = if tt.land {
                amount
            } else {
                (amount as f64 * development) as u32
            };
            let weighted = amount as f64 * rules.goods(goods).production_weight * pf;
            values.add(ColonyValueCategory::Production, weighted);
            *production.entry(goods).or_default() += amount;
            if amount > HIGH_PRODUCTION {
                if !high_production.contains(&goods) {
                    high_production.push(goods);
                }
            } else if amount > GOOD_PRODUCTION && !good_production.contains(&goods) {
                good_production.push(goods);
            }
        }

        for _ in hostile_units(game, player, c) {
            values.scale(ColonyValueCategory::Adjacent, MOD_ENEMY_UNIT[1]);
        }
    }

    for goods in &high_production {
        values.scale(ColonyValueCategory::Level, MOD_HIGH_PRODUCTION);
        good_production.retain(|g| g != goods);
    }
    if !good_production.is_empty() {
        values.scale(
            ColonyValueCategory::Level,
            MOD_GOOD_PRODUCTION * good_production.len() as f64,
        );
    }

    let mut supporting_colony = false;
    for radius in 2..DISTANCE_MAX {
        let r = radius as usize;
        for c in game.map.ring(coord, radius) {
            let settlement = game
                .map
                .tile(c)
                .and_then(|t| t.settlement.as_ref())
                .and_then(|s| game.colony(s).ok());
            if let Some(settlement) = settlement {
                if settlement.owner == player.id {
                    if !supporting_colony {
                        supporting_colony = true;
                        values.scale(ColonyValueCategory::Nearby, MOD_OWN_COLONY[r]);
                    }
                } else if player.at_war_with(&settlement.owner) {
                    values.scale(ColonyValueCategory::Nearby, MOD_ENEMY_COLONY[r]);
                } else {
                    values.scale(ColonyValueCategory::Nearby, MOD_NEUTRAL_COLONY[r]);
                }
            }
            for _ in hostile_units(game, player, c) {
                values.scale(ColonyValueCategory::Nearby, MOD_ENEMY_UNIT[r]);
            }
        }
    }

    if production.get(&food).copied().unwrap_or(0) < FOOD_LOW {
        values.scale(ColonyValueCategory::Food, MOD_FOOD_LOW);
    }
    for (goods, amount) in &production {
        let gt = rules.goods(*goods);
        let threshold = gt.low_production_threshold;
        if threshold <= 0.0 {
            continue;
        }
        let factor = if (*amount as f64) < threshold {
            let fraction = *amount as f64 / threshold;
            (1.0 - fraction) * gt.zero_production_factor + fraction
        } else {
            1.0
        };
        values.key_goods.push((*goods, factor));
    }
    values
}

/// Offensive units on the tile belonging to players we are at war with
fn hostile_units<'a>(game: &'a Game, player: &'a Player, coord: TileCoord) -> impl Iterator<Item = ObjectId> + 'a {
    game.units_at(coord).into_iter().filter(move |id| {
        game.unit(id).is_ok_and(|u| {
            u.owner != player.id
                && player.at_war_with(&u.owner)
                && game.rules.unit_type(u.unit_type).is_offensive()
        })
    })
}

/// Single score for founding at `coord`; negative values are sentinels
pub fn colony_value(game: &Game, player: &Player, coord: TileCoord) -> i32 {
    colony_values(game, player, coord).total()
}

/// Score candidates in parallel, best first
///
/// Disqualified sites are dropped. Ties keep the order of `coords`.
pub fn rank_sites(game: &Game, player: &Player, coords: &[TileCoord]) -> Vec<(TileCoord, ColonyValue)> {
    let mut scored: Vec<(usize, TileCoord, ColonyValue)> = coords
        .par_iter()
        .enumerate()
        .map(|(i, &c)| (i, c, colony_values(game, player, c)))
        .filter(|(_, _, v)| v.rejection().is_none())
        .collect();
    scored.sort_by_key(|(i, _, v)| {
        let product: f64 = ColonyValueCategory::ALL
            .iter()
            .map(|c| v.get(*c))
            .chain(v.key_goods().iter().map(|(_, f)| *f))
            .product();
        (std::cmp::Reverse(OrderedFloat(product)), *i)
    });
    scored.into_iter().map(|(_, c, v)| (c, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimulationConfig;
    use crate::game::ScenarioBuilder;
    use crate::model::PlayerType;
    use crate::rules::RuleTable;
    use std::sync::Arc;

    #[test]
    fn test_sentinel_round_trip() {
        for reason in [
            NoValueType::Bogus,
            NoValueType::Terrain,
            NoValueType::Rumour,
            NoValueType::Settled,
            NoValueType::Food,
            NoValueType::Inland,
            NoValueType::Polar,
        ] {
            assert_eq!(NoValueType::from_value(reason.value()), reason);
            assert_eq!(ColonyValue::rejected(reason).total(), reason.value());
        }
        assert_eq!(NoValueType::from_value(-99), NoValueType::Bogus);
    }

    #[test]
    fn test_landlocked_first_colony_rejected() {
        let rules = Arc::new(RuleTable::classic());
        let plains = rules.tile_type_by_key("plains").expect("plains");
        let mut game = Game::new(rules, SimulationConfig::default(), 10, 10, plains, 4).expect("game");
        let dutch = game.add_player("Dutch", PlayerType::Colonial).expect("dutch");
        let player = game.player(&dutch).expect("player");
        assert_eq!(colony_value(&game, player, TileCoord::new(5, 5)), NoValueType::Inland.value());
    }

    #[test]
    fn test_coastal_sites_ranked() {
        let scenario = ScenarioBuilder::new(RuleTable::classic()).build().expect("scenario");
        let game = &scenario.game;
        let dutch = game.player(&scenario.players[0]).expect("dutch");
        let (w, h) = (game.map.width() as i32, game.map.height() as i32);
        let coords: Vec<_> = (0..h).map(|y| TileCoord::new(w - 3, y)).collect();
        let ranked = rank_sites(game, dutch, &coords);
        assert!(!ranked.is_empty());
        assert!(ranked.len() < coords.len());
        let scores: Vec<i32> = ranked.iter().map(|(_, v)| v.total()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores.iter().all(|s| *s >= 0));
    }
}
