//! Ready-made starting positions for the CLI and the tests

use std::sync::Arc;

use crate::core::error::{GameError, Result};
use crate::core::types::TileCoord;
use crate::core::SimulationConfig;
use crate::model::{PlayerType, UnitLocation};
use crate::registry::ObjectId;
use crate::rules::{Buildable, RuleTable, TileTypeId};

use super::Game;

/// A generated game plus the handles a caller usually needs
#[derive(Debug)]
pub struct Scenario {
    pub game: Game,
    /// Dutch, English, Arawak
    pub players: Vec<ObjectId>,
    /// Dutch colony, English colony, Arawak camp
    pub colonies: Vec<ObjectId>,
}

/// Two coastal European colonies facing the sea and one inland native camp
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    rules: RuleTable,
    config: SimulationConfig,
    width: u32,
    height: u32,
    seed: u64,
}

impl ScenarioBuilder {
    pub fn new(rules: RuleTable) -> Self {
        Self {
            rules,
            config: SimulationConfig::default(),
            width: 16,
            height: 12,
            seed: 1492,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fog_of_war(mut self, enabled: bool) -> Self {
        self.rules.options.fog_of_war = enabled;
        self
    }

    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Scenario> {
        if self.width < 8 || self.height < 8 {
            return Err(GameError::InvalidAction(format!(
                "scenario map must be at least 8x8, got {}x{}",
                self.width, self.height
            )));
        }
        let rules = Arc::new(self.rules);
        let key = |k: &str| {
            rules
                .tile_type_by_key(k)
                .ok_or_else(|| GameError::InvalidAction(format!("rules lack tile type {}", k)))
        };
        let plains = key("plains")?;
        let terrain = [
            plains,
            plains,
            plains,
            plains,
            key("grassland")?,
            key("prairie")?,
            key("mixed_forest")?,
            key("hills")?,
        ];
        let ocean = key("ocean")?;
        let high_seas = key("high_seas")?;

        let (w, h) = (self.width as i32, self.height as i32);
        let mut game = Game::new(Arc::clone(&rules), self.config, self.width, self.height, plains, self.seed)?;
        for y in 0..h {
            for x in 0..w {
                let tile_type: TileTypeId = match x {
                    _ if x == w - 1 => high_seas,
                    _ if x == w - 2 => ocean,
                    _ => terrain[(terrain_hash(x, y, self.seed) % terrain.len() as u64) as usize],
                };
                game.set_terrain(TileCoord::new(x, y), tile_type)?;
            }
        }

        let dutch_at = TileCoord::new(w - 3, h / 4);
        let english_at = TileCoord::new(w - 3, h - 1 - h / 4);
        let camp_at = TileCoord::new(2, h / 2);
        for at in [dutch_at, english_at, camp_at] {
            game.set_terrain(at, plains)?;
        }
        game.refresh_high_seas();

        let dutch = game.add_player("Dutch", PlayerType::Colonial)?;
        let english = game.add_player("English", PlayerType::Colonial)?;
        let arawak = game.add_player("Arawak", PlayerType::Native)?;

        let colonist = rules.default_unit_type();
        let food = rules.primary_food();
        let lumber = goods(&rules, "lumber")?;

        let jamestown = game.found_colony(&dutch, dutch_at, None)?;
        game.create_unit(
            &dutch,
            colonist,
            UnitLocation::WorkTile {
                colony: jamestown.clone(),
                tile: TileCoord::new(dutch_at.x - 1, dutch_at.y),
            },
        )?;
        let carpenters = {
            let c = game.colony(&jamestown)?;
            let root = building(&rules, "carpenter_house")?;
            game.colony_building_of_root(c, root)
        };
        if let Some(b) = carpenters {
            game.create_unit(&dutch, colonist, UnitLocation::Building(b))?;
        }
        {
            let docks = building(&rules, "docks")?;
            let c = game.colony_mut(&jamestown)?;
            c.goods.add(food, 20);
            c.goods.add(lumber, 40);
            c.build_queue.push(Buildable::Building(docks));
            c.goods.save_state();
        }

        let plymouth = game.found_colony(&english, english_at, None)?;
        game.create_unit(
            &english,
            colonist,
            UnitLocation::WorkTile {
                colony: plymouth.clone(),
                tile: TileCoord::new(english_at.x - 1, english_at.y),
            },
        )?;
        {
            let wagon = rules
                .unit_type_by_key("wagon_train")
                .ok_or_else(|| GameError::InvalidAction("rules lack wagon_train".into()))?;
            let c = game.colony_mut(&plymouth)?;
            c.goods.add(food, 10);
            c.build_queue.push(Buildable::Unit(wagon));
            c.goods.save_state();
        }
        game.create_unit(
            &english,
            colonist,
            UnitLocation::Tile(TileCoord::new(english_at.x - 2, english_at.y)),
        )?;

        let camp = game.found_colony(&arawak, camp_at, Some("Arawak Village"))?;
        game.create_unit(&arawak, colonist, UnitLocation::Tile(TileCoord::new(camp_at.x + 1, camp_at.y)))?;

        tracing::info!("scenario ready: {}x{} (seed {})", self.width, self.height, self.seed);
        Ok(Scenario {
            game,
            players: vec![dutch, english, arawak],
            colonies: vec![jamestown, plymouth, camp],
        })
    }
}

fn goods(rules: &RuleTable, key: &str) -> Result<crate::rules::GoodsTypeId> {
    rules
        .goods_by_key(key)
        .ok_or_else(|| GameError::InvalidAction(format!("rules lack goods {}", key)))
}

fn building(rules: &RuleTable, key: &str) -> Result<crate::rules::BuildingTypeId> {
    rules
        .building_type_by_key(key)
        .ok_or_else(|| GameError::InvalidAction(format!("rules lack building {}", key)))
}

fn terrain_hash(x: i32, y: i32, seed: u64) -> u64 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x as u64);
    h = h.wrapping_mul(31).wrapping_add(y as u64);
    h ^ (h >> 16)
}
