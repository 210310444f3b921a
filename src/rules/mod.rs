//! Read-only rule table consumed by the simulation
//!
//! Goods, unit, building and terrain types plus the numeric tunables and
//! game options. Built once (from the classic defaults or a TOML file) and
//! shared immutably.

pub mod classic;
pub mod loader;
pub mod types;

pub use types::{
    Ability, Buildable, BuildingType, BuildingTypeId, GoodsType, GoodsTypeId, TileType, TileTypeId,
    UnitLimit, UnitType, UnitTypeId,
};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RulesError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unknown {kind} key: {key}")]
    UnknownKey { kind: &'static str, key: String },
    #[error("Invalid rules: {0}")]
    Invalid(String),
}

/// Whether a European player may found a colony on native-owned land for free
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOnNativeLand {
    #[default]
    Never,
    Always,
    First,
    FirstAndUncontacted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// Restrict visibility to current sight ranges instead of explored terrain
    pub fog_of_war: bool,
    /// Missions in native settlements reveal the settlement's surroundings
    pub enhanced_missionaries: bool,
    pub build_on_native_land: BuildOnNativeLand,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            fog_of_war: true,
            enhanced_missionaries: false,
            build_on_native_land: BuildOnNativeLand::Never,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Founding father cost: fathers² · factor + 50
    pub founding_father_factor: u32,
    /// Immigration requirement growth per recruited migrant
    pub immigration_increment: u32,
    /// Immigration points needed for the first migrant
    pub initial_immigration: u32,
    /// Storage per goods type before any warehouse
    pub warehouse_base_capacity: u32,
    /// Multiplier on native land prices
    pub land_price_factor: u32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            founding_father_factor: 7,
            immigration_increment: 20,
            initial_immigration: 15,
            warehouse_base_capacity: 100,
            land_price_factor: 40,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    goods: Vec<GoodsType>,
    unit_types: Vec<UnitType>,
    building_types: Vec<BuildingType>,
    tile_types: Vec<TileType>,
    pub options: GameOptions,
    pub tunables: Tunables,
    primary_food: GoodsTypeId,
    default_unit: UnitTypeId,
    ship_names: Vec<String>,
    settlement_names: Vec<String>,
    keys: KeyIndex,
}

/// Key to list position, one map per kind of type
#[derive(Debug, Clone, Default)]
struct KeyIndex {
    goods: AHashMap<String, u16>,
    units: AHashMap<String, u16>,
    buildings: AHashMap<String, u16>,
    tiles: AHashMap<String, u16>,
}

fn index_keys<'a>(kind: &str, keys: impl Iterator<Item = &'a str>) -> Result<AHashMap<String, u16>, RulesError> {
    let mut index = AHashMap::new();
    for (i, key) in keys.enumerate() {
        if index.insert(key.to_string(), i as u16).is_some() {
            return Err(RulesError::Invalid(format!("duplicate {} key {}", kind, key)));
        }
    }
    Ok(index)
}

impl RuleTable {
    /// Assemble and validate a table
    ///
    /// Ids must equal list positions. The first food goods becomes the
    /// primary food; the first born-in-colony person the default colonist.
    pub fn new(
        goods: Vec<GoodsType>,
        unit_types: Vec<UnitType>,
        building_types: Vec<BuildingType>,
        tile_types: Vec<TileType>,
    ) -> Result<Self, RulesError> {
        for (i, g) in goods.iter().enumerate() {
            if g.id.0 as usize != i {
                return Err(RulesError::Invalid(format!("goods {} out of order", g.key)));
            }
        }
        for (i, u) in unit_types.iter().enumerate() {
            if u.id.0 as usize != i {
                return Err(RulesError::Invalid(format!("unit type {} out of order", u.key)));
            }
        }
        for (i, b) in building_types.iter().enumerate() {
            if b.id.0 as usize != i {
                return Err(RulesError::Invalid(format!("building type {} out of order", b.key)));
            }
            if let Some(base) = b.upgrades_from {
                if base.0 as usize >= i {
                    return Err(RulesError::Invalid(format!(
                        "building type {} must follow the type it upgrades",
                        b.key
                    )));
                }
            }
        }
        for (i, t) in tile_types.iter().enumerate() {
            if t.id.0 as usize != i {
                return Err(RulesError::Invalid(format!("tile type {} out of order", t.key)));
            }
        }
        let primary_food = goods
            .iter()
            .find(|g| g.food)
            .map(|g| g.id)
            .ok_or_else(|| RulesError::Invalid("no food goods type".into()))?;
        let default_unit = unit_types
            .iter()
            .find(|u| u.is_person() && u.has_ability(Ability::BornInColony))
            .map(|u| u.id)
            .ok_or_else(|| RulesError::Invalid("no born-in-colony colonist type".into()))?;
        let keys = KeyIndex {
            goods: index_keys("goods", goods.iter().map(|g| g.key.as_str()))?,
            units: index_keys("unit type", unit_types.iter().map(|u| u.key.as_str()))?,
            buildings: index_keys("building type", building_types.iter().map(|b| b.key.as_str()))?,
            tiles: index_keys("tile type", tile_types.iter().map(|t| t.key.as_str()))?,
        };

        Ok(Self {
            goods,
            unit_types,
            building_types,
            tile_types,
            options: GameOptions::default(),
            tunables: Tunables::default(),
            primary_food,
            default_unit,
            ship_names: Vec::new(),
            settlement_names: Vec::new(),
            keys,
        })
    }

    pub fn with_options(mut self, options: GameOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tunables(mut self, tunables: Tunables) -> Self {
        self.tunables = tunables;
        self
    }

    pub fn with_names(mut self, ships: Vec<String>, settlements: Vec<String>) -> Self {
        self.ship_names = ships;
        self.settlement_names = settlements;
        self
    }

    // === LOOKUPS ===

    pub fn goods(&self, id: GoodsTypeId) -> &GoodsType {
        &self.goods[id.0 as usize]
    }

    pub fn unit_type(&self, id: UnitTypeId) -> &UnitType {
        &self.unit_types[id.0 as usize]
    }

    pub fn building_type(&self, id: BuildingTypeId) -> &BuildingType {
        &self.building_types[id.0 as usize]
    }

    pub fn tile_type(&self, id: TileTypeId) -> &TileType {
        &self.tile_types[id.0 as usize]
    }

    pub fn all_goods(&self) -> &[GoodsType] {
        &self.goods
    }

    pub fn all_unit_types(&self) -> &[UnitType] {
        &self.unit_types
    }

    pub fn all_building_types(&self) -> &[BuildingType] {
        &self.building_types
    }

    pub fn all_tile_types(&self) -> &[TileType] {
        &self.tile_types
    }

    pub fn goods_by_key(&self, key: &str) -> Option<GoodsTypeId> {
        self.keys.goods.get(key).map(|&i| GoodsTypeId(i))
    }

    pub fn unit_type_by_key(&self, key: &str) -> Option<UnitTypeId> {
        self.keys.units.get(key).map(|&i| UnitTypeId(i))
    }

    pub fn building_type_by_key(&self, key: &str) -> Option<BuildingTypeId> {
        self.keys.buildings.get(key).map(|&i| BuildingTypeId(i))
    }

    pub fn tile_type_by_key(&self, key: &str) -> Option<TileTypeId> {
        self.keys.tiles.get(key).map(|&i| TileTypeId(i))
    }

    pub fn primary_food(&self) -> GoodsTypeId {
        self.primary_food
    }

    pub fn default_unit_type(&self) -> UnitTypeId {
        self.default_unit
    }

    pub fn ship_names(&self) -> &[String] {
        &self.ship_names
    }

    pub fn settlement_names(&self) -> &[String] {
        &self.settlement_names
    }

    // === DERIVED PREDICATES ===

    /// Goods that some other goods is manufactured from
    pub fn is_raw_material(&self, id: GoodsTypeId) -> bool {
        self.goods.iter().any(|g| g.made_from == Some(id))
    }

    /// Storable goods that feed into a building material
    pub fn is_raw_building_material(&self, id: GoodsTypeId) -> bool {
        self.goods
            .iter()
            .any(|g| g.building_material && g.made_from == Some(id))
    }

    pub fn expert_for(&self, goods: GoodsTypeId) -> Option<UnitTypeId> {
        self.unit_types
            .iter()
            .find(|u| u.expert_production == Some(goods))
            .map(|u| u.id)
    }

    pub fn required_goods(&self, buildable: Buildable) -> &[(GoodsTypeId, u32)] {
        match buildable {
            Buildable::Unit(u) => &self.unit_type(u).required_goods,
            Buildable::Building(b) => &self.building_type(b).required_goods,
        }
    }

    pub fn required_population(&self, buildable: Buildable) -> u32 {
        match buildable {
            Buildable::Unit(u) => self.unit_type(u).required_population,
            Buildable::Building(b) => self.building_type(b).required_population,
        }
    }

    pub fn buildable_name(&self, buildable: Buildable) -> &str {
        match buildable {
            Buildable::Unit(u) => &self.unit_type(u).name,
            Buildable::Building(b) => &self.building_type(b).name,
        }
    }

    /// Is `goods` consumed by any buildable in the table
    pub fn is_needed_for_building(&self, goods: GoodsTypeId) -> bool {
        self.unit_types
            .iter()
            .flat_map(|u| u.required_goods.iter())
            .chain(self.building_types.iter().flat_map(|b| b.required_goods.iter()))
            .any(|(g, _)| *g == goods)
    }

    /// Base type of an upgrade chain
    pub fn building_root(&self, id: BuildingTypeId) -> BuildingTypeId {
        let mut current = id;
        while let Some(base) = self.building_type(current).upgrades_from {
            current = base;
        }
        current
    }

    /// The type that upgrades `id`, if any
    pub fn upgrade_of(&self, id: BuildingTypeId) -> Option<BuildingTypeId> {
        self.building_types
            .iter()
            .find(|b| b.upgrades_from == Some(id))
            .map(|b| b.id)
    }

    pub fn automatic_buildings(&self) -> impl Iterator<Item = &BuildingType> {
        self.building_types.iter().filter(|b| b.automatic)
    }
}
