//! Rule-table entry types: goods, units, buildings, terrain

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoodsTypeId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingTypeId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileTypeId(pub u16);

/// Ability predicates attached to units, buildings and players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// Unit is grown from food rather than built; never named
    BornInColony,
    /// Unit is a colonist that can work a location
    Person,
    /// Unit travels by sea
    Naval,
    /// Colony sells flagged goods automatically
    Export,
    /// Building instructs students
    Teach,
    /// Colony can build ships
    BuildShips,
    /// Colony can build artillery
    BuildArtillery,
    /// Colony lies next to water
    Coastal,
    /// Player sees around every other European colony
    SeeAllColonies,
    /// Building raises the colony's defence
    Defence,
}

/// Goods classification and siting weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsType {
    pub id: GoodsTypeId,
    pub key: String,
    pub name: String,
    pub food: bool,
    pub storable: bool,
    pub building_material: bool,
    pub breedable: bool,
    /// Minimum stock before breeding starts
    pub breeding_number: u32,
    /// Exempt from warehouse capacity
    pub limit_ignored: bool,
    /// Accumulates as colony liberty instead of being stored
    pub liberty: bool,
    /// Accumulates as player immigration instead of being stored
    pub immigration: bool,
    /// Market sale price per unit
    pub price: u32,
    /// Goods this is manufactured from
    pub made_from: Option<GoodsTypeId>,
    pub production_weight: f64,
    pub low_production_threshold: f64,
    pub zero_production_factor: f64,
}

/// Cap on how many units of a type a player may build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitLimit {
    /// No more units of the type than the player has colonies
    PerColony,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    pub id: UnitTypeId,
    pub key: String,
    pub name: String,
    pub offence: u32,
    pub line_of_sight: u32,
    /// Negative for unskilled colonists, zero for free colonists
    pub skill: i32,
    pub expert_production: Option<GoodsTypeId>,
    pub food_consumption: u32,
    pub required_goods: Vec<(GoodsTypeId, u32)>,
    pub required_population: u32,
    /// Colony ability needed to build this unit
    pub required_ability: Option<Ability>,
    pub abilities: BTreeSet<Ability>,
    pub limit: Option<UnitLimit>,
    /// What this type becomes when taught by any teacher
    pub education_target: Option<UnitTypeId>,
    /// Turns a teacher of this type needs per student
    pub education_turns: u32,
}

impl UnitType {
    pub fn has_ability(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    pub fn is_person(&self) -> bool {
        self.has_ability(Ability::Person)
    }

    pub fn is_offensive(&self) -> bool {
        self.offence > 0
    }

    pub fn is_expert_for(&self, goods: GoodsTypeId) -> bool {
        self.expert_production == Some(goods)
    }

    /// Non-expert persons of neutral skill learn by doing
    pub fn can_gain_experience(&self) -> bool {
        self.is_person() && self.skill == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    pub id: BuildingTypeId,
    pub key: String,
    pub name: String,
    pub upgrades_from: Option<BuildingTypeId>,
    /// 1 for a base building, +1 per upgrade step
    pub level: u32,
    pub workplaces: u32,
    pub basic_production: u32,
    pub input: Option<GoodsTypeId>,
    pub output: Option<GoodsTypeId>,
    pub required_goods: Vec<(GoodsTypeId, u32)>,
    pub required_population: u32,
    pub required_ability: Option<Ability>,
    pub abilities: BTreeSet<Ability>,
    /// Added to warehouse capacity
    pub storage_bonus: u32,
    pub line_of_sight_bonus: u32,
    pub min_skill: i32,
    pub max_skill: i32,
    /// Present from founding, never queued
    pub automatic: bool,
}

impl BuildingType {
    pub fn has_ability(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    pub fn accepts_skill(&self, skill: i32) -> bool {
        skill >= self.min_skill && skill <= self.max_skill
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileType {
    pub id: TileTypeId,
    pub key: String,
    pub name: String,
    pub land: bool,
    pub high_seas: bool,
    pub polar: bool,
    pub settleable: bool,
    /// Output of a colonist working the tile
    pub production: Vec<(GoodsTypeId, u32)>,
    /// Unattended output when the tile is a colony center
    pub center_production: Vec<(GoodsTypeId, u32)>,
}

impl TileType {
    pub fn potential(&self, goods: GoodsTypeId) -> u32 {
        self.production
            .iter()
            .find(|(g, _)| *g == goods)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Potential production, highest first
    pub fn sorted_potential(&self) -> Vec<(GoodsTypeId, u32)> {
        let mut potential: Vec<_> = self.production.iter().copied().filter(|(_, n)| *n > 0).collect();
        potential.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        potential
    }
}

/// Something a colony can put in a build queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Buildable {
    Unit(UnitTypeId),
    Building(BuildingTypeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_potential_descends() {
        let tile = TileType {
            id: TileTypeId(0),
            key: "t".into(),
            name: "T".into(),
            land: true,
            high_seas: false,
            polar: false,
            settleable: true,
            production: vec![(GoodsTypeId(0), 3), (GoodsTypeId(1), 6), (GoodsTypeId(2), 0)],
            center_production: vec![],
        };
        assert_eq!(tile.sorted_potential(), vec![(GoodsTypeId(1), 6), (GoodsTypeId(0), 3)]);
        assert_eq!(tile.potential(GoodsTypeId(2)), 0);
        assert_eq!(tile.potential(GoodsTypeId(5)), 0);
    }
}
