//! Load a rule table from TOML
//!
//! Entries refer to each other by key; ids are assigned by position in
//! each list.

use std::collections::BTreeSet;

use serde::Deserialize;

use super::types::*;
use super::{GameOptions, RuleTable, RulesError, Tunables};

/// TOML representation of a rules file
#[derive(Debug, Deserialize)]
struct TomlRules {
    #[serde(default)]
    options: GameOptions,
    #[serde(default)]
    tunables: Tunables,
    goods: Vec<TomlGoods>,
    unit_types: Vec<TomlUnitType>,
    building_types: Vec<TomlBuildingType>,
    tile_types: Vec<TomlTileType>,
    #[serde(default)]
    ship_names: Vec<String>,
    #[serde(default)]
    settlement_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlAmount {
    goods: String,
    amount: u32,
}

#[derive(Debug, Deserialize)]
struct TomlGoods {
    key: String,
    name: String,
    #[serde(default)]
    food: bool,
    #[serde(default = "yes")]
    storable: bool,
    #[serde(default)]
    building_material: bool,
    #[serde(default)]
    breedable: bool,
    #[serde(default)]
    breeding_number: u32,
    #[serde(default)]
    limit_ignored: bool,
    #[serde(default)]
    liberty: bool,
    #[serde(default)]
    immigration: bool,
    #[serde(default)]
    price: u32,
    made_from: Option<String>,
    #[serde(default = "one")]
    production_weight: f64,
    #[serde(default)]
    low_production_threshold: f64,
    #[serde(default = "one")]
    zero_production_factor: f64,
}

#[derive(Debug, Deserialize)]
struct TomlUnitType {
    key: String,
    name: String,
    #[serde(default)]
    offence: u32,
    #[serde(default = "one_u32")]
    line_of_sight: u32,
    #[serde(default)]
    skill: i32,
    expert_production: Option<String>,
    #[serde(default)]
    food_consumption: u32,
    #[serde(default)]
    required_goods: Vec<TomlAmount>,
    #[serde(default = "one_u32")]
    required_population: u32,
    required_ability: Option<Ability>,
    #[serde(default)]
    abilities: BTreeSet<Ability>,
    limit: Option<UnitLimit>,
    education_target: Option<String>,
    #[serde(default)]
    education_turns: u32,
}

#[derive(Debug, Deserialize)]
struct TomlBuildingType {
    key: String,
    name: String,
    upgrades_from: Option<String>,
    #[serde(default)]
    workplaces: u32,
    #[serde(default)]
    basic_production: u32,
    input: Option<String>,
    output: Option<String>,
    #[serde(default)]
    required_goods: Vec<TomlAmount>,
    #[serde(default)]
    required_population: u32,
    required_ability: Option<Ability>,
    #[serde(default)]
    abilities: BTreeSet<Ability>,
    #[serde(default)]
    storage_bonus: u32,
    #[serde(default)]
    line_of_sight_bonus: u32,
    #[serde(default = "min_skill")]
    min_skill: i32,
    #[serde(default = "max_skill")]
    max_skill: i32,
    #[serde(default)]
    automatic: bool,
}

#[derive(Debug, Deserialize)]
struct TomlTileType {
    key: String,
    name: String,
    #[serde(default = "yes")]
    land: bool,
    #[serde(default)]
    high_seas: bool,
    #[serde(default)]
    polar: bool,
    #[serde(default = "yes")]
    settleable: bool,
    #[serde(default)]
    production: Vec<TomlAmount>,
    center_production: Option<Vec<TomlAmount>>,
}

fn yes() -> bool {
    true
}

fn one() -> f64 {
    1.0
}

fn one_u32() -> u32 {
    1
}

fn min_skill() -> i32 {
    -2
}

fn max_skill() -> i32 {
    10
}

fn index_of(keys: &[String], kind: &'static str, key: &str) -> Result<u16, RulesError> {
    keys.iter()
        .position(|k| k == key)
        .map(|i| i as u16)
        .ok_or_else(|| RulesError::UnknownKey {
            kind,
            key: key.to_string(),
        })
}

fn amounts(keys: &[String], list: Vec<TomlAmount>) -> Result<Vec<(GoodsTypeId, u32)>, RulesError> {
    list.into_iter()
        .map(|a| Ok((GoodsTypeId(index_of(keys, "goods", &a.goods)?), a.amount)))
        .collect()
}

impl RuleTable {
    /// Load rules from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self, RulesError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RulesError::Io(e.to_string()))?;
        Self::parse_toml(&content)
    }

    /// Parse rules from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, RulesError> {
        let data: TomlRules =
            toml::from_str(content).map_err(|e| RulesError::Parse(e.to_string()))?;

        let goods_keys: Vec<String> = data.goods.iter().map(|g| g.key.clone()).collect();
        let unit_keys: Vec<String> = data.unit_types.iter().map(|u| u.key.clone()).collect();
        let building_keys: Vec<String> = data.building_types.iter().map(|b| b.key.clone()).collect();

        let goods = data
            .goods
            .into_iter()
            .enumerate()
            .map(|(i, g)| {
                let made_from = match g.made_from {
                    Some(k) => Some(GoodsTypeId(index_of(&goods_keys, "goods", &k)?)),
                    None => None,
                };
                Ok(GoodsType {
                    id: GoodsTypeId(i as u16),
                    key: g.key,
                    name: g.name,
                    food: g.food,
                    storable: g.storable,
                    building_material: g.building_material,
                    breedable: g.breedable,
                    breeding_number: g.breeding_number,
                    limit_ignored: g.limit_ignored,
                    liberty: g.liberty,
                    immigration: g.immigration,
                    price: g.price,
                    made_from,
                    production_weight: g.production_weight,
                    low_production_threshold: g.low_production_threshold,
                    zero_production_factor: g.zero_production_factor,
                })
            })
            .collect::<Result<Vec<_>, RulesError>>()?;

        let unit_types = data
            .unit_types
            .into_iter()
            .enumerate()
            .map(|(i, u)| {
                let expert_production = match u.expert_production {
                    Some(k) => Some(GoodsTypeId(index_of(&goods_keys, "goods", &k)?)),
                    None => None,
                };
                let education_target = match u.education_target {
                    Some(k) => Some(UnitTypeId(index_of(&unit_keys, "unit type", &k)?)),
                    None => None,
                };
                Ok(UnitType {
                    id: UnitTypeId(i as u16),
                    key: u.key,
                    name: u.name,
                    offence: u.offence,
                    line_of_sight: u.line_of_sight,
                    skill: u.skill,
                    expert_production,
                    food_consumption: u.food_consumption,
                    required_goods: amounts(&goods_keys, u.required_goods)?,
                    required_population: u.required_population,
                    required_ability: u.required_ability,
                    abilities: u.abilities,
                    limit: u.limit,
                    education_target,
                    education_turns: u.education_turns,
                })
            })
            .collect::<Result<Vec<_>, RulesError>>()?;

        let mut building_types: Vec<BuildingType> = Vec::with_capacity(data.building_types.len());
        for (i, b) in data.building_types.into_iter().enumerate() {
            let upgrades_from = match b.upgrades_from {
                Some(k) => Some(BuildingTypeId(index_of(&building_keys, "building type", &k)?)),
                None => None,
            };
            let level = match upgrades_from {
                Some(base) => match building_types.get(base.0 as usize) {
                    Some(base) => base.level + 1,
                    None => {
                        return Err(RulesError::Invalid(format!(
                            "building type {} listed before the type it upgrades",
                            b.key
                        )))
                    }
                },
                None => 1,
            };
            let input = match b.input {
                Some(k) => Some(GoodsTypeId(index_of(&goods_keys, "goods", &k)?)),
                None => None,
            };
            let output = match b.output {
                Some(k) => Some(GoodsTypeId(index_of(&goods_keys, "goods", &k)?)),
                None => None,
            };
            building_types.push(BuildingType {
                id: BuildingTypeId(i as u16),
                key: b.key,
                name: b.name,
                upgrades_from,
                level,
                workplaces: b.workplaces,
                basic_production: b.basic_production,
                input,
                output,
                required_goods: amounts(&goods_keys, b.required_goods)?,
                required_population: b.required_population,
                required_ability: b.required_ability,
                abilities: b.abilities,
                storage_bonus: b.storage_bonus,
                line_of_sight_bonus: b.line_of_sight_bonus,
                min_skill: b.min_skill,
                max_skill: b.max_skill,
                automatic: b.automatic,
            });
        }

        let tile_types = data
            .tile_types
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                let production = amounts(&goods_keys, t.production)?;
                let center_production = match t.center_production {
                    Some(list) => amounts(&goods_keys, list)?,
                    None => production.clone(),
                };
                Ok(TileType {
                    id: TileTypeId(i as u16),
                    key: t.key,
                    name: t.name,
                    land: t.land,
                    high_seas: t.high_seas,
                    polar: t.polar,
                    settleable: t.settleable && t.land,
                    production,
                    center_production,
                })
            })
            .collect::<Result<Vec<_>, RulesError>>()?;

        Ok(RuleTable::new(goods, unit_types, building_types, tile_types)?
            .with_options(data.options)
            .with_tunables(data.tunables)
            .with_names(data.ship_names, data.settlement_names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [options]
        fog_of_war = false

        [tunables]
        warehouse_base_capacity = 150

        [[goods]]
        key = "grain"
        name = "Grain"
        food = true

        [[goods]]
        key = "timber"
        name = "Timber"

        [[goods]]
        key = "planks"
        name = "Planks"
        storable = false
        building_material = true
        made_from = "timber"

        [[unit_types]]
        key = "settler"
        name = "Settler"
        abilities = ["person", "born_in_colony"]
        food_consumption = 2
        required_goods = [{ goods = "grain", amount = 200 }]

        [[building_types]]
        key = "sawpit"
        name = "Sawpit"
        workplaces = 2
        basic_production = 3
        input = "timber"
        output = "planks"
        automatic = true

        [[building_types]]
        key = "sawmill"
        name = "Sawmill"
        upgrades_from = "sawpit"
        required_goods = [{ goods = "planks", amount = 40 }]

        [[tile_types]]
        key = "meadow"
        name = "Meadow"
        production = [{ goods = "grain", amount = 4 }]
    "#;

    #[test]
    fn test_rules_toml_parsing() {
        let rules = RuleTable::parse_toml(MINIMAL).expect("Failed to parse TOML");
        assert!(!rules.options.fog_of_war);
        assert_eq!(rules.tunables.warehouse_base_capacity, 150);
        assert_eq!(rules.tunables.immigration_increment, Tunables::default().immigration_increment);
        let grain = rules.goods_by_key("grain").expect("grain");
        assert_eq!(rules.primary_food(), grain);
        let mill = rules.building_type_by_key("sawmill").expect("sawmill");
        assert_eq!(rules.building_type(mill).level, 2);
        let meadow = rules.tile_type_by_key("meadow").expect("meadow");
        assert_eq!(rules.tile_type(meadow).center_production, vec![(grain, 4)]);
    }

    #[test]
    fn test_rules_toml_unknown_goods_key() {
        let broken = MINIMAL.replace("input = \"timber\"", "input = \"granite\"");
        match RuleTable::parse_toml(&broken) {
            Err(RulesError::UnknownKey { kind, key }) => {
                assert_eq!(kind, "goods");
                assert_eq!(key, "granite");
            }
            other => panic!("expected unknown key, got {other:?}"),
        }
    }

    #[test]
    fn test_rules_toml_requires_born_colonist() {
        let broken = MINIMAL.replace("abilities = [\"person\", \"born_in_colony\"]", "abilities = [\"person\"]");
        assert!(matches!(RuleTable::parse_toml(&broken), Err(RulesError::Invalid(_))));
    }
}
