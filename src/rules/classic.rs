//! Built-in classic rule set
//!
//! Hardcoded catalog used by the CLI and the tests. A TOML file can replace
//! it wholesale through `RuleTable::parse_toml`.

use std::collections::BTreeSet;

use super::types::*;
use super::RuleTable;

fn goods(id: u16, key: &str, name: &str) -> GoodsType {
    GoodsType {
        id: GoodsTypeId(id),
        key: key.into(),
        name: name.into(),
        food: false,
        storable: true,
        building_material: false,
        breedable: false,
        breeding_number: 0,
        limit_ignored: false,
        liberty: false,
        immigration: false,
        price: 1,
        made_from: None,
        production_weight: 1.0,
        low_production_threshold: 0.0,
        zero_production_factor: 1.0,
    }
}

fn person(id: u16, key: &str, name: &str, skill: i32) -> UnitType {
    UnitType {
        id: UnitTypeId(id),
        key: key.into(),
        name: name.into(),
        offence: 0,
        line_of_sight: 1,
        skill,
        expert_production: None,
        food_consumption: 2,
        required_goods: Vec::new(),
        required_population: 1,
        required_ability: None,
        abilities: BTreeSet::from([Ability::Person]),
        limit: None,
        education_target: None,
        education_turns: 0,
    }
}

fn expert(id: u16, key: &str, name: &str, skill: i32, goods: u16, turns: u32) -> UnitType {
    UnitType {
        expert_production: Some(GoodsTypeId(goods)),
        education_turns: turns,
        ..person(id, key, name, skill)
    }
}

fn machine(id: u16, key: &str, name: &str, cost: Vec<(GoodsTypeId, u32)>) -> UnitType {
    UnitType {
        id: UnitTypeId(id),
        key: key.into(),
        name: name.into(),
        offence: 0,
        line_of_sight: 1,
        skill: 0,
        expert_production: None,
        food_consumption: 0,
        required_goods: cost,
        required_population: 1,
        required_ability: None,
        abilities: BTreeSet::new(),
        limit: None,
        education_target: None,
        education_turns: 0,
    }
}

fn building(id: u16, key: &str, name: &str, cost: Vec<(GoodsTypeId, u32)>, population: u32) -> BuildingType {
    BuildingType {
        id: BuildingTypeId(id),
        key: key.into(),
        name: name.into(),
        upgrades_from: None,
        level: 1,
        workplaces: 0,
        basic_production: 0,
        input: None,
        output: None,
        required_goods: cost,
        required_population: population,
        required_ability: None,
        abilities: BTreeSet::new(),
        storage_bonus: 0,
        line_of_sight_bonus: 0,
        min_skill: -2,
        max_skill: 10,
        automatic: false,
    }
}

fn factory(id: u16, key: &str, name: &str, input: Option<u16>, output: u16) -> BuildingType {
    BuildingType {
        workplaces: 3,
        basic_production: 3,
        input: input.map(GoodsTypeId),
        output: Some(GoodsTypeId(output)),
        automatic: true,
        ..building(id, key, name, Vec::new(), 0)
    }
}

fn upgrade(base: BuildingType, id: u16, key: &str, name: &str, cost: Vec<(GoodsTypeId, u32)>, population: u32) -> BuildingType {
    BuildingType {
        id: BuildingTypeId(id),
        key: key.into(),
        name: name.into(),
        upgrades_from: Some(base.id),
        level: base.level + 1,
        required_goods: cost,
        required_population: population,
        automatic: false,
        ..base
    }
}

fn tile(id: u16, key: &str, name: &str, production: Vec<(u16, u32)>) -> TileType {
    let production: Vec<(GoodsTypeId, u32)> =
        production.into_iter().map(|(g, n)| (GoodsTypeId(g), n)).collect();
    TileType {
        id: TileTypeId(id),
        key: key.into(),
        name: name.into(),
        land: true,
        high_seas: false,
        polar: false,
        settleable: true,
        center_production: production.clone(),
        production,
    }
}

// Goods ids, in table order
const FOOD: u16 = 0;
const SUGAR: u16 = 1;
const TOBACCO: u16 = 2;
const COTTON: u16 = 3;
const FURS: u16 = 4;
const LUMBER: u16 = 5;
const ORE: u16 = 6;
const SILVER: u16 = 7;
const HORSES: u16 = 8;
const RUM: u16 = 9;
const CIGARS: u16 = 10;
const CLOTH: u16 = 11;
const COATS: u16 = 12;
const TOOLS: u16 = 13;
const MUSKETS: u16 = 14;
const HAMMERS: u16 = 15;
const BELLS: u16 = 16;
const CROSSES: u16 = 17;

fn g(id: u16, amount: u32) -> (GoodsTypeId, u32) {
    (GoodsTypeId(id), amount)
}

impl RuleTable {
    /// Load the classic rules (hardcoded)
    pub fn classic() -> Self {
        let goods_list = vec![
            GoodsType {
                food: true,
                limit_ignored: true,
                production_weight: 1.0,
                price: 1,
                ..goods(FOOD, "food", "Food")
            },
            GoodsType { price: 4, production_weight: 0.6, ..goods(SUGAR, "sugar", "Sugar") },
            GoodsType { price: 4, production_weight: 0.6, ..goods(TOBACCO, "tobacco", "Tobacco") },
            GoodsType { price: 3, production_weight: 0.6, ..goods(COTTON, "cotton", "Cotton") },
            GoodsType { price: 4, production_weight: 0.6, ..goods(FURS, "furs", "Furs") },
            GoodsType {
                price: 1,
                production_weight: 0.8,
                low_production_threshold: 4.0,
                zero_production_factor: 0.25,
                ..goods(LUMBER, "lumber", "Lumber")
            },
            GoodsType {
                price: 4,
                production_weight: 0.8,
                low_production_threshold: 2.0,
                zero_production_factor: 0.8,
                ..goods(ORE, "ore", "Ore")
            },
            GoodsType { price: 19, production_weight: 1.5, ..goods(SILVER, "silver", "Silver") },
            GoodsType {
                breedable: true,
                breeding_number: 2,
                price: 1,
                made_from: Some(GoodsTypeId(FOOD)),
                ..goods(HORSES, "horses", "Horses")
            },
            GoodsType { price: 10, made_from: Some(GoodsTypeId(SUGAR)), ..goods(RUM, "rum", "Rum") },
            GoodsType { price: 10, made_from: Some(GoodsTypeId(TOBACCO)), ..goods(CIGARS, "cigars", "Cigars") },
            GoodsType { price: 10, made_from: Some(GoodsTypeId(COTTON)), ..goods(CLOTH, "cloth", "Cloth") },
            GoodsType { price: 10, made_from: Some(GoodsTypeId(FURS)), ..goods(COATS, "coats", "Coats") },
            GoodsType {
                building_material: true,
                price: 1,
                made_from: Some(GoodsTypeId(ORE)),
                ..goods(TOOLS, "tools", "Tools")
            },
            GoodsType { price: 2, made_from: Some(GoodsTypeId(TOOLS)), ..goods(MUSKETS, "muskets", "Muskets") },
            GoodsType {
                building_material: true,
                storable: false,
                price: 0,
                made_from: Some(GoodsTypeId(LUMBER)),
                ..goods(HAMMERS, "hammers", "Hammers")
            },
            GoodsType { storable: false, liberty: true, price: 0, ..goods(BELLS, "bells", "Bells") },
            GoodsType { storable: false, immigration: true, price: 0, ..goods(CROSSES, "crosses", "Crosses") },
        ];

        let mut free_colonist = person(0, "free_colonist", "Free Colonist", 0);
        free_colonist.abilities.insert(Ability::BornInColony);
        free_colonist.required_goods = vec![g(FOOD, 200)];

        let indentured_servant = UnitType {
            education_target: Some(UnitTypeId(0)),
            ..person(1, "indentured_servant", "Indentured Servant", -1)
        };
        let petty_criminal = UnitType {
            education_target: Some(UnitTypeId(1)),
            ..person(2, "petty_criminal", "Petty Criminal", -2)
        };
        let veteran_soldier = UnitType {
            offence: 2,
            education_turns: 6,
            ..person(10, "veteran_soldier", "Veteran Soldier", 2)
        };
        let artillery = UnitType {
            offence: 7,
            required_ability: Some(Ability::BuildArtillery),
            ..machine(11, "artillery", "Artillery", vec![g(HAMMERS, 192), g(TOOLS, 40)])
        };
        let wagon_train = UnitType {
            limit: Some(UnitLimit::PerColony),
            ..machine(12, "wagon_train", "Wagon Train", vec![g(HAMMERS, 40)])
        };
        let caravel = UnitType {
            required_ability: Some(Ability::BuildShips),
            abilities: BTreeSet::from([Ability::Naval]),
            ..machine(13, "caravel", "Caravel", vec![g(HAMMERS, 128), g(TOOLS, 40)])
        };

        let unit_types = vec![
            free_colonist,
            indentured_servant,
            petty_criminal,
            expert(3, "expert_farmer", "Expert Farmer", 1, FOOD, 4),
            expert(4, "expert_lumberjack", "Expert Lumberjack", 1, LUMBER, 4),
            expert(5, "expert_ore_miner", "Expert Ore Miner", 1, ORE, 4),
            expert(6, "master_carpenter", "Master Carpenter", 2, HAMMERS, 6),
            expert(7, "master_blacksmith", "Master Blacksmith", 2, TOOLS, 6),
            expert(8, "elder_statesman", "Elder Statesman", 3, BELLS, 8),
            expert(9, "firebrand_preacher", "Firebrand Preacher", 3, CROSSES, 8),
            veteran_soldier,
            artillery,
            wagon_train,
            caravel,
        ];

        let town_hall = BuildingType {
            basic_production: 1,
            ..factory(0, "town_hall", "Town Hall", None, BELLS)
        };
        let carpenter_house = factory(1, "carpenter_house", "Carpenter's House", Some(LUMBER), HAMMERS);
        let lumber_mill = BuildingType {
            basic_production: 6,
            ..upgrade(carpenter_house.clone(), 2, "lumber_mill", "Lumber Mill", vec![g(HAMMERS, 52)], 3)
        };
        let blacksmith_house = factory(3, "blacksmith_house", "Blacksmith's House", Some(ORE), TOOLS);
        let blacksmith_shop = BuildingType {
            basic_production: 6,
            ..upgrade(
                blacksmith_house.clone(),
                4,
                "blacksmith_shop",
                "Blacksmith's Shop",
                vec![g(HAMMERS, 64), g(TOOLS, 20)],
                4,
            )
        };
        let armory = BuildingType {
            workplaces: 3,
            basic_production: 3,
            input: Some(GoodsTypeId(TOOLS)),
            output: Some(GoodsTypeId(MUSKETS)),
            abilities: BTreeSet::from([Ability::BuildArtillery]),
            ..building(5, "armory", "Armory", vec![g(HAMMERS, 52)], 1)
        };
        let schoolhouse = BuildingType {
            workplaces: 1,
            min_skill: 1,
            max_skill: 1,
            abilities: BTreeSet::from([Ability::Teach]),
            ..building(6, "schoolhouse", "Schoolhouse", vec![g(HAMMERS, 64), g(TOOLS, 30)], 4)
        };
        let college = BuildingType {
            workplaces: 2,
            max_skill: 2,
            ..upgrade(schoolhouse.clone(), 7, "college", "College", vec![g(HAMMERS, 160), g(TOOLS, 50)], 8)
        };
        let stockade = BuildingType {
            line_of_sight_bonus: 1,
            abilities: BTreeSet::from([Ability::Defence]),
            ..building(8, "stockade", "Stockade", vec![g(HAMMERS, 64)], 3)
        };
        let docks = BuildingType {
            required_ability: Some(Ability::Coastal),
            ..building(9, "docks", "Docks", vec![g(HAMMERS, 52)], 1)
        };
        let drydock = BuildingType {
            abilities: BTreeSet::from([Ability::BuildShips]),
            ..upgrade(docks.clone(), 10, "drydock", "Drydock", vec![g(HAMMERS, 80), g(TOOLS, 50)], 4)
        };
        let warehouse = BuildingType {
            storage_bonus: 100,
            ..building(11, "warehouse", "Warehouse", vec![g(HAMMERS, 80)], 1)
        };
        let warehouse_expansion = BuildingType {
            storage_bonus: 200,
            ..upgrade(
                warehouse.clone(),
                12,
                "warehouse_expansion",
                "Warehouse Expansion",
                vec![g(HAMMERS, 80), g(TOOLS, 20)],
                1,
            )
        };
        let custom_house = BuildingType {
            abilities: BTreeSet::from([Ability::Export]),
            ..building(13, "custom_house", "Custom House", vec![g(HAMMERS, 150), g(TOOLS, 50)], 3)
        };

        let building_types = vec![
            town_hall,
            carpenter_house,
            lumber_mill,
            blacksmith_house,
            blacksmith_shop,
            armory,
            schoolhouse,
            college,
            stockade,
            docks,
            drydock,
            warehouse,
            warehouse_expansion,
            custom_house,
        ];

        let arctic = TileType {
            polar: true,
            ..tile(7, "arctic", "Arctic", vec![])
        };
        let mountains = TileType {
            settleable: false,
            ..tile(5, "mountains", "Mountains", vec![(ORE, 4), (SILVER, 1)])
        };
        let ocean = TileType {
            land: false,
            settleable: false,
            ..tile(9, "ocean", "Ocean", vec![(FOOD, 4)])
        };
        let high_seas = TileType {
            land: false,
            settleable: false,
            high_seas: true,
            ..tile(10, "high_seas", "High Seas", vec![(FOOD, 2)])
        };
        let tile_types = vec![
            tile(0, "plains", "Plains", vec![(FOOD, 5), (COTTON, 3)]),
            tile(1, "grassland", "Grassland", vec![(FOOD, 3), (TOBACCO, 3)]),
            tile(2, "prairie", "Prairie", vec![(FOOD, 3), (COTTON, 3)]),
            tile(3, "mixed_forest", "Mixed Forest", vec![(FOOD, 3), (LUMBER, 6), (FURS, 3)]),
            tile(4, "hills", "Hills", vec![(FOOD, 4), (ORE, 4)]),
            mountains,
            tile(6, "tundra", "Tundra", vec![(FOOD, 3), (ORE, 2)]),
            arctic,
            tile(8, "swamp", "Swamp", vec![(FOOD, 3), (SUGAR, 3), (LUMBER, 4)]),
            ocean,
            high_seas,
        ];

        let ships = ["Santa Maria", "Pinta", "Nina", "Mayflower", "Golden Hind", "Half Moon"];
        let settlements = [
            "Jamestown", "Plymouth", "Roanoke", "Boston", "Salem", "Providence", "Hartford",
            "New Haven", "Charlestown", "Baltimore",
        ];

        match RuleTable::new(goods_list, unit_types, building_types, tile_types) {
            Ok(rules) => rules.with_names(
                ships.iter().map(|s| s.to_string()).collect(),
                settlements.iter().map(|s| s.to_string()).collect(),
            ),
            Err(e) => panic!("classic rules are inconsistent: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_table_keys_are_unique() {
        let rules = RuleTable::classic();
        let mut keys: Vec<&str> = rules.all_goods().iter().map(|g| g.key.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), rules.all_goods().len());
    }

    #[test]
    fn test_experts_cover_worked_goods() {
        let rules = RuleTable::classic();
        for key in ["food", "lumber", "ore", "hammers", "tools", "bells"] {
            let goods = rules.goods_by_key(key).expect("goods");
            assert!(rules.expert_for(goods).is_some(), "no expert for {key}");
        }
    }

    #[test]
    fn test_upgrades_inherit_base_shape() {
        let rules = RuleTable::classic();
        let expansion = rules.building_type_by_key("warehouse_expansion").expect("expansion");
        let bt = rules.building_type(expansion);
        assert_eq!(bt.level, 2);
        assert_eq!(bt.storage_bonus, 200);
        assert!(!bt.automatic);
    }
}
