//! Name cache for units and settlements
//!
//! Owned by the `Game` and reset whenever a new game starts.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rules::{Ability, RuleTable, UnitTypeId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameCache {
    ship_names: Vec<String>,
    settlement_names: Vec<String>,
    unit_counters: BTreeMap<UnitTypeId, u32>,
    settlement_counter: u32,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refill from the rule table, shuffling the ship names
    pub fn reset<R: Rng>(&mut self, rules: &RuleTable, rng: &mut R) {
        self.ship_names = rules.ship_names().to_vec();
        self.ship_names.shuffle(rng);
        self.settlement_names = rules.settlement_names().to_vec();
        self.settlement_names.reverse();
        self.unit_counters.clear();
        self.settlement_counter = 0;
    }

    /// Name for a newly built unit; born colonists stay anonymous
    pub fn next_unit_name(&mut self, rules: &RuleTable, unit_type: UnitTypeId) -> Option<String> {
        let ut = rules.unit_type(unit_type);
        if ut.has_ability(Ability::BornInColony) {
            return None;
        }
        if ut.has_ability(Ability::Naval) {
            if let Some(name) = self.ship_names.pop() {
                return Some(name);
            }
        }
        let counter = self.unit_counters.entry(unit_type).or_insert(0);
        *counter += 1;
        Some(format!("{} {}", ut.name, counter))
    }

    pub fn next_settlement_name(&mut self, owner_name: &str) -> String {
        if let Some(name) = self.settlement_names.pop() {
            return name;
        }
        self.settlement_counter += 1;
        format!("{} {}", owner_name, self.settlement_counter)
    }
}
