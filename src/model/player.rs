//! Players - participants holding relations, progress and owned entities

use std::collections::{BTreeMap, BTreeSet};

use crate::diplomacy::{Stance, Tension};
use crate::registry::ObjectId;
use crate::rules::{Ability, GoodsTypeId};
use crate::visibility::SightCache;

use super::market::Market;
use super::owned::OwnedList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    Colonial,
    Native,
    Rebel,
    Royal,
}

impl PlayerType {
    pub fn is_european(&self) -> bool {
        !matches!(self, PlayerType::Native)
    }
}

#[derive(Debug)]
pub struct Player {
    pub id: ObjectId,
    /// Bit index into the map's explored flags
    pub slot: u8,
    pub name: String,
    pub player_type: PlayerType,
    pub dead: bool,
    pub gold: i64,
    pub tax: u32,
    pub immigration: u32,
    pub immigration_required: u32,
    pub liberty: u32,
    pub father_count: u32,
    /// Sparse; absent means uncontacted
    pub stance: BTreeMap<ObjectId, Stance>,
    /// Sparse; absent means minimum tension
    pub tension: BTreeMap<ObjectId, Tension>,
    pub abilities: BTreeSet<Ability>,
    pub boycotts: BTreeSet<GoodsTypeId>,
    pub market: Market,
    pub units: OwnedList,
    pub settlements: OwnedList,
    pub sight: SightCache,
}

impl Player {
    pub fn new(id: ObjectId, slot: u8, name: String, player_type: PlayerType) -> Self {
        Self {
            id,
            slot,
            name,
            player_type,
            dead: false,
            gold: 0,
            tax: 0,
            immigration: 0,
            immigration_required: 0,
            liberty: 0,
            father_count: 0,
            stance: BTreeMap::new(),
            tension: BTreeMap::new(),
            abilities: BTreeSet::new(),
            boycotts: BTreeSet::new(),
            market: Market::new(),
            units: OwnedList::new(),
            settlements: OwnedList::new(),
            sight: SightCache::new(),
        }
    }

    pub fn is_european(&self) -> bool {
        self.player_type.is_european()
    }

    pub fn stance_toward(&self, other: &ObjectId) -> Stance {
        self.stance.get(other).copied().unwrap_or_default()
    }

    pub fn tension_toward(&self, other: &ObjectId) -> Tension {
        self.tension.get(other).copied().unwrap_or(Tension::MIN)
    }

    pub fn has_contacted(&self, other: &ObjectId) -> bool {
        self.stance_toward(other) != Stance::Uncontacted
    }

    pub fn at_war_with(&self, other: &ObjectId) -> bool {
        self.stance_toward(other) == Stance::War
    }

    pub fn has_ability(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    pub fn can_trade(&self, goods: GoodsTypeId) -> bool {
        !self.boycotts.contains(&goods)
    }

    /// Liberty needed for the next founding father
    pub fn founding_father_cost(&self, factor: u32) -> u32 {
        self.father_count * self.father_count * factor + 50
    }
}
