//! Save and restore of a whole game as JSON
//!
//! Entities are written in identity order as tagged records and rebuilt
//! through a `FactoryTable`, so each kind decides how it is reconstructed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{GameError, Result};
use crate::core::types::Turn;
use crate::core::SimulationConfig;
use crate::diplomacy::{Stance, Tension};
use crate::map::{Map, Tile};
use crate::model::{Building, Colony, Market, NameCache, OwnedList, Player, PlayerType, Unit};
use crate::registry::{ObjectId, Registry, TagCounts, TypeTag};
use crate::rules::{Ability, GoodsTypeId, RuleTable};

use super::factory::FactoryTable;
use super::{register_tiles, Entities, Game};

/// Persistent part of a player; caches and locks are rebuilt on load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: ObjectId,
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
    pub stance: BTreeMap<ObjectId, Stance>,
    pub tension: BTreeMap<ObjectId, Tension>,
    pub abilities: BTreeSet<Ability>,
    pub boycotts: BTreeSet<GoodsTypeId>,
    pub market: Market,
    pub units: Vec<ObjectId>,
    pub settlements: Vec<ObjectId>,
}

impl PlayerRecord {
    pub fn from_player(player: &Player) -> Self {
        let stance: BTreeMap<ObjectId, Stance> = player
            .stance
            .iter()
            .filter(|(_, s)| **s != Stance::Uncontacted)
            .map(|(id, s)| (id.clone(), *s))
            .collect();
        let tension = player
            .tension
            .iter()
            .filter(|(id, _)| stance.contains_key(*id))
            .map(|(id, t)| (id.clone(), *t))
            .collect();
        Self {
            id: player.id.clone(),
            slot: player.slot,
            name: player.name.clone(),
            player_type: player.player_type,
            dead: player.dead,
            gold: player.gold,
            tax: player.tax,
            immigration: player.immigration,
            immigration_required: player.immigration_required,
            liberty: player.liberty,
            father_count: player.father_count,
            stance,
            tension,
            abilities: player.abilities.clone(),
            boycotts: player.boycotts.clone(),
            market: player.market.clone(),
            units: player.units.snapshot(),
            settlements: player.settlements.snapshot(),
        }
    }

    pub fn into_player(self) -> Player {
        let mut player = Player::new(self.id, self.slot, self.name, self.player_type);
        player.dead = self.dead;
        player.gold = self.gold;
        player.tax = self.tax;
        player.immigration = self.immigration;
        player.immigration_required = self.immigration_required;
        player.liberty = self.liberty;
        player.father_count = self.father_count;
        player.stance = self.stance;
        player.tension = self.tension;
        player.abilities = self.abilities;
        player.boycotts = self.boycotts;
        player.market = self.market;
        player.units = OwnedList::from_vec(self.units);
        player.settlements = OwnedList::from_vec(self.settlements);
        player
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity")]
pub enum EntityRecord {
    Player(PlayerRecord),
    Unit(Unit),
    Colony(Colony),
    Building(Building),
}

impl EntityRecord {
    pub fn tag(&self) -> TypeTag {
        match self {
            EntityRecord::Player(_) => TypeTag::Player,
            EntityRecord::Unit(_) => TypeTag::Unit,
            EntityRecord::Colony(_) => TypeTag::Colony,
            EntityRecord::Building(_) => TypeTag::Building,
        }
    }

    pub fn id(&self) -> &ObjectId {
        match self {
            EntityRecord::Player(p) => &p.id,
            EntityRecord::Unit(u) => &u.id,
            EntityRecord::Colony(c) => &c.id,
            EntityRecord::Building(b) => &b.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub uuid: Uuid,
    pub turn: Turn,
    pub seed: u64,
    pub next_id: u64,
    pub config: SimulationConfig,
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Tile>,
    pub explored: Vec<u64>,
    pub roster: Vec<ObjectId>,
    pub names: NameCache,
    pub entities: Vec<EntityRecord>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Game {
    /// Capture every live entity in identity order
    pub fn snapshot(&self) -> GameSnapshot {
        let mut entities = Vec::new();
        for (id, entity) in self.registry.scan(&self.entities) {
            let record = match entity.tag {
                TypeTag::Player => self.entities.players.get(entity.key).map(|p| EntityRecord::Player(PlayerRecord::from_player(p))),
                TypeTag::Unit => self.entities.units.get(entity.key).cloned().map(EntityRecord::Unit),
                TypeTag::Colony => self.entities.colonies.get(entity.key).cloned().map(EntityRecord::Colony),
                TypeTag::Building => self.entities.buildings.get(entity.key).cloned().map(EntityRecord::Building),
                TypeTag::Tile => None,
            };
            match record {
                Some(r) => entities.push(r),
                None if entity.tag != TypeTag::Tile => tracing::warn!("snapshot skipped {}", id),
                None => {}
            }
        }
        GameSnapshot {
            uuid: self.uuid,
            turn: self.turn,
            seed: self.seed,
            next_id: self.registry.next_id_value(),
            config: self.config.clone(),
            width: self.map.width(),
            height: self.map.height(),
            tiles: self.map.tiles().cloned().collect(),
            explored: self.map.explored_bits(),
            roster: self.roster.clone(),
            names: self.names.clone(),
            entities,
        }
    }

    /// Rebuild a game from a snapshot
    ///
    /// The random source is reseeded from the stored seed and turn, so a
    /// restored game replays the same draws as every other restore of the
    /// same snapshot.
    pub fn restore(snapshot: GameSnapshot, rules: Arc<RuleTable>, factories: &FactoryTable) -> Result<Self> {
        snapshot.config.validate()?;
        let map = Map::from_parts(snapshot.width, snapshot.height, snapshot.tiles, snapshot.explored)
            .ok_or_else(|| GameError::InvalidAction("snapshot map does not match its size".into()))?;

        let stats = TagCounts::new();
        let mut registry = Registry::new(snapshot.config.sweep_threshold);
        registry.add_listener(Box::new(stats.clone()));
        let entities = Entities::new(map.len() as u32);
        register_tiles(&mut registry, &map, &entities)?;

        let mut game = Self {
            uuid: snapshot.uuid,
            turn: snapshot.turn,
            config: snapshot.config,
            rules,
            registry,
            entities,
            map,
            names: snapshot.names,
            rng: ChaCha8Rng::seed_from_u64(snapshot.seed ^ u64::from(snapshot.turn)),
            roster: Vec::new(),
            seed: snapshot.seed,
            stats,
        };
        for record in snapshot.entities {
            factories.construct(&mut game, record)?;
        }
        for id in &snapshot.roster {
            game.player(id)?;
        }
        game.roster = snapshot.roster;
        game.registry.advance_next_id(snapshot.next_id);
        tracing::info!("restored game {} at turn {}", game.uuid, game.turn);
        Ok(game)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.snapshot().to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path, rules: Arc<RuleTable>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::restore(GameSnapshot::from_json(&json)?, rules, &FactoryTable::standard())
    }
}
