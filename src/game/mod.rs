//! The Game aggregate
//!
//! Owns every entity through typed arenas, the registry indexing them by
//! identity, the map, the rule table and all per-game state (configuration,
//! name cache, random source). Nothing here is global.

pub mod factory;
pub mod integrity;
pub mod scenario;
pub mod snapshot;

pub use factory::FactoryTable;
pub use integrity::Integrity;
pub use scenario::{Scenario, ScenarioBuilder};
pub use snapshot::{EntityRecord, GameSnapshot, PlayerRecord};

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::core::error::{GameError, Result};
use crate::core::types::{TileCoord, Turn};
use crate::core::SimulationConfig;
use crate::map::{Map, MAX_PLAYER_SLOTS};
use crate::model::{
    Building, Colony, ColonyTile, NameCache, Player, PlayerType, SettlementKind, Unit, UnitLocation,
};
use crate::registry::{Arena, EntityRef, EntityStore, ObjectId, Registry, SlotKey, TagCounts, TypeTag};
use crate::rules::{Ability, Buildable, BuildingTypeId, GoodsTypeId, RuleTable, TileTypeId, UnitTypeId};
use crate::sync::{ChangeSet, See};
use crate::visibility;

/// Typed arenas owning the game's entities
#[derive(Debug, Default)]
pub struct Entities {
    pub players: Arena<Player>,
    pub units: Arena<Unit>,
    pub colonies: Arena<Colony>,
    pub buildings: Arena<Building>,
    tile_count: u32,
}

impl Entities {
    pub fn new(tile_count: u32) -> Self {
        Self {
            tile_count,
            ..Self::default()
        }
    }
}

impl EntityStore for Entities {
    fn is_live(&self, entity: EntityRef) -> bool {
        match entity.tag {
            TypeTag::Player => self.players.contains(entity.key),
            TypeTag::Unit => self.units.contains(entity.key),
            TypeTag::Colony => self.colonies.contains(entity.key),
            TypeTag::Building => self.buildings.contains(entity.key),
            TypeTag::Tile => entity.key.index() < self.tile_count && entity.key.generation() == 0,
        }
    }
}

#[derive(Debug)]
pub struct Game {
    pub uuid: Uuid,
    pub turn: Turn,
    pub config: SimulationConfig,
    pub rules: Arc<RuleTable>,
    pub registry: Registry,
    pub entities: Entities,
    pub map: Map,
    pub names: NameCache,
    pub rng: ChaCha8Rng,
    roster: Vec<ObjectId>,
    seed: u64,
    stats: TagCounts,
}

impl Game {
    /// Start a new game on a map filled with one terrain type
    pub fn new(
        rules: Arc<RuleTable>,
        config: SimulationConfig,
        width: u32,
        height: u32,
        fill: TileTypeId,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(GameError::InvalidAction("map must have at least one tile".into()));
        }
        let stats = TagCounts::new();
        let mut registry = Registry::new(config.sweep_threshold);
        registry.add_listener(Box::new(stats.clone()));

        let mut map = Map::new(width, height, fill, || registry.next_id(TypeTag::Tile));
        map.compute_high_seas(&rules);
        let entities = Entities::new(map.len() as u32);
        register_tiles(&mut registry, &map, &entities)?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut names = NameCache::new();
        names.reset(&rules, &mut rng);

        tracing::info!("new game {}x{} (seed {})", width, height, seed);
        Ok(Self {
            uuid: Uuid::new_v4(),
            turn: 1,
            config,
            rules,
            registry,
            entities,
            map,
            names,
            rng,
            roster: Vec::new(),
            seed,
            stats,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Change one tile's terrain; call `refresh_high_seas` after a batch
    pub fn set_terrain(&mut self, coord: TileCoord, tile_type: TileTypeId) -> Result<()> {
        if !self.map.contains(coord) {
            return Err(GameError::TileOutOfBounds(coord));
        }
        self.map.set_tile_type(coord, tile_type);
        Ok(())
    }

    pub fn refresh_high_seas(&mut self) {
        let rules = Arc::clone(&self.rules);
        self.map.compute_high_seas(&rules);
    }

    // === PLAYERS ===

    pub fn add_player(&mut self, name: &str, player_type: PlayerType) -> Result<ObjectId> {
        if self.roster.len() >= MAX_PLAYER_SLOTS as usize {
            return Err(GameError::InvalidAction(format!(
                "no free player slot for {}",
                name
            )));
        }
        let id = self.registry.next_id(TypeTag::Player);
        let mut player = Player::new(id.clone(), self.roster.len() as u8, name.to_string(), player_type);
        if player.is_european() {
            player.immigration_required = self.rules.tunables.initial_immigration;
        }
        self.insert_player(player)?;
        self.roster.push(id.clone());
        tracing::debug!("added player {} ({})", name, id);
        Ok(id)
    }

    /// Players in slot order
    pub fn roster(&self) -> &[ObjectId] {
        &self.roster
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.roster.iter().filter_map(|id| self.player(id).ok())
    }

    pub fn live_player_ids(&self) -> Vec<ObjectId> {
        self.players()
            .filter(|p| !p.dead)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Players are flagged dead, never removed
    pub fn mark_dead(&mut self, id: &ObjectId) -> Result<()> {
        let player = self.player_mut(id)?;
        player.dead = true;
        tracing::info!("player {} is dead", player.name);
        Ok(())
    }

    // === LOOKUP ===

    fn lookup(&self, id: &ObjectId, tag: TypeTag) -> Result<SlotKey> {
        if id.tag() != Some(tag) {
            return Err(GameError::WrongKind {
                id: id.clone(),
                expected: tag.as_str(),
            });
        }
        self.registry
            .peek(id, &self.entities)
            .map(|e| e.key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    /// Evicting lookup; a decayed entry is removed from the registry
    pub fn resolve(&mut self, id: &ObjectId) -> Option<EntityRef> {
        self.registry.resolve(id, &self.entities)
    }

    pub fn player(&self, id: &ObjectId) -> Result<&Player> {
        let key = self.lookup(id, TypeTag::Player)?;
        self.entities
            .players
            .get(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn player_mut(&mut self, id: &ObjectId) -> Result<&mut Player> {
        let key = self.lookup(id, TypeTag::Player)?;
        self.entities
            .players
            .get_mut(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn unit(&self, id: &ObjectId) -> Result<&Unit> {
        let key = self.lookup(id, TypeTag::Unit)?;
        self.entities
            .units
            .get(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn unit_mut(&mut self, id: &ObjectId) -> Result<&mut Unit> {
        let key = self.lookup(id, TypeTag::Unit)?;
        self.entities
            .units
            .get_mut(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn colony(&self, id: &ObjectId) -> Result<&Colony> {
        let key = self.lookup(id, TypeTag::Colony)?;
        self.entities
            .colonies
            .get(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn colony_mut(&mut self, id: &ObjectId) -> Result<&mut Colony> {
        let key = self.lookup(id, TypeTag::Colony)?;
        self.entities
            .colonies
            .get_mut(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn building(&self, id: &ObjectId) -> Result<&Building> {
        let key = self.lookup(id, TypeTag::Building)?;
        self.entities
            .buildings
            .get(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn building_mut(&mut self, id: &ObjectId) -> Result<&mut Building> {
        let key = self.lookup(id, TypeTag::Building)?;
        self.entities
            .buildings
            .get_mut(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))
    }

    pub fn tile_coord(&self, id: &ObjectId) -> Result<TileCoord> {
        let key = self.lookup(id, TypeTag::Tile)?;
        Ok(self.map.coord_of(key.index() as usize))
    }

    // === INSERTION ===
    // Each insert puts the entity in its arena and registers it, undoing the
    // arena insert if registration fails.

    pub(crate) fn insert_player(&mut self, player: Player) -> Result<ObjectId> {
        let id = player.id.clone();
        let key = self.entities.players.insert(player);
        if let Err(e) = self
            .registry
            .register(id.clone(), EntityRef::new(TypeTag::Player, key), &self.entities)
        {
            self.entities.players.remove(key);
            return Err(e.into());
        }
        Ok(id)
    }

    pub(crate) fn insert_unit(&mut self, unit: Unit) -> Result<ObjectId> {
        let id = unit.id.clone();
        let key = self.entities.units.insert(unit);
        if let Err(e) = self
            .registry
            .register(id.clone(), EntityRef::new(TypeTag::Unit, key), &self.entities)
        {
            self.entities.units.remove(key);
            return Err(e.into());
        }
        Ok(id)
    }

    pub(crate) fn insert_colony(&mut self, colony: Colony) -> Result<ObjectId> {
        let id = colony.id.clone();
        let key = self.entities.colonies.insert(colony);
        if let Err(e) = self
            .registry
            .register(id.clone(), EntityRef::new(TypeTag::Colony, key), &self.entities)
        {
            self.entities.colonies.remove(key);
            return Err(e.into());
        }
        Ok(id)
    }

    pub(crate) fn insert_building(&mut self, building: Building) -> Result<ObjectId> {
        let id = building.id.clone();
        let key = self.entities.buildings.insert(building);
        if let Err(e) = self
            .registry
            .register(id.clone(), EntityRef::new(TypeTag::Building, key), &self.entities)
        {
            self.entities.buildings.remove(key);
            return Err(e.into());
        }
        Ok(id)
    }

    // === UNITS ===

    /// Create a unit at a validated location
    pub fn create_unit(
        &mut self,
        owner: &ObjectId,
        unit_type: UnitTypeId,
        location: UnitLocation,
    ) -> Result<ObjectId> {
        self.player(owner)?;
        self.check_location(None, unit_type, &location)?;
        let rules = Arc::clone(&self.rules);
        let id = self.registry.next_id(TypeTag::Unit);
        let mut unit = Unit::new(id.clone(), unit_type, owner.clone(), location.clone());
        unit.name = self.names.next_unit_name(&rules, unit_type);
        unit.work_type = self.default_work_type(&location);
        self.insert_unit(unit)?;
        self.attach(&id, &location)?;

        if let Some(tile) = location.map_tile() {
            self.explore_around(owner, tile, rules.unit_type(unit_type).line_of_sight);
        }
        let player = self.player_mut(owner)?;
        player.units.push(id.clone());
        player.sight.invalidate();
        tracing::debug!("created {} ({}) at {:?}", id, rules.unit_type(unit_type).name, location);
        Ok(id)
    }

    fn default_work_type(&self, location: &UnitLocation) -> Option<GoodsTypeId> {
        match location {
            UnitLocation::Building(b) => self
                .building(b)
                .ok()
                .and_then(|b| self.rules.building_type(b.building_type).output),
            UnitLocation::WorkTile { .. } => Some(self.rules.primary_food()),
            _ => None,
        }
    }

    /// Can a unit of `unit_type` (optionally an existing unit) stand at `location`
    pub fn check_location(
        &self,
        unit: Option<&ObjectId>,
        unit_type: UnitTypeId,
        location: &UnitLocation,
    ) -> Result<()> {
        let ut = self.rules.unit_type(unit_type);
        match location {
            UnitLocation::Tile(c) => {
                if !self.map.contains(*c) {
                    return Err(GameError::TileOutOfBounds(*c));
                }
            }
            UnitLocation::Building(b) => {
                let building = self.building(b)?;
                let bt = self.rules.building_type(building.building_type);
                let present = unit.is_some_and(|u| building.units.contains(u));
                if !present && building.units.len() as u32 >= bt.workplaces {
                    return Err(GameError::InvalidAction(format!("{} is full", bt.name)));
                }
                if !ut.is_person() || !bt.accepts_skill(ut.skill) {
                    return Err(GameError::InvalidAction(format!(
                        "{} cannot work in {}",
                        ut.name, bt.name
                    )));
                }
            }
            UnitLocation::WorkTile { colony, tile } => {
                let c = self.colony(colony)?;
                let Some(work_tile) = c.work_tile(*tile) else {
                    return Err(GameError::InvalidAction(format!(
                        "{} is not worked by {}",
                        tile, c.name
                    )));
                };
                if work_tile.unit.is_some() && work_tile.unit.as_ref() != unit {
                    return Err(GameError::InvalidAction(format!("{} is occupied", tile)));
                }
                if !ut.is_person() {
                    return Err(GameError::InvalidAction(format!("{} cannot work land", ut.name)));
                }
                let claimed_elsewhere = self
                    .map
                    .tile(*tile)
                    .and_then(|t| t.owning_settlement.as_ref())
                    .is_some_and(|s| s != colony);
                if claimed_elsewhere {
                    return Err(GameError::InvalidAction(format!(
                        "{} is used by another settlement",
                        tile
                    )));
                }
            }
            UnitLocation::Carrier(carrier) => {
                if Some(carrier) == unit {
                    return Err(GameError::InvalidAction("a unit cannot carry itself".into()));
                }
                self.unit(carrier)?;
            }
            UnitLocation::Europe => {}
        }
        Ok(())
    }

    fn attach(&mut self, unit: &ObjectId, location: &UnitLocation) -> Result<()> {
        match location {
            UnitLocation::Building(b) => {
                let building = self.building_mut(b)?;
                if !building.units.contains(unit) {
                    building.units.push(unit.clone());
                }
            }
            UnitLocation::WorkTile { colony, tile } => {
                let owner = {
                    let c = self.colony_mut(colony)?;
                    if let Some(work_tile) = c.work_tile_mut(*tile) {
                        work_tile.unit = Some(unit.clone());
                    }
                    c.owner.clone()
                };
                if let Some(t) = self.map.tile_mut(*tile) {
                    if t.owner.is_none() {
                        t.owner = Some(owner);
                        t.owning_settlement = Some(colony.clone());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn detach(&mut self, unit: &ObjectId, location: &UnitLocation) {
        match location {
            UnitLocation::Building(b) => {
                if let Ok(building) = self.building_mut(b) {
                    building.units.retain(|u| u != unit);
                }
            }
            UnitLocation::WorkTile { colony, tile } => {
                if let Ok(c) = self.colony_mut(colony) {
                    if let Some(work_tile) = c.work_tile_mut(*tile) {
                        if work_tile.unit.as_ref() == Some(unit) {
                            work_tile.unit = None;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    pub fn move_unit(&mut self, id: &ObjectId, to: UnitLocation) -> Result<()> {
        let (unit_type, owner, from) = {
            let u = self.unit(id)?;
            (u.unit_type, u.owner.clone(), u.location.clone())
        };
        if from == to {
            return Ok(());
        }
        self.check_location(Some(id), unit_type, &to)?;
        self.detach(id, &from);
        self.attach(id, &to)?;
        let work_type = self.default_work_type(&to);
        let building_output = matches!(to, UnitLocation::Building(_));

        if let Some(tile) = to.map_tile() {
            self.explore_around(&owner, tile, self.rules.unit_type(unit_type).line_of_sight);
        }
        let unit = self.unit_mut(id)?;
        unit.location = to;
        if building_output || unit.work_type.is_none() {
            if unit.work_type != work_type {
                unit.experience = 0;
            }
            unit.work_type = work_type;
        }
        if let Ok(p) = self.player(&owner) {
            p.sight.invalidate();
        }
        Ok(())
    }

    /// Switch what a unit produces; experience does not carry over
    pub fn set_work_type(&mut self, id: &ObjectId, goods: Option<GoodsTypeId>) -> Result<()> {
        let unit = self.unit_mut(id)?;
        if unit.work_type != goods {
            unit.work_type = goods;
            unit.experience = 0;
        }
        Ok(())
    }

    pub fn change_unit_type(&mut self, id: &ObjectId, unit_type: UnitTypeId) -> Result<()> {
        let unit = self.unit_mut(id)?;
        unit.unit_type = unit_type;
        unit.experience = 0;
        let owner = unit.owner.clone();
        visibility::invalidate(self, &owner);
        Ok(())
    }

    /// Remove a unit and everything it carries
    pub fn dispose_unit(&mut self, id: &ObjectId, reason: &str) -> Result<Unit> {
        let key = self.lookup(id, TypeTag::Unit)?;
        let carrier = UnitLocation::Carrier(id.clone());
        let passengers: Vec<ObjectId> = self
            .entities
            .units
            .iter()
            .filter(|(_, u)| u.location == carrier)
            .map(|(_, u)| u.id.clone())
            .collect();
        for passenger in passengers {
            self.dispose_unit(&passenger, reason)?;
        }

        let unit = self
            .entities
            .units
            .remove(key)
            .ok_or_else(|| GameError::EntityNotFound(id.clone()))?;
        self.detach(id, &unit.location);
        for other in [&unit.teacher, &unit.student].into_iter().flatten() {
            if let Ok(o) = self.unit_mut(other) {
                if o.student.as_ref() == Some(id) {
                    o.student = None;
                }
                if o.teacher.as_ref() == Some(id) {
                    o.teacher = None;
                    o.turns_of_training = 0;
                }
            }
        }
        let mut was_missionary = false;
        for colony in self.entities.colonies.values_mut() {
            if let SettlementKind::NativeCamp { missionary } = &mut colony.kind {
                if missionary.as_ref() == Some(id) {
                    *missionary = None;
                    was_missionary = true;
                }
            }
        }
        if let Ok(p) = self.player(&unit.owner) {
            p.units.remove(id);
            p.sight.invalidate();
        }
        if was_missionary {
            visibility::invalidate_all(self);
        }
        self.registry.deregister(id, reason, &self.entities);
        Ok(unit)
    }

    /// Units standing directly on a map tile
    pub fn units_at(&self, coord: TileCoord) -> Vec<ObjectId> {
        let here = UnitLocation::Tile(coord);
        self.entities
            .units
            .iter()
            .filter(|(_, u)| u.location == here)
            .map(|(_, u)| u.id.clone())
            .collect()
    }

    // === SETTLEMENTS ===

    /// Found a settlement, claiming the center and free adjacent land
    ///
    /// European players get a colony with the automatic buildings; native
    /// players get a camp.
    pub fn found_colony(&mut self, owner: &ObjectId, coord: TileCoord, name: Option<&str>) -> Result<ObjectId> {
        let rules = Arc::clone(&self.rules);
        let (owner_name, native) = {
            let p = self.player(owner)?;
            (p.name.clone(), !p.is_european())
        };
        let tile = self.map.tile(coord).ok_or(GameError::TileOutOfBounds(coord))?;
        if tile.has_settlement() {
            return Err(GameError::InvalidAction(format!("{} already holds a settlement", coord)));
        }
        if !rules.tile_type(tile.tile_type).land {
            return Err(GameError::InvalidAction(format!("cannot settle on water at {}", coord)));
        }

        let name = match name {
            Some(n) => n.to_string(),
            None => self.names.next_settlement_name(&owner_name),
        };
        let id = self.registry.next_id(TypeTag::Colony);
        let kind = if native {
            SettlementKind::NativeCamp { missionary: None }
        } else {
            SettlementKind::Colony
        };
        let mut colony = Colony::new(id.clone(), name.clone(), owner.clone(), coord, kind, self.turn);
        colony.work_tiles = self
            .map
            .surrounding(coord, 1)
            .into_iter()
            .map(|c| ColonyTile { coord: c, unit: None })
            .collect();
        if !native {
            colony.population_queue.push(Buildable::Unit(rules.default_unit_type()));
        }
        self.insert_colony(colony)?;

        for c in self.map.within(coord, 1) {
            let Some(t) = self.map.tile_mut(c) else { continue };
            let free = t.owner.is_none() || (t.owner.as_ref() == Some(owner) && t.owning_settlement.is_none());
            if c == coord || free {
                t.owner = Some(owner.clone());
                t.owning_settlement = Some(id.clone());
            }
            if c == coord {
                t.settlement = Some(id.clone());
                t.lost_city_rumour = false;
            }
        }
        if !native {
            for bt in rules.automatic_buildings() {
                self.add_building(&id, bt.id)?;
            }
        }
        self.player(owner)?.settlements.push(id.clone());
        let radius = self.colony(&id).map(|c| self.colony_line_of_sight(c))?;
        self.explore_around(owner, coord, radius);
        visibility::invalidate_all(self);
        tracing::info!("{} founded {} ({}) at {}", owner_name, name, id, coord);
        Ok(id)
    }

    pub fn add_building(&mut self, colony: &ObjectId, building_type: BuildingTypeId) -> Result<ObjectId> {
        self.colony(colony)?;
        let id = self.registry.next_id(TypeTag::Building);
        self.insert_building(Building::new(id.clone(), building_type, colony.clone()))?;
        self.colony_mut(colony)?.buildings.push(id.clone());
        Ok(id)
    }

    /// Remove a settlement mid-turn
    ///
    /// Its workers are disposed, its buildings dropped from their arena
    /// (their registry entries decay), its land released. Queued updates
    /// for all of them are suppressed in favour of one removal the owner
    /// always receives.
    pub fn dispose_colony(&mut self, id: &ObjectId, cs: &mut ChangeSet) -> Result<()> {
        let (owner, tile, buildings, name) = {
            let c = self.colony(id)?;
            (c.owner.clone(), c.tile, c.buildings.clone(), c.name.clone())
        };
        let workers = self.colony_units(id);
        for w in &workers {
            self.dispose_unit(w, "settlement disposed")?;
        }
        let key = self.lookup(id, TypeTag::Colony)?;
        self.entities.colonies.remove(key);
        for b in &buildings {
            if let Ok(k) = self.lookup(b, TypeTag::Building) {
                self.entities.buildings.remove(k);
            }
        }
        self.map.release_claims(id);
        if let Ok(p) = self.player(&owner) {
            p.settlements.remove(id);
        }
        self.registry.deregister(id, "disposed", &self.entities);

        let mut gone = vec![id.clone()];
        gone.extend(workers);
        gone.extend(buildings);
        cs.suppress_updates_for(&gone);
        cs.add_remove(See::perhaps().always(&owner), id.clone(), Some(tile));
        visibility::invalidate_all(self);
        tracing::info!("disposed settlement {} ({}) at {}", name, id, tile);
        Ok(())
    }

    // === COLONY QUERIES ===

    /// Workers inside buildings and on work tiles
    pub fn colony_units(&self, id: &ObjectId) -> Vec<ObjectId> {
        let Ok(colony) = self.colony(id) else { return Vec::new() };
        let mut units: Vec<ObjectId> = colony
            .buildings
            .iter()
            .filter_map(|b| self.building(b).ok())
            .flat_map(|b| b.units.iter().cloned())
            .collect();
        units.extend(colony.tile_workers().cloned());
        units
    }

    pub fn colony_unit_count(&self, id: &ObjectId) -> usize {
        self.colony_units(id).len()
    }

    pub fn colony_buildings<'a>(&'a self, colony: &'a Colony) -> impl Iterator<Item = &'a Building> + 'a {
        colony.buildings.iter().filter_map(|b| self.building(b).ok())
    }

    /// The colony's building in the upgrade chain rooted at `root`
    pub fn colony_building_of_root(&self, colony: &Colony, root: BuildingTypeId) -> Option<ObjectId> {
        self.colony_buildings(colony)
            .find(|b| self.rules.building_root(b.building_type) == root)
            .map(|b| b.id.clone())
    }

    /// Storage limit per goods type
    pub fn warehouse_capacity(&self, colony: &Colony) -> u32 {
        let bonus = self
            .colony_buildings(colony)
            .map(|b| self.rules.building_type(b.building_type).storage_bonus)
            .max()
            .unwrap_or(0);
        self.rules.tunables.warehouse_base_capacity + bonus
    }

    pub fn colony_has_ability(&self, colony: &Colony, ability: Ability) -> bool {
        if ability == Ability::Coastal {
            return self.map.is_coastal(colony.tile, &self.rules);
        }
        self.colony_buildings(colony)
            .any(|b| self.rules.building_type(b.building_type).has_ability(ability))
    }

    /// Mark everything within `radius` of `coord` explored for `owner`
    ///
    /// Exploration is permanent and independent of fog of war.
    pub fn explore_around(&self, owner: &ObjectId, coord: TileCoord, radius: u32) -> usize {
        let Ok(player) = self.player(owner) else { return 0 };
        let fresh = self.map.mark_explored(player.slot, &self.map.within(coord, radius));
        if fresh > 0 {
            tracing::trace!("{} explored {} tiles around {}", owner, fresh, coord);
        }
        fresh
    }

    pub fn colony_line_of_sight(&self, colony: &Colony) -> u32 {
        let bonus = self
            .colony_buildings(colony)
            .map(|b| self.rules.building_type(b.building_type).line_of_sight_bonus)
            .max()
            .unwrap_or(0);
        self.config.colony_line_of_sight + bonus
    }

    /// Coastal with a water route to the high seas
    pub fn is_connected_port(&self, colony: &Colony) -> bool {
        self.map.is_coastal(colony.tile, &self.rules)
            && self.map.tile(colony.tile).is_some_and(|t| t.high_seas_count.is_some())
    }

    /// Live entity counts per tag
    pub fn statistics(&self) -> BTreeMap<TypeTag, usize> {
        self.stats.snapshot()
    }
}

fn register_tiles(registry: &mut Registry, map: &Map, entities: &Entities) -> Result<()> {
    for (i, tile) in map.tiles().enumerate() {
        registry.register(
            tile.id.clone(),
            EntityRef::new(TypeTag::Tile, SlotKey::fixed(i as u32)),
            entities,
        )?;
    }
    Ok(())
}
