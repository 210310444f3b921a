//! Per-kind constructors used when rebuilding entities from records

use std::collections::BTreeMap;

use crate::core::error::{GameError, Result};
use crate::registry::{ObjectId, TypeTag};

use super::snapshot::EntityRecord;
use super::Game;

pub type Constructor = fn(&mut Game, EntityRecord) -> Result<ObjectId>;

/// Maps each entity kind to the function that rebuilds it
#[derive(Clone)]
pub struct FactoryTable {
    constructors: BTreeMap<TypeTag, Constructor>,
}

impl std::fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl FactoryTable {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Constructors for every persisted kind
    pub fn standard() -> Self {
        Self::empty()
            .with(TypeTag::Player, construct_player)
            .with(TypeTag::Unit, construct_unit)
            .with(TypeTag::Colony, construct_colony)
            .with(TypeTag::Building, construct_building)
    }

    /// Add or replace the constructor for one kind
    pub fn with(mut self, tag: TypeTag, constructor: Constructor) -> Self {
        self.constructors.insert(tag, constructor);
        self
    }

    pub fn construct(&self, game: &mut Game, record: EntityRecord) -> Result<ObjectId> {
        let tag = record.tag();
        let constructor = self.constructors.get(&tag).ok_or_else(|| {
            GameError::InvalidAction(format!("no constructor for {} records", tag.as_str()))
        })?;
        constructor(game, record)
    }
}

impl Default for FactoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn mismatch(record: &EntityRecord, expected: &'static str) -> GameError {
    GameError::WrongKind {
        id: record.id().clone(),
        expected,
    }
}

fn construct_player(game: &mut Game, record: EntityRecord) -> Result<ObjectId> {
    match record {
        EntityRecord::Player(p) => game.insert_player(p.into_player()),
        other => Err(mismatch(&other, "player")),
    }
}

fn construct_unit(game: &mut Game, record: EntityRecord) -> Result<ObjectId> {
    match record {
        EntityRecord::Unit(u) => game.insert_unit(u),
        other => Err(mismatch(&other, "unit")),
    }
}

fn construct_colony(game: &mut Game, record: EntityRecord) -> Result<ObjectId> {
    match record {
        EntityRecord::Colony(c) => game.insert_colony(c),
        other => Err(mismatch(&other, "colony")),
    }
}

fn construct_building(game: &mut Game, record: EntityRecord) -> Result<ObjectId> {
    match record {
        EntityRecord::Building(b) => game.insert_building(b),
        other => Err(mismatch(&other, "building")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimulationConfig;
    use crate::model::{PlayerType, Unit, UnitLocation};
    use crate::rules::RuleTable;
    use std::sync::Arc;

    #[test]
    fn test_missing_constructor_rejected() {
        let rules = Arc::new(RuleTable::classic());
        let plains = rules.tile_type_by_key("plains").expect("plains");
        let mut game = Game::new(Arc::clone(&rules), SimulationConfig::default(), 4, 4, plains, 5).expect("game");
        let owner = game.add_player("Dutch", PlayerType::Colonial).expect("player");
        let unit = Unit::new(
            ObjectId::new(TypeTag::Unit, 500),
            rules.default_unit_type(),
            owner,
            UnitLocation::Europe,
        );
        let table = FactoryTable::empty().with(TypeTag::Player, construct_player);
        assert!(table.construct(&mut game, EntityRecord::Unit(unit.clone())).is_err());

        let id = FactoryTable::standard()
            .construct(&mut game, EntityRecord::Unit(unit))
            .expect("unit");
        assert!(game.unit(&id).is_ok());
        assert_eq!(game.registry.next_id_value(), 501);
    }
}
