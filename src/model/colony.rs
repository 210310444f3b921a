//! Settlements - European colonies and native camps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::build_queue::{BuildQueue, CompletionAction};
use super::goods::GoodsContainer;
use crate::core::types::{TileCoord, Turn};
use crate::registry::ObjectId;
use crate::rules::GoodsTypeId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementKind {
    Colony,
    /// Native settlement; may host one foreign missionary
    NativeCamp { missionary: Option<ObjectId> },
}

/// Per-goods export and warehouse thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportData {
    pub exported: bool,
    /// Stock kept back when exporting
    pub export_level: u32,
    /// Warn when rising past this many per cargo of capacity
    pub high_level: u32,
    /// Warn when falling below this many per cargo of capacity
    pub low_level: u32,
}

impl Default for ExportData {
    fn default() -> Self {
        Self {
            exported: false,
            export_level: 0,
            high_level: 90,
            low_level: 10,
        }
    }
}

/// How much food a breedable goods may eat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedingData {
    /// Only eat food left over after colonists are fed
    pub consume_only_surplus: bool,
    /// Percent of the available food breeding may use
    pub consume_ratio: u32,
}

impl Default for BreedingData {
    fn default() -> Self {
        Self {
            consume_only_surplus: true,
            consume_ratio: 50,
        }
    }
}

/// A tile a colonist can work from the colony
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonyTile {
    pub coord: TileCoord,
    pub unit: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colony {
    pub id: ObjectId,
    pub name: String,
    pub owner: ObjectId,
    pub tile: TileCoord,
    pub kind: SettlementKind,
    pub goods: GoodsContainer,
    pub export_data: BTreeMap<GoodsTypeId, ExportData>,
    pub breeding: BTreeMap<GoodsTypeId, BreedingData>,
    pub build_queue: BuildQueue,
    pub population_queue: BuildQueue,
    pub buildings: Vec<ObjectId>,
    pub work_tiles: Vec<ColonyTile>,
    /// Accumulated liberty (bells)
    pub liberty: u32,
    pub sons_of_liberty: u32,
    pub old_sons_of_liberty: u32,
    pub production_bonus: i32,
    /// Whether surplus food grows new colonists
    pub makes_new_colonists: bool,
    pub established: Turn,
}

impl Colony {
    pub fn new(id: ObjectId, name: String, owner: ObjectId, tile: TileCoord, kind: SettlementKind, turn: Turn) -> Self {
        Self {
            id,
            name,
            owner,
            tile,
            kind,
            goods: GoodsContainer::new(),
            export_data: BTreeMap::new(),
            breeding: BTreeMap::new(),
            build_queue: BuildQueue::new(CompletionAction::Remove),
            population_queue: BuildQueue::new(CompletionAction::Shuffle),
            buildings: Vec::new(),
            work_tiles: Vec::new(),
            liberty: 0,
            sons_of_liberty: 0,
            old_sons_of_liberty: 0,
            production_bonus: 0,
            makes_new_colonists: true,
            established: turn,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, SettlementKind::NativeCamp { .. })
    }

    pub fn missionary(&self) -> Option<&ObjectId> {
        match &self.kind {
            SettlementKind::NativeCamp { missionary } => missionary.as_ref(),
            SettlementKind::Colony => None,
        }
    }

    pub fn export_data(&self, goods: GoodsTypeId) -> ExportData {
        self.export_data.get(&goods).copied().unwrap_or_default()
    }

    pub fn set_export_data(&mut self, goods: GoodsTypeId, data: ExportData) {
        self.export_data.insert(goods, data);
    }

    pub fn breeding_data(&self, goods: GoodsTypeId) -> BreedingData {
        self.breeding.get(&goods).copied().unwrap_or_default()
    }

    /// Player-settable breeding limits for one goods type
    pub fn set_breeding_data(&mut self, goods: GoodsTypeId, consume_only_surplus: bool, consume_ratio: u32) {
        self.breeding.insert(
            goods,
            BreedingData {
                consume_only_surplus,
                consume_ratio: consume_ratio.min(100),
            },
        );
    }

    pub fn set_makes_new_colonists(&mut self, value: bool) {
        self.makes_new_colonists = value;
    }

    pub fn work_tile(&self, coord: TileCoord) -> Option<&ColonyTile> {
        self.work_tiles.iter().find(|t| t.coord == coord)
    }

    pub fn work_tile_mut(&mut self, coord: TileCoord) -> Option<&mut ColonyTile> {
        self.work_tiles.iter_mut().find(|t| t.coord == coord)
    }

    /// Units working the surrounding land
    pub fn tile_workers(&self) -> impl Iterator<Item = &ObjectId> {
        self.work_tiles.iter().filter_map(|t| t.unit.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeTag;

    fn colony() -> Colony {
        Colony::new(
            ObjectId::new(TypeTag::Colony, 1),
            "Test".into(),
            ObjectId::new(TypeTag::Player, 2),
            TileCoord::new(3, 3),
            SettlementKind::Colony,
            0,
        )
    }

    #[test]
    fn test_defaults() {
        let c = colony();
        assert!(c.makes_new_colonists);
        let data = c.export_data(GoodsTypeId(4));
        assert!(!data.exported);
        assert_eq!((data.low_level, data.high_level), (10, 90));
        let breeding = c.breeding_data(GoodsTypeId(8));
        assert!(breeding.consume_only_surplus);
        assert_eq!(breeding.consume_ratio, 50);
    }

    #[test]
    fn test_breeding_ratio_capped() {
        let mut c = colony();
        c.set_breeding_data(GoodsTypeId(8), false, 250);
        assert_eq!(c.breeding_data(GoodsTypeId(8)).consume_ratio, 100);
        assert!(!c.breeding_data(GoodsTypeId(8)).consume_only_surplus);
    }
}
