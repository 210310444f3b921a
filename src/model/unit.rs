//! Units - colonists, soldiers, wagons and ships

use serde::{Deserialize, Serialize};

use crate::core::types::TileCoord;
use crate::registry::ObjectId;
use crate::rules::{GoodsTypeId, UnitTypeId};

/// Where a unit currently is
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitLocation {
    /// Directly on the map
    Tile(TileCoord),
    /// Working inside a colony building
    Building(ObjectId),
    /// Working a colony's surrounding land
    WorkTile { colony: ObjectId, tile: TileCoord },
    /// Embarked on another unit
    Carrier(ObjectId),
    /// In the remote home port
    Europe,
}

impl UnitLocation {
    /// Map tile when the unit stands directly on the map
    pub fn map_tile(&self) -> Option<TileCoord> {
        match self {
            UnitLocation::Tile(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_work_location(&self) -> bool {
        matches!(self, UnitLocation::Building(_) | UnitLocation::WorkTile { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: ObjectId,
    pub unit_type: UnitTypeId,
    pub owner: ObjectId,
    pub location: UnitLocation,
    pub name: Option<String>,
    /// Goods this unit produces at its work location
    pub work_type: Option<GoodsTypeId>,
    pub experience: u32,
    pub student: Option<ObjectId>,
    pub teacher: Option<ObjectId>,
    pub turns_of_training: u32,
}

impl Unit {
    pub fn new(id: ObjectId, unit_type: UnitTypeId, owner: ObjectId, location: UnitLocation) -> Self {
        Self {
            id,
            unit_type,
            owner,
            location,
            name: None,
            work_type: None,
            experience: 0,
            student: None,
            teacher: None,
            turns_of_training: 0,
        }
    }

    pub fn display_name<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(type_name)
    }
}
