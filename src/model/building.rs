//! Colony buildings

use serde::{Deserialize, Serialize};

use crate::registry::ObjectId;
use crate::rules::{BuildingTypeId, RuleTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: ObjectId,
    pub building_type: BuildingTypeId,
    pub colony: ObjectId,
    /// Workers (or teachers) inside
    pub units: Vec<ObjectId>,
}

impl Building {
    pub fn new(id: ObjectId, building_type: BuildingTypeId, colony: ObjectId) -> Self {
        Self {
            id,
            building_type,
            colony,
            units: Vec::new(),
        }
    }

    pub fn free_workplaces(&self, rules: &RuleTable) -> u32 {
        rules
            .building_type(self.building_type)
            .workplaces
            .saturating_sub(self.units.len() as u32)
    }
}
