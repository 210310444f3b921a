//! Player-addressed model messages

use serde::{Deserialize, Serialize};

use crate::registry::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Default,
    Warning,
    UnitAdded,
    UnitLost,
    UnitImproved,
    BuildingCompleted,
    MissingGoods,
    GoodsMovement,
    WarehouseCapacity,
    SonsOfLiberty,
    Government,
    Foreign,
}

/// A message for one player, keyed for localization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub message_type: MessageType,
    pub key: String,
    pub source: ObjectId,
    pub params: Vec<(String, String)>,
}

impl ModelMessage {
    pub fn new(message_type: MessageType, key: &str, source: &ObjectId) -> Self {
        Self {
            message_type,
            key: key.to_string(),
            source: source.clone(),
            params: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
