use thiserror::Error;

use crate::core::config::ConfigError;
use crate::diplomacy::DiplomacyError;
use crate::registry::{ObjectId, RegistryError};
use crate::rules::RulesError;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Entity not found: {0}")]
    EntityNotFound(ObjectId),

    #[error("Entity {id} is not a {expected}")]
    WrongKind { id: ObjectId, expected: &'static str },

    #[error("Tile out of bounds: {0}")]
    TileOutOfBounds(crate::core::types::TileCoord),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Diplomacy error: {0}")]
    Diplomacy(#[from] DiplomacyError),

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
