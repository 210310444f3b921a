//! Colonia - turn-based colonial strategy simulation core
//!
//! The `Game` aggregate owns every entity. The registry indexes them by
//! stable identity, diplomacy and visibility derive relations and sight,
//! and `turn` advances settlements one turn at a time.

pub mod core;
pub mod diplomacy;
pub mod game;
pub mod map;
pub mod model;
pub mod registry;
pub mod rules;
pub mod siting;
pub mod sync;
pub mod turn;
pub mod visibility;
