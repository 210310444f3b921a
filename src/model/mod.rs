pub mod build_queue;
pub mod building;
pub mod colony;
pub mod goods;
pub mod market;
pub mod message;
pub mod names;
pub mod owned;
pub mod player;
pub mod unit;

pub use build_queue::{BuildQueue, CompletionAction};
pub use building::Building;
pub use colony::{BreedingData, Colony, ColonyTile, ExportData, SettlementKind};
pub use goods::GoodsContainer;
pub use market::Market;
pub use message::{MessageType, ModelMessage};
pub use names::NameCache;
pub use owned::OwnedList;
pub use player::{Player, PlayerType};
pub use unit::{Unit, UnitLocation};
