//! Differential update set
//!
//! Every mutation the simulation makes is recorded with the scope of
//! players allowed to learn about it. The network layer turns the set into
//! per-player updates; nothing here is broadcast unconditionally.

use crate::core::types::TileCoord;
use crate::game::Game;
use crate::model::{ModelMessage, UnitLocation};
use crate::registry::{ObjectId, TypeTag};
use crate::visibility;

/// Which players receive a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum See {
    Only(ObjectId),
    AllExcept(ObjectId),
    /// Players that can currently see the entity's tile
    Perhaps {
        always: Option<ObjectId>,
        except: Option<ObjectId>,
    },
}

impl See {
    pub fn only(player: &ObjectId) -> Self {
        See::Only(player.clone())
    }

    pub fn all_except(player: &ObjectId) -> Self {
        See::AllExcept(player.clone())
    }

    pub fn perhaps() -> Self {
        See::Perhaps {
            always: None,
            except: None,
        }
    }

    /// Include `player` even without sight of the tile
    pub fn always(self, player: &ObjectId) -> Self {
        match self {
            See::Perhaps { except, .. } => See::Perhaps {
                always: Some(player.clone()),
                except,
            },
            other => other,
        }
    }

    pub fn except(self, player: &ObjectId) -> Self {
        match self {
            See::Perhaps { always, .. } => See::Perhaps {
                always,
                except: Some(player.clone()),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Full entity state
    Update { see: See, entity: ObjectId },
    /// Named fields only
    Partial {
        see: See,
        entity: ObjectId,
        fields: Vec<String>,
    },
    /// Entity gone; the tile it stood on scopes `Perhaps`
    Remove {
        see: See,
        entity: ObjectId,
        tile: Option<TileCoord>,
    },
}

impl Change {
    pub fn entity(&self) -> &ObjectId {
        match self {
            Change::Update { entity, .. }
            | Change::Partial { entity, .. }
            | Change::Remove { entity, .. } => entity,
        }
    }

    pub fn see(&self) -> &See {
        match self {
            Change::Update { see, .. } | Change::Partial { see, .. } | Change::Remove { see, .. } => see,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
    messages: Vec<(ObjectId, ModelMessage)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, see: See, entity: ObjectId) {
        self.changes.push(Change::Update { see, entity });
    }

    pub fn add_partial(&mut self, see: See, entity: ObjectId, fields: &[&str]) {
        self.changes.push(Change::Partial {
            see,
            entity,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
    }

    pub fn add_remove(&mut self, see: See, entity: ObjectId, tile: Option<TileCoord>) {
        self.changes.push(Change::Remove { see, entity, tile });
    }

    /// Queue a message for one player; delivery order is insertion order
    pub fn add_message(&mut self, player: &ObjectId, message: ModelMessage) {
        self.messages.push((player.clone(), message));
    }

    /// Drop queued updates (not removals or messages) for these entities
    pub fn suppress_updates_for(&mut self, ids: &[ObjectId]) -> usize {
        let before = self.changes.len();
        self.changes.retain(|c| match c {
            Change::Remove { .. } => true,
            _ => !ids.contains(c.entity()),
        });
        before - self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn messages(&self) -> &[(ObjectId, ModelMessage)] {
        &self.messages
    }

    pub fn messages_for<'a>(&'a self, player: &'a ObjectId) -> impl Iterator<Item = &'a ModelMessage> + 'a {
        self.messages
            .iter()
            .filter(move |(p, _)| p == player)
            .map(|(_, m)| m)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.messages.is_empty()
    }

    pub fn merge(&mut self, other: ChangeSet) {
        self.changes.extend(other.changes);
        self.messages.extend(other.messages);
    }

    /// Resolve each change's scope to the live players that receive it
    pub fn recipients(&self, game: &Game) -> Vec<(&Change, Vec<ObjectId>)> {
        let players = game.live_player_ids();
        self.changes
            .iter()
            .map(|change| {
                let to = match change.see() {
                    See::Only(p) => players.iter().filter(|q| *q == p).cloned().collect(),
                    See::AllExcept(p) => players.iter().filter(|q| *q != p).cloned().collect(),
                    See::Perhaps { always, except } => {
                        let tile = match change {
                            Change::Remove { tile, .. } => *tile,
                            _ => entity_tile(game, change.entity()),
                        };
                        players
                            .iter()
                            .filter(|q| {
                                if always.as_ref() == Some(*q) {
                                    return true;
                                }
                                if except.as_ref() == Some(*q) {
                                    return false;
                                }
                                tile.is_some_and(|t| visibility::can_see(game, q, t))
                            })
                            .cloned()
                            .collect()
                    }
                };
                (change, to)
            })
            .collect()
    }
}

/// Map tile an entity is perceived at, if any
pub fn entity_tile(game: &Game, id: &ObjectId) -> Option<TileCoord> {
    match id.tag()? {
        TypeTag::Colony => game.colony(id).ok().map(|c| c.tile),
        TypeTag::Building => {
            let colony = game.building(id).ok()?.colony.clone();
            game.colony(&colony).ok().map(|c| c.tile)
        }
        TypeTag::Unit => match &game.unit(id).ok()?.location {
            UnitLocation::Tile(c) => Some(*c),
            UnitLocation::WorkTile { colony, .. } => game.colony(colony).ok().map(|c| c.tile),
            UnitLocation::Building(b) => entity_tile(game, b),
            UnitLocation::Carrier(carrier) => entity_tile(game, carrier),
            UnitLocation::Europe => None,
        },
        TypeTag::Tile => game.tile_coord(id).ok(),
        TypeTag::Player => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageType;

    fn pid(n: u64) -> ObjectId {
        ObjectId::new(TypeTag::Player, n)
    }

    #[test]
    fn test_perhaps_builder() {
        let see = See::perhaps().always(&pid(1)).except(&pid(2));
        assert_eq!(
            see,
            See::Perhaps {
                always: Some(pid(1)),
                except: Some(pid(2))
            }
        );
        assert_eq!(See::only(&pid(1)).always(&pid(3)), See::Only(pid(1)));
    }

    #[test]
    fn test_suppress_keeps_removals_and_messages() {
        let colony = ObjectId::new(TypeTag::Colony, 5);
        let mut cs = ChangeSet::new();
        cs.add(See::only(&pid(1)), colony.clone());
        cs.add_partial(See::only(&pid(1)), colony.clone(), &["goods"]);
        cs.add_message(&pid(1), ModelMessage::new(MessageType::Default, "x", &colony));
        assert_eq!(cs.suppress_updates_for(&[colony.clone()]), 2);
        cs.add_remove(See::perhaps().always(&pid(1)), colony.clone(), None);
        assert_eq!(cs.suppress_updates_for(&[colony]), 0);
        assert_eq!(cs.changes().len(), 1);
        assert_eq!(cs.messages_for(&pid(1)).count(), 1);
    }
}
