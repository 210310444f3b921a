//! Relationship state machine between players
//!
//! Stances are stored on both players and always change together. Tension
//! is one-directional and only drifts stances at turn end.

pub mod stance;
pub mod tension;

pub use stance::Stance;
pub use tension::{Tension, TensionLevel};

use thiserror::Error;

use crate::game::Game;
use crate::model::{MessageType, ModelMessage};
use crate::registry::ObjectId;
use crate::sync::{ChangeSet, See};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiplomacyError {
    #[error("invalid stance transition: {from:?} -> {to:?}")]
    InvalidTransition { from: Stance, to: Stance },
    #[error("player {0} has no relation with itself")]
    SelfRelation(ObjectId),
    #[error("unknown player: {0}")]
    UnknownPlayer(ObjectId),
}

fn check_pair(game: &Game, a: &ObjectId, b: &ObjectId) -> Result<(), DiplomacyError> {
    if a == b {
        return Err(DiplomacyError::SelfRelation(a.clone()));
    }
    for id in [a, b] {
        if game.player(id).is_err() {
            return Err(DiplomacyError::UnknownPlayer(id.clone()));
        }
    }
    Ok(())
}

/// First contact: both sides move to peace with minimum tension
///
/// Returns false (and changes nothing) when the pair already met. Each
/// side's update is scoped to that player alone.
pub fn make_contact(game: &mut Game, a: &ObjectId, b: &ObjectId, cs: &mut ChangeSet) -> Result<bool, DiplomacyError> {
    check_pair(game, a, b)?;
    let already = game
        .player(a)
        .map(|p| p.has_contacted(b))
        .map_err(|_| DiplomacyError::UnknownPlayer(a.clone()))?;
    if already {
        return Ok(false);
    }
    for (me, them) in [(a, b), (b, a)] {
        let player = game
            .player_mut(me)
            .map_err(|_| DiplomacyError::UnknownPlayer(me.clone()))?;
        player.stance.insert(them.clone(), Stance::Peace);
        player.tension.insert(them.clone(), Tension::MIN);
        cs.add_partial(See::only(me), me.clone(), &["stance", "tension"]);
    }
    tracing::info!("first contact between {} and {}", a, b);
    Ok(true)
}

/// Change the stance between two players
///
/// Illegal requests fail without touching either player. A legal change
/// updates both sides, adds the matrix tension delta to both tensions and
/// scopes each side's update to that player alone.
pub fn set_stance(
    game: &mut Game,
    a: &ObjectId,
    b: &ObjectId,
    to: Stance,
    cs: &mut ChangeSet,
) -> Result<(), DiplomacyError> {
    check_pair(game, a, b)?;
    let from = game
        .player(a)
        .map(|p| p.stance_toward(b))
        .map_err(|_| DiplomacyError::UnknownPlayer(a.clone()))?;
    if from == to {
        return Ok(());
    }
    if !from.can_transition_to(to) {
        return Err(DiplomacyError::InvalidTransition { from, to });
    }
    let delta = from.tension_modifier(to);

    for (me, them) in [(a, b), (b, a)] {
        let player = game
            .player_mut(me)
            .map_err(|_| DiplomacyError::UnknownPlayer(me.clone()))?;
        player.stance.insert(them.clone(), to);
        player.tension.entry(them.clone()).or_insert(Tension::MIN).modify(delta);
        cs.add_partial(See::only(me), me.clone(), &["stance", "tension"]);
        cs.add_message(
            me,
            ModelMessage::new(MessageType::Foreign, "model.diplomacy.stanceChange", me)
                .with("other", them)
                .with("stance", to.key()),
        );
    }
    tracing::info!("stance {} -> {} between {} and {}", from.key(), to.key(), a, b);
    Ok(())
}

/// Add `delta` to `a`'s tension toward `b`; returns the new value
pub fn modify_tension(
    game: &mut Game,
    a: &ObjectId,
    b: &ObjectId,
    delta: i32,
) -> Result<Tension, DiplomacyError> {
    check_pair(game, a, b)?;
    let player = game
        .player_mut(a)
        .map_err(|_| DiplomacyError::UnknownPlayer(a.clone()))?;
    let tension = player.tension.entry(b.clone()).or_insert(Tension::MIN);
    tension.modify(delta);
    Ok(*tension)
}

/// Move every contacted pair toward the stance its tension implies
///
/// The more hostile side of each pair drives the result. A target that is
/// not one legal step away is reached through the intermediate stance.
/// Returns the number of stance changes made.
pub fn apply_tension_stances(game: &mut Game, cs: &mut ChangeSet) -> usize {
    let margin = game.config.tension_hysteresis;
    let players = game.live_player_ids();
    let mut pending = Vec::new();
    for (i, a) in players.iter().enumerate() {
        for b in &players[i + 1..] {
            let (Ok(pa), Ok(pb)) = (game.player(a), game.player(b)) else { continue };
            let current = pa.stance_toward(b);
            if current == Stance::Uncontacted {
                continue;
            }
            let tension = pa.tension_toward(b).max(pb.tension_toward(a));
            let target = current.from_tension(tension, margin);
            if target != current {
                pending.push((a.clone(), b.clone(), current, target));
            }
        }
    }

    let mut changes = 0;
    for (a, b, current, target) in pending {
        let Some(path) = current.path_to(target) else {
            tracing::warn!("no stance path {} -> {}", current.key(), target.key());
            continue;
        };
        for step in path {
            match set_stance(game, &a, &b, step, cs) {
                Ok(()) => changes += 1,
                Err(e) => {
                    tracing::warn!("tension stance change failed: {}", e);
                    break;
                }
            }
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimulationConfig;
    use crate::model::PlayerType;
    use crate::rules::RuleTable;
    use std::sync::Arc;

    fn game_with_two() -> (Game, ObjectId, ObjectId) {
        let rules = Arc::new(RuleTable::classic());
        let plains = rules.tile_type_by_key("plains").expect("plains");
        let mut game = Game::new(rules, SimulationConfig::default(), 6, 6, plains, 1).expect("game");
        let a = game.add_player("Dutch", PlayerType::Colonial).expect("a");
        let b = game.add_player("English", PlayerType::Colonial).expect("b");
        (game, a, b)
    }

    #[test]
    fn test_contact_sets_peace_both_sides() {
        let (mut game, a, b) = game_with_two();
        let mut cs = ChangeSet::new();
        assert!(make_contact(&mut game, &a, &b, &mut cs).expect("contact"));
        for (me, them) in [(&a, &b), (&b, &a)] {
            let p = game.player(me).expect("player");
            assert_eq!(p.stance_toward(them), Stance::Peace);
            assert_eq!(p.tension_toward(them), Tension::MIN);
        }
        assert_eq!(cs.changes().len(), 2);
        let mut again = ChangeSet::new();
        assert!(!make_contact(&mut game, &a, &b, &mut again).expect("again"));
        assert!(again.is_empty());
    }

    #[test]
    fn test_illegal_transition_leaves_state() {
        let (mut game, a, b) = game_with_two();
        let mut cs = ChangeSet::new();
        let err = set_stance(&mut game, &a, &b, Stance::Peace, &mut cs).unwrap_err();
        assert_eq!(
            err,
            DiplomacyError::InvalidTransition {
                from: Stance::Uncontacted,
                to: Stance::Peace
            }
        );
        assert!(cs.is_empty());
        assert_eq!(game.player(&a).expect("a").stance_toward(&b), Stance::Uncontacted);
    }

    #[test]
    fn test_war_applies_modifier_to_both() {
        let (mut game, a, b) = game_with_two();
        make_contact(&mut game, &a, &b, &mut ChangeSet::new()).expect("contact");
        let mut cs = ChangeSet::new();
        set_stance(&mut game, &a, &b, Stance::War, &mut cs).expect("war");
        assert_eq!(game.player(&a).expect("a").tension_toward(&b).value(), 500);
        assert_eq!(game.player(&b).expect("b").tension_toward(&a).value(), 500);
        assert_eq!(cs.messages().len(), 2);
    }

    #[test]
    fn test_self_relation_rejected() {
        let (mut game, a, _) = game_with_two();
        assert!(matches!(
            make_contact(&mut game, &a, &a, &mut ChangeSet::new()),
            Err(DiplomacyError::SelfRelation(_))
        ));
    }
}
