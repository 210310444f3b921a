//! Integration tests for the relationship state machine
//!
//! Covers first contact, requested stance changes and the end-of-turn drift
//! of stances driven by tension, including the hysteresis margin.

use std::sync::Arc;

use proptest::prelude::*;

use colonia::core::SimulationConfig;
use colonia::diplomacy::{self, DiplomacyError, Stance, Tension};
use colonia::game::Game;
use colonia::model::PlayerType;
use colonia::registry::ObjectId;
use colonia::rules::RuleTable;
use colonia::sync::{Change, ChangeSet, See};
use colonia::turn;

fn three_players() -> (Game, ObjectId, ObjectId, ObjectId) {
    let rules = Arc::new(RuleTable::classic());
    let plains = rules.tile_type_by_key("plains").expect("plains");
    let mut game = Game::new(rules, SimulationConfig::default(), 8, 8, plains, 5).expect("game");
    let dutch = game.add_player("Dutch", PlayerType::Colonial).expect("dutch");
    let english = game.add_player("English", PlayerType::Colonial).expect("english");
    let arawak = game.add_player("Arawak", PlayerType::Native).expect("arawak");
    (game, dutch, english, arawak)
}

fn stance(game: &Game, a: &ObjectId, b: &ObjectId) -> Stance {
    game.player(a).expect("player").stance_toward(b)
}

fn tension(game: &Game, a: &ObjectId, b: &ObjectId) -> i32 {
    game.player(a).expect("player").tension_toward(b).value()
}

// ============================================================================
// REQUESTED CHANGES
// ============================================================================

/// Stances stay symmetric through a sequence of legal requests
#[test]
fn test_requested_changes_stay_symmetric() {
    let (mut game, dutch, english, _) = three_players();
    let mut cs = ChangeSet::new();
    assert!(diplomacy::make_contact(&mut game, &dutch, &english, &mut cs).expect("contact"));
    assert!(!diplomacy::make_contact(&mut game, &english, &dutch, &mut cs).expect("again"));
    assert_eq!(cs.changes().len(), 2);
    assert!(cs.messages().is_empty());

    for to in [Stance::Alliance, Stance::Peace, Stance::War, Stance::CeaseFire, Stance::Peace] {
        diplomacy::set_stance(&mut game, &dutch, &english, to, &mut cs).expect("legal");
        assert_eq!(stance(&game, &dutch, &english), to);
        assert_eq!(stance(&game, &english, &dutch), to);
    }
    assert_eq!(cs.messages_for(&dutch).count(), 5);
    assert_eq!(cs.messages_for(&english).count(), 5);
}

/// First contact tells each side about its own relation and nobody else
#[test]
fn test_first_contact_published_per_side() {
    let (mut game, dutch, english, arawak) = three_players();
    let mut cs = ChangeSet::new();
    diplomacy::make_contact(&mut game, &dutch, &english, &mut cs).expect("contact");

    for side in [&dutch, &english] {
        let update = cs
            .changes()
            .iter()
            .find(|c| c.entity() == side)
            .expect("update for side");
        assert_eq!(update.see(), &See::only(side));
        assert!(matches!(update, Change::Partial { fields, .. } if fields.iter().any(|f| f == "stance")));
    }
    assert!(cs.changes().iter().all(|c| c.entity() != &arawak));
    assert_eq!(stance(&game, &english, &dutch), Stance::Peace);
}

/// Requests that skip a step or involve strangers fail and change nothing
#[test]
fn test_rejected_requests_leave_state_untouched() {
    let (mut game, dutch, english, arawak) = three_players();
    let mut cs = ChangeSet::new();

    let err = diplomacy::set_stance(&mut game, &dutch, &arawak, Stance::War, &mut cs).unwrap_err();
    assert_eq!(
        err,
        DiplomacyError::InvalidTransition {
            from: Stance::Uncontacted,
            to: Stance::War
        }
    );

    diplomacy::make_contact(&mut game, &dutch, &english, &mut ChangeSet::new()).expect("contact");
    diplomacy::set_stance(&mut game, &dutch, &english, Stance::War, &mut cs).expect("war");
    let before = tension(&game, &dutch, &english);
    let err = diplomacy::set_stance(&mut game, &dutch, &english, Stance::Peace, &mut cs).unwrap_err();
    assert!(matches!(err, DiplomacyError::InvalidTransition { .. }));
    assert_eq!(stance(&game, &dutch, &english), Stance::War);
    assert_eq!(tension(&game, &dutch, &english), before);
    assert_eq!(cs.messages().len(), 2);
}

// ============================================================================
// TENSION DRIFT
// ============================================================================

/// Hatred starts a war at turn end; cooling passes through cease-fire to peace
#[test]
fn test_tension_drives_war_and_reconciliation() {
    let (mut game, dutch, english, _) = three_players();
    diplomacy::make_contact(&mut game, &dutch, &english, &mut ChangeSet::new()).expect("contact");

    diplomacy::modify_tension(&mut game, &english, &dutch, 1_011).expect("tension");
    turn::run_turn(&mut game);
    assert_eq!(stance(&game, &dutch, &english), Stance::War);
    assert_eq!(tension(&game, &english, &dutch), Tension::new(1_100).value());

    diplomacy::modify_tension(&mut game, &english, &dutch, -600).expect("tension");
    diplomacy::modify_tension(&mut game, &dutch, &english, -600).expect("tension");
    let cs = turn::run_turn(&mut game);
    assert_eq!(stance(&game, &english, &dutch), Stance::CeaseFire);
    assert!(cs
        .messages_for(&dutch)
        .any(|m| m.key == "model.diplomacy.stanceChange"));

    // Still too tense for peace
    turn::run_turn(&mut game);
    assert_eq!(stance(&game, &english, &dutch), Stance::CeaseFire);

    let t = tension(&game, &english, &dutch).max(tension(&game, &dutch, &english));
    diplomacy::modify_tension(&mut game, &english, &dutch, -t).expect("tension");
    diplomacy::modify_tension(&mut game, &dutch, &english, -t).expect("tension");
    turn::run_turn(&mut game);
    assert_eq!(stance(&game, &english, &dutch), Stance::Peace);
    assert_eq!(stance(&game, &dutch, &english), Stance::Peace);
}

/// Tension just past the hateful limit but inside the margin keeps the peace
#[test]
fn test_margin_absorbs_small_overshoot() {
    let (mut game, dutch, english, _) = three_players();
    diplomacy::make_contact(&mut game, &dutch, &english, &mut ChangeSet::new()).expect("contact");
    let margin = game.config.tension_hysteresis;
    diplomacy::modify_tension(&mut game, &dutch, &english, 1_000 + margin).expect("tension");
    let mut cs = ChangeSet::new();
    assert_eq!(diplomacy::apply_tension_stances(&mut game, &mut cs), 0);
    assert_eq!(stance(&game, &dutch, &english), Stance::Peace);
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    /// Tension never leaves its bounds, whatever is added
    #[test]
    fn test_tension_stays_bounded(deltas in prop::collection::vec(-3_000i32..3_000, 1..30)) {
        let (mut game, dutch, english, _) = three_players();
        diplomacy::make_contact(&mut game, &dutch, &english, &mut ChangeSet::new()).expect("contact");
        for d in deltas {
            let t = diplomacy::modify_tension(&mut game, &dutch, &english, d).expect("tension");
            prop_assert!((0..=1_100).contains(&t.value()));
        }
    }

    /// Peace only breaks beyond the margin, and war only cools below it
    #[test]
    fn test_hysteresis_thresholds(value in 0i32..=1_100, margin in 0i32..50) {
        let t = Tension::new(value);
        let from_peace = Stance::Peace.from_tension(t, margin);
        prop_assert_eq!(from_peace == Stance::War, value > 1_000 + margin);

        let from_war = Stance::War.from_tension(t, margin);
        prop_assert_eq!(from_war == Stance::CeaseFire, value <= 600 - margin);
    }

    /// Every stance tension can imply is reachable in legal steps
    #[test]
    fn test_implied_stance_is_reachable(value in 0i32..=1_100, index in 0usize..5) {
        let current = Stance::ALL[index];
        let target = current.from_tension(Tension::new(value), 10);
        let path = current.path_to(target);
        prop_assert!(path.is_some());
        let mut at = current;
        for step in path.unwrap_or_default() {
            prop_assert!(at.can_transition_to(step));
            at = step;
        }
        prop_assert_eq!(at, target);
    }
}
