//! Integration tests for saving and restoring a game in progress

use std::sync::Arc;

use colonia::game::{FactoryTable, Game, GameSnapshot, Integrity, ScenarioBuilder};
use colonia::rules::RuleTable;
use colonia::turn;

// ============================================================================
// SAVE AND RESUME
// ============================================================================

/// Two restores of one save play the next turns identically
#[test]
fn test_restores_replay_identically() {
    let scenario = ScenarioBuilder::new(RuleTable::classic()).seed(4).build().expect("scenario");
    let mut game = scenario.game;
    for _ in 0..3 {
        turn::run_turn(&mut game);
    }
    let json = game.snapshot().to_json().expect("json");
    let rules = Arc::clone(&game.rules);

    let resume = || {
        let snapshot = GameSnapshot::from_json(&json).expect("parse");
        let mut g = Game::restore(snapshot, Arc::clone(&rules), &FactoryTable::standard()).expect("restore");
        for _ in 0..3 {
            turn::run_turn(&mut g);
        }
        g
    };
    let (a, b) = (resume(), resume());
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.turn, 7);
}

/// A restored game keeps its statistics and passes the integrity check
#[test]
fn test_restored_game_is_consistent() {
    let scenario = ScenarioBuilder::new(RuleTable::classic()).build().expect("scenario");
    let mut game = scenario.game;
    turn::run_turn(&mut game);

    let path = std::env::temp_dir().join(format!("colonia-{}.json", game.uuid));
    game.save(&path).expect("save");
    let mut restored = Game::load(&path, Arc::clone(&game.rules)).expect("load");
    let _ = std::fs::remove_file(&path);

    assert_eq!(restored.uuid, game.uuid);
    assert_eq!(restored.turn, game.turn);
    assert_eq!(restored.statistics(), game.statistics());
    assert_eq!(restored.check_integrity(false), Integrity::Ok);
    for colony in &scenario.colonies {
        assert_eq!(restored.colony_unit_count(colony), game.colony_unit_count(colony));
    }
}
