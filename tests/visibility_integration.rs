//! Integration tests for the visibility engine
//!
//! Fog of war on: sight follows units and settlements, and goes stale only
//! until the next invalidation. Fog of war off: sight equals explored land.

use std::sync::Arc;

use colonia::core::types::TileCoord;
use colonia::core::SimulationConfig;
use colonia::game::{Game, ScenarioBuilder};
use colonia::model::{PlayerType, UnitLocation};
use colonia::registry::ObjectId;
use colonia::rules::RuleTable;
use colonia::turn;
use colonia::visibility;

fn game(fog: bool) -> (Game, ObjectId) {
    let mut rules = RuleTable::classic();
    rules.options.fog_of_war = fog;
    let rules = Arc::new(rules);
    let plains = rules.tile_type_by_key("plains").expect("plains");
    let mut game = Game::new(rules, SimulationConfig::default(), 12, 12, plains, 17).expect("game");
    let player = game.add_player("Dutch", PlayerType::Colonial).expect("player");
    (game, player)
}

// ============================================================================
// FOG OF WAR
// ============================================================================

/// A scout sees its own radius and nothing beyond
#[test]
fn test_unit_sight_radius() {
    let (mut game, dutch) = game(true);
    let scout = game
        .create_unit(&dutch, game.rules.default_unit_type(), UnitLocation::Tile(TileCoord::new(5, 5)))
        .expect("unit");
    let radius = game.rules.unit_type(game.unit(&scout).expect("unit").unit_type).line_of_sight as i32;

    assert!(visibility::can_see(&game, &dutch, TileCoord::new(5, 5)));
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(5 + radius, 5)));
    assert!(!visibility::can_see(&game, &dutch, TileCoord::new(5 + radius + 1, 5)));
    assert!(!visibility::can_see(&game, &dutch, TileCoord::new(-1, 5)));

    let visible = visibility::visible_tiles(&game, &dutch);
    let side = (2 * radius + 1) as usize;
    assert_eq!(visible.len(), side * side);
}

/// Moving the only unit away hides the old tile once sight is invalidated
#[test]
fn test_moving_away_hides_old_ground() {
    let (mut game, dutch) = game(true);
    let scout = game
        .create_unit(&dutch, game.rules.default_unit_type(), UnitLocation::Tile(TileCoord::new(2, 2)))
        .expect("unit");
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(2, 2)));

    game.move_unit(&scout, UnitLocation::Tile(TileCoord::new(9, 9))).expect("move");
    visibility::invalidate(&game, &dutch);
    assert!(!visibility::can_see(&game, &dutch, TileCoord::new(2, 2)));
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(9, 9)));
    assert!(game.map.is_explored(TileCoord::new(2, 2), game.player(&dutch).expect("p").slot));
}

/// Units in Europe or inside buildings contribute no sight
#[test]
fn test_off_map_units_see_nothing() {
    let (mut game, dutch) = game(true);
    game.create_unit(&dutch, game.rules.default_unit_type(), UnitLocation::Europe)
        .expect("unit");
    assert!(visibility::visible_tiles(&game, &dutch).is_empty());
}

/// A colony sees its surroundings, and the end of turn refreshes everyone
#[test]
fn test_colony_sight_refreshed_each_turn() {
    let scenario = ScenarioBuilder::new(RuleTable::classic())
        .fog_of_war(true)
        .build()
        .expect("scenario");
    let mut game = scenario.game;
    let (dutch, english) = (&scenario.players[0], &scenario.players[1]);
    let jamestown = game.colony(&scenario.colonies[0]).expect("colony").tile;
    let plymouth = game.colony(&scenario.colonies[1]).expect("colony").tile;

    assert!(visibility::can_see(&game, dutch, jamestown));
    assert!(!visibility::can_see(&game, dutch, plymouth));
    assert!(visibility::can_see(&game, english, plymouth));

    let recomputed = game.player(dutch).expect("player").sight.recomputations();
    turn::run_turn(&mut game);
    assert!(!game.player(dutch).expect("player").sight.is_valid());
    assert!(visibility::can_see(&game, dutch, jamestown));
    assert!(game.player(dutch).expect("player").sight.recomputations() > recomputed);
}

// ============================================================================
// NO FOG OF WAR
// ============================================================================

/// Without fog, sight is exactly the explored set regardless of positions
#[test]
fn test_without_fog_explored_is_visible() {
    let (mut game, dutch) = game(false);
    let scout = game
        .create_unit(&dutch, game.rules.default_unit_type(), UnitLocation::Tile(TileCoord::new(5, 5)))
        .expect("unit");
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(5, 5)));
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(6, 6)));
    assert!(!visibility::can_see(&game, &dutch, TileCoord::new(0, 0)));

    // Leaving does not hide ground already explored
    game.move_unit(&scout, UnitLocation::Tile(TileCoord::new(9, 9))).expect("move");
    visibility::invalidate(&game, &dutch);
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(5, 5)));
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(10, 10)));

    let slot = game.player(&dutch).expect("player").slot;
    game.map.mark_explored(slot, &[TileCoord::new(0, 0)]);
    visibility::invalidate(&game, &dutch);
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(0, 0)));
    assert_eq!(visibility::visible_tiles(&game, &dutch).len(), 9 + 9 + 1);
}

/// Founding a colony explores its surroundings even without fog
#[test]
fn test_without_fog_colony_tile_visible() {
    let (mut game, dutch) = game(false);
    let english = game.add_player("English", PlayerType::Colonial).expect("english");
    game.create_unit(&dutch, game.rules.default_unit_type(), UnitLocation::Tile(TileCoord::new(5, 5)))
        .expect("unit");
    let colony = game.found_colony(&dutch, TileCoord::new(5, 5), None).expect("colony");
    let radius = game.colony_line_of_sight(game.colony(&colony).expect("colony")) as i32;

    assert!(visibility::can_see(&game, &dutch, TileCoord::new(5, 5)));
    assert!(visibility::can_see(&game, &dutch, TileCoord::new(5 + radius, 5)));
    assert!(!visibility::can_see(&game, &english, TileCoord::new(5, 5)));
}
