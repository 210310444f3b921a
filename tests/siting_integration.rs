//! Integration tests for the colony siting evaluator
//!
//! Runs against the standard two-colony scenario: a coastal strip two
//! columns from the east edge, ocean, then high seas.

use colonia::core::types::TileCoord;
use colonia::diplomacy::{self, Stance};
use colonia::game::{Scenario, ScenarioBuilder};
use colonia::model::{PlayerType, UnitLocation};
use colonia::rules::RuleTable;
use colonia::siting::{self, ColonyValueCategory, NoClaimReason, NoValueType};
use colonia::sync::ChangeSet;

fn scenario() -> Scenario {
    ScenarioBuilder::new(RuleTable::classic()).build().expect("scenario")
}

// ============================================================================
// DISQUALIFICATION
// ============================================================================

/// Water, crowded, inland and polar sites each carry their own sentinel
#[test]
fn test_rejection_sentinels() {
    let mut s = scenario();
    let arctic = s.game.rules.tile_type_by_key("arctic").expect("arctic");
    let w = s.game.map.width() as i32;
    s.game.set_terrain(TileCoord::new(w - 3, 10), arctic).expect("terrain");

    let game = &s.game;
    let dutch = game.player(&s.players[0]).expect("dutch");
    let jamestown = game.colony(&s.colonies[0]).expect("colony").tile;
    let plymouth = game.colony(&s.colonies[1]).expect("colony").tile;
    let value = |c: TileCoord| siting::colony_value(game, dutch, c);

    assert_eq!(value(TileCoord::new(w - 2, 5)), NoValueType::Terrain.value());
    assert_eq!(value(TileCoord::new(jamestown.x, jamestown.y + 1)), NoValueType::Settled.value());
    assert_eq!(value(TileCoord::new(plymouth.x - 1, plymouth.y)), NoValueType::Settled.value());
    assert_eq!(value(TileCoord::new(6, 6)), NoValueType::Inland.value());
    assert_eq!(value(TileCoord::new(w - 3, 10)), NoValueType::Polar.value());
    assert_eq!(value(TileCoord::new(-4, 2)), NoValueType::Terrain.value());
}

/// A newcomer with no settlements will not found on a rumour
#[test]
fn test_rumour_rejected_for_newcomer() {
    let mut s = scenario();
    let french = s.game.add_player("French", PlayerType::Colonial).expect("french");
    let w = s.game.map.width() as i32;
    let site = TileCoord::new(w - 3, 0);
    s.game.map.tile_mut(site).expect("tile").lost_city_rumour = true;

    let game = &s.game;
    let newcomer = game.player(&french).expect("french");
    assert_eq!(siting::colony_value(game, newcomer, site), NoValueType::Rumour.value());

    // The Dutch already have a colony, so the rumour only weighs the tile
    let dutch = game.player(&s.players[0]).expect("dutch");
    let values = siting::colony_values(game, dutch, site);
    assert!(values.rejection().is_none());
    assert!(values.get(ColonyValueCategory::Tile) < 1.0);
}

// ============================================================================
// SCORING
// ============================================================================

/// Hostile troops next to a site cut its value, and on the site block it
#[test]
fn test_enemy_units_reduce_value() {
    let mut s = scenario();
    let (dutch, english) = (s.players[0].clone(), s.players[1].clone());
    let w = s.game.map.width() as i32;
    let site = TileCoord::new(w - 3, 0);
    let beside = TileCoord::new(w - 4, 0);

    let before = {
        let p = s.game.player(&dutch).expect("dutch");
        siting::colony_values(&s.game, p, site)
    };
    assert!(before.rejection().is_none());
    assert!(before.total() > 0);

    let artillery = s.game.rules.unit_type_by_key("artillery").expect("artillery");
    s.game
        .create_unit(&english, artillery, UnitLocation::Tile(beside))
        .expect("artillery");
    diplomacy::make_contact(&mut s.game, &dutch, &english, &mut ChangeSet::new()).expect("contact");
    let mut cs = ChangeSet::new();
    diplomacy::set_stance(&mut s.game, &dutch, &english, Stance::War, &mut cs).expect("war");

    let p = s.game.player(&dutch).expect("dutch");
    let after = siting::colony_values(&s.game, p, site);
    assert!(after.rejection().is_none());
    assert!(after.get(ColonyValueCategory::Adjacent) < before.get(ColonyValueCategory::Adjacent));
    assert!(after.total() <= before.total());
    assert_eq!(siting::claim_to_found_reason(&s.game, p, beside), NoClaimReason::Occupied);
}

/// Ranking drops rejected sites, orders by value and keeps ties stable
#[test]
fn test_ranking_order() {
    let s = scenario();
    let game = &s.game;
    let dutch = game.player(&s.players[0]).expect("dutch");
    let (w, h) = (game.map.width() as i32, game.map.height() as i32);
    let mut coords: Vec<TileCoord> = (0..h).map(|y| TileCoord::new(w - 3, y)).collect();
    coords.push(TileCoord::new(6, 6));
    coords.push(TileCoord::new(w - 3, 0));

    let ranked = siting::rank_sites(game, dutch, &coords);
    assert!(ranked.iter().all(|(c, _)| *c != TileCoord::new(6, 6)));
    let totals: Vec<i32> = ranked.iter().map(|(_, v)| v.total()).collect();
    assert!(totals.windows(2).all(|pair| pair[0] >= pair[1]));

    let twins: Vec<usize> = ranked
        .iter()
        .enumerate()
        .filter(|(_, (c, _))| *c == TileCoord::new(w - 3, 0))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(twins.len(), 2);
    assert!(twins[0] < twins[1]);
    assert_eq!(ranked[twins[0]].1, ranked[twins[1]].1);

    let again = siting::rank_sites(game, dutch, &coords);
    assert_eq!(again, ranked);
}
