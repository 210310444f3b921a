//! Colonia - headless simulation runner
//!
//! Builds the standard scenario, advances it a number of turns and prints
//! what happened each turn.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use colonia::core::error::Result;
use colonia::core::SimulationConfig;
use colonia::game::{Game, Integrity, ScenarioBuilder};
use colonia::rules::RuleTable;
use colonia::siting;
use colonia::turn::run_turn;

/// Run the colony simulation without a client
#[derive(Parser, Debug)]
#[command(name = "colonia")]
#[command(about = "Advance a colonial strategy scenario and report each turn")]
struct Args {
    /// Number of turns to run
    #[arg(long, default_value_t = 10)]
    turns: u32,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 1492)]
    seed: u64,

    /// Map width in tiles
    #[arg(long, default_value_t = 16)]
    width: u32,

    /// Map height in tiles
    #[arg(long, default_value_t = 12)]
    height: u32,

    /// Restrict sight to unit and settlement range
    #[arg(long, overrides_with = "no_fog")]
    fog: bool,

    /// Everything explored stays visible
    #[arg(long, overrides_with = "fog")]
    no_fog: bool,

    /// Simulation tunables (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rule table (TOML); the classic rules when absent
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Resume from a JSON snapshot, and write the final state back to it
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("colonia=info")))
        .init();

    let args = Args::parse();
    let mut rules = match &args.rules {
        Some(path) => RuleTable::load_from_toml(path)?,
        None => RuleTable::classic(),
    };
    rules.options.fog_of_war = args.fog || !args.no_fog;
    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let mut game = match &args.snapshot {
        Some(path) if path.exists() => {
            tracing::info!("resuming from {}", path.display());
            Game::load(path, Arc::new(rules))?
        }
        _ => {
            ScenarioBuilder::new(rules)
                .width(args.width)
                .height(args.height)
                .seed(args.seed)
                .config(config)
                .build()?
                .game
        }
    };

    println!("\n=== COLONIA ===");
    println!("game {} at turn {}, seed {}", game.uuid, game.turn, game.seed());
    for _ in 0..args.turns {
        let cs = run_turn(&mut game);
        println!("\n-- turn {} --", game.turn);
        for player in game.players() {
            let messages: Vec<_> = cs.messages_for(&player.id).collect();
            println!(
                "{:<8} gold {:>5}  liberty {:>4}  immigration {:>3}/{:<3}  fathers {}  messages {}",
                player.name,
                player.gold,
                player.liberty,
                player.immigration,
                player.immigration_required,
                player.father_count,
                messages.len()
            );
            for m in messages {
                println!("         {}", m.key);
            }
        }
    }

    match game.check_integrity(true) {
        Integrity::Ok => {}
        other => tracing::warn!("integrity check: {:?}", other),
    }
    println!("\nentities:");
    for (tag, count) in game.statistics() {
        println!("  {:<9} {}", tag.as_str(), count);
    }
    print_best_sites(&game);

    if let Some(path) = &args.snapshot {
        game.save(path)?;
        tracing::info!("saved to {}", path.display());
    }
    Ok(())
}

fn print_best_sites(game: &Game) {
    let coords: Vec<_> = game.map.tiles().map(|t| t.coord).collect();
    for player in game.players().filter(|p| p.is_european() && !p.dead) {
        let ranked = siting::rank_sites(game, player, &coords);
        let best: Vec<String> = ranked
            .iter()
            .take(3)
            .map(|(c, v)| format!("{} = {}", c, v.total()))
            .collect();
        println!("best sites for {}: {}", player.name, best.join(", "));
    }
}
