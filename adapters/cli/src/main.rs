#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Maze Chase headlessly.

mod autopilot;
mod high_score;
mod logging;
mod render;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use maze_chase_core::{Event, Phase};
use maze_chase_simulation::{Simulation, SimulationConfig};
use maze_chase_world::query;

use crate::autopilot::Autopilot;

/// Headless Maze Chase runner driven by an autopilot.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", version, about)]
struct Args {
    /// TOML file overriding the default simulation configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Master seed; overrides the configured one.
    #[arg(long)]
    seed: Option<u64>,
    /// Upper bound on simulated ticks.
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,
    /// Stop once this many levels were completed.
    #[arg(long, default_value_t = 3)]
    levels: u32,
    /// Ticks between two autopilot moves.
    #[arg(long, default_value_t = 8)]
    move_interval: u32,
    /// Print an ASCII frame every N ticks.
    #[arg(long)]
    render_every: Option<u64>,
    /// File holding the best score across runs.
    #[arg(long, default_value = "maze-chase-highscore.json")]
    high_score_file: PathBuf,
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Entry point for the Maze Chase command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SimulationConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let tick_rate = config.tick_rate_hz;

    let mut simulation = Simulation::new(config).context("failed to start the simulation")?;
    let mut autopilot = Autopilot::new(args.move_interval);
    let mut completed = 0;
    let mut final_score = 0;

    for _ in 0..args.ticks {
        let _ = autopilot.drive(&mut simulation);
        simulation.tick();

        for event in simulation.drain_events() {
            match event {
                Event::LevelCompleted { level, score } => {
                    completed += 1;
                    final_score = score;
                    println!("level {level} cleared with score {score}");
                }
                Event::GameOver { score, level } => {
                    final_score = score;
                    println!("caught on level {level} with score {score}");
                }
                _ => {}
            }
        }

        let world = simulation.world();
        if let Some(every) = args.render_every.filter(|every| *every > 0) {
            if query::tick_index(world) % every == 0 {
                println!("{}\n", render::frame(world));
            }
        }
        if completed >= args.levels || query::phase(world) == Phase::GameOver {
            break;
        }
    }

    let world = simulation.world();
    final_score = final_score.max(query::player(world).score);
    println!("{}", render::frame(world));
    println!(
        "finished after {:.1}s of simulated time",
        query::tick_index(world) as f64 / f64::from(tick_rate)
    );

    if high_score::record(&args.high_score_file, final_score)? {
        println!("new high score: {final_score}");
    } else {
        let best = high_score::load(&args.high_score_file)?;
        println!("high score: {best}");
    }
    Ok(())
}
