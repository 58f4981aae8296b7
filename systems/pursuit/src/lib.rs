#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic pursuit system that plans enemy paths toward the player.

use maze_chase_core::{CellCoord, Command, Direction, EnemySnapshot, EnemyView, Event, Grid};
use maze_chase_world::pathfinding;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

/// Difficulty ramp for the pursuit branch.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    /// Probability of pursuing on level one.
    pub base_intelligence: f32,
    /// Probability added for every level after the first.
    pub intelligence_growth: f32,
    /// Upper bound of the pursuit probability.
    pub max_intelligence: f32,
}

impl PursuitConfig {
    /// Pursuit probability for the provided level.
    #[must_use]
    pub fn intelligence_for(&self, level: u32) -> f32 {
        let ramp = self.intelligence_growth * level.saturating_sub(1) as f32;
        (self.base_intelligence + ramp).min(self.max_intelligence)
    }
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            base_intelligence: 0.7,
            intelligence_growth: 0.05,
            max_intelligence: 1.0,
        }
    }
}

/// Pure system that reacts to world events and emits enemy commands.
#[derive(Debug)]
pub struct Pursuit {
    config: PursuitConfig,
    intelligence: f32,
    rng: ChaCha8Rng,
}

impl Pursuit {
    /// Creates a pursuit system drawing its decisions from `seed`.
    #[must_use]
    pub fn new(config: PursuitConfig, seed: u64) -> Self {
        Self {
            intelligence: config.intelligence_for(1),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Current probability that a decision takes the pursuit branch.
    #[must_use]
    pub fn intelligence(&self) -> f32 {
        self.intelligence
    }

    /// Consumes world events and immutable views to emit enemy commands.
    ///
    /// Only enemies whose decision cadence elapsed are considered, and only
    /// on a tick. Each decision caches a path through
    /// [`Command::SetEnemyPath`] and advances at most one tile.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        enemies: &EnemyView,
        player: CellCoord,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::LevelStarted { level, .. } = event {
                self.intelligence = self.config.intelligence_for(*level);
                log::debug!("enemy intelligence set to {:.2}", self.intelligence);
            }
        }

        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for enemy in enemies.iter().filter(|enemy| enemy.ready_for_decision) {
            if self.rng.gen::<f32>() < self.intelligence {
                pursue(grid, enemy, player, out);
            } else {
                self.wander(grid, enemy, out);
            }
        }
    }

    fn wander(&mut self, grid: &Grid, enemy: &EnemySnapshot, out: &mut Vec<Command>) {
        let options: Vec<CellCoord> = grid
            .neighbors(enemy.cell)
            .filter(|cell| grid.is_walkable(*cell))
            .collect();
        if options.is_empty() {
            out.push(Command::SetEnemyPath {
                enemy: enemy.id,
                path: Vec::new(),
            });
            return;
        }

        let next = options[self.rng.gen_range(0..options.len())];
        out.push(Command::SetEnemyPath {
            enemy: enemy.id,
            path: vec![enemy.cell, next],
        });
        if let Some(direction) = Direction::between(enemy.cell, next) {
            out.push(Command::StepEnemy {
                enemy: enemy.id,
                direction,
            });
        }
    }
}

fn pursue(grid: &Grid, enemy: &EnemySnapshot, player: CellCoord, out: &mut Vec<Command>) {
    let path = pathfinding::find_path(grid, enemy.cell, player);
    let step = match path.get(1) {
        Some(next) => Direction::between(enemy.cell, *next),
        None if path.is_empty() => greedy_step(grid, enemy.cell, player),
        None => None,
    };

    out.push(Command::SetEnemyPath {
        enemy: enemy.id,
        path,
    });
    if let Some(direction) = step {
        out.push(Command::StepEnemy {
            enemy: enemy.id,
            direction,
        });
    }
}

/// Single step toward `target` when no path exists: the axis with the larger
/// gap first (horizontal on ties), then the other axis.
fn greedy_step(grid: &Grid, from: CellCoord, target: CellCoord) -> Option<Direction> {
    let (dx, dy) = from.offset_to(target);
    let horizontal = match dx {
        0 => None,
        dx if dx > 0 => Some(Direction::East),
        _ => Some(Direction::West),
    };
    let vertical = match dy {
        0 => None,
        dy if dy > 0 => Some(Direction::South),
        _ => Some(Direction::North),
    };
    let (primary, secondary) = if dx.abs() >= dy.abs() {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };

    [primary, secondary].into_iter().flatten().find(|direction| {
        from.step(*direction)
            .map_or(false, |cell| grid.is_walkable(cell))
    })
}
