#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Online maze mutation that never seals the exit.
//!
//! On every adaptation cadence the system samples the interior tiles around
//! the player and proposes flips. Wall removals are proposed as drawn. Wall
//! placements are proposed only when both the player and the entrance keep a
//! route to the exit on a scratch copy of the grid that already carries the
//! earlier proposals of the same pass and treats pending walls as solid.
//! The world validates every proposal again before committing it.

use maze_chase_core::{Axis, CellCoord, Command, Event, Grid, PlayerSnapshot, TileKind};
use maze_chase_world::connectivity::{self, TileChange};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

/// Tuning knobs for maze mutation.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdaptationConfig {
    /// Ticks between adaptation passes; zero disables mutation.
    pub cadence_ticks: u32,
    /// Scales every tile's adaptability into a flip probability.
    pub rate: f32,
    /// Tiles closer to the player than this Manhattan distance are left alone.
    pub min_player_radius: u32,
    /// Tiles farther from the player than this Manhattan distance are left alone.
    pub max_player_radius: u32,
    /// Extra wall weight for tiles across the player's dominant travel axis.
    pub axis_bias: f32,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            cadence_ticks: 60,
            rate: 0.02,
            min_player_radius: 3,
            max_player_radius: 8,
            axis_bias: 0.5,
        }
    }
}

/// World positions the adaptation pass has to respect.
#[derive(Clone, Copy, Debug)]
pub struct Anchors<'a> {
    /// Player snapshot, including the recent move history.
    pub player: &'a PlayerSnapshot,
    /// Maze entrance.
    pub start: CellCoord,
    /// Maze exit.
    pub exit: CellCoord,
    /// Tiles holding enemies or powerups.
    pub occupied: &'a [CellCoord],
}

/// Pure system that turns elapsed time into tile flip proposals.
#[derive(Debug)]
pub struct Adaptation {
    config: AdaptationConfig,
    elapsed: u32,
    rng: ChaCha8Rng,
}

impl Adaptation {
    /// Creates an adaptation system drawing its proposals from `seed`.
    #[must_use]
    pub fn new(config: AdaptationConfig, seed: u64) -> Self {
        Self {
            config,
            elapsed: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Consumes world events and the current maze to emit flip proposals.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        anchors: Anchors<'_>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::LevelStarted { .. } => self.elapsed = 0,
                Event::TimeAdvanced { .. } => self.elapsed = self.elapsed.saturating_add(1),
                _ => {}
            }
        }

        if self.config.cadence_ticks == 0 || self.elapsed < self.config.cadence_ticks {
            return;
        }
        self.elapsed -= self.config.cadence_ticks;

        let before = out.len();
        self.propose(grid, anchors, out);
        log::trace!("adaptation pass proposed {} flips", out.len() - before);
    }

    fn propose(&mut self, grid: &Grid, anchors: Anchors<'_>, out: &mut Vec<Command>) {
        let player = anchors.player.cell;
        let dominant = anchors.player.dominant_axis();

        let mut scratch = grid.clone();
        let pending: Vec<CellCoord> = grid.pending_walls().collect();
        for cell in &pending {
            if scratch.set_kind(*cell, TileKind::Wall).is_err() {
                log::warn!("pending wall at {cell:?} lies on the border");
            }
        }

        let candidates: Vec<CellCoord> = grid
            .interior_cells()
            .filter(|cell| *cell != anchors.start && *cell != anchors.exit && *cell != player)
            .filter(|cell| {
                let distance = cell.manhattan_distance(player);
                distance >= self.config.min_player_radius
                    && distance <= self.config.max_player_radius
            })
            .filter(|cell| !anchors.occupied.contains(cell) && !pending.contains(cell))
            .collect();

        for cell in candidates {
            let Ok(tile) = scratch.tile_at(cell) else {
                continue;
            };
            let current = tile.kind();
            let mut weight = tile.adaptability() * self.config.rate;
            if current == TileKind::Floor {
                weight *= wall_bias(player, dominant, cell, self.config.axis_bias);
            }
            if self.rng.gen::<f32>() >= weight {
                continue;
            }

            let kind = current.flipped();
            if kind == TileKind::Wall {
                let wall = TileChange::wall(cell);
                let keeps_route =
                    connectivity::reachable_under_hypothetical(&scratch, player, anchors.exit, wall)
                        && connectivity::reachable_under_hypothetical(
                            &scratch,
                            anchors.start,
                            anchors.exit,
                            wall,
                        );
                if !keeps_route {
                    continue;
                }
            }

            if scratch.set_kind(cell, kind).is_ok() {
                out.push(Command::FlipTile { cell, kind });
            }
        }
    }
}

/// Wall weight multiplier for `cell`: tiles in the player's row while moving
/// horizontally, or in the player's column while moving vertically, get
/// `1 + axis_bias`.
fn wall_bias(player: CellCoord, dominant: Option<Axis>, cell: CellCoord, axis_bias: f32) -> f32 {
    let across_travel = match dominant {
        Some(Axis::Horizontal) => cell.row() == player.row(),
        Some(Axis::Vertical) => cell.column() == player.column(),
        None => false,
    };
    if across_travel {
        1.0 + axis_bias
    } else {
        1.0
    }
}
