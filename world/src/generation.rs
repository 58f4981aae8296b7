//! Random maze generation with a one-shot solvability repair.

use maze_chase_core::{CellCoord, Direction, Grid, GridError, Tile, TileKind};
use rand::Rng;
use thiserror::Error;

use crate::connectivity;

/// Smallest edge length that leaves room for distinct start and exit tiles.
pub const MIN_GRID_SIZE: u32 = 4;

/// Failures raised for invalid generator input.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The grid cannot hold a border plus distinct start and exit tiles.
    #[error("grid size {size} is below the minimum of {}", MIN_GRID_SIZE)]
    GridTooSmall {
        /// Requested edge length.
        size: u32,
    },
    /// The wall probability is not a probability.
    #[error("wall probability {probability} lies outside [0, 1]")]
    InvalidProbability {
        /// Requested probability.
        probability: f32,
    },
    /// A generator step touched a coordinate it should never reach.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Fixed entrance of every maze.
#[must_use]
pub const fn start_cell() -> CellCoord {
    CellCoord::new(1, 1)
}

/// Fixed exit of a maze with the given edge length.
#[must_use]
pub const fn exit_cell(size: u32) -> CellCoord {
    CellCoord::new(size.saturating_sub(2), size.saturating_sub(2))
}

/// Generates a walled maze in which the exit is reachable from the start.
///
/// Interior tiles become walls with probability `wall_probability` and draw
/// an adaptability uniformly from `[0, 1)`. When the sampled layout leaves
/// the exit unreachable, a random monotone corridor is carved from the start
/// to the exit, so a single pass always produces a solvable maze.
pub fn generate<R>(size: u32, wall_probability: f32, rng: &mut R) -> Result<Grid, GenerationError>
where
    R: Rng + ?Sized,
{
    if size < MIN_GRID_SIZE {
        return Err(GenerationError::GridTooSmall { size });
    }
    if !(0.0..=1.0).contains(&wall_probability) {
        return Err(GenerationError::InvalidProbability {
            probability: wall_probability,
        });
    }

    let mut grid = Grid::filled(size, TileKind::Wall);
    let interior: Vec<CellCoord> = grid.interior_cells().collect();
    for cell in interior {
        let kind = if rng.gen::<f32>() < wall_probability {
            TileKind::Wall
        } else {
            TileKind::Floor
        };
        let adaptability = rng.gen::<f32>();
        grid.set_tile(cell, Tile::new(kind, adaptability))?;
    }

    let start = start_cell();
    let exit = exit_cell(size);
    grid.set_kind(start, TileKind::Floor)?;
    grid.set_kind(exit, TileKind::Floor)?;

    if !connectivity::reachable(&grid, start, exit) {
        let carved = carve(&mut grid, start, exit, rng)?;
        log::debug!("carved {carved} tiles to connect {start:?} with {exit:?}");
    }

    Ok(grid)
}

/// Walks from `start` to `goal`, closing either the horizontal or vertical
/// gap at random on each step, and turns every visited tile into floor.
fn carve<R>(
    grid: &mut Grid,
    start: CellCoord,
    goal: CellCoord,
    rng: &mut R,
) -> Result<usize, GenerationError>
where
    R: Rng + ?Sized,
{
    let mut cursor = start;
    let mut carved = 0;

    while cursor != goal {
        let (dx, dy) = cursor.offset_to(goal);
        let horizontal = if dx != 0 && dy != 0 {
            rng.gen_bool(0.5)
        } else {
            dx != 0
        };
        let direction = match (horizontal, dx > 0, dy > 0) {
            (true, true, _) => Direction::East,
            (true, false, _) => Direction::West,
            (false, _, true) => Direction::South,
            (false, _, false) => Direction::North,
        };
        let Some(next) = cursor.step(direction) else {
            break;
        };
        cursor = next;
        if grid.kind_at(cursor) != Some(TileKind::Floor) {
            grid.set_kind(cursor, TileKind::Floor)?;
            carved += 1;
        }
    }

    Ok(carved)
}
