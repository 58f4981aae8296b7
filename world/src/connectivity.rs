//! Breadth-first reachability queries over floor tiles.
//!
//! Both queries are read-only: a hypothetical mutation is expressed as an
//! overlay consulted during the search instead of a write to the grid.

use std::collections::VecDeque;

use maze_chase_core::{CellCoord, Grid, TileKind};

/// Single-tile override applied on top of a grid during a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileChange {
    /// Tile whose kind is overridden.
    pub cell: CellCoord,
    /// Kind the tile is assumed to hold.
    pub kind: TileKind,
}

impl TileChange {
    /// Hypothetical wall placed on `cell`.
    #[must_use]
    pub const fn wall(cell: CellCoord) -> Self {
        Self {
            cell,
            kind: TileKind::Wall,
        }
    }
}

/// Reports whether a 4-connected floor route joins `start` and `goal`.
#[must_use]
pub fn reachable(grid: &Grid, start: CellCoord, goal: CellCoord) -> bool {
    search(grid, start, goal, |cell| grid.kind_at(cell))
}

/// Same as [`reachable`], evaluated as if `change` had been applied.
#[must_use]
pub fn reachable_under_hypothetical(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    change: TileChange,
) -> bool {
    search(grid, start, goal, |cell| {
        if cell == change.cell && grid.contains(cell) {
            Some(change.kind)
        } else {
            grid.kind_at(cell)
        }
    })
}

/// Evaluates several hypothetical changes at once; later entries win.
///
/// Used when pending walls have to be treated as solid.
#[must_use]
pub fn reachable_with_overrides(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    changes: &[TileChange],
) -> bool {
    search(grid, start, goal, |cell| {
        changes
            .iter()
            .rev()
            .find(|change| change.cell == cell)
            .filter(|_| grid.contains(cell))
            .map(|change| change.kind)
            .or_else(|| grid.kind_at(cell))
    })
}

fn search<F>(grid: &Grid, start: CellCoord, goal: CellCoord, kind_at: F) -> bool
where
    F: Fn(CellCoord) -> Option<TileKind>,
{
    if !grid.contains(start) || !grid.contains(goal) {
        return false;
    }
    if start == goal {
        return true;
    }
    let walkable = |cell: CellCoord| kind_at(cell) == Some(TileKind::Floor);
    if !walkable(start) || !walkable(goal) {
        return false;
    }

    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();
    if let Some(index) = grid.index_of(start) {
        visited[index] = true;
        queue.push_back(start);
    }

    while let Some(cell) = queue.pop_front() {
        for neighbor in grid.neighbors(cell) {
            let Some(index) = grid.index_of(neighbor) else {
                continue;
            };
            if visited[index] || !walkable(neighbor) {
                continue;
            }
            if neighbor == goal {
                return true;
            }
            visited[index] = true;
            queue.push_back(neighbor);
        }
    }

    false
}
