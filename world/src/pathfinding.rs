//! A* shortest paths over the 4-connected tile grid.
//!
//! Every move costs one and the Manhattan distance is the heuristic, which
//! never overestimates on a 4-connected unit-cost grid. The frontier is a
//! binary heap with lazy deletion: relaxing an open node pushes a fresh entry
//! and stale entries are skipped when popped. Parent links are stored in a
//! dense arena indexed by tile index rather than as references between nodes.
//!
//! Ties are broken by the lowest `f`, then the lowest `h`, then the earliest
//! insertion into the frontier. Neighbours are expanded North, East, South,
//! West, so equal inputs always yield the same path.

use std::{cmp::Ordering, collections::BinaryHeap};

use maze_chase_core::{CellCoord, Grid};

/// Smallest closed-set size allowed before the search gives up.
pub const MIN_EXPANSION_CAP: usize = 200;

/// Closed-set limit used by [`find_path`] for the provided grid.
///
/// The cap is `max(200, N²)`. A correct search closes every tile at most
/// once, so the cap only binds if the grid contents are inconsistent.
#[must_use]
pub fn expansion_cap(grid: &Grid) -> usize {
    grid.cell_count().max(MIN_EXPANSION_CAP)
}

/// Shortest path from `start` to `goal`, both inclusive.
///
/// Returns an empty vector when the goal is a wall, lies out of bounds, or
/// cannot be reached. `start == goal` yields `[start]`.
#[must_use]
pub fn find_path(grid: &Grid, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
    find_path_bounded(grid, start, goal, expansion_cap(grid))
}

/// [`find_path`] with an explicit closed-set cap.
#[must_use]
pub fn find_path_bounded(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    cap: usize,
) -> Vec<CellCoord> {
    let (Some(start_index), Some(goal_index)) = (grid.index_of(start), grid.index_of(goal)) else {
        return Vec::new();
    };
    if start_index == goal_index {
        return vec![start];
    }
    if !grid.is_walkable(goal) {
        return Vec::new();
    }

    let count = grid.cell_count();
    let mut g_score = vec![u32::MAX; count];
    let mut parent: Vec<Option<usize>> = vec![None; count];
    let mut closed = vec![false; count];
    let mut closed_count = 0_usize;
    let mut sequence = 0_u64;
    let mut open = BinaryHeap::new();

    g_score[start_index] = 0;
    let h = start.manhattan_distance(goal);
    open.push(OpenNode {
        f: h,
        h,
        g: 0,
        sequence,
        index: start_index,
    });

    while let Some(node) = open.pop() {
        if closed[node.index] || node.g != g_score[node.index] {
            continue;
        }
        if node.index == goal_index {
            return reconstruct(grid, &parent, goal_index);
        }

        closed[node.index] = true;
        closed_count += 1;
        if closed_count > cap {
            log::debug!(
                "path search from {start:?} to {goal:?} hit the expansion cap of {cap} nodes"
            );
            return Vec::new();
        }

        let Some(cell) = grid.cell_at_index(node.index) else {
            continue;
        };
        for neighbor in grid.neighbors(cell) {
            if !grid.is_walkable(neighbor) {
                continue;
            }
            let Some(neighbor_index) = grid.index_of(neighbor) else {
                continue;
            };
            if closed[neighbor_index] {
                continue;
            }

            let tentative = node.g + 1;
            if tentative >= g_score[neighbor_index] {
                continue;
            }

            g_score[neighbor_index] = tentative;
            parent[neighbor_index] = Some(node.index);
            sequence += 1;
            let h = neighbor.manhattan_distance(goal);
            open.push(OpenNode {
                f: tentative + h,
                h,
                g: tentative,
                sequence,
                index: neighbor_index,
            });
        }
    }

    Vec::new()
}

fn reconstruct(grid: &Grid, parent: &[Option<usize>], goal_index: usize) -> Vec<CellCoord> {
    let mut path = Vec::new();
    let mut cursor = Some(goal_index);
    while let Some(index) = cursor {
        if let Some(cell) = grid.cell_at_index(index) {
            path.push(cell);
        }
        cursor = parent[index];
    }
    path.reverse();
    path
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    h: u32,
    g: u32,
    sequence: u64,
    index: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the smallest key first.
        (other.f, other.h, other.sequence).cmp(&(self.f, self.h, self.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
