//! Dense square tile grid shared by the world and the pure systems.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCoord;

/// Classification of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Solid tile that blocks every entity.
    Wall,
    /// Open tile that entities may occupy.
    Floor,
}

impl TileKind {
    /// Returns the opposite kind, used when proposing maze mutations.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Wall => Self::Floor,
            Self::Floor => Self::Wall,
        }
    }
}

/// One cell of the maze grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    kind: TileKind,
    adaptability: f32,
    pending_wall: bool,
}

impl Tile {
    /// Creates a tile with the provided kind and mutation weight.
    ///
    /// The adaptability is clamped into `[0, 1)`; non-finite values collapse
    /// to zero so that the tile never becomes eligible for mutation.
    #[must_use]
    pub fn new(kind: TileKind, adaptability: f32) -> Self {
        let adaptability = if adaptability.is_finite() {
            adaptability.clamp(0.0, MAX_ADAPTABILITY)
        } else {
            0.0
        };
        Self {
            kind,
            adaptability,
            pending_wall: false,
        }
    }

    /// Current classification of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Weight that biases how likely the tile is to be mutated.
    #[must_use]
    pub const fn adaptability(&self) -> f32 {
        self.adaptability
    }

    /// Reports whether the tile is a floor tile scheduled to become a wall.
    #[must_use]
    pub const fn is_pending_wall(&self) -> bool {
        self.pending_wall
    }
}

const MAX_ADAPTABILITY: f32 = 1.0 - f32::EPSILON;

/// Failures raised by bounds-checked grid access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GridError {
    /// The coordinate lies outside `[0, size)` on at least one axis.
    #[error("cell ({column}, {row}) lies outside the {size}x{size} grid")]
    OutOfBounds {
        /// Column of the rejected coordinate.
        column: u32,
        /// Row of the rejected coordinate.
        row: u32,
        /// Edge length of the grid.
        size: u32,
    },
    /// Border tiles are permanent walls and reject every mutation.
    #[error("border cell ({column}, {row}) is immutable")]
    BorderImmutable {
        /// Column of the rejected coordinate.
        column: u32,
        /// Row of the rejected coordinate.
        row: u32,
    },
}

/// Square grid of tiles stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    size: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a `size × size` grid where every tile has the same kind and
    /// zero adaptability.
    ///
    /// This is a raw constructor: it does not wall the border. Maze
    /// generation starts from `Grid::filled(size, TileKind::Wall)`.
    #[must_use]
    pub fn filled(size: u32, kind: TileKind) -> Self {
        let edge = usize::try_from(size).unwrap_or(0);
        let count = edge.checked_mul(edge).unwrap_or(0);
        Self {
            size,
            tiles: vec![Tile::new(kind, 0.0); count],
        }
    }

    /// Edge length of the grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Total number of tiles.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.size && cell.row() < self.size
    }

    /// Reports whether the coordinate lies on the outermost ring of tiles.
    #[must_use]
    pub const fn is_border(&self, cell: CellCoord) -> bool {
        self.contains(cell)
            && (cell.column() == 0
                || cell.row() == 0
                || cell.column() + 1 == self.size
                || cell.row() + 1 == self.size)
    }

    /// Bounds-checked tile lookup.
    pub fn tile_at(&self, cell: CellCoord) -> Result<&Tile, GridError> {
        self.index_of(cell)
            .and_then(|index| self.tiles.get(index))
            .ok_or(self.out_of_bounds(cell))
    }

    /// Kind of the tile at `cell`, or `None` when out of bounds.
    #[must_use]
    pub fn kind_at(&self, cell: CellCoord) -> Option<TileKind> {
        self.tile_at(cell).ok().map(Tile::kind)
    }

    /// `true` when the coordinate is in bounds and holds a floor tile.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.kind_at(cell) == Some(TileKind::Floor)
    }

    /// Changes the kind of a non-border tile.
    ///
    /// Border tiles are rejected with [`GridError::BorderImmutable`] and left
    /// untouched. Changing the kind clears any pending-wall marker.
    pub fn set_kind(&mut self, cell: CellCoord, kind: TileKind) -> Result<(), GridError> {
        let tile = self.interior_tile_mut(cell)?;
        tile.kind = kind;
        tile.pending_wall = false;
        Ok(())
    }

    /// Replaces a non-border tile wholesale.
    pub fn set_tile(&mut self, cell: CellCoord, tile: Tile) -> Result<(), GridError> {
        *self.interior_tile_mut(cell)? = tile;
        Ok(())
    }

    /// Flags a floor tile as scheduled to become a wall.
    pub fn mark_pending_wall(&mut self, cell: CellCoord) -> Result<(), GridError> {
        self.interior_tile_mut(cell)?.pending_wall = true;
        Ok(())
    }

    /// Removes the pending-wall flag from a tile.
    pub fn clear_pending_wall(&mut self, cell: CellCoord) -> Result<(), GridError> {
        self.interior_tile_mut(cell)?.pending_wall = false;
        Ok(())
    }

    /// Coordinates of every tile currently flagged as a pending wall.
    pub fn pending_walls(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells()
            .filter(move |cell| self.tile_at(*cell).map_or(false, Tile::is_pending_wall))
    }

    /// Number of floor tiles on the grid.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.kind == TileKind::Floor)
            .count()
    }

    /// Iterates every coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |column| CellCoord::new(column, row)))
    }

    /// Iterates every non-border coordinate in row-major order.
    pub fn interior_cells(&self) -> impl Iterator<Item = CellCoord> {
        let upper = self.size.saturating_sub(1);
        (1..upper).flat_map(move |row| (1..upper).map(move |column| CellCoord::new(column, row)))
    }

    /// In-bounds 4-connected neighbours in North, East, South, West order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> {
        let mut candidates = [None; 4];
        let mut count = 0;

        if let Some(row) = cell.row().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
        if cell.column() + 1 < self.size {
            candidates[count] = Some(CellCoord::new(cell.column() + 1, cell.row()));
            count += 1;
        }
        if cell.row() + 1 < self.size {
            candidates[count] = Some(CellCoord::new(cell.column(), cell.row() + 1));
            count += 1;
        }
        if let Some(column) = cell.column().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }

        candidates.into_iter().take(count).flatten()
    }

    /// Row-major index of an in-bounds coordinate.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.size).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Inverse of [`Grid::index_of`].
    #[must_use]
    pub fn cell_at_index(&self, index: usize) -> Option<CellCoord> {
        if index >= self.tiles.len() {
            return None;
        }
        let width = usize::try_from(self.size).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    fn interior_tile_mut(&mut self, cell: CellCoord) -> Result<&mut Tile, GridError> {
        if self.is_border(cell) {
            return Err(GridError::BorderImmutable {
                column: cell.column(),
                row: cell.row(),
            });
        }
        let error = self.out_of_bounds(cell);
        self.index_of(cell)
            .and_then(|index| self.tiles.get_mut(index))
            .ok_or(error)
    }

    const fn out_of_bounds(&self, cell: CellCoord) -> GridError {
        GridError::OutOfBounds {
            column: cell.column(),
            row: cell.row(),
            size: self.size,
        }
    }
}
