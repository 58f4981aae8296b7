#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use serde::{Deserialize, Serialize};

pub mod grid;

pub use grid::{Grid, GridError, Tile, TileKind};

/// Number of accepted player moves retained for adaptation heuristics.
pub const MOVE_HISTORY_LEN: usize = 20;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Generates a fresh maze and repopulates every entity for the level.
    StartLevel {
        /// One-based level number; drives enemy count and difficulty.
        level: u32,
    },
    /// Resets health and score, then starts level one.
    ResetRun,
    /// Advances the simulation clock by a single fixed tick.
    Tick,
    /// Requests that the player move one tile in the given direction.
    MovePlayer {
        /// Direction of travel for the attempted move.
        direction: Direction,
    },
    /// Replaces an enemy's cached path and restarts its decision timer.
    SetEnemyPath {
        /// Enemy whose decision completed.
        enemy: EnemyId,
        /// Path from the enemy towards the player; empty when unreachable.
        path: Vec<CellCoord>,
    },
    /// Requests that an enemy advance a single tile.
    StepEnemy {
        /// Enemy attempting to move.
        enemy: EnemyId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Evaluates player contact with enemies and powerups.
    ResolveContacts,
    /// Proposes changing the kind of a single interior tile.
    FlipTile {
        /// Tile targeted by the proposal.
        cell: CellCoord,
        /// Kind the tile should take on.
        kind: TileKind,
    },
    /// Spends a full ability charge to push nearby enemies away.
    ActivateAbility,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just elapsed.
        tick: u64,
    },
    /// Announces that a freshly generated level is ready.
    LevelStarted {
        /// One-based level number.
        level: u32,
        /// Number of enemies spawned into the maze.
        enemies: u32,
    },
    /// Confirms that the player moved between two tiles.
    PlayerMoved {
        /// Tile the player occupied before moving.
        from: CellCoord,
        /// Tile the player occupies after moving.
        to: CellCoord,
    },
    /// Reports that a move request was refused without changing state.
    PlayerMoveRejected {
        /// Direction that was requested.
        direction: Direction,
    },
    /// Confirms that an enemy advanced between two tiles.
    EnemyAdvanced {
        /// Enemy that moved.
        enemy: EnemyId,
        /// Tile occupied before the step.
        from: CellCoord,
        /// Tile occupied after the step.
        to: CellCoord,
    },
    /// Reports that an enemy was shoved by the player's ability.
    EnemyPushed {
        /// Enemy that was displaced.
        enemy: EnemyId,
        /// Tile occupied before the push.
        from: CellCoord,
        /// Tile occupied after the push.
        to: CellCoord,
    },
    /// Confirms that a tile changed kind.
    TileFlipped {
        /// Tile that changed.
        cell: CellCoord,
        /// Kind the tile holds now.
        kind: TileKind,
    },
    /// Announces that a floor tile will solidify into a wall shortly.
    WallWarning {
        /// Tile scheduled to become a wall.
        cell: CellCoord,
        /// Ticks remaining before the wall solidifies.
        ticks: u32,
    },
    /// Reports that a proposed or pending flip was discarded.
    TileFlipRejected {
        /// Tile targeted by the flip.
        cell: CellCoord,
        /// Specific reason the flip was refused.
        reason: FlipRejection,
    },
    /// Confirms that the player picked up a powerup.
    PowerupCollected {
        /// Tile the powerup occupied.
        cell: CellCoord,
        /// Kind of powerup that was consumed.
        kind: PowerupKind,
    },
    /// Announces that a powerup appeared in the maze.
    PowerupSpawned {
        /// Tile holding the new powerup.
        cell: CellCoord,
        /// Kind of powerup that was created.
        kind: PowerupKind,
    },
    /// Reports that an enemy caught the player.
    PlayerDamaged {
        /// Health removed by the hit.
        amount: u32,
        /// Health remaining after the hit.
        health: i32,
    },
    /// Confirms that the special ability fired.
    AbilityActivated {
        /// Number of enemies that were displaced.
        pushed: u32,
    },
    /// Reports that the ability was requested without a full charge.
    AbilityUnavailable {
        /// Charge accumulated at the time of the request.
        charge: f32,
    },
    /// Announces that the player reached the exit.
    LevelCompleted {
        /// Level that was completed.
        level: u32,
        /// Score held when the exit was reached.
        score: u32,
    },
    /// Announces that the run ended because health dropped to zero.
    GameOver {
        /// Final score of the run.
        score: u32,
        /// Level reached by the run.
        level: u32,
    },
}

/// Reasons a tile flip may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlipRejection {
    /// The tile lies on the permanent border or outside the grid.
    Border,
    /// The tile is the start or the exit.
    Protected,
    /// An entity currently stands on the tile.
    Occupied,
    /// The tile already holds the requested kind or is already pending.
    Unchanged,
    /// Walling the tile would separate the player or the start from the exit.
    WouldDisconnect,
}

/// Lifecycle of a run as tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// A level is in progress.
    Running,
    /// Health dropped to zero; only a reset restarts play.
    GameOver,
}

/// Cardinal movement directions. Diagonal movement does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in the canonical expansion order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Converts a unit axis-aligned delta into a direction.
    #[must_use]
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Self::North),
            (1, 0) => Some(Self::East),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }

    /// Unit delta `(dx, dy)` for the direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Axis the direction travels along.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::East | Self::West => Axis::Horizontal,
            Self::North | Self::South => Axis::Vertical,
        }
    }

    /// Direction between two orthogonally adjacent cells.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let dx = i64::from(to.column()) - i64::from(from.column());
        let dy = i64::from(to.row()) - i64::from(from.row());
        match (dx, dy) {
            (0, -1) => Some(Self::North),
            (1, 0) => Some(Self::East),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }
}

/// Movement axis on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Columns change, rows stay fixed.
    Horizontal,
    /// Rows change, columns stay fixed.
    Vertical,
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index (`x`) of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index (`y`) of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Euclidean distance in grid units.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        let dx = self.column().abs_diff(other.column()) as f32;
        let dy = self.row().abs_diff(other.row()) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Neighbouring cell in the given direction, or `None` below zero.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.delta();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }

    /// Signed offset `(dx, dy)` from `self` to `other`.
    #[must_use]
    pub fn offset_to(self, other: CellCoord) -> (i64, i64) {
        (
            i64::from(other.column()) - i64::from(self.column()),
            i64::from(other.row()) - i64::from(self.row()),
        )
    }
}

/// Continuous position used purely for interpolated rendering.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualPosition {
    /// Horizontal coordinate in tile units.
    pub x: f32,
    /// Vertical coordinate in tile units.
    pub y: f32,
}

impl VisualPosition {
    /// Visual position resting exactly on the cell.
    #[must_use]
    pub fn at(cell: CellCoord) -> Self {
        Self {
            x: cell.column() as f32,
            y: cell.row() as f32,
        }
    }

    /// Moves a fraction of the remaining distance toward `cell`, snapping
    /// once both axes are within `snap` of the target.
    pub fn ease_toward(&mut self, cell: CellCoord, factor: f32, snap: f32) {
        let target = Self::at(cell);
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        if dx.abs() < snap && dy.abs() < snap {
            *self = target;
            return;
        }
        self.x += dx * factor;
        self.y += dy * factor;
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Kinds of powerups scattered through the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Restores health up to the maximum.
    Health,
    /// Adds a fixed score bonus.
    Score,
}

/// Powerup resting on a floor tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Powerup {
    /// Tile the powerup occupies.
    pub cell: CellCoord,
    /// Effect applied on pickup.
    pub kind: PowerupKind,
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Authoritative tile occupied by the player.
    pub cell: CellCoord,
    /// Interpolated position for rendering.
    pub visual: VisualPosition,
    /// Remaining health; zero or below ends the run.
    pub health: i32,
    /// Accumulated score.
    pub score: u32,
    /// Most recent accepted moves, oldest first.
    pub recent_moves: Vec<Direction>,
}

impl PlayerSnapshot {
    /// Axis the player travelled along most often recently, if any.
    #[must_use]
    pub fn dominant_axis(&self) -> Option<Axis> {
        let horizontal = self
            .recent_moves
            .iter()
            .filter(|direction| direction.axis() == Axis::Horizontal)
            .count();
        let vertical = self.recent_moves.len() - horizontal;
        match horizontal.cmp(&vertical) {
            std::cmp::Ordering::Greater => Some(Axis::Horizontal),
            std::cmp::Ordering::Less => Some(Axis::Vertical),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Authoritative tile occupied by the enemy.
    pub cell: CellCoord,
    /// Interpolated position for rendering.
    pub visual: VisualPosition,
    /// Path cached by the most recent decision.
    pub path: Vec<CellCoord>,
    /// Indicates whether the decision cadence elapsed for this enemy.
    pub ready_for_decision: bool,
}

/// Read-only snapshot describing all enemies within the maze.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn direction_deltas_agree_with_between() {
        let origin = CellCoord::new(3, 3);
        for direction in Direction::ALL {
            let (dx, dy) = direction.delta();
            assert_eq!(Direction::from_delta(dx, dy), Some(direction));
            let next = origin.step(direction).expect("interior step");
            assert_eq!(Direction::between(origin, next), Some(direction));
        }
        assert_eq!(Direction::from_delta(1, 1), None);
        assert_eq!(Direction::between(origin, origin), None);
    }

    #[test]
    fn step_refuses_negative_coordinates() {
        assert_eq!(CellCoord::new(0, 2).step(Direction::West), None);
        assert_eq!(CellCoord::new(2, 0).step(Direction::North), None);
    }

    #[test]
    fn visual_position_eases_and_snaps() {
        let target = CellCoord::new(2, 0);
        let mut visual = VisualPosition::at(CellCoord::new(0, 0));
        visual.ease_toward(target, 0.5, 0.01);
        assert!((visual.x - 1.0).abs() < f32::EPSILON);

        for _ in 0..32 {
            visual.ease_toward(target, 0.5, 0.01);
        }
        assert_eq!(visual, VisualPosition::at(target));
    }

    #[test]
    fn dominant_axis_counts_recent_moves() {
        let mut snapshot = PlayerSnapshot {
            cell: CellCoord::new(1, 1),
            visual: VisualPosition::at(CellCoord::new(1, 1)),
            health: 100,
            score: 0,
            recent_moves: vec![Direction::East, Direction::East, Direction::South],
        };
        assert_eq!(snapshot.dominant_axis(), Some(Axis::Horizontal));

        snapshot.recent_moves.push(Direction::North);
        assert_eq!(snapshot.dominant_axis(), None);
    }
}
