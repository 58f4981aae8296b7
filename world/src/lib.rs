#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Maze Chase.
//!
//! The world owns the grid, the player, the enemies, and the powerups. It is
//! mutated exclusively through [`apply`], which validates every command and
//! reports the outcome as [`Event`] values. Read access goes through the
//! [`query`] module.

pub mod connectivity;
pub mod generation;
pub mod pathfinding;

use std::collections::VecDeque;

use maze_chase_core::{
    CellCoord, Command, Direction, EnemyId, Event, FlipRejection, Grid, Phase, Powerup,
    PowerupKind, TileKind, VisualPosition, MOVE_HISTORY_LEN,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::connectivity::TileChange;

const VISUAL_SNAP: f32 = 0.01;

/// Tuning knobs for the authoritative world.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of the square maze, border included.
    pub grid_size: u32,
    /// Probability that an interior tile starts out as a wall.
    pub wall_probability: f32,
    /// Enemies spawned on level one; one more joins every second level.
    pub base_enemy_count: u32,
    /// Minimum column and row for enemy spawn tiles, keeping them away from
    /// the entrance.
    pub enemy_spawn_margin: u32,
    /// Ticks between successive enemy decisions.
    pub enemy_decision_ticks: u32,
    /// Powerups kept in the maze at all times.
    pub powerup_count: u32,
    /// Probability that a spawned powerup restores health.
    pub health_powerup_chance: f32,
    /// Health at the start of a run and the cap for healing.
    pub max_health: i32,
    /// Health restored by a health powerup.
    pub health_pickup: i32,
    /// Score granted by a score powerup.
    pub score_pickup: u32,
    /// Score granted for every accepted move.
    pub move_score: u32,
    /// Contact triggers when player and enemy are closer than this, in tiles.
    pub contact_radius: f32,
    /// Health removed by a single contact.
    pub contact_damage: u32,
    /// Ticks after a contact during which further contacts deal no damage.
    pub damage_cooldown_ticks: u32,
    /// Ticks a new wall spends as a walkable warning before solidifying.
    pub wall_warning_ticks: u32,
    /// Fraction of the remaining distance the player's visual closes per tick.
    pub player_easing: f32,
    /// Fraction of the remaining distance an enemy's visual closes per tick.
    pub enemy_easing: f32,
    /// Charge required to fire the special ability.
    pub ability_max_charge: f32,
    /// Charge regenerated per tick.
    pub ability_charge_per_tick: f32,
    /// Manhattan radius around the player affected by the ability.
    pub ability_radius: u32,
    /// Maximum number of tiles an enemy is pushed.
    pub ability_push_distance: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 15,
            wall_probability: 0.25,
            base_enemy_count: 1,
            enemy_spawn_margin: 5,
            enemy_decision_ticks: 36,
            powerup_count: 3,
            health_powerup_chance: 0.3,
            max_health: 100,
            health_pickup: 20,
            score_pickup: 50,
            move_score: 1,
            contact_radius: 0.5,
            contact_damage: 20,
            damage_cooldown_ticks: 36,
            wall_warning_ticks: 120,
            player_easing: 0.3,
            enemy_easing: 0.1,
            ability_max_charge: 100.0,
            ability_charge_per_tick: 0.25,
            ability_radius: 3,
            ability_push_distance: 2,
        }
    }
}

/// Hand-authored level used to set up deterministic scenarios.
#[cfg(any(test, feature = "test_scaffolding"))]
#[derive(Clone, Debug)]
pub struct Layout {
    /// Maze to install; its size overrides the configured grid size.
    pub grid: Grid,
    /// Tile the player starts on.
    pub player: CellCoord,
    /// Tiles enemies start on, in identifier order.
    pub enemies: Vec<CellCoord>,
    /// Powerups placed in the maze.
    pub powerups: Vec<Powerup>,
}

/// Represents the authoritative Maze Chase world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    rng: ChaCha8Rng,
    grid: Grid,
    start: CellCoord,
    exit: CellCoord,
    player: Player,
    enemies: Vec<Enemy>,
    powerups: Vec<Powerup>,
    pending_walls: Vec<PendingWall>,
    level: u32,
    phase: Phase,
    tick_index: u64,
    damage_cooldown: u32,
    ability_charge: f32,
}

impl World {
    /// Creates an empty world; [`Command::StartLevel`] generates the first maze.
    #[must_use]
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let start = generation::start_cell();
        let exit = generation::exit_cell(config.grid_size);
        Self {
            grid: Grid::filled(config.grid_size, TileKind::Wall),
            rng: ChaCha8Rng::seed_from_u64(seed),
            start,
            exit,
            player: Player::new(start, config.max_health),
            enemies: Vec::new(),
            powerups: Vec::new(),
            pending_walls: Vec::new(),
            level: 0,
            phase: Phase::Running,
            tick_index: 0,
            damage_cooldown: 0,
            ability_charge: 0.0,
            config,
        }
    }

    /// Creates a world running the provided hand-authored level one.
    #[cfg(any(test, feature = "test_scaffolding"))]
    #[must_use]
    pub fn from_layout(config: WorldConfig, seed: u64, layout: Layout) -> Self {
        let size = layout.grid.size();
        let mut world = Self::new(WorldConfig { grid_size: size, ..config }, seed);
        world.grid = layout.grid;
        world.exit = generation::exit_cell(size);
        world.level = 1;
        world.player.place(layout.player);
        world.enemies = layout
            .enemies
            .into_iter()
            .enumerate()
            .map(|(index, cell)| Enemy::new(EnemyId::new(index as u32), cell))
            .collect();
        world.powerups = layout.powerups;
        world
    }

    fn start_level(&mut self, level: u32, out_events: &mut Vec<Event>) {
        let level = level.max(1);
        let grid = match generation::generate(
            self.config.grid_size,
            self.config.wall_probability,
            &mut self.rng,
        ) {
            Ok(grid) => grid,
            Err(error) => {
                log::error!("failed to generate level {level}: {error}");
                return;
            }
        };

        self.grid = grid;
        self.start = generation::start_cell();
        self.exit = generation::exit_cell(self.config.grid_size);
        self.level = level;
        self.phase = Phase::Running;
        self.player.place(self.start);
        self.player.history.clear();
        self.pending_walls.clear();
        self.damage_cooldown = 0;
        self.spawn_enemies();
        self.powerups.clear();

        let enemies = u32::try_from(self.enemies.len()).unwrap_or(u32::MAX);
        log::info!(
            "level {level} generated: {} floor tiles, {enemies} enemies",
            self.grid.walkable_count()
        );
        out_events.push(Event::LevelStarted { level, enemies });

        for _ in 0..self.config.powerup_count {
            if let Some(powerup) = self.spawn_powerup() {
                out_events.push(Event::PowerupSpawned {
                    cell: powerup.cell,
                    kind: powerup.kind,
                });
            }
        }
    }

    fn reset_run(&mut self, out_events: &mut Vec<Event>) {
        self.player.health = self.config.max_health;
        self.player.score = 0;
        self.ability_charge = 0.0;
        self.start_level(1, out_events);
    }

    fn spawn_enemies(&mut self) {
        let count = self.config.base_enemy_count + self.level / 2;
        let margin = self.config.enemy_spawn_margin;
        let mut candidates: Vec<CellCoord> = self
            .grid
            .interior_cells()
            .filter(|cell| cell.column() >= margin && cell.row() >= margin)
            .filter(|cell| self.is_spawnable(*cell))
            .collect();
        if candidates.is_empty() {
            candidates = self
                .grid
                .interior_cells()
                .filter(|cell| self.is_spawnable(*cell))
                .collect();
        }

        self.enemies.clear();
        for index in 0..count {
            if candidates.is_empty() {
                log::warn!("no free tile left for enemy {index} on level {}", self.level);
                break;
            }
            let pick = self.rng.gen_range(0..candidates.len());
            let cell = candidates.swap_remove(pick);
            self.enemies.push(Enemy::new(EnemyId::new(index), cell));
        }
    }

    fn is_spawnable(&self, cell: CellCoord) -> bool {
        self.grid.is_walkable(cell)
            && cell != self.start
            && cell != self.exit
            && cell != self.player.cell
    }

    fn spawn_powerup(&mut self) -> Option<Powerup> {
        let candidates: Vec<CellCoord> = self
            .grid
            .interior_cells()
            .filter(|cell| self.is_free_for_powerup(*cell))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let cell = candidates[self.rng.gen_range(0..candidates.len())];
        let kind = if self.rng.gen::<f32>() < self.config.health_powerup_chance {
            PowerupKind::Health
        } else {
            PowerupKind::Score
        };
        let powerup = Powerup { cell, kind };
        self.powerups.push(powerup);
        Some(powerup)
    }

    fn is_free_for_powerup(&self, cell: CellCoord) -> bool {
        self.is_spawnable(cell)
            && !self.is_pending_wall(cell)
            && !self.enemies.iter().any(|enemy| enemy.cell == cell)
            && !self.powerups.iter().any(|powerup| powerup.cell == cell)
    }

    fn is_pending_wall(&self, cell: CellCoord) -> bool {
        self.grid
            .tile_at(cell)
            .map_or(false, |tile| tile.is_pending_wall())
    }

    fn advance_tick(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });

        self.player
            .visual
            .ease_toward(self.player.cell, self.config.player_easing, VISUAL_SNAP);
        for enemy in &mut self.enemies {
            enemy
                .visual
                .ease_toward(enemy.cell, self.config.enemy_easing, VISUAL_SNAP);
            enemy.decision_timer = enemy.decision_timer.saturating_add(1);
        }

        self.damage_cooldown = self.damage_cooldown.saturating_sub(1);
        self.ability_charge = (self.ability_charge + self.config.ability_charge_per_tick)
            .min(self.config.ability_max_charge);

        self.advance_wall_warnings(out_events);
    }

    fn advance_wall_warnings(&mut self, out_events: &mut Vec<Event>) {
        if self.pending_walls.is_empty() {
            return;
        }

        let mut due = Vec::new();
        self.pending_walls.retain_mut(|pending| {
            pending.remaining = pending.remaining.saturating_sub(1);
            if pending.remaining == 0 {
                due.push(pending.cell);
                false
            } else {
                true
            }
        });

        for cell in due {
            if self.grid.clear_pending_wall(cell).is_err() {
                continue;
            }
            match self.wall_rejection(cell, false) {
                Some(reason) => {
                    log::debug!("pending wall at {cell:?} cancelled: {reason:?}");
                    out_events.push(Event::TileFlipRejected { cell, reason });
                }
                None => {
                    if self.grid.set_kind(cell, TileKind::Wall).is_ok() {
                        out_events.push(Event::TileFlipped {
                            cell,
                            kind: TileKind::Wall,
                        });
                    }
                }
            }
        }
    }

    fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            out_events.push(Event::PlayerMoveRejected { direction });
            return;
        }

        let from = self.player.cell;
        let Some(to) = from
            .step(direction)
            .filter(|cell| self.grid.is_walkable(*cell))
        else {
            out_events.push(Event::PlayerMoveRejected { direction });
            return;
        };

        self.player.cell = to;
        self.player.record_move(direction);
        self.player.score = self.player.score.saturating_add(self.config.move_score);
        out_events.push(Event::PlayerMoved { from, to });

        self.collect_powerup_at(to, out_events);

        if to == self.exit {
            log::info!(
                "level {} completed with score {}",
                self.level,
                self.player.score
            );
            out_events.push(Event::LevelCompleted {
                level: self.level,
                score: self.player.score,
            });
        }
    }

    fn collect_powerup_at(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(position) = self.powerups.iter().position(|powerup| powerup.cell == cell) else {
            return;
        };
        let powerup = self.powerups.remove(position);
        match powerup.kind {
            PowerupKind::Health => {
                self.player.health = self
                    .player
                    .health
                    .saturating_add(self.config.health_pickup)
                    .min(self.config.max_health);
            }
            PowerupKind::Score => {
                self.player.score = self.player.score.saturating_add(self.config.score_pickup);
            }
        }
        out_events.push(Event::PowerupCollected {
            cell,
            kind: powerup.kind,
        });

        if let Some(replacement) = self.spawn_powerup() {
            out_events.push(Event::PowerupSpawned {
                cell: replacement.cell,
                kind: replacement.kind,
            });
        }
    }

    fn set_enemy_path(&mut self, enemy: EnemyId, path: Vec<CellCoord>) {
        if let Some(enemy) = self.enemy_mut(enemy) {
            enemy.path = path;
            enemy.decision_timer = 0;
        }
    }

    fn step_enemy(&mut self, enemy: EnemyId, direction: Direction, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(index) = self.enemies.iter().position(|candidate| candidate.id == enemy) else {
            return;
        };

        let from = self.enemies[index].cell;
        let Some(to) = from
            .step(direction)
            .filter(|cell| self.grid.is_walkable(*cell))
        else {
            log::trace!("enemy {} step {direction:?} from {from:?} blocked", enemy.get());
            return;
        };

        self.enemies[index].cell = to;
        out_events.push(Event::EnemyAdvanced { enemy, from, to });
    }

    fn resolve_contacts(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            return;
        }

        self.collect_powerup_at(self.player.cell, out_events);

        if self.damage_cooldown > 0 {
            return;
        }
        let player = self.player.cell;
        let radius = self.config.contact_radius;
        if !self
            .enemies
            .iter()
            .any(|enemy| enemy.cell.euclidean_distance(player) < radius)
        {
            return;
        }

        let amount = self.config.contact_damage;
        self.player.health = self
            .player
            .health
            .saturating_sub(i32::try_from(amount).unwrap_or(i32::MAX));
        self.damage_cooldown = self.config.damage_cooldown_ticks;
        self.player.place(self.start);
        log::info!(
            "player caught at {player:?}, health now {}",
            self.player.health
        );
        out_events.push(Event::PlayerDamaged {
            amount,
            health: self.player.health,
        });

        if self.player.health <= 0 {
            self.phase = Phase::GameOver;
            log::info!(
                "game over on level {} with score {}",
                self.level,
                self.player.score
            );
            out_events.push(Event::GameOver {
                score: self.player.score,
                level: self.level,
            });
        }
    }

    fn flip_tile(&mut self, cell: CellCoord, kind: TileKind, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            return;
        }
        if let Some(reason) = self.flip_rejection(cell, kind) {
            log::debug!("flip of {cell:?} to {kind:?} rejected: {reason:?}");
            out_events.push(Event::TileFlipRejected { cell, reason });
            return;
        }

        match kind {
            TileKind::Floor => {
                // Opening a warned tile cancels its warning.
                self.pending_walls.retain(|pending| pending.cell != cell);
                if self.grid.set_kind(cell, TileKind::Floor).is_ok() {
                    out_events.push(Event::TileFlipped { cell, kind });
                }
            }
            TileKind::Wall if self.config.wall_warning_ticks == 0 => {
                if self.grid.set_kind(cell, TileKind::Wall).is_ok() {
                    out_events.push(Event::TileFlipped { cell, kind });
                }
            }
            TileKind::Wall => {
                if self.grid.mark_pending_wall(cell).is_ok() {
                    let ticks = self.config.wall_warning_ticks;
                    self.pending_walls.push(PendingWall {
                        cell,
                        remaining: ticks,
                    });
                    out_events.push(Event::WallWarning { cell, ticks });
                }
            }
        }
    }

    fn flip_rejection(&self, cell: CellCoord, kind: TileKind) -> Option<FlipRejection> {
        if !self.grid.contains(cell) || self.grid.is_border(cell) {
            return Some(FlipRejection::Border);
        }
        if cell == self.start || cell == self.exit {
            return Some(FlipRejection::Protected);
        }

        let current = self.grid.kind_at(cell);
        let pending = self.is_pending_wall(cell);
        match kind {
            TileKind::Floor if current == Some(TileKind::Floor) && !pending => {
                Some(FlipRejection::Unchanged)
            }
            TileKind::Floor => None,
            TileKind::Wall if pending || current == Some(TileKind::Wall) => {
                Some(FlipRejection::Unchanged)
            }
            TileKind::Wall => self.wall_rejection(cell, true),
        }
    }

    /// Checks whether `cell` may become a wall right now.
    ///
    /// With `include_pending` every pending wall is treated as solid as well,
    /// so several warnings cannot jointly seal the exit once they solidify.
    fn wall_rejection(&self, cell: CellCoord, include_pending: bool) -> Option<FlipRejection> {
        let occupied = cell == self.player.cell
            || self.enemies.iter().any(|enemy| enemy.cell == cell)
            || self.powerups.iter().any(|powerup| powerup.cell == cell);
        if occupied {
            return Some(FlipRejection::Occupied);
        }

        let mut changes: Vec<TileChange> = if include_pending {
            self.pending_walls
                .iter()
                .map(|pending| TileChange::wall(pending.cell))
                .collect()
        } else {
            Vec::new()
        };
        changes.push(TileChange::wall(cell));

        let keeps_player = connectivity::reachable_with_overrides(
            &self.grid,
            self.player.cell,
            self.exit,
            &changes,
        );
        let keeps_start =
            connectivity::reachable_with_overrides(&self.grid, self.start, self.exit, &changes);
        if keeps_player && keeps_start {
            None
        } else {
            Some(FlipRejection::WouldDisconnect)
        }
    }

    fn activate_ability(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            return;
        }
        if self.ability_charge < self.config.ability_max_charge {
            out_events.push(Event::AbilityUnavailable {
                charge: self.ability_charge,
            });
            return;
        }

        self.ability_charge = 0.0;
        let player = self.player.cell;
        let mut pushed = 0;
        for index in 0..self.enemies.len() {
            let from = self.enemies[index].cell;
            if from.manhattan_distance(player) > self.config.ability_radius {
                continue;
            }
            let Some(direction) = push_direction(player, from) else {
                continue;
            };

            let mut destination = from;
            for _ in 0..self.config.ability_push_distance {
                let Some(next) = destination.step(direction) else {
                    break;
                };
                let blocked = !self.grid.is_walkable(next)
                    || next == player
                    || self.enemies.iter().any(|enemy| enemy.cell == next);
                if blocked {
                    break;
                }
                destination = next;
            }

            if destination != from {
                let enemy = &mut self.enemies[index];
                enemy.cell = destination;
                enemy.path.clear();
                pushed += 1;
                out_events.push(Event::EnemyPushed {
                    enemy: enemy.id,
                    from,
                    to: destination,
                });
            }
        }

        out_events.push(Event::AbilityActivated { pushed });
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|candidate| candidate.id == enemy)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartLevel { level } => world.start_level(level, out_events),
        Command::ResetRun => world.reset_run(out_events),
        Command::Tick => world.advance_tick(out_events),
        Command::MovePlayer { direction } => world.move_player(direction, out_events),
        Command::SetEnemyPath { enemy, path } => world.set_enemy_path(enemy, path),
        Command::StepEnemy { enemy, direction } => world.step_enemy(enemy, direction, out_events),
        Command::ResolveContacts => world.resolve_contacts(out_events),
        Command::FlipTile { cell, kind } => world.flip_tile(cell, kind, out_events),
        Command::ActivateAbility => world.activate_ability(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use maze_chase_core::{
        CellCoord, EnemySnapshot, EnemyView, Grid, Phase, PlayerSnapshot, Powerup,
    };

    use super::{World, WorldConfig};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Provides read-only access to the maze grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Entrance of the current maze.
    #[must_use]
    pub fn start(world: &World) -> CellCoord {
        world.start
    }

    /// Exit of the current maze.
    #[must_use]
    pub fn exit(world: &World) -> CellCoord {
        world.exit
    }

    /// Current level number; zero before the first level starts.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.level
    }

    /// Lifecycle phase of the run.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Charge accumulated toward the special ability.
    #[must_use]
    pub fn ability_charge(world: &World) -> f32 {
        world.ability_charge
    }

    /// Reports whether the special ability can fire.
    #[must_use]
    pub fn ability_ready(world: &World) -> bool {
        world.ability_charge >= world.config.ability_max_charge
    }

    /// Tile currently occupied by the player.
    #[must_use]
    pub fn player_cell(world: &World) -> CellCoord {
        world.player.cell
    }

    /// Captures a read-only snapshot of the player.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            cell: world.player.cell,
            visual: world.player.visual,
            health: world.player.health,
            score: world.player.score,
            recent_moves: world.player.history.iter().copied().collect(),
        }
    }

    /// Captures a read-only view of the enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let decision_ticks = world.config.enemy_decision_ticks;
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    cell: enemy.cell,
                    visual: enemy.visual,
                    path: enemy.path.clone(),
                    ready_for_decision: enemy.decision_timer >= decision_ticks,
                })
                .collect(),
        )
    }

    /// Powerups currently lying in the maze.
    #[must_use]
    pub fn powerups(world: &World) -> &[Powerup] {
        &world.powerups
    }

    /// Tiles in their wall warning phase with the ticks left until they solidify.
    #[must_use]
    pub fn pending_walls(world: &World) -> Vec<(CellCoord, u32)> {
        world
            .pending_walls
            .iter()
            .map(|pending| (pending.cell, pending.remaining))
            .collect()
    }

    /// Tiles that maze mutation must leave alone because something rests on them.
    #[must_use]
    pub fn occupied_cells(world: &World) -> Vec<CellCoord> {
        world
            .enemies
            .iter()
            .map(|enemy| enemy.cell)
            .chain(world.powerups.iter().map(|powerup| powerup.cell))
            .collect()
    }
}

#[derive(Clone, Debug)]
struct Player {
    cell: CellCoord,
    visual: VisualPosition,
    health: i32,
    score: u32,
    history: VecDeque<Direction>,
}

impl Player {
    fn new(cell: CellCoord, health: i32) -> Self {
        Self {
            cell,
            visual: VisualPosition::at(cell),
            health,
            score: 0,
            history: VecDeque::with_capacity(MOVE_HISTORY_LEN),
        }
    }

    fn place(&mut self, cell: CellCoord) {
        self.cell = cell;
        self.visual = VisualPosition::at(cell);
    }

    fn record_move(&mut self, direction: Direction) {
        if self.history.len() == MOVE_HISTORY_LEN {
            let _ = self.history.pop_front();
        }
        self.history.push_back(direction);
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    cell: CellCoord,
    visual: VisualPosition,
    path: Vec<CellCoord>,
    decision_timer: u32,
}

impl Enemy {
    fn new(id: EnemyId, cell: CellCoord) -> Self {
        Self {
            id,
            cell,
            visual: VisualPosition::at(cell),
            path: Vec::new(),
            decision_timer: 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingWall {
    cell: CellCoord,
    remaining: u32,
}

/// Direction that moves `target` straight away from `origin` along the axis
/// with the larger separation; ties push horizontally.
fn push_direction(origin: CellCoord, target: CellCoord) -> Option<Direction> {
    let (dx, dy) = origin.offset_to(target);
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx.abs() >= dy.abs() {
        Some(if dx > 0 {
            Direction::East
        } else {
            Direction::West
        })
    } else {
        Some(if dy > 0 {
            Direction::South
        } else {
            Direction::North
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_layout(size: u32, player: CellCoord, enemies: Vec<CellCoord>) -> Layout {
        let mut grid = Grid::filled(size, TileKind::Wall);
        let interior: Vec<_> = grid.interior_cells().collect();
        for cell in interior {
            grid.set_kind(cell, TileKind::Floor).expect("interior");
        }
        Layout {
            grid,
            player,
            enemies,
            powerups: Vec::new(),
        }
    }

    fn config() -> WorldConfig {
        WorldConfig {
            wall_warning_ticks: 0,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn start_level_places_entities_on_floor() {
        let mut world = World::new(WorldConfig::default(), 5);
        let mut events = Vec::new();
        apply(&mut world, Command::StartLevel { level: 4 }, &mut events);

        assert_eq!(query::level(&world), 4);
        assert_eq!(query::player_cell(&world), CellCoord::new(1, 1));
        let enemies = query::enemy_view(&world);
        assert_eq!(enemies.len(), 3);
        for enemy in enemies.iter() {
            assert!(query::grid(&world).is_walkable(enemy.cell));
            assert!(enemy.cell.column() >= 5 && enemy.cell.row() >= 5);
        }
        assert_eq!(query::powerups(&world).len(), 3);
        for powerup in query::powerups(&world) {
            assert!(query::grid(&world).is_walkable(powerup.cell));
            assert_ne!(powerup.cell, query::exit(&world));
        }
        assert!(matches!(
            events.first(),
            Some(Event::LevelStarted {
                level: 4,
                enemies: 3
            })
        ));
    }

    #[test]
    fn move_into_wall_is_rejected_without_state_change() {
        let mut world = World::from_layout(config(), 1, open_layout(7, CellCoord::new(1, 1), vec![]));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::North,
            },
            &mut events,
        );

        assert_eq!(query::player_cell(&world), CellCoord::new(1, 1));
        assert_eq!(query::player(&world).score, 0);
        assert_eq!(
            events,
            vec![Event::PlayerMoveRejected {
                direction: Direction::North
            }]
        );
    }

    #[test]
    fn health_pickup_is_capped_and_replaced() {
        let mut layout = open_layout(7, CellCoord::new(1, 1), vec![]);
        layout.powerups = vec![
            Powerup {
                cell: CellCoord::new(2, 1),
                kind: PowerupKind::Health,
            },
            Powerup {
                cell: CellCoord::new(4, 4),
                kind: PowerupKind::Score,
            },
        ];
        let mut world = World::from_layout(config(), 1, layout);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::East,
            },
            &mut events,
        );

        assert_eq!(query::player(&world).health, 100);
        let powerups = query::powerups(&world);
        assert_eq!(powerups.len(), 2);
        assert!(powerups.iter().all(|powerup| powerup.cell != CellCoord::new(2, 1)));
        assert!(events.contains(&Event::PowerupCollected {
            cell: CellCoord::new(2, 1),
            kind: PowerupKind::Health
        }));
    }

    #[test]
    fn reaching_exit_reports_completion() {
        let mut world =
            World::from_layout(config(), 1, open_layout(5, CellCoord::new(3, 2), vec![]));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::South,
            },
            &mut events,
        );

        assert!(events.contains(&Event::LevelCompleted { level: 1, score: 1 }));
    }

    #[test]
    fn wall_flip_that_disconnects_is_rejected() {
        // Single corridor along row 1 from (1,1) to the exit column.
        let mut grid = Grid::filled(5, TileKind::Wall);
        for cell in [
            CellCoord::new(1, 1),
            CellCoord::new(2, 1),
            CellCoord::new(3, 1),
            CellCoord::new(3, 2),
            CellCoord::new(3, 3),
        ] {
            grid.set_kind(cell, TileKind::Floor).expect("interior");
        }
        let layout = Layout {
            grid,
            player: CellCoord::new(1, 1),
            enemies: vec![],
            powerups: vec![],
        };
        let mut world = World::from_layout(config(), 1, layout);
        let before = query::grid(&world).clone();
        let rejection = Event::TileFlipRejected {
            cell: CellCoord::new(2, 1),
            reason: FlipRejection::WouldDisconnect,
        };
        let mut events = Vec::new();
        for _ in 0..3 {
            apply(
                &mut world,
                Command::FlipTile {
                    cell: CellCoord::new(2, 1),
                    kind: TileKind::Wall,
                },
                &mut events,
            );
        }

        assert_eq!(events, vec![rejection.clone(), rejection.clone(), rejection]);
        assert_eq!(query::grid(&world), &before);
    }

    #[test]
    fn protected_and_border_tiles_never_flip() {
        let mut world = World::from_layout(config(), 1, open_layout(7, CellCoord::new(3, 3), vec![]));
        let mut events = Vec::new();
        for cell in [CellCoord::new(1, 1), CellCoord::new(5, 5), CellCoord::new(0, 3)] {
            apply(
                &mut world,
                Command::FlipTile {
                    cell,
                    kind: TileKind::Wall,
                },
                &mut events,
            );
        }

        assert_eq!(
            events,
            vec![
                Event::TileFlipRejected {
                    cell: CellCoord::new(1, 1),
                    reason: FlipRejection::Protected
                },
                Event::TileFlipRejected {
                    cell: CellCoord::new(5, 5),
                    reason: FlipRejection::Protected
                },
                Event::TileFlipRejected {
                    cell: CellCoord::new(0, 3),
                    reason: FlipRejection::Border
                },
            ]
        );
    }

    #[test]
    fn pending_wall_solidifies_after_warning() {
        let cfg = WorldConfig {
            wall_warning_ticks: 2,
            ..WorldConfig::default()
        };
        let mut world = World::from_layout(cfg, 1, open_layout(7, CellCoord::new(1, 1), vec![]));
        let cell = CellCoord::new(3, 3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::FlipTile {
                cell,
                kind: TileKind::Wall,
            },
            &mut events,
        );
        assert_eq!(events, vec![Event::WallWarning { cell, ticks: 2 }]);
        assert!(query::grid(&world).is_walkable(cell));

        events.clear();
        apply(&mut world, Command::Tick, &mut events);
        assert!(query::grid(&world).is_walkable(cell));
        apply(&mut world, Command::Tick, &mut events);

        assert_eq!(query::grid(&world).kind_at(cell), Some(TileKind::Wall));
        assert!(events.contains(&Event::TileFlipped {
            cell,
            kind: TileKind::Wall
        }));
        assert!(query::pending_walls(&world).is_empty());
    }

    #[test]
    fn pending_wall_is_cancelled_when_player_stands_on_it() {
        let cfg = WorldConfig {
            wall_warning_ticks: 1,
            ..WorldConfig::default()
        };
        let mut world = World::from_layout(cfg, 1, open_layout(7, CellCoord::new(1, 1), vec![]));
        let cell = CellCoord::new(2, 1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::FlipTile {
                cell,
                kind: TileKind::Wall,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::East,
            },
            &mut events,
        );
        events.clear();
        apply(&mut world, Command::Tick, &mut events);

        assert!(query::grid(&world).is_walkable(cell));
        assert!(events.contains(&Event::TileFlipRejected {
            cell,
            reason: FlipRejection::Occupied
        }));
    }

    #[test]
    fn contact_damage_is_gated_by_cooldown() {
        let mut world = World::from_layout(
            config(),
            1,
            open_layout(7, CellCoord::new(3, 3), vec![CellCoord::new(3, 3), CellCoord::new(1, 1)]),
        );
        let mut events = Vec::new();
        apply(&mut world, Command::ResolveContacts, &mut events);
        // Knocked back onto the start tile, where the second enemy waits.
        assert_eq!(query::player_cell(&world), CellCoord::new(1, 1));
        for _ in 0..10 {
            apply(&mut world, Command::Tick, &mut events);
            apply(&mut world, Command::ResolveContacts, &mut events);
        }

        let hits = events
            .iter()
            .filter(|event| matches!(event, Event::PlayerDamaged { .. }))
            .count();
        assert_eq!(hits, 1);
        assert_eq!(query::player(&world).health, 80);
    }

    #[test]
    fn lethal_contact_ends_the_run() {
        let cfg = WorldConfig {
            contact_damage: 150,
            ..config()
        };
        let mut world = World::from_layout(
            cfg,
            1,
            open_layout(7, CellCoord::new(3, 3), vec![CellCoord::new(3, 3)]),
        );
        let mut events = Vec::new();
        apply(&mut world, Command::ResolveContacts, &mut events);

        assert_eq!(query::phase(&world), Phase::GameOver);
        assert!(events.contains(&Event::GameOver { score: 0, level: 1 }));

        events.clear();
        apply(&mut world, Command::Tick, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn ability_pushes_nearby_enemies_away() {
        let cfg = WorldConfig {
            ability_charge_per_tick: 100.0,
            ..config()
        };
        let mut world = World::from_layout(
            cfg,
            1,
            open_layout(9, CellCoord::new(3, 3), vec![CellCoord::new(4, 3), CellCoord::new(7, 7)]),
        );
        let mut events = Vec::new();
        apply(&mut world, Command::ActivateAbility, &mut events);
        assert!(matches!(events[0], Event::AbilityUnavailable { .. }));

        apply(&mut world, Command::Tick, &mut events);
        events.clear();
        apply(&mut world, Command::ActivateAbility, &mut events);

        assert_eq!(
            events,
            vec![
                Event::EnemyPushed {
                    enemy: EnemyId::new(0),
                    from: CellCoord::new(4, 3),
                    to: CellCoord::new(6, 3)
                },
                Event::AbilityActivated { pushed: 1 },
            ]
        );
        assert!(!query::ability_ready(&world));
    }

    #[test]
    fn move_history_keeps_recent_moves_only() {
        let mut world = World::from_layout(config(), 1, open_layout(7, CellCoord::new(1, 1), vec![]));
        let mut events = Vec::new();
        for _ in 0..15 {
            for direction in [Direction::East, Direction::West] {
                apply(&mut world, Command::MovePlayer { direction }, &mut events);
            }
        }
        assert_eq!(query::player(&world).recent_moves.len(), MOVE_HISTORY_LEN);
    }
}
