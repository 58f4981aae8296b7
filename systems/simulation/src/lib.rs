#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step simulation clock that wires the world and its systems together.
//!
//! Every [`Simulation::tick`] runs the same pipeline: advance time, let the
//! pursuit system steer enemies, resolve contacts and pickups, then let the
//! adaptation system mutate the maze. Player input is applied immediately
//! between ticks. Every event the world emits is kept for
//! [`Simulation::drain_events`].

mod config;

use std::{collections::VecDeque, mem};

use maze_chase_core::{Command, Direction, Event, Phase};
use maze_chase_system_adaptation::{Adaptation, Anchors};
use maze_chase_system_pursuit::Pursuit;
use maze_chase_world::{self as world, query, World};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use config::{ConfigError, SimulationConfig};

/// Result of a movement request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The player changed tiles.
    pub accepted: bool,
    /// The move completed the level; the next level is already running.
    pub reached_exit: bool,
}

/// Result of a special ability request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AbilityOutcome {
    /// The ability fired and consumed its charge.
    pub activated: bool,
}

/// Owns the world and the systems and advances them in lockstep.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    pursuit: Pursuit,
    adaptation: Adaptation,
    paused: bool,
    inbox: Vec<Event>,
    journal: Vec<Event>,
}

impl Simulation {
    /// Validates the configuration and starts level one.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = World::new(config.world.clone(), derive_seed(config.seed, 0));
        let mut simulation = Self::with_world(config, world)?;
        let mut events = Vec::new();
        simulation.execute(Command::StartLevel { level: 1 }, &mut events);
        Ok(simulation)
    }

    /// Wraps an already prepared world, typically a hand-authored layout.
    pub fn with_world(config: SimulationConfig, world: World) -> Result<Self, ConfigError> {
        config.validate()?;
        log::debug!("simulation seeded with {:#x}", config.seed);
        Ok(Self {
            pursuit: Pursuit::new(config.pursuit, derive_seed(config.seed, 1)),
            adaptation: Adaptation::new(config.adaptation, derive_seed(config.seed, 2)),
            config,
            world,
            paused: false,
            inbox: Vec::new(),
            journal: Vec::new(),
        })
    }

    /// Configuration the simulation runs with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Read-only access to the world for [`maze_chase_world::query`].
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Advances the simulation by one fixed step.
    ///
    /// Does nothing while paused or after the run ended.
    pub fn tick(&mut self) {
        if self.paused || query::phase(&self.world) != Phase::Running {
            return;
        }

        let mut scratch = Vec::new();
        self.execute(Command::Tick, &mut scratch);
        let events = mem::take(&mut self.inbox);

        let mut commands = Vec::new();
        let enemies = query::enemy_view(&self.world);
        self.pursuit.handle(
            &events,
            query::grid(&self.world),
            &enemies,
            query::player_cell(&self.world),
            &mut commands,
        );
        self.execute_all(commands, &mut scratch);

        self.execute(Command::ResolveContacts, &mut scratch);
        if query::phase(&self.world) != Phase::Running {
            return;
        }

        let mut commands = Vec::new();
        let player = query::player(&self.world);
        let occupied = query::occupied_cells(&self.world);
        self.adaptation.handle(
            &events,
            query::grid(&self.world),
            Anchors {
                player: &player,
                start: query::start(&self.world),
                exit: query::exit(&self.world),
                occupied: &occupied,
            },
            &mut commands,
        );
        self.execute_all(commands, &mut scratch);
    }

    /// Moves the player by a unit delta.
    ///
    /// Non-unit deltas, walls, pauses and finished runs reject the move.
    pub fn attempt_player_move(&mut self, dx: i32, dy: i32) -> MoveOutcome {
        let Some(direction) = Direction::from_delta(dx, dy) else {
            return MoveOutcome::default();
        };
        if self.paused {
            return MoveOutcome::default();
        }

        let mut events = Vec::new();
        self.execute(Command::MovePlayer { direction }, &mut events);
        MoveOutcome {
            accepted: events
                .iter()
                .any(|event| matches!(event, Event::PlayerMoved { .. })),
            reached_exit: events
                .iter()
                .any(|event| matches!(event, Event::LevelCompleted { .. })),
        }
    }

    /// Fires the special ability when fully charged.
    pub fn trigger_special_ability(&mut self) -> AbilityOutcome {
        if self.paused {
            return AbilityOutcome::default();
        }

        let mut events = Vec::new();
        self.execute(Command::ActivateAbility, &mut events);
        AbilityOutcome {
            activated: events
                .iter()
                .any(|event| matches!(event, Event::AbilityActivated { .. })),
        }
    }

    /// Starts a fresh run on level one with full health and zero score.
    pub fn restart(&mut self) {
        self.paused = false;
        let mut events = Vec::new();
        self.execute(Command::ResetRun, &mut events);
    }

    /// Suspends or resumes tick processing and input.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Reports whether the simulation is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns every event emitted since the previous drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.journal)
    }

    fn execute_all(&mut self, commands: Vec<Command>, out: &mut Vec<Event>) {
        for command in commands {
            self.execute(command, out);
        }
    }

    /// Applies a command and every follow-up it triggers.
    fn execute(&mut self, command: Command, out: &mut Vec<Event>) {
        let mut queue = VecDeque::from([command]);
        while let Some(command) = queue.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            for event in &events {
                if let Event::LevelCompleted { level, .. } = event {
                    queue.push_back(Command::StartLevel {
                        level: level.saturating_add(1),
                    });
                }
            }
            self.inbox.extend(events.iter().cloned());
            self.journal.extend(events.iter().cloned());
            out.extend(events);
        }
    }
}

/// Independent stream seed for one consumer of the master seed.
fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng.next_u64()
}
