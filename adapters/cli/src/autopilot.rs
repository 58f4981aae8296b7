//! Scripted player that walks the shortest route to the exit.

use maze_chase_core::Direction;
use maze_chase_simulation::{MoveOutcome, Simulation};
use maze_chase_world::{pathfinding, query, World};

/// Moves the player along the current shortest path at a fixed pace and
/// fires the special ability whenever an enemy comes within its reach.
#[derive(Debug)]
pub(crate) struct Autopilot {
    move_interval: u32,
    elapsed: u32,
}

impl Autopilot {
    /// Creates an autopilot that moves once every `move_interval` ticks.
    pub(crate) fn new(move_interval: u32) -> Self {
        Self {
            move_interval: move_interval.max(1),
            elapsed: 0,
        }
    }

    /// Issues this tick's input, if any.
    pub(crate) fn drive(&mut self, simulation: &mut Simulation) -> Option<MoveOutcome> {
        if threatened(simulation.world()) && simulation.trigger_special_ability().activated {
            log::debug!("autopilot fired the special ability");
        }

        self.elapsed += 1;
        if self.elapsed < self.move_interval {
            return None;
        }
        self.elapsed = 0;

        let direction = next_step(simulation.world())?;
        let (dx, dy) = direction.delta();
        Some(simulation.attempt_player_move(dx, dy))
    }
}

/// First step of the shortest path from the player to the exit.
pub(crate) fn next_step(world: &World) -> Option<Direction> {
    let from = query::player_cell(world);
    let path = pathfinding::find_path(query::grid(world), from, query::exit(world));
    path.get(1).and_then(|next| Direction::between(from, *next))
}

fn threatened(world: &World) -> bool {
    if !query::ability_ready(world) {
        return false;
    }
    let player = query::player_cell(world);
    let radius = query::config(world).ability_radius;
    query::enemy_view(world)
        .iter()
        .any(|enemy| enemy.cell.manhattan_distance(player) <= radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_simulation::SimulationConfig;

    #[test]
    fn autopilot_reaches_the_exit_without_ticks() {
        let mut simulation = Simulation::new(SimulationConfig::default()).expect("valid config");
        let mut autopilot = Autopilot::new(1);

        let mut completed = false;
        for _ in 0..500 {
            if let Some(outcome) = autopilot.drive(&mut simulation) {
                assert!(outcome.accepted);
                if outcome.reached_exit {
                    completed = true;
                    break;
                }
            }
        }

        assert!(completed);
        assert_eq!(query::level(simulation.world()), 2);
    }

    #[test]
    fn autopilot_respects_its_pace() {
        let mut simulation = Simulation::new(SimulationConfig::default()).expect("valid config");
        let mut autopilot = Autopilot::new(3);

        assert!(autopilot.drive(&mut simulation).is_none());
        assert!(autopilot.drive(&mut simulation).is_none());
        assert!(autopilot.drive(&mut simulation).is_some());
    }
}
