use maze_chase_core::{CellCoord, Event, Grid, Phase, Powerup, PowerupKind, TileKind};
use maze_chase_simulation::{Simulation, SimulationConfig};
use maze_chase_system_adaptation::AdaptationConfig;
use maze_chase_system_pursuit::PursuitConfig;
use maze_chase_world::{connectivity, pathfinding, query, Layout, World};

fn open_grid(size: u32) -> Grid {
    let mut grid = Grid::filled(size, TileKind::Wall);
    let interior: Vec<_> = grid.interior_cells().collect();
    for cell in interior {
        grid.set_kind(cell, TileKind::Floor).expect("interior");
    }
    grid
}

fn calm_config() -> SimulationConfig {
    SimulationConfig {
        pursuit: PursuitConfig {
            base_intelligence: 1.0,
            intelligence_growth: 0.0,
            max_intelligence: 1.0,
        },
        adaptation: AdaptationConfig {
            rate: 0.0,
            ..AdaptationConfig::default()
        },
        ..SimulationConfig::default()
    }
}

fn simulation_with(config: SimulationConfig, layout: Layout) -> Simulation {
    let world = World::from_layout(config.world.clone(), config.seed, layout);
    Simulation::with_world(config, world).expect("valid config")
}

#[test]
fn contact_deals_one_hit_per_decision_window() {
    let config = calm_config();
    let cooldown = u64::from(config.world.damage_cooldown_ticks);
    let mut simulation = simulation_with(
        config,
        Layout {
            grid: open_grid(9),
            player: CellCoord::new(1, 1),
            enemies: vec![CellCoord::new(2, 1)],
            powerups: Vec::new(),
        },
    );

    let mut hits = Vec::new();
    for _ in 0..400 {
        simulation.tick();
        let tick = query::tick_index(simulation.world());
        for event in simulation.drain_events() {
            if let Event::PlayerDamaged { amount, .. } = event {
                assert_eq!(amount, 20);
                hits.push(tick);
            }
        }
    }

    assert_eq!(hits.len(), 5, "five hits of 20 drain 100 health");
    for pair in hits.windows(2) {
        assert!(
            pair[1] - pair[0] >= cooldown,
            "hits at ticks {} and {} fall into one window",
            pair[0],
            pair[1]
        );
    }
    assert_eq!(query::phase(simulation.world()), Phase::GameOver);
    assert!(query::player(simulation.world()).health <= 0);
}

#[test]
fn game_over_freezes_until_restart() {
    let mut config = calm_config();
    config.world.contact_damage = 500;
    let mut simulation = simulation_with(
        config,
        Layout {
            grid: open_grid(9),
            player: CellCoord::new(2, 2),
            enemies: vec![CellCoord::new(2, 2)],
            powerups: Vec::new(),
        },
    );

    simulation.tick();
    assert_eq!(query::phase(simulation.world()), Phase::GameOver);
    let frozen = query::tick_index(simulation.world());
    simulation.tick();
    assert_eq!(query::tick_index(simulation.world()), frozen);
    assert!(!simulation.attempt_player_move(1, 0).accepted);

    simulation.restart();
    let player = query::player(simulation.world());
    assert_eq!(query::phase(simulation.world()), Phase::Running);
    assert_eq!(query::level(simulation.world()), 1);
    assert_eq!(player.health, 100);
    assert_eq!(player.score, 0);
}

#[test]
fn health_pickup_is_capped_and_count_is_kept() {
    let mut simulation = simulation_with(
        calm_config(),
        Layout {
            grid: open_grid(9),
            player: CellCoord::new(1, 1),
            enemies: Vec::new(),
            powerups: vec![
                Powerup {
                    cell: CellCoord::new(2, 1),
                    kind: PowerupKind::Health,
                },
                Powerup {
                    cell: CellCoord::new(3, 1),
                    kind: PowerupKind::Score,
                },
                Powerup {
                    cell: CellCoord::new(5, 5),
                    kind: PowerupKind::Score,
                },
            ],
        },
    );

    assert!(simulation.attempt_player_move(1, 0).accepted);
    let player = query::player(simulation.world());
    assert_eq!(player.health, 100);
    assert_eq!(query::powerups(simulation.world()).len(), 3);

    assert!(simulation.attempt_player_move(1, 0).accepted);
    assert_eq!(query::player(simulation.world()).score, 2 + 50);
    assert_eq!(query::powerups(simulation.world()).len(), 3);
}

#[test]
fn invalid_moves_are_rejected() {
    let mut simulation = simulation_with(
        calm_config(),
        Layout {
            grid: open_grid(9),
            player: CellCoord::new(1, 1),
            enemies: Vec::new(),
            powerups: Vec::new(),
        },
    );

    assert!(!simulation.attempt_player_move(0, -1).accepted, "border wall");
    assert!(!simulation.attempt_player_move(1, 1).accepted, "diagonal");
    assert!(!simulation.attempt_player_move(2, 0).accepted, "jump");
    assert!(!simulation.attempt_player_move(0, 0).accepted, "no-op");

    simulation.set_paused(true);
    assert!(!simulation.attempt_player_move(1, 0).accepted, "paused");
    simulation.set_paused(false);
    assert!(simulation.attempt_player_move(1, 0).accepted);
    assert_eq!(query::player_cell(simulation.world()), CellCoord::new(2, 1));
}

#[test]
fn walking_the_shortest_path_completes_the_level() {
    let mut simulation = Simulation::new(calm_config()).expect("valid config");
    let world = simulation.world();
    let path = pathfinding::find_path(query::grid(world), query::start(world), query::exit(world));
    assert!(path.len() >= 2);

    let mut outcome = Default::default();
    for pair in path.windows(2) {
        let dx = i32::try_from(pair[1].column()).expect("small grid")
            - i32::try_from(pair[0].column()).expect("small grid");
        let dy = i32::try_from(pair[1].row()).expect("small grid")
            - i32::try_from(pair[0].row()).expect("small grid");
        outcome = simulation.attempt_player_move(dx, dy);
        assert!(outcome.accepted);
    }

    assert!(outcome.reached_exit);
    assert_eq!(query::level(simulation.world()), 2);
    assert_eq!(
        query::player_cell(simulation.world()),
        query::start(simulation.world())
    );
    assert!(simulation
        .drain_events()
        .iter()
        .any(|event| matches!(event, Event::LevelStarted { level: 2, .. })));
}

#[test]
fn exit_remains_reachable_while_the_maze_adapts() {
    let config = SimulationConfig {
        seed: 31,
        adaptation: AdaptationConfig {
            cadence_ticks: 2,
            rate: 1.0,
            ..AdaptationConfig::default()
        },
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::new(config).expect("valid config");
    let moves = [(1, 0), (0, 1), (-1, 0), (0, -1)];

    for step in 0..600 {
        if step % 5 == 0 {
            let (dx, dy) = moves[(step / 5) % moves.len()];
            let _ = simulation.attempt_player_move(dx, dy);
        }
        simulation.tick();
        if query::phase(simulation.world()) == Phase::GameOver {
            simulation.restart();
        }

        let world = simulation.world();
        let grid = query::grid(world);
        let exit = query::exit(world);
        assert!(connectivity::reachable(grid, query::start(world), exit));
        assert!(connectivity::reachable(grid, query::player_cell(world), exit));
    }
}

#[test]
fn ability_pushes_enemies_once_charged() {
    let mut config = calm_config();
    config.world.ability_charge_per_tick = 50.0;
    config.world.enemy_decision_ticks = 1000;
    let mut simulation = simulation_with(
        config,
        Layout {
            grid: open_grid(11),
            player: CellCoord::new(5, 5),
            enemies: vec![CellCoord::new(5, 3)],
            powerups: Vec::new(),
        },
    );

    assert!(!simulation.trigger_special_ability().activated);
    simulation.tick();
    simulation.tick();
    assert!(query::ability_ready(simulation.world()));
    assert!(simulation.trigger_special_ability().activated);

    let enemy = query::enemy_view(simulation.world())
        .into_vec()
        .pop()
        .expect("enemy present");
    assert_eq!(enemy.cell, CellCoord::new(5, 1));
    assert!(!query::ability_ready(simulation.world()));
}
