//! ASCII frames of the maze for terminal output.

use maze_chase_core::{CellCoord, PowerupKind, TileKind};
use maze_chase_world::{query, World};

/// Draws the maze followed by a status line.
///
/// `#` wall, `.` floor, `!` wall warning, `S` start, `E` exit, `@` player,
/// `X` enemy, `+` health powerup, `$` score powerup.
pub(crate) fn frame(world: &World) -> String {
    let grid = query::grid(world);
    let player = query::player(world);
    let enemies = query::enemy_view(world);
    let size = grid.size();

    let mut out = String::with_capacity((size as usize + 1) * size as usize + 64);
    for row in 0..size {
        for column in 0..size {
            let cell = CellCoord::new(column, row);
            let glyph = if cell == player.cell {
                '@'
            } else if enemies.iter().any(|enemy| enemy.cell == cell) {
                'X'
            } else if let Some(powerup) = query::powerups(world)
                .iter()
                .find(|powerup| powerup.cell == cell)
            {
                match powerup.kind {
                    PowerupKind::Health => '+',
                    PowerupKind::Score => '$',
                }
            } else if cell == query::exit(world) {
                'E'
            } else if cell == query::start(world) {
                'S'
            } else {
                match grid.tile_at(cell) {
                    Ok(tile) if tile.is_pending_wall() => '!',
                    Ok(tile) if tile.kind() == TileKind::Floor => '.',
                    _ => '#',
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "level {}  health {}  score {}  charge {:.0}%  tick {}",
        query::level(world),
        player.health,
        player.score,
        query::ability_charge(world) / query::config(world).ability_max_charge * 100.0,
        query::tick_index(world),
    ));
    out
}
