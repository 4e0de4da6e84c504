//! Collision queries against the tile grid and world bounds.
//!
//! The core never talks to an engine physics backend. Two primitives cover
//! everything it needs:
//!
//! - [`move_aabb`]: per-axis swept movement of an axis-aligned box, clamping
//!   against solid cells and the world rectangle. Used by the character.
//! - [`cast_ray`]: DDA traversal of the grid returning the first obstruction
//!   as a [`Contact`] value. Used by the ball's flight, the aim-assist
//!   indicator, and the spawn-side probes.
//!
//! A contact is a plain value `{point, normal, tag}`; nothing here calls back
//! into gameplay code.

use crate::grid::TileGrid;

/// Skin distance kept between a resolved body and the surface it hit.
const SKIN: f32 = 0.05;

/// What a collision landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTag {
    /// A destructible grid tile.
    Tile,
    /// An indestructible beam/girder/support tile.
    Beam,
    /// The world boundary rectangle.
    Bounds,
}

/// Minimal collision result value.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Contact point on the struck surface.
    pub px: f32,
    pub py: f32,
    /// Outward surface normal (unit, axis-aligned).
    pub nx: f32,
    pub ny: f32,
    pub tag: SurfaceTag,
}

/// Result of a swept AABB move.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveResult {
    /// Final center after clamping.
    pub x: f32,
    pub y: f32,
    /// Horizontal motion was blocked.
    pub hit_x: bool,
    /// Downward motion was blocked (floor).
    pub hit_down: bool,
    /// Upward motion was blocked (ceiling).
    pub hit_up: bool,
}

/// Reflect velocity `v` about unit surface normal `n` (specular, speed
/// preserving): `v' = v - 2 (v . n) n`.
pub fn reflect(vx: f32, vy: f32, nx: f32, ny: f32) -> (f32, f32) {
    let dot = vx * nx + vy * ny;
    (vx - 2.0 * dot * nx, vy - 2.0 * dot * ny)
}

/// Inclusive cell range covered by a span `[min, max)` with a small inset so
/// bodies flush against a cell boundary do not register the neighbor cell.
fn cell_span(grid: &TileGrid, min: f32, max: f32) -> (i32, i32) {
    let inset = 1e-3;
    (
        ((min + inset) / grid.tile_size).floor() as i32,
        ((max - inset) / grid.tile_size).floor() as i32,
    )
}

fn column_solid(grid: &TileGrid, col: i32, row_min: i32, row_max: i32) -> bool {
    (row_min..=row_max).any(|row| grid.solid_tag((col, row)).is_some())
}

fn row_solid(grid: &TileGrid, row: i32, col_min: i32, col_max: i32) -> bool {
    (col_min..=col_max).any(|col| grid.solid_tag((col, row)).is_some())
}

/// Move an AABB (center `cx, cy`, half extents `hx, hy`) by `(dx, dy)`,
/// resolving each axis independently against solid cells and world bounds.
pub fn move_aabb(grid: &TileGrid, cx: f32, cy: f32, hx: f32, hy: f32, dx: f32, dy: f32) -> MoveResult {
    let ts = grid.tile_size;
    let mut result = MoveResult {
        x: cx,
        y: cy,
        ..Default::default()
    };

    // Horizontal axis.
    if dx != 0.0 {
        let (row_min, row_max) = cell_span(grid, cy - hy, cy + hy);
        let sign = dx.signum();
        let start_col = (((result.x + sign * hx) + if dx > 0.0 { -1e-3 } else { 1e-3 }) / ts).floor() as i32;
        let target_edge = result.x + dx + sign * hx;
        let end_col = (target_edge / ts).floor() as i32;

        let mut blocked_at = None;
        let mut col = start_col + sign as i32;
        loop {
            if (dx > 0.0 && col > end_col) || (dx < 0.0 && col < end_col) {
                break;
            }
            if column_solid(grid, col, row_min, row_max) {
                blocked_at = Some(col);
                break;
            }
            col += sign as i32;
        }

        match blocked_at {
            Some(col) => {
                let face = if dx > 0.0 { col as f32 * ts } else { (col + 1) as f32 * ts };
                result.x = face - sign * (hx + SKIN);
                result.hit_x = true;
            }
            None => result.x = cx + dx,
        }

        // World bounds on x.
        if result.x - hx < 0.0 {
            result.x = hx + SKIN;
            result.hit_x = true;
        } else if grid.width > 0.0 && result.x + hx > grid.width {
            result.x = grid.width - hx - SKIN;
            result.hit_x = true;
        }
    }

    // Vertical axis, using the resolved x.
    if dy != 0.0 {
        let (col_min, col_max) = cell_span(grid, result.x - hx, result.x + hx);
        let sign = dy.signum();
        let start_row = (((cy + sign * hy) + if dy > 0.0 { -1e-3 } else { 1e-3 }) / ts).floor() as i32;
        let target_edge = cy + dy + sign * hy;
        let end_row = (target_edge / ts).floor() as i32;

        let mut blocked_at = None;
        let mut row = start_row + sign as i32;
        loop {
            if (dy > 0.0 && row > end_row) || (dy < 0.0 && row < end_row) {
                break;
            }
            if row_solid(grid, row, col_min, col_max) {
                blocked_at = Some(row);
                break;
            }
            row += sign as i32;
        }

        match blocked_at {
            Some(row) => {
                let face = if dy > 0.0 { row as f32 * ts } else { (row + 1) as f32 * ts };
                result.y = face - sign * (hy + SKIN);
                if dy < 0.0 {
                    result.hit_down = true;
                } else {
                    result.hit_up = true;
                }
            }
            None => result.y = cy + dy,
        }

        // World bounds on y (floorless worlds kill via fall-out, so only the
        // ceiling is clamped here).
        if grid.height > 0.0 && result.y + hy > grid.height {
            result.y = grid.height - hy - SKIN;
            result.hit_up = true;
        }
    } else {
        result.y = cy;
    }

    result
}

/// Probe one tile-width below an AABB for solid ground.
pub fn grounded(grid: &TileGrid, cx: f32, cy: f32, hx: f32, hy: f32) -> bool {
    let probe = cy - hy - SKIN * 4.0;
    let (col_min, col_max) = cell_span(grid, cx - hx, cx + hx);
    let row = (probe / grid.tile_size).floor() as i32;
    row_solid(grid, row, col_min, col_max)
}

/// Cast a ray from `(ox, oy)` along unit direction `(dx, dy)` up to
/// `max_len`, returning the first obstruction (solid cell or world bound).
///
/// Starting inside a solid cell reports a zero-distance contact whose normal
/// opposes the dominant ray axis.
pub fn cast_ray(
    grid: &TileGrid,
    ox: f32,
    oy: f32,
    dx: f32,
    dy: f32,
    max_len: f32,
) -> Option<(f32, Contact)> {
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-6 || max_len <= 0.0 {
        return None;
    }
    let (dx, dy) = (dx / len, dy / len);
    let ts = grid.tile_size;

    let (mut cell_x, mut cell_y) = grid.world_to_cell(ox, oy);

    if let Some(tag) = grid.solid_tag((cell_x, cell_y)) {
        let (nx, ny) = if dx.abs() >= dy.abs() {
            (-dx.signum(), 0.0)
        } else {
            (0.0, -dy.signum())
        };
        return Some((
            0.0,
            Contact {
                px: ox,
                py: oy,
                nx,
                ny,
                tag,
            },
        ));
    }

    let step_x: i32 = if dx > 0.0 { 1 } else { -1 };
    let step_y: i32 = if dy > 0.0 { 1 } else { -1 };

    // Distance along the ray to the next vertical/horizontal cell boundary.
    let mut t_max_x = if dx != 0.0 {
        let next = if dx > 0.0 {
            (cell_x + 1) as f32 * ts
        } else {
            cell_x as f32 * ts
        };
        (next - ox) / dx
    } else {
        f32::INFINITY
    };
    let mut t_max_y = if dy != 0.0 {
        let next = if dy > 0.0 {
            (cell_y + 1) as f32 * ts
        } else {
            cell_y as f32 * ts
        };
        (next - oy) / dy
    } else {
        f32::INFINITY
    };
    let t_delta_x = if dx != 0.0 { ts / dx.abs() } else { f32::INFINITY };
    let t_delta_y = if dy != 0.0 { ts / dy.abs() } else { f32::INFINITY };

    // Distance at which the ray leaves the world rectangle.
    let t_bounds = bounds_exit(grid, ox, oy, dx, dy);

    loop {
        let (t, nx, ny) = if t_max_x <= t_max_y {
            let t = t_max_x;
            t_max_x += t_delta_x;
            cell_x += step_x;
            (t, -(step_x as f32), 0.0)
        } else {
            let t = t_max_y;
            t_max_y += t_delta_y;
            cell_y += step_y;
            (t, 0.0, -(step_y as f32))
        };

        if let Some(tb) = t_bounds {
            if tb < t && tb <= max_len {
                let (bnx, bny) = bounds_normal(grid, ox + dx * tb, oy + dy * tb);
                return Some((
                    tb,
                    Contact {
                        px: ox + dx * tb,
                        py: oy + dy * tb,
                        nx: bnx,
                        ny: bny,
                        tag: SurfaceTag::Bounds,
                    },
                ));
            }
        }
        if t > max_len {
            return None;
        }

        if let Some(tag) = grid.solid_tag((cell_x, cell_y)) {
            return Some((
                t,
                Contact {
                    px: ox + dx * t,
                    py: oy + dy * t,
                    nx,
                    ny,
                    tag,
                },
            ));
        }
    }
}

/// Distance along the ray at which it exits the world rectangle, if the world
/// has bounds and the ray is heading out.
fn bounds_exit(grid: &TileGrid, ox: f32, oy: f32, dx: f32, dy: f32) -> Option<f32> {
    if grid.width <= 0.0 || grid.height <= 0.0 {
        return None;
    }
    let mut t_exit = f32::INFINITY;
    if dx > 0.0 {
        t_exit = t_exit.min((grid.width - ox) / dx);
    } else if dx < 0.0 {
        t_exit = t_exit.min((0.0 - ox) / dx);
    }
    if dy > 0.0 {
        t_exit = t_exit.min((grid.height - oy) / dy);
    } else if dy < 0.0 {
        t_exit = t_exit.min((0.0 - oy) / dy);
    }
    t_exit.is_finite().then_some(t_exit.max(0.0))
}

/// Inward normal of the world-bound face nearest a point.
fn bounds_normal(grid: &TileGrid, px: f32, py: f32) -> (f32, f32) {
    let eps = 0.5;
    if px <= eps {
        (1.0, 0.0)
    } else if grid.width > 0.0 && px >= grid.width - eps {
        (-1.0, 0.0)
    } else if py <= eps {
        (0.0, 1.0)
    } else {
        (0.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Tile, TileMaterial};

    fn test_grid() -> TileGrid {
        // 20x15 cell world at 16 units per cell.
        TileGrid::new(320.0, 240.0, 16.0)
    }

    #[test]
    fn test_reflect_off_vertical_wall() {
        let (vx, vy) = reflect(10.0, 0.0, -1.0, 0.0);
        assert!((vx - -10.0).abs() < 1e-6);
        assert!(vy.abs() < 1e-6);
    }

    #[test]
    fn test_reflect_preserves_speed() {
        let (vx, vy) = reflect(3.0, -4.0, 0.0, 1.0);
        let speed = (vx * vx + vy * vy).sqrt();
        assert!((speed - 5.0).abs() < 1e-5);
        assert!((vx - 3.0).abs() < 1e-6);
        assert!((vy - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_reflect_grazing_is_identity_for_tangent() {
        // Velocity parallel to the surface is unchanged.
        let (vx, vy) = reflect(7.0, 0.0, 0.0, 1.0);
        assert!((vx - 7.0).abs() < 1e-6);
        assert!(vy.abs() < 1e-6);
    }

    #[test]
    fn test_move_aabb_free_space() {
        let grid = test_grid();
        let result = move_aabb(&grid, 100.0, 100.0, 6.0, 14.0, 5.0, -3.0);
        assert!((result.x - 105.0).abs() < 1e-4);
        assert!((result.y - 97.0).abs() < 1e-4);
        assert!(!result.hit_x && !result.hit_down && !result.hit_up);
    }

    #[test]
    fn test_move_aabb_lands_on_floor() {
        let mut grid = test_grid();
        // Floor row at cells y=2 (tops at y=48).
        for col in 0..20 {
            grid.insert((col, 2), Tile::new(TileMaterial::Beam));
        }
        let result = move_aabb(&grid, 100.0, 70.0, 6.0, 14.0, 0.0, -20.0);
        assert!(result.hit_down);
        // Body bottom rests on the face at y=48.
        assert!((result.y - 14.0 - 48.0).abs() < 0.1);
    }

    #[test]
    fn test_move_aabb_blocked_by_wall() {
        let mut grid = test_grid();
        // Wall column at cells x=8 (left face at x=128).
        for row in 0..15 {
            grid.insert((8, row), Tile::new(TileMaterial::Brick));
        }
        let result = move_aabb(&grid, 110.0, 100.0, 6.0, 14.0, 40.0, 0.0);
        assert!(result.hit_x);
        assert!(result.x + 6.0 <= 128.0);
        assert!((result.x + 6.0 - 128.0).abs() < 0.1);
    }

    #[test]
    fn test_move_aabb_clamped_to_world() {
        let grid = test_grid();
        let result = move_aabb(&grid, 10.0, 100.0, 6.0, 14.0, -50.0, 0.0);
        assert!(result.hit_x);
        assert!(result.x - 6.0 >= 0.0);
    }

    #[test]
    fn test_grounded_probe() {
        let mut grid = test_grid();
        for col in 0..20 {
            grid.insert((col, 2), Tile::new(TileMaterial::Beam));
        }
        // Resting just above the floor face at y=48.
        assert!(grounded(&grid, 100.0, 48.0 + 14.0 + 0.05, 6.0, 14.0));
        // Well above it.
        assert!(!grounded(&grid, 100.0, 100.0, 6.0, 14.0));
    }

    #[test]
    fn test_cast_ray_hits_wall_face() {
        let mut grid = test_grid();
        grid.insert((8, 6), Tile::new(TileMaterial::Brick));
        // Ray from the left at cell row 6 (y = 104).
        let (dist, contact) = cast_ray(&grid, 100.0, 104.0, 1.0, 0.0, 300.0).unwrap();
        assert!((dist - 28.0).abs() < 1e-3); // left face at x=128
        assert_eq!(contact.tag, SurfaceTag::Tile);
        assert!((contact.nx - -1.0).abs() < 1e-6);
        assert_eq!(contact.ny, 0.0);
    }

    #[test]
    fn test_cast_ray_respects_max_len() {
        let mut grid = test_grid();
        grid.insert((8, 6), Tile::new(TileMaterial::Brick));
        assert!(cast_ray(&grid, 100.0, 104.0, 1.0, 0.0, 20.0).is_none());
    }

    #[test]
    fn test_cast_ray_hits_world_bounds() {
        let grid = test_grid();
        let (dist, contact) = cast_ray(&grid, 300.0, 100.0, 1.0, 0.0, 500.0).unwrap();
        assert_eq!(contact.tag, SurfaceTag::Bounds);
        assert!((dist - 20.0).abs() < 1e-3);
        assert!((contact.nx - -1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cast_ray_starting_inside_solid() {
        let mut grid = test_grid();
        grid.insert((2, 2), Tile::new(TileMaterial::Beam));
        let (dist, contact) = cast_ray(&grid, 40.0, 40.0, 1.0, 0.0, 100.0).unwrap();
        assert_eq!(dist, 0.0);
        assert_eq!(contact.tag, SurfaceTag::Beam);
        assert!((contact.nx - -1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cast_ray_diagonal_normal_is_axis_aligned() {
        let mut grid = test_grid();
        for col in 0..20 {
            grid.insert((col, 2), Tile::new(TileMaterial::Beam));
        }
        let inv = 1.0 / 2.0f32.sqrt();
        let (_, contact) = cast_ray(&grid, 100.0, 80.0, inv, -inv, 300.0).unwrap();
        // Falling onto a floor: normal points up.
        assert_eq!(contact.nx, 0.0);
        assert!((contact.ny - 1.0).abs() < 1e-6);
    }
}
