//! Ball aiming and flight.
//!
//! While tracking, the ball orbits the player along the aim direction and
//! carries the aim-assist ray. Once launched it flies under its own velocity,
//! reflecting specularly off solid surfaces with at most one bounce per tick,
//! and reports confirmed tile hits to the destruction system through
//! [`PendingHits`]. The ball never mutates the grid itself.

use crate::components::{AimDirection, AssistIndicator, Ball, BallPhase, Player, Position, Velocity};
use crate::collision::{self, SurfaceTag};
use crate::config::{DeltaTime, SimConfig};
use crate::events::{FeedbackBuffer, PendingHits, SimEvent};
use crate::grid::TileGrid;
use crate::level::Props;
use crate::systems::input::InputSnapshot;
use bevy_ecs::prelude::*;

/// Clearance kept between the ball surface and a struck face after a bounce.
const BOUNCE_SKIN: f32 = 0.1;

/// Set while the aim-assist ray is jammed against an indestructible surface
/// at point-blank range; the controller treats it as a forced launch.
#[derive(Resource, Debug, Default)]
pub struct AimBlocked(pub bool);

/// Keep a tracking ball on its orbit around the player and refresh the
/// aim-assist indicator.
pub fn ball_tracking_system(
    config: Res<SimConfig>,
    input: Res<InputSnapshot>,
    grid: Res<TileGrid>,
    mut aim_blocked: ResMut<AimBlocked>,
    q_player: Query<&Position, (With<Player>, Without<Ball>)>,
    mut q_ball: Query<
        (
            &mut Position,
            &mut Velocity,
            &mut AimDirection,
            &BallPhase,
            &mut AssistIndicator,
        ),
        With<Ball>,
    >,
) {
    let Ok(player_pos) = q_player.get_single() else {
        return;
    };
    for (mut pos, mut vel, mut dir, phase, mut assist) in q_ball.iter_mut() {
        if !phase.tracking || phase.dead {
            continue;
        }
        vel.zero();

        // A pointer at the exact origin means the host sent no aim sample;
        // the previous direction (initially the facing side) stays.
        if input.aim_x != 0.0 || input.aim_y != 0.0 {
            let dx = input.aim_x - player_pos.x;
            let dy = input.aim_y - player_pos.y;
            let len = (dx * dx + dy * dy).sqrt();
            if len > 1e-3 {
                dir.x = dx / len;
                dir.y = dy / len;
            }
        }

        let (hx, _) = config.player_half_extents;
        let orbit = hx + config.ball_radius + 2.0;
        pos.x = player_pos.x + dir.x * orbit;
        pos.y = player_pos.y + dir.y * orbit;

        match collision::cast_ray(&grid, pos.x, pos.y, dir.x, dir.y, config.assist_max_length) {
            Some((t, contact)) => {
                assist.0 = t;
                aim_blocked.0 =
                    contact.tag == SurfaceTag::Beam && t <= config.ball_radius + 1.0;
            }
            None => {
                assist.0 = config.assist_max_length;
                aim_blocked.0 = false;
            }
        }
    }
}

/// Integrate launched balls: fly, bounce, queue tile hits, die in hazards.
pub fn ball_flight_system(
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    grid: Res<TileGrid>,
    props: Res<Props>,
    mut pending: ResMut<PendingHits>,
    mut feedback: ResMut<FeedbackBuffer>,
    mut q_ball: Query<(&mut Position, &mut Velocity, &mut BallPhase), With<Ball>>,
) {
    for (mut pos, mut vel, mut phase) in q_ball.iter_mut() {
        if phase.tracking || phase.dead {
            continue;
        }
        let speed = vel.magnitude();
        if speed < 1e-3 {
            continue;
        }
        let travel = speed * dt.0;
        let ux = vel.vx / speed;
        let uy = vel.vy / speed;

        let hit = collision::cast_ray(&grid, pos.x, pos.y, ux, uy, travel + config.ball_radius);
        match hit {
            Some((t, contact)) => {
                // One bounce per tick: advance to the surface, then reflect.
                let back = (t - config.ball_radius - BOUNCE_SKIN).max(0.0);
                pos.x += ux * back;
                pos.y += uy * back;
                let (rvx, rvy) = collision::reflect(vel.vx, vel.vy, contact.nx, contact.ny);
                vel.vx = rvx;
                vel.vy = rvy;
                feedback.push(SimEvent::BallBounced {
                    x: contact.px,
                    y: contact.py,
                });

                if contact.tag == SurfaceTag::Tile {
                    // The struck cell sits half a tile behind the contact face.
                    let cell = grid.world_to_cell(
                        contact.px - contact.nx * grid.tile_size * 0.5,
                        contact.py - contact.ny * grid.tile_size * 0.5,
                    );
                    pending.0.push((cell, (contact.nx, contact.ny)));
                }
            }
            None => {
                pos.x += vel.vx * dt.0;
                pos.y += vel.vy * dt.0;
            }
        }

        if props.ball_hazard_at(pos.x, pos.y) {
            phase.dead = true;
        }
    }
}
