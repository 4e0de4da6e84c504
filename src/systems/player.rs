//! Player state machine and motion.
//!
//! The controller is split across three systems run in order each tick:
//! `timer_system` advances the countdown timers, `player_state_system`
//! consumes input edges and drives the discrete state machine (including ball
//! ownership), and `player_motion_system` integrates velocity, resolves
//! collision, and applies the landing/airborne transitions that depend on
//! contact. `respawn_system` runs at the end of the chain so a death observed
//! mid-tick resets the world before the next snapshot.
//!
//! All assist windows (coyote time, the jump queue, the strike cooldown) are
//! plain tick counters on [`PlayerTimers`]; expiring is reaching zero and
//! cancelling is writing zero.

use crate::components::{
    AimDirection, Ball, BallBundle, BallPhase, BallRef, Facing, Player, PlayerState, PlayerTimers,
    Position, SurfaceContact, Velocity,
};
use crate::collision;
use crate::config::{DeltaTime, SimConfig};
use crate::events::{FeedbackBuffer, SimEvent};
use crate::grid::TileGrid;
use crate::level::{LevelInfo, Props};
use crate::segments::SegmentMap;
use crate::systems::ball::AimBlocked;
use crate::systems::camera::CameraForceUpdate;
use crate::systems::input::InputSnapshot;
use bevy_ecs::prelude::*;
use log::debug;

/// Set when the death timer expires; consumed by `respawn_system`.
#[derive(Resource, Debug, Default)]
pub struct RespawnRequest(pub bool);

/// Latched once the player touches the level target.
#[derive(Resource, Debug, Default)]
pub struct ObjectiveState {
    pub reached: bool,
}

/// Advance every countdown timer by one tick.
pub fn timer_system(mut query: Query<&mut PlayerTimers>) {
    for mut timers in query.iter_mut() {
        timers.tick();
    }
}

/// Input-driven state transitions: jumping, aiming, striking, ball ownership.
#[allow(clippy::too_many_arguments)]
pub fn player_state_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    input: Res<InputSnapshot>,
    grid: Res<TileGrid>,
    mut aim_blocked: ResMut<AimBlocked>,
    mut respawn: ResMut<RespawnRequest>,
    mut feedback: ResMut<FeedbackBuffer>,
    mut q_player: Query<
        (
            &Position,
            &mut Velocity,
            &mut Facing,
            &mut PlayerState,
            &mut PlayerTimers,
            &SurfaceContact,
            &mut BallRef,
        ),
        With<Player>,
    >,
    mut q_balls: Query<
        (&Position, &mut Velocity, &mut BallPhase, &AimDirection),
        (With<Ball>, Without<Player>),
    >,
) {
    let Ok((pos, mut vel, mut facing, mut state, mut timers, contact, mut ball_ref)) =
        q_player.get_single_mut()
    else {
        return;
    };

    // A ball killed elsewhere this frame is despawned by its owner.
    if let Some(entity) = ball_ref.0 {
        let dead = q_balls.get(entity).map(|(_, _, phase, _)| phase.dead).unwrap_or(true);
        if dead {
            commands.entity(entity).despawn();
            ball_ref.0 = None;
            feedback.push(SimEvent::BallRemoved);
        }
    }

    match *state {
        PlayerState::Death => {
            if timers.respawn == 0 {
                respawn.0 = true;
            }
            return;
        }
        PlayerState::Elevator => return,
        _ => {}
    }

    // Facing follows the axis whenever the axis is live.
    if state.allows_horizontal_control() && input.axis != 0.0 {
        facing.0 = if input.axis > 0.0 { 1 } else { -1 };
    }

    // The launch tick resolves on the next update; motion settles it into a
    // grounded or airborne state.
    if *state == PlayerState::Strike {
        *state = if contact.grounded {
            if input.axis != 0.0 {
                PlayerState::Run
            } else {
                PlayerState::Idle
            }
        } else {
            PlayerState::Fall
        };
    }

    // Assist windows expire to Fall.
    if *state == PlayerState::CoyoteTime && timers.coyote == 0 {
        *state = PlayerState::Fall;
    }
    if *state == PlayerState::JumpQueued && timers.jump_queue == 0 {
        *state = PlayerState::Fall;
    }

    // Jump edges.
    if input.jump_pressed {
        match *state {
            s if s.is_grounded() => {
                start_jump(&config, &mut vel, &mut state, &mut timers, contact.on_spring, &mut feedback);
            }
            PlayerState::CoyoteTime => {
                // The grace window honors the press as if still grounded.
                start_jump(&config, &mut vel, &mut state, &mut timers, contact.on_spring, &mut feedback);
            }
            PlayerState::Fall | PlayerState::Jump => {
                // Too early: remember the press until landing or timeout.
                *state = PlayerState::JumpQueued;
                timers.jump_queue = config.jump_queue_ticks;
            }
            _ => {}
        }
    }
    if (input.jump_released || !input.jump_held)
        && *state == PlayerState::Jump
        && vel.vy > 0.0
    {
        // Short hop: letting go of jump early cuts the ascent.
        vel.vy = 0.0;
    }

    // Aim exit: a release, or the assist ray jammed against a beam.
    if *state == PlayerState::Aim {
        vel.zero();
        let blocked = aim_blocked.0;
        aim_blocked.0 = false;
        if input.strike_released || blocked {
            if let Some(entity) = ball_ref.0 {
                if let Ok((_, mut ball_vel, mut phase, dir)) = q_balls.get_mut(entity) {
                    ball_vel.vx = dir.x * config.launch_speed;
                    ball_vel.vy = dir.y * config.launch_speed;
                    phase.tracking = false;
                }
            }
            *state = PlayerState::Strike;
            vel.vy = config.strike_boost;
            timers.strike_cooldown = config.strike_cooldown_ticks;
            timers.ball_lifetime = config.ball_lifetime_ticks;
            feedback.push(SimEvent::BallLaunched);
            debug!("ball launched");
        }
        return;
    }
    aim_blocked.0 = false;

    // Strike edges. Holding the button keeps retrying a refused spawn.
    let wants_strike = input.strike_pressed || (ball_ref.0.is_none() && input.strike_held);
    if wants_strike && state.can_strike() && timers.strike_cooldown == 0 {
        match ball_ref.0 {
            Some(entity) => {
                // Pick the live ball back up if it is within reach.
                if let Ok((ball_pos, mut ball_vel, mut phase, _)) = q_balls.get_mut(entity) {
                    if input.strike_pressed
                        && pos.distance_squared_to(ball_pos)
                            <= config.pickup_radius * config.pickup_radius
                    {
                        ball_vel.zero();
                        phase.tracking = true;
                        timers.ball_lifetime = 0;
                        *state = PlayerState::Aim;
                        vel.zero();
                    }
                }
            }
            None => {
                if let Some(side) = spawn_side(&grid, &config, pos, facing.0) {
                    let (hx, _) = config.player_half_extents;
                    let spawn_x = pos.x + side as f32 * (hx + config.ball_radius + 2.0);
                    let entity = commands
                        .spawn(BallBundle::tracking_at(spawn_x, pos.y, side))
                        .id();
                    ball_ref.0 = Some(entity);
                    *state = PlayerState::Aim;
                    vel.zero();
                    feedback.push(SimEvent::BallSpawned);
                }
                // Both sides blocked: refused, retried while held.
            }
        }
    }

    // A launched ball expires after its lifetime window.
    if let Some(entity) = ball_ref.0 {
        if let Ok((_, _, phase, _)) = q_balls.get(entity) {
            if !phase.tracking && timers.ball_lifetime == 0 {
                commands.entity(entity).despawn();
                ball_ref.0 = None;
                feedback.push(SimEvent::BallRemoved);
            }
        }
    }
}

fn start_jump(
    config: &SimConfig,
    vel: &mut Velocity,
    state: &mut PlayerState,
    timers: &mut PlayerTimers,
    on_spring: bool,
    feedback: &mut FeedbackBuffer,
) {
    let factor = if on_spring { config.spring_factor } else { 1.0 };
    vel.vy = config.jump_speed * factor;
    *state = PlayerState::Jump;
    timers.coyote = 0;
    timers.jump_queue = 0;
    feedback.push(SimEvent::Jump { spring: on_spring });
}

/// Find a clear side to spawn the ball on: the facing side first, then the
/// opposite. Returns `None` when both probes hit something.
fn spawn_side(grid: &TileGrid, config: &SimConfig, pos: &Position, facing: i8) -> Option<i8> {
    for side in [facing, -facing] {
        let clear = collision::cast_ray(
            grid,
            pos.x,
            pos.y,
            side as f32,
            0.0,
            config.spawn_probe_distance,
        )
        .is_none();
        if clear {
            return Some(side);
        }
    }
    None
}

/// Integrate player velocity, resolve collision, and apply contact-driven
/// transitions (landing, walking off a ledge, hazards, triggers).
#[allow(clippy::too_many_arguments)]
pub fn player_motion_system(
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    input: Res<InputSnapshot>,
    grid: Res<TileGrid>,
    mut props: ResMut<Props>,
    mut objective: ResMut<ObjectiveState>,
    mut feedback: ResMut<FeedbackBuffer>,
    mut q_player: Query<
        (
            &mut Position,
            &mut Velocity,
            &mut PlayerState,
            &mut PlayerTimers,
            &mut SurfaceContact,
        ),
        With<Player>,
    >,
) {
    let Ok((mut pos, mut vel, mut state, mut timers, mut contact)) = q_player.get_single_mut()
    else {
        return;
    };
    let (hx, hy) = config.player_half_extents;

    match *state {
        PlayerState::Death => {
            // The corpse arcs freely; no collision, no triggers.
            vel.vy = (vel.vy + config.gravity * dt.0).max(-config.max_fall_speed);
            pos.x += vel.vx * dt.0;
            pos.y += vel.vy * dt.0;
            return;
        }
        PlayerState::Elevator => {
            vel.zero();
            return;
        }
        PlayerState::Aim => {
            vel.zero();
            return;
        }
        _ => {}
    }

    if state.allows_horizontal_control() {
        vel.vx = input.axis * config.move_speed;
    } else {
        vel.vx = 0.0;
    }
    vel.vy = (vel.vy + config.gravity * dt.0).max(-config.max_fall_speed);

    let moved = collision::move_aabb(&grid, pos.x, pos.y, hx, hy, vel.vx * dt.0, vel.vy * dt.0);
    pos.x = moved.x;
    pos.y = moved.y;
    if moved.hit_x {
        vel.vx = 0.0;
    }
    if moved.hit_up && vel.vy > 0.0 {
        vel.vy = 0.0;
    }

    let was_grounded = contact.grounded;
    let now_grounded =
        moved.hit_down || (vel.vy <= 0.0 && collision::grounded(&grid, pos.x, pos.y, hx, hy));
    contact.grounded = now_grounded;
    contact.on_spring = now_grounded && props.spring_at(pos.x, pos.y - 2.0, hx, hy);
    if moved.hit_down {
        vel.vy = 0.0;
    }

    // Contact-driven transitions.
    if now_grounded && !state.is_grounded() {
        if *state == PlayerState::JumpQueued && timers.jump_queue > 0 {
            // Buffered press fires the moment feet touch down.
            timers.jump_queue = 0;
            let factor = if contact.on_spring { config.spring_factor } else { 1.0 };
            vel.vy = config.jump_speed * factor;
            *state = PlayerState::Jump;
            contact.grounded = false;
            feedback.push(SimEvent::Jump { spring: contact.on_spring });
        } else {
            *state = if input.axis != 0.0 {
                PlayerState::Run
            } else {
                PlayerState::Idle
            };
            feedback.push(SimEvent::Landed);
        }
    } else if !now_grounded && was_grounded && state.is_grounded() {
        // Walked off an edge: the jump press still works for a short window.
        *state = PlayerState::CoyoteTime;
        timers.coyote = config.coyote_ticks;
    } else if state.is_grounded() {
        *state = if input.axis != 0.0 {
            PlayerState::Run
        } else {
            PlayerState::Idle
        };
    } else if *state == PlayerState::Jump && vel.vy <= 0.0 {
        *state = PlayerState::Fall;
    }

    // Hazards and falling out of the world are both lethal.
    let fell_out = pos.y < -2.0 * grid.tile_size;
    if fell_out || props.hazard_at(pos.x, pos.y, hx, hy) {
        *state = PlayerState::Death;
        vel.vx = 0.0;
        vel.vy = config.death_launch_speed;
        timers.respawn = config.respawn_ticks;
        feedback.push(SimEvent::PlayerDied);
        feedback.shake(0.0, -1.0, 1.0);
        debug!("player died at ({:.1}, {:.1})", pos.x, pos.y);
        return;
    }

    if !objective.reached && props.target_at(pos.x, pos.y, hx, hy) {
        objective.reached = true;
        feedback.push(SimEvent::TargetReached);
    }

    for elevator in props.elevators.iter_mut() {
        if !elevator.triggered && elevator.rect.overlaps_aabb(pos.x, pos.y, hx, hy) {
            elevator.triggered = true;
            *state = PlayerState::Elevator;
            vel.zero();
            feedback.push(SimEvent::ElevatorEntered);
            break;
        }
    }
}

/// Reset the world after a death: despawn the ball, return the player to the
/// spawn point, and rewind segment progression.
pub fn respawn_system(
    mut commands: Commands,
    mut respawn: ResMut<RespawnRequest>,
    info: Res<LevelInfo>,
    mut segments: ResMut<SegmentMap>,
    mut force_camera: ResMut<CameraForceUpdate>,
    mut feedback: ResMut<FeedbackBuffer>,
    mut q_player: Query<
        (
            &mut Position,
            &mut Velocity,
            &mut Facing,
            &mut PlayerState,
            &mut PlayerTimers,
            &mut SurfaceContact,
            &mut BallRef,
        ),
        With<Player>,
    >,
    q_balls: Query<Entity, With<Ball>>,
) {
    if !respawn.0 {
        return;
    }
    respawn.0 = false;

    for entity in q_balls.iter() {
        commands.entity(entity).despawn();
    }

    let Ok((mut pos, mut vel, mut facing, mut state, mut timers, mut contact, mut ball_ref)) =
        q_player.get_single_mut()
    else {
        return;
    };
    pos.x = info.spawn_x;
    pos.y = info.spawn_y;
    vel.zero();
    facing.0 = 1;
    *state = PlayerState::Idle;
    *timers = PlayerTimers::default();
    *contact = SurfaceContact::default();
    ball_ref.0 = None;

    segments.reset();
    force_camera.0 = true;
    feedback.push(SimEvent::PlayerRespawned);
    debug!("player respawned at ({:.1}, {:.1})", info.spawn_x, info.spawn_y);
}
