//! ECS components for the Rubble Runner simulation core.
//!
//! Components are pure data containers attached to entities.
//! All gameplay logic lives in systems that query these components.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D world position (x = horizontal, y = vertical, y-up).
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// 2D velocity vector.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    pub fn magnitude(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn zero(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
    }
}

// ============================================================================
// PLAYER COMPONENTS
// ============================================================================

/// Marker for the player entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Facing direction: +1 = right, -1 = left.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facing(pub i8);

impl Default for Facing {
    fn default() -> Self {
        Self(1)
    }
}

/// Discrete motion state of the player character.
///
/// The full transition table is implemented in `systems::player`; the states
/// here are closed under every input event the controller accepts.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
    /// Grace window after leaving the ground during which a jump still works.
    CoyoteTime,
    /// A mid-air jump press being re-attempted every tick until landing or timeout.
    JumpQueued,
    /// Physics-locked aiming: vertical axis locked, horizontal movement disabled.
    Aim,
    /// The launch tick: upward boost applied, resolves to ground/air state.
    Strike,
    Death,
    /// Entered by a level trigger; horizontal motion locked until the host
    /// reports the elevator finished.
    Elevator,
}

impl PlayerState {
    /// States in which the horizontal input axis drives velocity and facing.
    pub fn allows_horizontal_control(&self) -> bool {
        matches!(
            self,
            PlayerState::Idle
                | PlayerState::Run
                | PlayerState::Jump
                | PlayerState::Fall
                | PlayerState::CoyoteTime
                | PlayerState::JumpQueued
                | PlayerState::Strike
        )
    }

    /// States resting on the floor.
    pub fn is_grounded(&self) -> bool {
        matches!(self, PlayerState::Idle | PlayerState::Run)
    }

    /// States from which a strike press is accepted.
    pub fn can_strike(&self) -> bool {
        !matches!(
            self,
            PlayerState::Aim | PlayerState::Strike | PlayerState::Death | PlayerState::Elevator
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Idle => "Idle",
            PlayerState::Run => "Run",
            PlayerState::Jump => "Jump",
            PlayerState::Fall => "Fall",
            PlayerState::CoyoteTime => "CoyoteTime",
            PlayerState::JumpQueued => "JumpQueued",
            PlayerState::Aim => "Aim",
            PlayerState::Strike => "Strike",
            PlayerState::Death => "Death",
            PlayerState::Elevator => "Elevator",
        }
    }
}

/// Named countdown timers for the player, advanced once per tick.
///
/// These are plain decrementing counters, not scheduled callbacks;
/// cancelling a window is just zeroing its field.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerTimers {
    /// Remaining coyote window ticks.
    pub coyote: u32,
    /// Remaining jump-buffer ticks.
    pub jump_queue: u32,
    /// Remaining un-strikeable cooldown ticks after a strike.
    pub strike_cooldown: u32,
    /// Remaining lifetime of the launched ball (armed at launch).
    pub ball_lifetime: u32,
    /// Remaining ticks until respawn after death.
    pub respawn: u32,
}

impl PlayerTimers {
    /// Advance all counters by one tick.
    pub fn tick(&mut self) {
        self.coyote = self.coyote.saturating_sub(1);
        self.jump_queue = self.jump_queue.saturating_sub(1);
        self.strike_cooldown = self.strike_cooldown.saturating_sub(1);
        self.ball_lifetime = self.ball_lifetime.saturating_sub(1);
        self.respawn = self.respawn.saturating_sub(1);
    }
}

/// Floor/spring contact flags, refreshed by the motion system each tick.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SurfaceContact {
    pub grounded: bool,
    pub on_spring: bool,
}

/// The player's owned projectile, if any. At most one live ball exists per
/// player; the character controller is the only creator and destroyer.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct BallRef(pub Option<Entity>);

/// Bundle for spawning the player at the level spawn point.
#[derive(Bundle, Default)]
pub struct PlayerBundle {
    pub marker: Player,
    pub position: Position,
    pub velocity: Velocity,
    pub facing: Facing,
    pub state: PlayerState,
    pub timers: PlayerTimers,
    pub contact: SurfaceContact,
    pub ball: BallRef,
}

impl PlayerBundle {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Position::new(x, y),
            ..Default::default()
        }
    }
}

// ============================================================================
// BALL COMPONENTS
// ============================================================================

/// Marker for the ball (projectile) entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Ball;

/// Unit direction vector used while aiming and at launch.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AimDirection {
    pub x: f32,
    pub y: f32,
}

impl Default for AimDirection {
    fn default() -> Self {
        Self { x: 1.0, y: 0.0 }
    }
}

/// Behavioral phase flags for the ball.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallPhase {
    /// True while the ball follows aim input instead of moving under velocity.
    pub tracking: bool,
    /// Set when the ball has been killed but not yet despawned by its owner.
    pub dead: bool,
}

impl Default for BallPhase {
    fn default() -> Self {
        Self {
            tracking: true,
            dead: false,
        }
    }
}

/// Length of the aim-assist indicator: distance along the aim direction to
/// the first obstruction. Player feedback only, never physics.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AssistIndicator(pub f32);

/// Bundle for spawning a ball in tracking (aim) mode.
#[derive(Bundle, Default)]
pub struct BallBundle {
    pub marker: Ball,
    pub position: Position,
    pub velocity: Velocity,
    pub direction: AimDirection,
    pub phase: BallPhase,
    pub assist: AssistIndicator,
}

impl BallBundle {
    pub fn tracking_at(x: f32, y: f32, facing: i8) -> Self {
        Self {
            position: Position::new(x, y),
            direction: AimDirection {
                x: facing as f32,
                y: 0.0,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_saturate_at_zero() {
        let mut timers = PlayerTimers {
            coyote: 1,
            ..Default::default()
        };
        timers.tick();
        assert_eq!(timers.coyote, 0);
        timers.tick();
        assert_eq!(timers.coyote, 0);
    }

    #[test]
    fn test_state_control_flags() {
        assert!(PlayerState::Run.allows_horizontal_control());
        assert!(PlayerState::CoyoteTime.allows_horizontal_control());
        assert!(!PlayerState::Aim.allows_horizontal_control());
        assert!(!PlayerState::Elevator.allows_horizontal_control());
        assert!(!PlayerState::Death.allows_horizontal_control());

        assert!(PlayerState::Idle.is_grounded());
        assert!(!PlayerState::Fall.is_grounded());

        assert!(PlayerState::Fall.can_strike());
        assert!(!PlayerState::Aim.can_strike());
        assert!(!PlayerState::Strike.can_strike());
    }

    #[test]
    fn test_ball_spawns_tracking() {
        let bundle = BallBundle::tracking_at(10.0, 20.0, -1);
        assert!(bundle.phase.tracking);
        assert!(!bundle.phase.dead);
        assert_eq!(bundle.direction.x, -1.0);
    }
}
