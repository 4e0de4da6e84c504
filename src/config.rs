//! Simulation configuration and tick bookkeeping.
//!
//! Every gameplay tunable lives in [`SimConfig`] so designers (and tests) can
//! adjust feel without touching system code. Timing windows are expressed in
//! ticks of the fixed timestep, never in wall-clock seconds: the jump-assist
//! mechanics depend on exact tick counts.

use bevy_ecs::prelude::*;

/// Configuration for the simulation core.
#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    /// Fixed timestep in seconds (e.g., 1/60 = 0.0167 for 60 Hz).
    pub fixed_timestep: f32,
    /// Downward acceleration in units/sec^2 (negative, y-up world).
    pub gravity: f32,
    /// Terminal fall speed in units/sec (positive magnitude).
    pub max_fall_speed: f32,
    /// Horizontal run speed in units/sec.
    pub move_speed: f32,
    /// Initial upward jump velocity in units/sec.
    pub jump_speed: f32,
    /// Jump velocity multiplier while standing on a spring surface.
    pub spring_factor: f32,
    /// Upward velocity applied when a strike launches the ball.
    pub strike_boost: f32,
    /// Ball launch speed in units/sec.
    pub launch_speed: f32,
    /// Ball collision radius in world units.
    pub ball_radius: f32,
    /// Maximum distance at which an existing ball can be re-aimed (picked up).
    /// Compared squared; a tunable, not a contract.
    pub pickup_radius: f32,
    /// Player collision half extents (half width, half height).
    pub player_half_extents: (f32, f32),
    /// Sideways probe distance used to find an unobstructed ball spawn side.
    pub spawn_probe_distance: f32,
    /// Maximum length of the aim-assist indicator ray.
    pub assist_max_length: f32,
    /// Upward launch applied to the player on death (for the death animation).
    pub death_launch_speed: f32,
    /// Coyote window: ticks after leaving the ground that still honor a jump.
    pub coyote_ticks: u32,
    /// Jump buffer: ticks a mid-air jump press is remembered before landing.
    pub jump_queue_ticks: u32,
    /// Ticks after a strike during which another strike is refused.
    pub strike_cooldown_ticks: u32,
    /// Ticks a launched ball lives before it is despawned.
    pub ball_lifetime_ticks: u32,
    /// Ticks between death and automatic respawn.
    pub respawn_ticks: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0, // 60 Hz
            gravity: -1800.0,
            max_fall_speed: 700.0,
            move_speed: 160.0,
            jump_speed: 420.0,
            spring_factor: 1.6,
            strike_boost: 150.0,
            launch_speed: 520.0,
            ball_radius: 5.0,
            pickup_radius: 48.0,
            player_half_extents: (6.0, 14.0),
            spawn_probe_distance: 20.0,
            assist_max_length: 400.0,
            death_launch_speed: 300.0,
            coyote_ticks: 6,
            jump_queue_ticks: 8,
            strike_cooldown_ticks: 12,
            ball_lifetime_ticks: 600, // 10 seconds at 60 Hz
            respawn_ticks: 90,
        }
    }
}

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// Global simulation tick counter, incremented once per fixed update.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_sane() {
        let config = SimConfig::default();
        assert!(config.fixed_timestep > 0.0);
        assert!(config.gravity < 0.0);
        assert!(config.coyote_ticks > 0);
        assert!(config.jump_queue_ticks > 0);
        assert!(config.pickup_radius > 0.0);
    }

    #[test]
    fn test_tick_increment_wraps() {
        let mut tick = SimTick(u64::MAX);
        tick.increment();
        assert_eq!(tick.0, 0);
    }
}
