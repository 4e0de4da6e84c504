//! Host-provided input state.
//!
//! The host samples its own devices and hands the core one snapshot per tick.
//! Edge flags (`*_pressed`, `*_released`) are meaningful for exactly one
//! fixed update; when the host steps multiple fixed updates in one call, the
//! edges are cleared after the first so a single press is never honored twice.

use bevy_ecs::prelude::*;

/// Input state for one fixed update.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    /// Horizontal movement axis in `[-1, 1]`.
    pub axis: f32,
    pub jump_pressed: bool,
    /// Level state of the jump button. Letting go mid-ascent ends the jump
    /// even when the host never delivers a release edge.
    pub jump_held: bool,
    pub jump_released: bool,
    pub strike_pressed: bool,
    pub strike_held: bool,
    pub strike_released: bool,
    /// Aim pointer in world coordinates, meaningful while aiming.
    pub aim_x: f32,
    pub aim_y: f32,
    pub pause_pressed: bool,
}

impl InputSnapshot {
    /// Drop one-tick edge flags, keeping held state and the axis.
    pub fn clear_edges(&mut self) {
        self.jump_pressed = false;
        self.jump_released = false;
        self.strike_pressed = false;
        self.strike_released = false;
        self.pause_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_edges_keeps_held_state() {
        let mut input = InputSnapshot {
            axis: -1.0,
            jump_pressed: true,
            jump_held: true,
            strike_pressed: true,
            strike_held: true,
            pause_pressed: true,
            ..Default::default()
        };
        input.clear_edges();
        assert!(!input.jump_pressed);
        assert!(!input.strike_pressed);
        assert!(!input.pause_pressed);
        assert!(input.jump_held);
        assert!(input.strike_held);
        assert_eq!(input.axis, -1.0);
    }
}
